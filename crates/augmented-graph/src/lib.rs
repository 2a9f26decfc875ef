//! Knowledge graphs generated from structured LLM output.
//!
//! - [`Complexity`]: the three schema tiers (basic, standard, advanced)
//! - [`knowledge_graph_schema`]: strict JSON schema for a tier
//! - [`GraphGenerator`]: asks a [`StructuredDecoder`] for a graph on a topic
//! - [`GraphDocument`]: node/relationship batch handed to a [`GraphSink`]
//! - [`render_knowledge_graph`], [`save_knowledge_graph`]: human and file output
//!
//! # Example
//!
//! ```rust,ignore
//! use augmented_graph::{Complexity, GraphGenerator};
//!
//! let generator = GraphGenerator::new(decoder);
//! let kg = generator.generate("a simple family of 3", Complexity::Basic).await?;
//! println!("{}", augmented_graph::render_knowledge_graph(&kg));
//! ```
//!
//! [`StructuredDecoder`]: augmented_core::StructuredDecoder

mod complexity;
mod document;
mod generator;
mod model;
mod render;
mod schema;

pub use complexity::{schema_description, Complexity};
pub use document::{document_summary, to_graph_document, upload, DocumentSource, GraphDocument, GraphNode, GraphRelationship, GraphSink};
pub use generator::{GraphGenerator, DEFAULT_SOURCE};
pub use model::{KnowledgeGraph, Metadata, Node, Property, Relationship};
pub use render::{render_knowledge_graph, save_knowledge_graph};
pub use schema::knowledge_graph_schema;

use augmented_core::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid complexity level: {0}. Must be one of: basic, standard, advanced")]
    InvalidComplexity(String),

    #[error("Error generating knowledge graph: {0}")]
    Generation(#[from] SessionError),

    #[error("Graph sink rejected the document: {0}")]
    Sink(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
