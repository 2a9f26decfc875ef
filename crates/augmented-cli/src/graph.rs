//! `augmented graph`: generate, print and save a knowledge graph.

use std::path::PathBuf;

use anyhow::{Context, Result};
use augmented_config::Credentials;
use augmented_core::ProviderKind;
use augmented_graph::{document_summary, render_knowledge_graph, save_knowledge_graph, to_graph_document, GraphGenerator};
use augmented_llm::connect_decoder;

use crate::GraphArgs;

fn output_path(args: &GraphArgs) -> PathBuf {
    args.out
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}_knowledge_graph.json", args.complexity)))
}

pub async fn run(args: GraphArgs) -> Result<()> {
    let credentials = Credentials::from_env();
    let api_key = credentials
        .api_key(ProviderKind::OpenAi)
        .context("OPENAI_API_KEY is required for knowledge-graph generation")?;
    let decoder = connect_decoder(api_key, credentials.api_base(ProviderKind::OpenAi), args.model.as_deref());

    let kg = GraphGenerator::new(decoder).generate(&args.topic, args.complexity).await?;
    println!("{}", render_knowledge_graph(&kg));

    let path = output_path(&args);
    save_knowledge_graph(&kg, &path)?;
    println!("Knowledge graph saved to {}", path.display());

    println!("\nGraph Document Summary:");
    print!("{}", document_summary(&to_graph_document(&kg)));
    Ok(())
}
