//! # Augmented: tool-calling LLM sessions
//!
//! Augmented puts one conversation API in front of Anthropic and OpenAI:
//! streaming text, provider-agnostic tool declarations, an automatic tool
//! loop, token and cost accounting, and structured knowledge-graph output.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use augmented::prelude::*;
//! use futures::StreamExt;
//!
//! let config = SessionConfig::builder(ProviderKind::Anthropic)
//!     .system_prompt("You are a helpful assistant.")
//!     .credentials(Credentials::from_env())
//!     .build();
//!
//! let mut session = Session::new(config)?;
//! session.register(
//!     ToolDeclaration::new("add", "Add two integers")
//!         .field("a", FieldSpec::required("integer"))
//!         .field("b", FieldSpec::required("integer")),
//!     handler_fn(|args| {
//!         let a: i64 = required_arg(&args, "a")?;
//!         let b: i64 = required_arg(&args, "b")?;
//!         Ok((a + b).to_string())
//!     }),
//! );
//!
//! let reply = session.generate("What is 2 + 3?");
//! futures::pin_mut!(reply);
//! while let Some(chunk) = reply.next().await {
//!     print!("{}", chunk?);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! | Crate | Description |
//! |-------|-------------|
//! | [`augmented_core`] | Messages, stream events, tool declarations, errors |
//! | [`augmented_config`] | Session configuration and credentials |
//! | [`augmented_tools`] | Tool registry and provider schema adapter |
//! | [`augmented_ledger`] | Token counting and cost ledger |
//! | [`augmented_llm`] | Anthropic and OpenAI streaming clients, stream normalizer |
//! | [`augmented_engine`] | Session orchestrator and diagnostics |
//! | `augmented_graph` | Knowledge-graph generation (feature `graph`) |

// Re-export core types
pub use augmented_core::{
    ContentBlock, FieldSpec, Message, MessageContent, ProviderKind, ReasoningEffort, Role, SessionError,
    StopReason, StreamEvent, StructuredDecoder, StructuredRequest, ToolArguments, ToolCall, ToolDeclaration,
    TurnResult,
};

// Re-export config
pub use augmented_config::{ConfigError, Credentials, DebugFlags, SessionConfig, SessionConfigBuilder};

// Re-export tools
pub use augmented_tools::{handler_fn, optional_arg, required_arg, Tool, ToolArgs, ToolError, ToolHandler, ToolRegistry};

// Re-export ledger
pub use augmented_ledger::{CostSummary, EstimatingCounter, LedgerSummary, TiktokenCounter, TokenCounter, TokenLedger};

// Re-export LLM clients
pub use augmented_llm::{connect, connect_decoder, AnthropicClient, ChatProvider, EventStream, OpenAiClient, StreamRequest};

// Re-export engine
pub use augmented_engine::{ErrorLog, Session, ToolsLog, TranscriptLog};

#[cfg(feature = "graph")]
pub use augmented_graph as graph;

// Scripted provider for tests (hidden)
#[doc(hidden)]
pub use augmented_llm::mock;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use augmented::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::{Message, ProviderKind, Role, SessionError, StopReason};

    // Config
    pub use crate::{Credentials, SessionConfig};

    // Tools
    pub use crate::{handler_fn, optional_arg, required_arg, FieldSpec, Tool, ToolDeclaration, ToolError, ToolRegistry};

    // Engine
    pub use crate::Session;

    // Knowledge graphs
    #[cfg(feature = "graph")]
    pub use augmented_graph::{Complexity, GraphGenerator, KnowledgeGraph};
}
