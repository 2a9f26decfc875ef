//! Core domain types and error definitions for augmented.
//!
//! This crate provides the types shared by every other augmented crate:
//!
//! - [`SessionError`]: error taxonomy for a conversation session
//! - [`Message`], [`Role`], [`ContentBlock`]: conversation history
//! - [`StreamEvent`] and [`TurnResult`]: the provider-agnostic streaming contract
//! - [`ToolCall`], [`ToolArguments`], [`ToolDeclaration`], [`FieldSpec`]: tool calling
//! - [`ProviderKind`] and [`ReasoningEffort`]: provider selection
//! - [`StructuredDecoder`]: schema-conformant decode boundary
//!
//! # Example
//!
//! ```rust
//! use augmented_core::{ContentBlock, Message, Role};
//!
//! let msg = Message::user("What is 2 + 3?");
//! assert_eq!(msg.role, Role::User);
//! assert_eq!(msg.text(), "What is 2 + 3?");
//!
//! let reply = Message::assistant(vec![ContentBlock::text("5")]);
//! assert_eq!(reply.text(), "5");
//! ```

mod message;
mod provider;
mod stream;
mod tool;

pub use message::{ContentBlock, Message, MessageContent, Role};
pub use provider::{ArgumentPolicy, DispatchPolicy, ProviderKind, ReasoningEffort, SelectorError};
pub use stream::{BlockKind, Delta, StopReason, StreamEvent, TurnResult};
pub use tool::{
    FieldSpec, InputSchema, StructuredDecoder, StructuredRequest, ToolArguments, ToolCall,
    ToolDeclaration,
};

use thiserror::Error;

/// Errors that can end a session operation.
///
/// Only `Transport`, `InvalidConfiguration` and `TurnLimit` are fatal to a
/// `generate` pass. Tool failures never surface here; they are rendered to
/// text and fed back into the conversation.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The provider stream (or the request opening it) failed.
    #[error("Provider transport failed: {0}")]
    Transport(String),

    /// Missing credentials, unknown provider or an invalid setting.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Finalized tool-call arguments were not valid JSON.
    #[error("Error parsing tool arguments for '{tool}': {message}")]
    MalformedToolArguments { tool: String, message: String },

    /// Structured output did not decode.
    #[error("Failed to parse structured output: {0}")]
    Parse(String),

    /// The tool loop opened more streams than the configured guard allows.
    #[error("Tool loop exceeded the limit of {0} turns")]
    TurnLimit(usize),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Parse(err.to_string())
    }
}

impl From<SelectorError> for SessionError {
    fn from(err: SelectorError) -> Self {
        SessionError::InvalidConfiguration(err.to_string())
    }
}
