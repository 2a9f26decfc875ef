//! Conversation orchestration for augmented.
//!
//! - [`Session`]: owns history, tools and the token ledger; drives the tool loop
//! - [`ErrorLog`], [`TranscriptLog`], [`ToolsLog`]: best-effort JSON diagnostics
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use augmented_config::{Credentials, SessionConfig};
//! use augmented_core::ProviderKind;
//! use augmented_engine::Session;
//! use futures::StreamExt;
//!
//! let config = SessionConfig::builder(ProviderKind::Anthropic)
//!     .system_prompt("You are a helpful assistant.")
//!     .credentials(Credentials::from_env())
//!     .build();
//! let mut session = Session::new(config)?;
//!
//! let reply = session.generate("What is 2 + 3?");
//! futures::pin_mut!(reply);
//! while let Some(chunk) = reply.next().await {
//!     print!("{}", chunk?);
//! }
//! ```
//!
//! # Tool Loop
//!
//! Each `generate` call:
//! 1. Appends the user message and opens a stream over the full history
//! 2. Relays text as it arrives
//! 3. If the turn stops for tool use, executes the requested calls (the first
//!    one for Anthropic, all of them in index order for OpenAI) and appends one
//!    tool result per call
//! 4. Opens the next stream, up to `max_turns` streams in total

mod diagnostics;
mod session;

pub use diagnostics::{ErrorLog, FailureContext, ToolFailure, ToolsLog, TranscriptLog};
pub use session::Session;
