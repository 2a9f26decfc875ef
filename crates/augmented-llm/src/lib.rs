//! Provider adapters and stream normalization for Anthropic and OpenAI.
//!
//! This crate turns two different streaming wire formats into one event
//! contract and folds that contract into turns:
//!
//! - [`ChatProvider`]: opens a stream of normalized [`StreamEvent`]s
//! - [`AnthropicClient`]: Messages API over server-sent events
//! - [`OpenAiClient`]: chat completions via `async-openai`, also a [`StructuredDecoder`]
//! - [`normalize`] and [`TurnAccumulator`]: the provider-agnostic state machine
//! - [`connect`]: builds the client for a [`ProviderKind`]
//! - [`mock::ScriptedProvider`]: replays scripted events, for tests
//!
//! # Streaming a turn
//!
//! ```rust,ignore
//! use augmented_llm::{connect, normalize, Normalized, StreamRequest};
//! use futures::StreamExt;
//!
//! let provider = connect(ProviderKind::Anthropic, &api_key, None);
//! let events = provider.open_stream(request).await?;
//! let mut history = Vec::new();
//! let stream = normalize(events, &mut history, ProviderKind::Anthropic.argument_policy());
//! futures::pin_mut!(stream);
//!
//! while let Some(item) = stream.next().await {
//!     match item? {
//!         Normalized::Text(text) => print!("{}", text),
//!         Normalized::Marker(_) => {}
//!         Normalized::Turn(turn) => println!("\nstop: {}", turn.stop_reason),
//!     }
//! }
//! ```

mod anthropic;
pub mod mock;
mod normalize;
mod openai;
mod unified;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;

pub use anthropic::AnthropicClient;
pub use augmented_core::{
    Message, ProviderKind, ReasoningEffort, SessionError, StopReason, StreamEvent, StructuredDecoder,
    StructuredRequest, TurnResult,
};
pub use normalize::{normalize, Normalized, TurnAccumulator};
pub use openai::OpenAiClient;
pub use unified::{connect, connect_decoder};

/// A stream of normalized provider events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, SessionError>> + Send>>;

/// Everything a provider needs to open one streaming turn.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub model: String,
    pub system_prompt: String,
    /// Full conversation history, replayed verbatim.
    pub messages: Vec<Message>,
    /// Tool schemas already converted for this provider.
    pub tools: Vec<Value>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Only sent to reasoning-class models.
    pub reasoning_effort: ReasoningEffort,
}

/// A hosted LLM API that streams responses.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Opens a stream for one assistant turn.
    async fn open_stream(&self, request: StreamRequest) -> Result<EventStream, SessionError>;

    /// The request parameters this provider would send, minus the messages.
    fn describe_request(&self, request: &StreamRequest) -> Value {
        serde_json::json!({
            "model": request.model,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "tools": request.tools,
            "stream": true,
        })
    }
}
