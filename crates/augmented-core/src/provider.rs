//! Provider selection and the per-provider policies of the tool loop.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ToolCall;

/// Errors parsing provider or reasoning-effort selectors from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Unknown provider: '{0}' (expected 'anthropic' or 'openai')")]
    UnknownProvider(String),

    #[error("Invalid reasoning effort: '{0}' (expected 'low', 'medium' or 'high')")]
    InvalidReasoningEffort(String),
}

/// The hosted LLM API a session talks to.
///
/// | Kind | Wire protocol | Arguments | Dispatch |
/// |------|---------------|-----------|----------|
/// | `Anthropic` | Messages API server-sent events | parsed incrementally | first call only |
/// | `OpenAi` | Chat completions chunks | parsed after the stream | every call, by index |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
        }
    }

    /// Guesses the provider from a model name (`claude-*` is Anthropic).
    pub fn detect(model: &str) -> Self {
        if model.to_lowercase().starts_with("claude-") {
            ProviderKind::Anthropic
        } else {
            ProviderKind::OpenAi
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "claude-3-5-sonnet-20241022",
            ProviderKind::OpenAi => "gpt-4",
        }
    }

    pub fn default_max_tokens(&self) -> u32 {
        match self {
            ProviderKind::Anthropic => 8192,
            ProviderKind::OpenAi => 4096,
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn credential_variable(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn argument_policy(&self) -> ArgumentPolicy {
        match self {
            ProviderKind::Anthropic => ArgumentPolicy::Incremental,
            ProviderKind::OpenAi => ArgumentPolicy::Deferred,
        }
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        match self {
            ProviderKind::Anthropic => DispatchPolicy::FirstOnly,
            ProviderKind::OpenAi => DispatchPolicy::All,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            _ => Err(SelectorError::UnknownProvider(s.to_string())),
        }
    }
}

impl TryFrom<String> for ProviderKind {
    type Error = SelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How streamed tool-call argument fragments become JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentPolicy {
    /// Parse the accumulator whenever it ends in `}`; failures keep accumulating.
    Incremental,
    /// Concatenate fragments and parse exactly once, when the stream ends.
    Deferred,
}

/// Which of a turn's tool calls the orchestrator executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    FirstOnly,
    All,
}

impl DispatchPolicy {
    /// Selects the calls to run. `calls` is already in index order.
    pub fn select<'a>(&self, calls: &'a [ToolCall]) -> &'a [ToolCall] {
        match self {
            DispatchPolicy::FirstOnly => &calls[..calls.len().min(1)],
            DispatchPolicy::All => calls,
        }
    }
}

/// Effort hint sent to reasoning-class models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    #[default]
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }
}

impl FromStr for ReasoningEffort {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(ReasoningEffort::Low),
            "medium" => Ok(ReasoningEffort::Medium),
            "high" => Ok(ReasoningEffort::High),
            _ => Err(SelectorError::InvalidReasoningEffort(s.to_string())),
        }
    }
}

impl fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
