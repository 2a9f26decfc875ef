//! The provider-agnostic streaming contract.
//!
//! Every provider adapter turns its wire format into a sequence of
//! [`StreamEvent`]s of the shape
//! `MessageStart, (BlockStart, BlockDelta*, BlockStop)*, MessageDelta?, MessageStop`.
//! The normalizer folds that sequence into one [`TurnResult`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Message, ToolCall};

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    End,
    ToolUse,
    Length,
    Other(String),
}

impl StopReason {
    /// Maps an Anthropic `stop_reason` string.
    pub fn from_anthropic(reason: &str) -> Self {
        match reason {
            "end_turn" | "stop_sequence" => StopReason::End,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::Length,
            other => StopReason::Other(other.to_string()),
        }
    }

    /// Maps an OpenAI `finish_reason` string.
    pub fn from_openai(reason: &str) -> Self {
        match reason {
            "stop" => StopReason::End,
            "tool_calls" | "function_call" => StopReason::ToolUse,
            "length" => StopReason::Length,
            other => StopReason::Other(other.to_string()),
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::End => f.write_str("end"),
            StopReason::ToolUse => f.write_str("tool_use"),
            StopReason::Length => f.write_str("length"),
            StopReason::Other(reason) => f.write_str(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    ToolUse,
}

/// Incremental payload of an open block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delta {
    Text(String),
    /// A fragment of a tool call's JSON arguments.
    PartialJson(String),
}

/// One normalized streaming event.
///
/// `index` identifies the content block an event belongs to. Blocks are
/// appended to the assistant message in `BlockStart` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart,
    BlockStart {
        index: usize,
        kind: BlockKind,
        id: Option<String>,
        name: Option<String>,
    },
    BlockDelta { index: usize, delta: Delta },
    BlockStop { index: usize },
    MessageDelta { stop_reason: Option<StopReason> },
    MessageStop,
}

impl StreamEvent {
    pub fn text_start(index: usize) -> Self {
        StreamEvent::BlockStart { index, kind: BlockKind::Text, id: None, name: None }
    }

    pub fn tool_start(index: usize, id: impl Into<String>, name: impl Into<String>) -> Self {
        StreamEvent::BlockStart {
            index,
            kind: BlockKind::ToolUse,
            id: Some(id.into()),
            name: Some(name.into()),
        }
    }

    pub fn text_delta(index: usize, text: impl Into<String>) -> Self {
        StreamEvent::BlockDelta { index, delta: Delta::Text(text.into()) }
    }

    pub fn json_delta(index: usize, fragment: impl Into<String>) -> Self {
        StreamEvent::BlockDelta { index, delta: Delta::PartialJson(fragment.into()) }
    }

    pub fn stop_reason(reason: StopReason) -> Self {
        StreamEvent::MessageDelta { stop_reason: Some(reason) }
    }
}

/// The finalized outcome of one streaming pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    /// The assistant message appended to history.
    pub message: Message,
    pub stop_reason: StopReason,
    /// Concatenation of every text delta of the turn.
    pub text: String,
    /// Requested tool calls in block index order.
    pub tool_calls: Vec<ToolCall>,
}

impl TurnResult {
    pub fn requests_tools(&self) -> bool {
        self.stop_reason == StopReason::ToolUse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anthropic_stop_reasons() {
        assert_eq!(StopReason::from_anthropic("end_turn"), StopReason::End);
        assert_eq!(StopReason::from_anthropic("stop_sequence"), StopReason::End);
        assert_eq!(StopReason::from_anthropic("tool_use"), StopReason::ToolUse);
        assert_eq!(StopReason::from_anthropic("max_tokens"), StopReason::Length);
        assert_eq!(StopReason::from_anthropic("refusal"), StopReason::Other("refusal".into()));
    }

    #[test]
    fn test_openai_stop_reasons() {
        assert_eq!(StopReason::from_openai("stop"), StopReason::End);
        assert_eq!(StopReason::from_openai("tool_calls"), StopReason::ToolUse);
        assert_eq!(StopReason::from_openai("function_call"), StopReason::ToolUse);
        assert_eq!(StopReason::from_openai("length"), StopReason::Length);
        assert_eq!(StopReason::from_openai("content_filter").to_string(), "content_filter");
    }

    #[test]
    fn test_event_helpers() {
        assert_eq!(
            StreamEvent::tool_start(1, "toolu_1", "add"),
            StreamEvent::BlockStart {
                index: 1,
                kind: BlockKind::ToolUse,
                id: Some("toolu_1".into()),
                name: Some("add".into()),
            }
        );
        assert_eq!(
            StreamEvent::json_delta(1, "{\"a\":"),
            StreamEvent::BlockDelta { index: 1, delta: Delta::PartialJson("{\"a\":".into()) }
        );
    }
}
