//! Conversation messages and content blocks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Carries the result of a tool invocation back to the model.
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One block of structured message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain model or user text.
    Text { text: String },
    /// A request from the model to invoke a tool.
    ///
    /// `input` is only meaningful once the streamed argument buffer parsed.
    ToolUse { id: String, name: String, input: Value },
    /// Output of a tool, keyed by the originating call id.
    ToolResult { tool_use_id: String, content: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        ContentBlock::ToolUse { id: id.into(), name: name.into(), input }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        ContentBlock::ToolResult { tool_use_id: tool_use_id.into(), content: content.into() }
    }

    /// Returns the text of a `Text` block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Message content: either a bare string or an ordered list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Concatenated text of every text block, in order.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks.iter().filter_map(ContentBlock::as_text).collect(),
        }
    }

    /// The content viewed as blocks. A bare string becomes a single text block.
    pub fn blocks(&self) -> Vec<ContentBlock> {
        match self {
            MessageContent::Text(text) => vec![ContentBlock::text(text.clone())],
            MessageContent::Blocks(blocks) => blocks.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(text) => text.is_empty(),
            MessageContent::Blocks(blocks) => blocks.is_empty(),
        }
    }
}

/// A single entry of conversation history.
///
/// History is append-only and replayed verbatim to the provider on every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
    /// Set on tool-result messages: the id of the call being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: Role::System, content: MessageContent::Text(text.into()), tool_call_id: None }
    }

    /// Creates a new user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, content: MessageContent::Text(text.into()), tool_call_id: None }
    }

    /// Creates an assistant message from finalized content blocks.
    pub fn assistant(blocks: Vec<ContentBlock>) -> Self {
        Self { role: Role::Assistant, content: MessageContent::Blocks(blocks), tool_call_id: None }
    }

    /// Creates a tool-result message answering `tool_call_id`.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let id = tool_call_id.into();
        Self {
            role: Role::Tool,
            content: MessageContent::Blocks(vec![ContentBlock::tool_result(id.clone(), content)]),
            tool_call_id: Some(id),
        }
    }

    pub fn text(&self) -> String {
        self.content.text()
    }

    /// The `ToolUse` blocks of this message in arrival order.
    pub fn tool_uses(&self) -> Vec<&ContentBlock> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter(|b| matches!(b, ContentBlock::ToolUse { .. }))
                .collect(),
        }
    }

    /// The result text carried by a tool-result message.
    pub fn tool_result_content(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                ContentBlock::ToolResult { content, .. } => Some(content.as_str()),
                _ => None,
            }),
            MessageContent::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_block_wire_shape() {
        let block = ContentBlock::tool_use("toolu_1", "add", json!({"a": 2}));
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value, json!({"type": "tool_use", "id": "toolu_1", "name": "add", "input": {"a": 2}}));

        let back: ContentBlock = serde_json::from_value(json!({"type": "text", "text": "hi"})).unwrap();
        assert_eq!(back, ContentBlock::text("hi"));
    }

    #[test]
    fn test_message_text_skips_non_text_blocks() {
        let msg = Message::assistant(vec![
            ContentBlock::text("Let me "),
            ContentBlock::tool_use("t1", "add", json!({})),
            ContentBlock::text("add."),
        ]);
        assert_eq!(msg.text(), "Let me add.");
        assert_eq!(msg.tool_uses().len(), 1);
    }

    #[test]
    fn test_tool_result_message() {
        let msg = Message::tool_result("call_9", "5");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_9"));
        assert_eq!(msg.tool_result_content(), Some("5"));
    }

    #[test]
    fn test_untagged_content_deserializes_both_forms() {
        let plain: Message = serde_json::from_value(json!({"role": "user", "content": "hello"})).unwrap();
        assert_eq!(plain.content, MessageContent::Text("hello".into()));

        let blocks: Message = serde_json::from_value(json!({
            "role": "assistant",
            "content": [{"type": "text", "text": "ok"}]
        }))
        .unwrap();
        assert_eq!(blocks.text(), "ok");
        assert!(blocks.tool_call_id.is_none());
    }
}
