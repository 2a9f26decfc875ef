//! Anthropic Messages API client with server-sent-event streaming.

use async_stream::try_stream;
use async_trait::async_trait;
use augmented_core::{ContentBlock, Message, ProviderKind, Role, SessionError, StopReason, StreamEvent};
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{ChatProvider, EventStream, StreamRequest};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

// === Wire events ===

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    MessageStart {},
    ContentBlockStart { index: usize, content_block: WireBlock },
    ContentBlockDelta { index: usize, delta: WireDelta },
    ContentBlockStop { index: usize },
    MessageDelta { delta: WireMessageDelta },
    MessageStop {},
    Ping {},
    Error { error: WireError },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse { id: String, name: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct WireMessageDelta {
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

fn map_event(event: WireEvent) -> Result<Vec<StreamEvent>, SessionError> {
    let events = match event {
        WireEvent::MessageStart {} => vec![StreamEvent::MessageStart],
        WireEvent::ContentBlockStart { index, content_block } => match content_block {
            WireBlock::Text { text } if text.is_empty() => vec![StreamEvent::text_start(index)],
            WireBlock::Text { text } => vec![StreamEvent::text_start(index), StreamEvent::text_delta(index, text)],
            WireBlock::ToolUse { id, name } => vec![StreamEvent::tool_start(index, id, name)],
            WireBlock::Other => Vec::new(),
        },
        WireEvent::ContentBlockDelta { index, delta } => match delta {
            WireDelta::TextDelta { text } => vec![StreamEvent::text_delta(index, text)],
            WireDelta::InputJsonDelta { partial_json } => vec![StreamEvent::json_delta(index, partial_json)],
            WireDelta::Other => Vec::new(),
        },
        WireEvent::ContentBlockStop { index } => vec![StreamEvent::BlockStop { index }],
        WireEvent::MessageDelta { delta } => vec![StreamEvent::MessageDelta {
            stop_reason: delta.stop_reason.as_deref().map(StopReason::from_anthropic),
        }],
        WireEvent::MessageStop {} => vec![StreamEvent::MessageStop],
        WireEvent::Ping {} | WireEvent::Unknown => Vec::new(),
        WireEvent::Error { error } => {
            return Err(SessionError::Transport(format!("Anthropic stream error {}: {}", error.kind, error.message)));
        }
    };
    Ok(events)
}

// === SSE decoding ===

/// Incremental server-sent-event decoder.
///
/// Network chunks may end mid-line or mid-codepoint; both are buffered
/// until the next chunk completes them.
#[derive(Debug, Default)]
struct SseDecoder {
    pending: Vec<u8>,
    line: String,
}

impl SseDecoder {
    /// Feeds one chunk and returns the complete `data:` payloads it finished.
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let cut = match std::str::from_utf8(&self.pending) {
            Ok(text) => text.len(),
            Err(e) => match e.error_len() {
                Some(len) => e.valid_up_to() + len,
                None => e.valid_up_to(),
            },
        };
        let decoded: Vec<u8> = self.pending.drain(..cut).collect();
        self.line.push_str(&String::from_utf8_lossy(&decoded));

        let mut payloads = Vec::new();
        while let Some(pos) = self.line.find('\n') {
            let raw: String = self.line.drain(..=pos).collect();
            let line = raw.trim_end_matches(['\r', '\n']);
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim_start();
                if !data.is_empty() && data != "[DONE]" {
                    payloads.push(data.to_string());
                }
            }
        }
        payloads
    }
}

/// Turns a raw SSE byte stream into normalized events.
fn decode_events<S, B, E>(bytes: S) -> impl Stream<Item = Result<StreamEvent, SessionError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    try_stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = SseDecoder::default();
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| SessionError::Transport(e.to_string()))?;
            for payload in decoder.push(chunk.as_ref()) {
                let wire: WireEvent = match serde_json::from_str(&payload) {
                    Ok(wire) => wire,
                    Err(e) => {
                        warn!("Failed to parse Anthropic event: {} - {}", e, payload);
                        continue;
                    }
                };
                for event in map_event(wire)? {
                    yield event;
                }
            }
        }
    }
}

// === History conversion ===

/// Converts history into Messages API form.
///
/// System messages are dropped (the prompt travels in `system`), tool results
/// become `user` messages with consecutive results merged, and empty text
/// blocks are removed.
///
/// The session dispatches only the first tool call of a turn. When an
/// assistant message carries several `tool_use` blocks, all of them are sent
/// back as-is and only the first is followed by a `tool_result`. The others
/// are left unanswered on purpose; no placeholder results are synthesized.
fn wire_messages(history: &[Message]) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(history.len());
    let mut merging_results = false;

    for message in history {
        match message.role {
            Role::System => continue,
            Role::Tool => {
                let blocks: Vec<Value> = message
                    .content
                    .blocks()
                    .into_iter()
                    .filter_map(|block| match block {
                        ContentBlock::ToolResult { tool_use_id, content } => {
                            Some(json!({"type": "tool_result", "tool_use_id": tool_use_id, "content": content}))
                        }
                        _ => None,
                    })
                    .collect();
                if blocks.is_empty() {
                    continue;
                }
                if merging_results {
                    if let Some(content) = out.last_mut().and_then(|m| m.get_mut("content")).and_then(Value::as_array_mut) {
                        content.extend(blocks);
                        continue;
                    }
                }
                out.push(json!({"role": "user", "content": blocks}));
                merging_results = true;
            }
            Role::User | Role::Assistant => {
                let blocks: Vec<Value> = message.content.blocks().into_iter().filter_map(wire_block).collect();
                if blocks.is_empty() {
                    continue;
                }
                out.push(json!({"role": message.role.as_str(), "content": blocks}));
                merging_results = false;
            }
        }
    }
    out
}

fn wire_block(block: ContentBlock) -> Option<Value> {
    match block {
        ContentBlock::Text { text } if text.is_empty() => None,
        ContentBlock::Text { text } => Some(json!({"type": "text", "text": text})),
        ContentBlock::ToolUse { id, name, input } => {
            let input = if input.is_object() { input } else { json!({}) };
            Some(json!({"type": "tool_use", "id": id, "name": name, "input": input}))
        }
        ContentBlock::ToolResult { tool_use_id, content } => {
            Some(json!({"type": "tool_result", "tool_use_id": tool_use_id, "content": content}))
        }
    }
}

// === Client ===

/// Client for Anthropic's Claude Messages API.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        info!("AnthropicClient: api_key_len={}", api_key.len());
        Self { client: Client::new(), api_key, api_url: ANTHROPIC_API_URL.to_string() }
    }

    /// Points the client at a different endpoint, e.g. a proxy.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    fn request_body(&self, request: &StreamRequest) -> Value {
        let mut body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "system": request.system_prompt,
            "messages": wire_messages(&request.messages),
            "stream": true,
        });
        if !request.tools.is_empty() {
            body["tools"] = Value::Array(request.tools.clone());
        }
        body
    }
}

#[async_trait]
impl ChatProvider for AnthropicClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn open_stream(&self, request: StreamRequest) -> Result<EventStream, SessionError> {
        let body = self.request_body(&request);

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::Transport(format!("Anthropic API error {}: {}", status, body)));
        }

        Ok(Box::pin(decode_events(response.bytes_stream())))
    }

    fn describe_request(&self, request: &StreamRequest) -> Value {
        let mut body = self.request_body(request);
        if let Some(map) = body.as_object_mut() {
            map.remove("messages");
        }
        body
    }
}
