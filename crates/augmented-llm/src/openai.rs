//! OpenAI chat-completions client built on `async-openai`.
//!
//! Requests are assembled as JSON and decoded into the `async-openai`
//! request type, which keeps reasoning-model fields (`developer` role,
//! `max_completion_tokens`, `reasoning_effort`) in one place. Streamed
//! chunks are reduced to [`ChunkFragment`]s and replayed through a
//! [`ChunkAdapter`] that synthesizes the terminal events OpenAI never sends.

use std::collections::BTreeSet;
use std::time::Instant;

use async_openai::{
    config::OpenAIConfig,
    types::{CreateChatCompletionRequest, CreateChatCompletionStreamResponse},
    Client,
};
use async_stream::try_stream;
use async_trait::async_trait;
use augmented_core::{
    ContentBlock, Message, ProviderKind, Role, SessionError, StopReason, StreamEvent, StructuredDecoder,
    StructuredRequest,
};
use augmented_ledger::ModelClass;
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{ChatProvider, EventStream, StreamRequest};

/// Model used for structured decoding unless overridden.
pub const DEFAULT_STRUCTURED_MODEL: &str = "gpt-4o-2024-08-06";

fn transport(e: impl ToString) -> SessionError {
    SessionError::Transport(e.to_string())
}

fn decode_request(body: Value) -> Result<CreateChatCompletionRequest, SessionError> {
    serde_json::from_value(body)
        .map_err(|e| SessionError::InvalidConfiguration(format!("Invalid OpenAI request: {}", e)))
}

// === Chunk adaptation ===

/// The parts of one streamed chunk the adapter cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ChunkFragment {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolFragment>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ToolFragment {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// Reduces a chunk to its first choice. Usage-only chunks carry no choice.
fn fragment(chunk: CreateChatCompletionStreamResponse) -> Option<ChunkFragment> {
    let choice = chunk.choices.into_iter().next()?;
    let finish_reason = choice
        .finish_reason
        .and_then(|reason| serde_json::to_value(reason).ok())
        .and_then(|value| value.as_str().map(str::to_string));
    let tool_calls = choice
        .delta
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| {
            let (name, arguments) = match call.function {
                Some(function) => (function.name, function.arguments),
                None => (None, None),
            };
            ToolFragment { index: call.index as usize, id: call.id, name, arguments }
        })
        .collect();
    Some(ChunkFragment { content: choice.delta.content, tool_calls, finish_reason })
}

/// Rebuilds the block-structured event contract from OpenAI's flat deltas.
///
/// Text lives at block index 0 and tool call `i` at index `i + 1`.
#[derive(Debug, Default)]
pub(crate) struct ChunkAdapter {
    started: bool,
    text_open: bool,
    tools: BTreeSet<usize>,
    finish_reason: Option<String>,
}

impl ChunkAdapter {
    pub fn apply(&mut self, fragment: ChunkFragment) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        self.start(&mut events);

        if let Some(content) = fragment.content.filter(|c| !c.is_empty()) {
            if !self.text_open {
                self.text_open = true;
                events.push(StreamEvent::text_start(0));
            }
            events.push(StreamEvent::text_delta(0, content));
        }

        for call in fragment.tool_calls {
            let index = call.index + 1;
            if self.tools.insert(index) {
                events.push(StreamEvent::tool_start(
                    index,
                    call.id.unwrap_or_default(),
                    call.name.unwrap_or_default(),
                ));
            }
            if let Some(arguments) = call.arguments.filter(|a| !a.is_empty()) {
                events.push(StreamEvent::json_delta(index, arguments));
            }
        }

        if fragment.finish_reason.is_some() {
            self.finish_reason = fragment.finish_reason;
        }
        events
    }

    /// Terminal events, emitted once the chunk stream is exhausted.
    pub fn finish(mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        self.start(&mut events);
        if self.text_open {
            events.push(StreamEvent::BlockStop { index: 0 });
        }
        events.extend(self.tools.iter().map(|index| StreamEvent::BlockStop { index: *index }));

        let stop_reason = if !self.tools.is_empty() {
            StopReason::ToolUse
        } else {
            self.finish_reason.as_deref().map(StopReason::from_openai).unwrap_or(StopReason::End)
        };
        events.push(StreamEvent::stop_reason(stop_reason));
        events.push(StreamEvent::MessageStop);
        events
    }

    fn start(&mut self, events: &mut Vec<StreamEvent>) {
        if !self.started {
            self.started = true;
            events.push(StreamEvent::MessageStart);
        }
    }
}

fn adapt_chunks<S>(chunks: S) -> impl Stream<Item = Result<StreamEvent, SessionError>> + Send
where
    S: Stream<Item = Result<Option<ChunkFragment>, SessionError>> + Send + 'static,
{
    try_stream! {
        let mut chunks = Box::pin(chunks);
        let mut adapter = ChunkAdapter::default();
        while let Some(chunk) = chunks.next().await {
            if let Some(fragment) = chunk? {
                for event in adapter.apply(fragment) {
                    yield event;
                }
            }
        }
        for event in adapter.finish() {
            yield event;
        }
    }
}

// === History conversion ===

fn system_role(model: &str) -> &'static str {
    if ModelClass::of(model).is_reasoning() {
        "developer"
    } else {
        "system"
    }
}

/// Converts history into chat-completions messages.
///
/// Assistant tool calls replay their original argument text so a malformed
/// call is sent back exactly as the model produced it.
fn wire_messages(model: &str, system_prompt: &str, history: &[Message]) -> Vec<Value> {
    let system_role = system_role(model);
    let mut out = Vec::with_capacity(history.len() + 1);
    if !system_prompt.is_empty() {
        out.push(json!({"role": system_role, "content": system_prompt}));
    }

    for message in history {
        match message.role {
            Role::System => out.push(json!({"role": system_role, "content": message.text()})),
            Role::User => out.push(json!({"role": "user", "content": message.text()})),
            Role::Assistant => {
                let calls: Vec<Value> = message
                    .tool_uses()
                    .into_iter()
                    .filter_map(|block| match block {
                        ContentBlock::ToolUse { id, name, input } => {
                            let arguments = match input {
                                Value::String(raw) => raw.clone(),
                                other => other.to_string(),
                            };
                            Some(json!({
                                "id": id,
                                "type": "function",
                                "function": {"name": name, "arguments": arguments},
                            }))
                        }
                        _ => None,
                    })
                    .collect();
                let text = message.text();
                let mut wire = json!({"role": "assistant"});
                if !text.is_empty() || calls.is_empty() {
                    wire["content"] = Value::String(text);
                }
                if !calls.is_empty() {
                    wire["tool_calls"] = Value::Array(calls);
                }
                out.push(wire);
            }
            Role::Tool => {
                let id = message.tool_call_id.clone().unwrap_or_default();
                let content = message.tool_result_content().unwrap_or_default();
                out.push(json!({"role": "tool", "tool_call_id": id, "content": content}));
            }
        }
    }
    out
}

// === Client ===

/// Client for OpenAI chat completions and compatible endpoints.
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    structured_model: String,
}

impl OpenAiClient {
    /// Creates a client for the given key and optional API base URL.
    pub fn new(api_key: &str, api_base: Option<&str>) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }
        info!("OpenAiClient: api_key_len={}, api_base={}", api_key.len(), api_base.unwrap_or("default"));
        Self { client: Client::with_config(config), structured_model: DEFAULT_STRUCTURED_MODEL.to_string() }
    }

    /// Sets the model used by [`StructuredDecoder::decode`].
    pub fn with_structured_model(mut self, model: impl Into<String>) -> Self {
        self.structured_model = model.into();
        self
    }

    fn request_body(&self, request: &StreamRequest) -> Value {
        let mut body = json!({
            "model": request.model,
            "messages": wire_messages(&request.model, &request.system_prompt, &request.messages),
            "stream": true,
        });
        if ModelClass::of(&request.model).is_reasoning() {
            body["max_completion_tokens"] = json!(request.max_tokens);
            body["reasoning_effort"] = json!(request.reasoning_effort.as_str());
        } else {
            body["max_tokens"] = json!(request.max_tokens);
            body["temperature"] = json!(request.temperature);
        }
        if !request.tools.is_empty() {
            body["tools"] = Value::Array(request.tools.clone());
        }
        body
    }

    fn structured_body(&self, request: &StructuredRequest) -> Value {
        json!({
            "model": self.structured_model,
            "messages": [
                {"role": system_role(&self.structured_model), "content": request.system_prompt},
                {"role": "user", "content": request.user_prompt},
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {"name": request.schema_name, "schema": request.schema, "strict": true},
            },
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn open_stream(&self, request: StreamRequest) -> Result<EventStream, SessionError> {
        let request = decode_request(self.request_body(&request))?;
        let stream = self.client.chat().create_stream(request).await.map_err(transport)?;
        let fragments = stream.map(|chunk| chunk.map(fragment).map_err(transport));
        Ok(Box::pin(adapt_chunks(fragments)))
    }

    fn describe_request(&self, request: &StreamRequest) -> Value {
        let mut body = self.request_body(request);
        if let Some(map) = body.as_object_mut() {
            map.remove("messages");
        }
        body
    }
}

#[async_trait]
impl StructuredDecoder for OpenAiClient {
    async fn decode(&self, request: StructuredRequest) -> Result<Value, SessionError> {
        let start = Instant::now();
        let body = decode_request(self.structured_body(&request))?;
        let response = self.client.chat().create(body).await.map_err(transport)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SessionError::Parse("No response content".into()))?;

        info!("Structured decode '{}': {}ms", request.schema_name, start.elapsed().as_millis());
        debug!("Structured response: {}", content);

        serde_json::from_str(&content)
            .map_err(|e| SessionError::Parse(format!("Failed to parse: {} - content: {}", e, content)))
    }
}
