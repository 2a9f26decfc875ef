//! Folds a provider's [`StreamEvent`]s into display chunks and a [`TurnResult`].
//!
//! The state machine is provider-agnostic; the only provider-specific input
//! is the [`ArgumentPolicy`] deciding when tool-call JSON is parsed.

use std::collections::HashMap;

use async_stream::try_stream;
use augmented_core::{
    ArgumentPolicy, BlockKind, ContentBlock, Delta, Message, SessionError, StopReason, StreamEvent, ToolArguments,
    ToolCall, TurnResult,
};
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::EventStream;

/// One item produced while normalizing a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Model text, emitted as soon as it arrives.
    Text(String),
    /// Progress marker such as `[Stream Started]`, already formatted.
    Marker(String),
    /// The finalized turn. Always the last item of a pass.
    Turn(TurnResult),
}

#[derive(Debug)]
enum BlockState {
    Text(String),
    Tool {
        index: usize,
        id: String,
        name: String,
        /// Accumulated argument fragments.
        buffer: String,
        input: Option<Value>,
    },
}

/// Per-pass normalizer state.
#[derive(Debug)]
pub struct TurnAccumulator {
    policy: ArgumentPolicy,
    started: bool,
    finished: bool,
    blocks: Vec<BlockState>,
    positions: HashMap<usize, usize>,
    text: String,
    stop_reason: Option<StopReason>,
}

impl TurnAccumulator {
    pub fn new(policy: ArgumentPolicy) -> Self {
        Self {
            policy,
            started: false,
            finished: false,
            blocks: Vec::new(),
            positions: HashMap::new(),
            text: String::new(),
            stop_reason: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Applies one event and returns what it produced.
    ///
    /// `MessageStop` produces [`Normalized::Turn`]; events after it are ignored.
    pub fn apply(&mut self, event: StreamEvent) -> Vec<Normalized> {
        if self.finished {
            return Vec::new();
        }
        let mut out = Vec::new();
        match event {
            StreamEvent::MessageStart => {
                if !self.started {
                    self.started = true;
                    out.push(Normalized::Marker("[Stream Started]\n".to_string()));
                }
            }
            StreamEvent::BlockStart { index, kind, id, name } => {
                let block = match kind {
                    BlockKind::Text => BlockState::Text(String::new()),
                    BlockKind::ToolUse => {
                        let name = name.unwrap_or_default();
                        out.push(Normalized::Marker(format!("\n[Tool Use Started: {}]\n", name)));
                        BlockState::Tool { index, id: id.unwrap_or_default(), name, buffer: String::new(), input: None }
                    }
                };
                self.positions.insert(index, self.blocks.len());
                self.blocks.push(block);
            }
            StreamEvent::BlockDelta { index, delta: Delta::Text(text) } => {
                let pos = match self.positions.get(&index) {
                    Some(pos) => *pos,
                    None => {
                        self.positions.insert(index, self.blocks.len());
                        self.blocks.push(BlockState::Text(String::new()));
                        self.blocks.len() - 1
                    }
                };
                match &mut self.blocks[pos] {
                    BlockState::Text(block_text) => block_text.push_str(&text),
                    BlockState::Tool { name, .. } => {
                        warn!("Text delta for tool block '{}' at index {}", name, index);
                    }
                }
                self.text.push_str(&text);
                out.push(Normalized::Text(text));
            }
            StreamEvent::BlockDelta { index, delta: Delta::PartialJson(fragment) } => {
                let policy = self.policy;
                match self.positions.get(&index).map(|pos| &mut self.blocks[*pos]) {
                    Some(BlockState::Tool { buffer, input, .. }) => match policy {
                        ArgumentPolicy::Incremental => {
                            if !fragment.trim().is_empty() {
                                buffer.push_str(&fragment);
                                if buffer.ends_with('}') {
                                    // False-positive closing braces just keep accumulating.
                                    if let Ok(parsed) = serde_json::from_str::<Value>(buffer) {
                                        out.push(Normalized::Marker(format!("\n[Tool Input: {}]\n", parsed)));
                                        *input = Some(parsed);
                                    }
                                }
                            }
                        }
                        ArgumentPolicy::Deferred => buffer.push_str(&fragment),
                    },
                    _ => warn!("Argument fragment for unknown tool block {}", index),
                }
            }
            StreamEvent::BlockStop { index } => {
                if self.policy == ArgumentPolicy::Incremental {
                    if let Some(BlockState::Tool { buffer, .. }) =
                        self.positions.get(&index).map(|pos| &mut self.blocks[*pos])
                    {
                        buffer.clear();
                    }
                }
            }
            StreamEvent::MessageDelta { stop_reason } => {
                if let Some(reason) = stop_reason {
                    out.push(Normalized::Marker(format!("\n[Stop Reason: {}]\n", reason)));
                    self.stop_reason = Some(reason);
                }
            }
            StreamEvent::MessageStop => {
                out.extend(self.finalize());
            }
        }
        out
    }

    fn finalize(&mut self) -> Vec<Normalized> {
        self.finished = true;
        let mut out = Vec::new();
        let mut content = Vec::with_capacity(self.blocks.len());
        let mut calls: Vec<(usize, ToolCall)> = Vec::new();

        for block in self.blocks.drain(..) {
            match block {
                BlockState::Text(text) => content.push(ContentBlock::Text { text }),
                BlockState::Tool { index, id, name, buffer, input } => {
                    let arguments = match self.policy {
                        ArgumentPolicy::Incremental => ToolArguments::Json(input.unwrap_or_else(|| json!({}))),
                        ArgumentPolicy::Deferred => parse_deferred(&buffer),
                    };
                    let block_input = match &arguments {
                        ToolArguments::Json(value) => {
                            if self.policy == ArgumentPolicy::Deferred {
                                out.push(Normalized::Marker(format!("\n[Tool Input: {}]\n", value)));
                            }
                            value.clone()
                        }
                        ToolArguments::Malformed { raw, error } => {
                            debug!("Arguments of '{}' did not parse: {}", name, error);
                            Value::String(raw.clone())
                        }
                    };
                    content.push(ContentBlock::ToolUse { id: id.clone(), name: name.clone(), input: block_input });
                    calls.push((index, ToolCall { id, name, arguments }));
                }
            }
        }
        calls.sort_by_key(|(index, _)| *index);

        let stop_reason = self.stop_reason.take().unwrap_or(StopReason::End);
        out.push(Normalized::Marker("\n[Message Complete]\n".to_string()));
        out.push(Normalized::Turn(TurnResult {
            message: Message::assistant(content),
            stop_reason,
            text: std::mem::take(&mut self.text),
            tool_calls: calls.into_iter().map(|(_, call)| call).collect(),
        }));
        out
    }
}

fn parse_deferred(raw: &str) -> ToolArguments {
    if raw.trim().is_empty() {
        return ToolArguments::Json(json!({}));
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => ToolArguments::Json(value),
        Err(e) => ToolArguments::Malformed { raw: raw.to_string(), error: e.to_string() },
    }
}

/// Normalizes one streaming pass.
///
/// Text and markers are yielded as they arrive. When the provider's terminal
/// event is reached the assistant message is appended to `history` and the
/// [`TurnResult`] is yielded last. A stream that fails, or ends without a
/// terminal event, yields a `Transport` error and no turn.
pub fn normalize<'a>(
    events: EventStream,
    history: &'a mut Vec<Message>,
    policy: ArgumentPolicy,
) -> impl Stream<Item = Result<Normalized, SessionError>> + Send + 'a {
    try_stream! {
        let mut events = events;
        let mut acc = TurnAccumulator::new(policy);

        while !acc.is_finished() {
            let event = match events.next().await {
                Some(event) => event?,
                None => break,
            };
            for item in acc.apply(event) {
                if let Normalized::Turn(turn) = &item {
                    history.push(turn.message.clone());
                }
                yield item;
            }
        }

        if !acc.is_finished() {
            Err::<(), SessionError>(SessionError::Transport(
                "provider stream ended before the message was complete".to_string(),
            ))?;
        }
    }
}
