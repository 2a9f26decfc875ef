//! A scripted provider for tests.
//!
//! Each call to [`ChatProvider::open_stream`] pops the next [`Script`] and
//! replays it; every request is recorded for later inspection.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use augmented_core::{ProviderKind, SessionError, StopReason, StreamEvent};
use futures::stream;

use crate::{ChatProvider, EventStream, StreamRequest};

/// What one `open_stream` call does.
#[derive(Debug, Clone)]
pub enum Script {
    /// Replay these events, then end the stream.
    Events(Vec<StreamEvent>),
    /// Replay these events, then fail with a transport error.
    FailAfter(Vec<StreamEvent>, String),
    /// Fail before any event is produced.
    OpenError(String),
}

pub struct ScriptedProvider {
    kind: ProviderKind,
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<StreamRequest>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self { kind, scripts: Mutex::new(VecDeque::new()), requests: Mutex::new(Vec::new()) }
    }

    pub fn with_script(self, script: Script) -> Self {
        self.push(script);
        self
    }

    /// Queues a script of plain events.
    pub fn with_events(self, events: Vec<StreamEvent>) -> Self {
        self.with_script(Script::Events(events))
    }

    pub fn push(&self, script: Script) {
        locked(&self.scripts).push_back(script);
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<StreamRequest> {
        locked(&self.requests).clone()
    }

    /// Scripts not yet consumed.
    pub fn remaining(&self) -> usize {
        locked(&self.scripts).len()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn open_stream(&self, request: StreamRequest) -> Result<EventStream, SessionError> {
        locked(&self.requests).push(request);
        let script = locked(&self.scripts).pop_front();
        match script {
            Some(Script::Events(events)) => Ok(Box::pin(stream::iter(events.into_iter().map(Ok)))),
            Some(Script::FailAfter(events, message)) => {
                let items = events.into_iter().map(Ok).chain(std::iter::once(Err(SessionError::Transport(message))));
                Ok(Box::pin(stream::iter(items)))
            }
            Some(Script::OpenError(message)) => Err(SessionError::Transport(message)),
            None => Err(SessionError::Transport("no scripted response left".to_string())),
        }
    }
}

// === Event builders ===

/// A complete text-only turn.
pub fn text_turn(text: &str) -> Vec<StreamEvent> {
    vec![
        StreamEvent::MessageStart,
        StreamEvent::text_start(0),
        StreamEvent::text_delta(0, text),
        StreamEvent::BlockStop { index: 0 },
        StreamEvent::stop_reason(StopReason::End),
        StreamEvent::MessageStop,
    ]
}

/// A turn with optional preamble text followed by tool calls.
///
/// Calls are `(id, name, raw_arguments)` and occupy block indices 1.. in order.
pub fn tool_turn(preamble: &str, calls: &[(&str, &str, &str)]) -> Vec<StreamEvent> {
    let mut events = vec![StreamEvent::MessageStart];
    if !preamble.is_empty() {
        events.push(StreamEvent::text_start(0));
        events.push(StreamEvent::text_delta(0, preamble));
        events.push(StreamEvent::BlockStop { index: 0 });
    }
    for (offset, (id, name, arguments)) in calls.iter().enumerate() {
        let index = offset + 1;
        events.push(StreamEvent::tool_start(index, *id, *name));
        events.push(StreamEvent::json_delta(index, *arguments));
        events.push(StreamEvent::BlockStop { index });
    }
    events.push(StreamEvent::stop_reason(StopReason::ToolUse));
    events.push(StreamEvent::MessageStop);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use augmented_core::{Message, ReasoningEffort};
    use futures::StreamExt;

    fn request() -> StreamRequest {
        StreamRequest {
            model: "claude-3-5-sonnet-20241022".into(),
            system_prompt: String::new(),
            messages: vec![Message::user("hi")],
            tools: Vec::new(),
            temperature: 1.0,
            max_tokens: 8192,
            reasoning_effort: ReasoningEffort::Medium,
        }
    }

    #[tokio::test]
    async fn test_replays_scripts_in_order() {
        let provider = ScriptedProvider::new(ProviderKind::Anthropic)
            .with_events(text_turn("first"))
            .with_script(Script::OpenError("boom".into()));

        let events: Vec<_> = provider.open_stream(request()).await.unwrap().collect().await;
        assert_eq!(events.len(), 6);
        assert!(matches!(provider.open_stream(request()).await, Err(SessionError::Transport(m)) if m == "boom"));
        assert!(provider.open_stream(request()).await.is_err());
        assert_eq!(provider.requests().len(), 3);
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn test_fail_after_ends_with_error() {
        let provider = ScriptedProvider::new(ProviderKind::OpenAi)
            .with_script(Script::FailAfter(vec![StreamEvent::MessageStart], "reset".into()));
        let items: Vec<_> = provider.open_stream(request()).await.unwrap().collect().await;
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(SessionError::Transport(_))));
    }
}
