//! Best-effort diagnostic records written under the session's log directory.
//!
//! Every writer here swallows its own failures: a record that cannot be
//! persisted is reported with `warn!` and the caller gets `None`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use augmented_core::{Message, ProviderKind};
use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

/// Conversation state captured alongside a tool failure.
#[derive(Debug, Clone, Serialize)]
pub struct FailureContext {
    pub model_name: String,
    pub debug_mode: bool,
    pub messages: Vec<Message>,
    pub tools_registered: Vec<String>,
}

/// A tool invocation that raised.
#[derive(Debug, Clone)]
pub struct ToolFailure {
    pub tool_name: String,
    pub tool_input: Value,
    /// Error class, e.g. `ToolFailed` or `InvalidArguments`.
    pub kind: String,
    pub message: String,
    pub provider: ProviderKind,
    pub context: FailureContext,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    kind: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct ErrorRecord<'a> {
    timestamp: String,
    tool_name: &'a str,
    tool_input: &'a Value,
    error: ErrorDetail<'a>,
    provider: ProviderKind,
    context: &'a FailureContext,
}

#[derive(Serialize)]
struct TranscriptRecord<'a> {
    model: &'a str,
    provider: ProviderKind,
    system_prompt: &'a str,
    messages: &'a [Message],
}

#[derive(Serialize)]
struct ToolsRecord<'a> {
    model: &'a str,
    provider: ProviderKind,
    registered_tools: &'a [Value],
    total_tools: usize,
}

fn file_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string().chars().take(8).collect()
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn write_json<T: Serialize>(dir: &Path, filename: &str, record: &T) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    let body = serde_json::to_vec_pretty(record)?;
    fs::write(&path, body)?;
    Ok(path)
}

fn settle(what: &str, result: io::Result<PathBuf>) -> Option<PathBuf> {
    match result {
        Ok(path) => {
            info!("{} written to {}", what, path.display());
            Some(path)
        }
        Err(e) => {
            warn!("Could not write {}: {}", what.to_lowercase(), e);
            None
        }
    }
}

/// Tool failure records under `<log_dir>/tool_errors/`.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    dir: PathBuf,
}

impl ErrorLog {
    pub fn new(log_dir: &Path) -> Self {
        Self { dir: log_dir.join("tool_errors") }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists one failure; `None` if it could not be written.
    pub fn log_error(&self, failure: &ToolFailure) -> Option<PathBuf> {
        let record = ErrorRecord {
            timestamp: Local::now().to_rfc3339(),
            tool_name: &failure.tool_name,
            tool_input: &failure.tool_input,
            error: ErrorDetail { kind: &failure.kind, message: &failure.message },
            provider: failure.provider,
            context: &failure.context,
        };
        let filename = format!("{}_{}_{}_error.json", file_stamp(), file_safe(&failure.tool_name), short_id());
        settle("Tool error log", write_json(&self.dir, &filename, &record))
    }
}

/// Conversation transcripts under `<log_dir>/messages/`.
#[derive(Debug, Clone)]
pub struct TranscriptLog {
    dir: PathBuf,
}

impl TranscriptLog {
    pub fn new(log_dir: &Path) -> Self {
        Self { dir: log_dir.join("messages") }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(
        &self,
        model: &str,
        provider: ProviderKind,
        system_prompt: &str,
        messages: &[Message],
    ) -> Option<PathBuf> {
        let record = TranscriptRecord { model, provider, system_prompt, messages };
        let filename = format!("debug_messages_{}_{}.json", file_stamp(), short_id());
        settle("Transcript", write_json(&self.dir, &filename, &record))
    }
}

/// Registered tool declarations under `<log_dir>/tools/`.
#[derive(Debug, Clone)]
pub struct ToolsLog {
    dir: PathBuf,
}

impl ToolsLog {
    pub fn new(log_dir: &Path) -> Self {
        Self { dir: log_dir.join("tools") }
    }

    pub fn write(&self, model: &str, provider: ProviderKind, tools: &[Value]) -> Option<PathBuf> {
        let record = ToolsRecord { model, provider, registered_tools: tools, total_tools: tools.len() };
        let filename = format!("tools_config_{}_{}.json", file_stamp(), short_id());
        settle("Tools configuration", write_json(&self.dir, &filename, &record))
    }
}
