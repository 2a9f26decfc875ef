//! The conversation orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use async_stream::try_stream;
use augmented_config::SessionConfig;
use augmented_core::{Message, ProviderKind, Role, SessionError, ToolArguments, ToolDeclaration, TurnResult};
use augmented_ledger::{TokenCounter, TokenLedger};
use augmented_llm::{connect, normalize, ChatProvider, Normalized, StreamRequest};
use augmented_tools::{Tool, ToolError, ToolHandler, ToolRegistry};
use futures::{Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::diagnostics::{ErrorLog, FailureContext, ToolFailure, ToolsLog, TranscriptLog};

const CONTINUING: &str = "\n[Continuing conversation with tool result...]\n";

/// One conversation with one provider.
///
/// Owns the history, the tool registry and the token ledger. One
/// [`Session::generate`] call may be in flight at a time, which the
/// `&mut self` receiver enforces.
pub struct Session {
    config: SessionConfig,
    provider: Arc<dyn ChatProvider>,
    system_prompt: String,
    tools: ToolRegistry,
    history: Vec<Message>,
    ledger: TokenLedger,
    errors: ErrorLog,
    transcripts: TranscriptLog,
    tool_configs: ToolsLog,
}

impl Session {
    /// Validates `config` and connects to its provider.
    ///
    /// Fails with `InvalidConfiguration` when the provider's key is missing
    /// or a setting is out of range.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let provider = connect(config.provider, config.api_key().unwrap_or_default(), config.api_base());
        Ok(Self::assemble(config, provider))
    }

    /// Uses an already constructed provider. Credentials are not checked.
    pub fn with_provider(config: SessionConfig, provider: Arc<dyn ChatProvider>) -> Result<Self, SessionError> {
        config.validate_settings()?;
        if provider.kind() != config.provider {
            return Err(SessionError::InvalidConfiguration(format!(
                "provider mismatch: config selects {}, client speaks {}",
                config.provider,
                provider.kind()
            )));
        }
        Ok(Self::assemble(config, provider))
    }

    fn assemble(config: SessionConfig, provider: Arc<dyn ChatProvider>) -> Self {
        let system_prompt = config.compose_system_prompt();
        let mut ledger = TokenLedger::new(config.model());
        ledger.log(Role::System, &system_prompt, false);

        info!("╔══════════════════════════════════════════════════════════════");
        info!("║ SESSION: {} ({})", config.model(), config.provider);
        info!("║ Max tokens: {}, temperature: {}", config.max_tokens(), config.temperature);
        info!("║ Max turns per generate: {}", config.max_turns);
        info!("╚══════════════════════════════════════════════════════════════");

        Self {
            tools: ToolRegistry::new(config.provider),
            errors: ErrorLog::new(&config.log_dir),
            transcripts: TranscriptLog::new(&config.log_dir),
            tool_configs: ToolsLog::new(&config.log_dir),
            history: Vec::new(),
            system_prompt,
            ledger,
            provider,
            config,
        }
    }

    /// Replaces the token oracle. The ledger restarts from the system prompt.
    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.ledger = TokenLedger::with_counter(self.config.model(), counter);
        self.ledger.log(Role::System, &self.system_prompt, false);
        self
    }

    // ========================================================================
    // Tools
    // ========================================================================

    /// Registers a tool. A repeated name replaces the earlier registration.
    pub fn register<H: ToolHandler + 'static>(&mut self, declaration: ToolDeclaration, handler: H) {
        self.tools.register(declaration, handler);
    }

    pub fn register_tool<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.register_tool(tool);
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Runs a registered tool.
    ///
    /// Never fails: unknown tools and handler errors come back as descriptive
    /// text, and handler errors are also recorded in the error log.
    pub async fn execute_tool(&mut self, name: &str, input: &Value) -> String {
        match self.tools.try_execute(name, input).await {
            Ok(output) => {
                self.ledger.log(Role::Tool, &output, true);
                debug!("Tool '{}' returned: {}", name, output);
                output
            }
            Err(err @ ToolError::NotFound(_)) => {
                warn!("║     ⚠ {}", err);
                err.to_string()
            }
            Err(err) => {
                warn!("║     ⚠ {}", err);
                self.errors.log_error(&ToolFailure {
                    tool_name: name.to_string(),
                    tool_input: input.clone(),
                    kind: err.kind().to_string(),
                    message: err.message(),
                    provider: self.config.provider,
                    context: FailureContext {
                        model_name: self.config.model().to_string(),
                        debug_mode: self.config.debug.tools,
                        messages: self.history.clone(),
                        tools_registered: self.tools.names(),
                    },
                });
                err.to_string()
            }
        }
    }

    /// Persists the provider-specific tool declarations.
    pub fn log_tools(&self) -> Option<PathBuf> {
        self.tool_configs
            .write(self.config.model(), self.config.provider, self.tools.wire_declarations())
    }

    // ========================================================================
    // Conversation
    // ========================================================================

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Forgets the conversation and restarts token accounting.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.ledger.reset();
        self.ledger.log(Role::System, &self.system_prompt, false);
    }

    pub fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.config.provider
    }

    /// The composed system prompt sent with every request.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn stream_request(&self) -> StreamRequest {
        StreamRequest {
            model: self.config.model().to_string(),
            system_prompt: self.system_prompt.clone(),
            messages: self.history.clone(),
            tools: self.tools.wire_declarations().to_vec(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens(),
            reasoning_effort: self.config.reasoning_effort,
        }
    }

    /// Sends `text` and streams the reply.
    ///
    /// Tool requests are executed and fed back until the model stops asking
    /// for tools. Ledger and transcript diagnostics are flushed when the pass
    /// ends, whether it succeeded or failed. Dropping the stream early skips
    /// them.
    pub fn generate<'a>(&'a mut self, text: &str) -> impl Stream<Item = Result<String, SessionError>> + Send + 'a {
        let text = text.to_string();
        try_stream! {
            if self.config.debug.settings {
                let settings = self.provider.describe_request(&self.stream_request());
                info!("║ Request settings: {}", serde_json::to_string_pretty(&settings).unwrap_or_default());
            }

            let mut failure = None;
            {
                let passes = self.run(text);
                futures::pin_mut!(passes);
                while let Some(item) = passes.next().await {
                    match item {
                        Ok(chunk) => yield chunk,
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
            }
            self.flush_diagnostics();

            if let Some(e) = failure {
                Err::<(), SessionError>(e)?;
            }
        }
    }

    fn run(&mut self, text: String) -> impl Stream<Item = Result<String, SessionError>> + Send + '_ {
        try_stream! {
            let trace = self.config.debug.tools;
            let policy = self.config.provider.argument_policy();
            let dispatch = self.config.provider.dispatch_policy();
            let max_turns = self.config.max_turns;

            self.ledger.log(Role::User, &text, false);
            self.history.push(Message::user(text));

            let mut turns = 0;
            loop {
                if turns >= max_turns {
                    warn!("║ ⚠ Max turns ({}) reached", max_turns);
                    Err::<(), SessionError>(SessionError::TurnLimit(max_turns))?;
                }
                turns += 1;

                info!("╠──────────────────────────────────────────────────────────────");
                info!("║ [{}] STREAM: {} messages in history", turns, self.history.len());
                let events = self.provider.open_stream(self.stream_request()).await?;

                let mut finished: Option<TurnResult> = None;
                {
                    let pass = normalize(events, &mut self.history, policy);
                    futures::pin_mut!(pass);
                    while let Some(item) = pass.next().await {
                        match item? {
                            Normalized::Text(chunk) => yield chunk,
                            Normalized::Marker(marker) if trace => debug!("{}", marker.trim()),
                            Normalized::Marker(marker) => yield marker,
                            Normalized::Turn(turn) => finished = Some(turn),
                        }
                    }
                }
                let turn = match finished {
                    Some(turn) => turn,
                    None => Err::<TurnResult, SessionError>(SessionError::Transport("stream produced no turn".to_string()))?,
                };

                if !turn.text.is_empty() {
                    self.ledger.log(Role::Assistant, &turn.text, false);
                }
                info!("║     ← {} chars, stop reason: {}", turn.text.len(), turn.stop_reason);
                if !turn.requests_tools() {
                    break;
                }

                let calls = dispatch.select(&turn.tool_calls).to_vec();
                if calls.is_empty() {
                    warn!("║     ⚠ Tool use requested without a tool call");
                    break;
                }
                for call in calls {
                    match call.arguments {
                        ToolArguments::Json(input) => {
                            info!("║     → Executing tool: {}", call.name);
                            let output = self.execute_tool(&call.name, &input).await;
                            info!("║     ← Tool result: {} chars", output.len());
                            self.history.push(Message::tool_result(call.id, output.clone()));
                            if trace {
                                debug!("Tool result: {}", output);
                            } else {
                                yield format!("\n[Tool Result]\n{}\n", output);
                            }
                        }
                        ToolArguments::Malformed { error, .. } => {
                            let message = format!("Error parsing tool arguments: {}", error);
                            warn!(
                                "║     ⚠ {}",
                                SessionError::MalformedToolArguments { tool: call.name.clone(), message: error }
                            );
                            self.history.push(Message::tool_result(call.id, message.clone()));
                            yield format!("\n[Error] {}\n", message);
                        }
                    }
                }

                if !trace {
                    yield CONTINUING.to_string();
                }
            }
        }
    }

    fn flush_diagnostics(&self) {
        if self.config.debug.tokens {
            self.ledger.log_summary();
        }
        if self.config.debug.messages {
            self.transcripts.write(
                self.config.model(),
                self.config.provider,
                &self.system_prompt,
                &self.history,
            );
        }
    }
}
