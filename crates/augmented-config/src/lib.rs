//! Session configuration schema, credentials and validation.
//!
//! This crate defines how an augmented session is configured:
//!
//! - [`SessionConfig`]: provider, model, sampling and debug settings
//! - [`SessionConfigBuilder`]: fluent API for building a config in code
//! - [`DebugFlags`]: independent tracing, token, settings and transcript toggles
//! - [`Credentials`]: API keys, supplied explicitly and never serialized
//!
//! # Loading from JSON
//!
//! ```rust,ignore
//! use augmented_config::{Credentials, SessionConfig};
//!
//! let config = SessionConfig::from_file("session.json")?.with_credentials(Credentials::from_env());
//! config.validate()?;
//! ```
//!
//! # Builder API
//!
//! ```rust
//! use augmented_config::{Credentials, SessionConfig};
//! use augmented_core::ProviderKind;
//!
//! let config = SessionConfig::builder(ProviderKind::Anthropic)
//!     .system_prompt("You are a careful calculator.")
//!     .temperature(0.2)
//!     .debug_tools(true)
//!     .credentials(Credentials::default().with_anthropic_key("sk-ant-test"))
//!     .build();
//!
//! assert_eq!(config.model(), "claude-3-5-sonnet-20241022");
//! assert_eq!(config.max_tokens(), 8192);
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use augmented_core::{ProviderKind, ReasoningEffort, SelectorError, SessionError};
use serde::{Deserialize, Serialize};

const DEFAULT_TEMPERATURE: f32 = 1.0;
const DEFAULT_MAX_TURNS: usize = 32;

const REACT_PREAMBLE: &str = r#"
You are a highly capable and thoughtful assistant that employs a ReAct (Reasoning and Acting) strategy. For every query, follow this iterative process:

1. **Initial Reasoning:** Start by writing a detailed chain-of-thought enclosed within <thinking> and </thinking> tags. Include your initial reasoning, hypotheses, and any uncertainties.
2. **Tool Invocation:** If further information, a computation, or an external lookup is required, call the appropriate tool and wait for its result.
3. **Iterative Refinement:** Once you receive the tool's output, update your chain-of-thought inside a new <thinking>...</thinking> block that integrates the result. Keep refining and calling tools as needed until you have considered the problem thoroughly.
4. **Final Answer:** When you are confident the query is fully addressed, provide your answer clearly labeled as FINAL ANSWER.
5. **Transparency:** Include your reasoning steps (the <thinking> blocks, tool invocations and their results) along with the final answer so the user can follow your thought process.

Use this structured approach for complex queries. Your specific role follows:
"#;

/// Errors that can occur when loading or validating a configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse JSON configuration.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The selected provider has no API key.
    #[error("{variable} not found for provider '{provider}'")]
    MissingCredential { provider: ProviderKind, variable: &'static str },

    #[error("Unknown provider: '{0}'")]
    UnknownProvider(String),

    #[error("reasoning_effort must be one of 'low', 'medium', 'high' (got '{0}')")]
    InvalidReasoningEffort(String),

    /// A setting is out of range.
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<SelectorError> for ConfigError {
    fn from(err: SelectorError) -> Self {
        match err {
            SelectorError::UnknownProvider(name) => ConfigError::UnknownProvider(name),
            SelectorError::InvalidReasoningEffort(value) => ConfigError::InvalidReasoningEffort(value),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        SessionError::InvalidConfiguration(err.to_string())
    }
}

/// Parses a provider selector, e.g. from a command-line flag.
pub fn parse_provider(value: &str) -> Result<ProviderKind, ConfigError> {
    Ok(value.parse::<ProviderKind>()?)
}

/// Parses a reasoning-effort hint.
pub fn parse_reasoning_effort(value: &str) -> Result<ReasoningEffort, ConfigError> {
    Ok(value.parse::<ReasoningEffort>()?)
}

/// Independent debug toggles.
///
/// | Flag | Effect |
/// |------|--------|
/// | `tools` | stream markers and tool traces go to the log instead of the output |
/// | `tokens` | the token ledger summary is logged after every `generate` |
/// | `settings` | request parameters are logged before every `generate` |
/// | `messages` | the full transcript is persisted after every `generate` |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugFlags {
    pub tools: bool,
    pub tokens: bool,
    pub settings: bool,
    pub messages: bool,
}

/// Provider API credentials.
///
/// Core code never reads the environment; the binary builds these with
/// [`Credentials::from_env`] and hands them to the config.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Alternative OpenAI-compatible endpoint.
    pub openai_api_base: Option<String>,
}

impl Credentials {
    /// Reads `ANTHROPIC_API_KEY`, `OPENAI_API_KEY` and `OPENAI_API_BASE`.
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            anthropic_api_key: read("ANTHROPIC_API_KEY"),
            openai_api_key: read("OPENAI_API_KEY"),
            openai_api_base: read("OPENAI_API_BASE"),
        }
    }

    pub fn with_anthropic_key(mut self, key: impl Into<String>) -> Self {
        self.anthropic_api_key = Some(key.into());
        self
    }

    pub fn with_openai_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    pub fn with_openai_base(mut self, base: impl Into<String>) -> Self {
        self.openai_api_base = Some(base.into());
        self
    }

    pub fn api_key(&self, provider: ProviderKind) -> Option<&str> {
        match provider {
            ProviderKind::Anthropic => self.anthropic_api_key.as_deref(),
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
        }
    }

    pub fn api_base(&self, provider: ProviderKind) -> Option<&str> {
        match provider {
            ProviderKind::Anthropic => None,
            ProviderKind::OpenAi => self.openai_api_base.as_deref(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |key: &Option<String>| key.as_ref().map(|k| format!("<{} chars>", k.len()));
        f.debug_struct("Credentials")
            .field("anthropic_api_key", &mask(&self.anthropic_api_key))
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("openai_api_base", &self.openai_api_base)
            .finish()
    }
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// Complete configuration of one conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub provider: ProviderKind,
    /// Model name; `None` selects the provider default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Output token cap; `None` selects the provider default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub system_prompt: String,
    /// Prepend the ReAct reasoning preamble to the system prompt.
    #[serde(default)]
    pub use_react: bool,
    /// Only sent to reasoning-class models.
    #[serde(default)]
    pub reasoning_effort: ReasoningEffort,
    /// Maximum streams opened by one `generate` call.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    #[serde(default)]
    pub debug: DebugFlags,
    /// Root of `tool_errors/`, `messages/` and `tools/`.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(skip)]
    pub credentials: Credentials,
}

impl SessionConfig {
    /// Creates a new builder for the given provider.
    pub fn builder(provider: ProviderKind) -> SessionConfigBuilder {
        SessionConfigBuilder::new(provider)
    }

    /// Loads a config from a JSON file. Credentials are never read from it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or_else(|| self.provider.default_model())
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or_else(|| self.provider.default_max_tokens())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.credentials.api_key(self.provider)
    }

    pub fn api_base(&self) -> Option<&str> {
        self.credentials.api_base(self.provider)
    }

    /// Checks ranges and that the selected provider has an API key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_settings()?;
        if self.api_key().map_or(true, |k| k.trim().is_empty()) {
            return Err(ConfigError::MissingCredential {
                provider: self.provider,
                variable: self.provider.credential_variable(),
            });
        }
        Ok(())
    }

    /// Checks every setting except credentials.
    pub fn validate_settings(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::validation(format!(
                "temperature must lie in 0.0..=2.0 (got {})",
                self.temperature
            )));
        }
        if self.max_tokens() == 0 {
            return Err(ConfigError::validation("max_tokens must be greater than 0"));
        }
        if self.max_turns == 0 {
            return Err(ConfigError::validation("max_turns must be at least 1"));
        }
        if self.model().trim().is_empty() {
            return Err(ConfigError::validation("model must not be empty"));
        }
        Ok(())
    }

    /// The system prompt actually sent: preamble, prompt, current local time.
    pub fn compose_system_prompt(&self) -> String {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.compose_system_prompt_at(&now)
    }

    pub fn compose_system_prompt_at(&self, timestamp: &str) -> String {
        let preamble = if self.use_react { REACT_PREAMBLE } else { "" };
        format!("{}{}\nCurrent Date and Time: {}\n", preamble, self.system_prompt, timestamp)
    }
}

// ============================================================================
// Builder API
// ============================================================================

/// Fluent builder for [`SessionConfig`].
#[derive(Debug)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    fn new(provider: ProviderKind) -> Self {
        Self {
            config: SessionConfig {
                provider,
                model: None,
                temperature: DEFAULT_TEMPERATURE,
                max_tokens: None,
                system_prompt: String::new(),
                use_react: false,
                reasoning_effort: ReasoningEffort::default(),
                max_turns: DEFAULT_MAX_TURNS,
                debug: DebugFlags::default(),
                log_dir: default_log_dir(),
                credentials: Credentials::default(),
            },
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn use_react(mut self, enabled: bool) -> Self {
        self.config.use_react = enabled;
        self
    }

    pub fn reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.config.reasoning_effort = effort;
        self
    }

    pub fn max_turns(mut self, max_turns: usize) -> Self {
        self.config.max_turns = max_turns;
        self
    }

    pub fn debug(mut self, flags: DebugFlags) -> Self {
        self.config.debug = flags;
        self
    }

    pub fn debug_tools(mut self, enabled: bool) -> Self {
        self.config.debug.tools = enabled;
        self
    }

    pub fn debug_tokens(mut self, enabled: bool) -> Self {
        self.config.debug.tokens = enabled;
        self
    }

    pub fn debug_settings(mut self, enabled: bool) -> Self {
        self.config.debug.settings = enabled;
        self
    }

    pub fn debug_messages(mut self, enabled: bool) -> Self {
        self.config.debug.messages = enabled;
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.log_dir = dir.into();
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = credentials;
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn openai_keys() -> Credentials {
        Credentials::default().with_openai_key("sk-test")
    }

    #[test]
    fn test_provider_defaults() {
        let anthropic = SessionConfig::builder(ProviderKind::Anthropic).build();
        assert_eq!(anthropic.model(), "claude-3-5-sonnet-20241022");
        assert_eq!(anthropic.max_tokens(), 8192);

        let openai = SessionConfig::builder(ProviderKind::OpenAi).build();
        assert_eq!(openai.model(), "gpt-4");
        assert_eq!(openai.max_tokens(), 4096);
        assert_eq!(openai.temperature, 1.0);
        assert_eq!(openai.max_turns, 32);
        assert_eq!(openai.reasoning_effort, ReasoningEffort::Medium);
        assert_eq!(openai.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn test_missing_credential_is_rejected() {
        let config = SessionConfig::builder(ProviderKind::Anthropic)
            .credentials(openai_keys())
            .build();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredential { provider: ProviderKind::Anthropic, variable: "ANTHROPIC_API_KEY" }
        ));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
        assert!(config.validate_settings().is_ok());
    }

    #[test]
    fn test_range_validation() {
        let hot = SessionConfig::builder(ProviderKind::OpenAi)
            .temperature(2.5)
            .credentials(openai_keys())
            .build();
        assert!(matches!(hot.validate(), Err(ConfigError::Validation(_))));

        let zero_turns = SessionConfig::builder(ProviderKind::OpenAi)
            .max_turns(0)
            .credentials(openai_keys())
            .build();
        assert!(matches!(zero_turns.validate(), Err(ConfigError::Validation(_))));

        let zero_tokens = SessionConfig::builder(ProviderKind::OpenAi)
            .max_tokens(0)
            .credentials(openai_keys())
            .build();
        assert!(matches!(zero_tokens.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let config = SessionConfig::from_json(
            r#"{"provider": "openai", "model": "o3-mini", "reasoning_effort": "high", "debug": {"tokens": true}}"#,
        )
        .unwrap();
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.model(), "o3-mini");
        assert_eq!(config.reasoning_effort, ReasoningEffort::High);
        assert!(config.debug.tokens);
        assert!(!config.debug.tools);
        assert_eq!(config.max_turns, 32);
        assert!(config.credentials.openai_api_key.is_none());
    }

    #[test]
    fn test_from_json_rejects_unknown_provider_and_effort() {
        let err = SessionConfig::from_json(r#"{"provider": "cohere"}"#).unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));

        assert!(SessionConfig::from_json(r#"{"provider": "openai", "reasoning_effort": "max"}"#).is_err());
    }

    #[test]
    fn test_selector_helpers() {
        assert_eq!(parse_provider("Anthropic").unwrap(), ProviderKind::Anthropic);
        assert!(matches!(parse_provider("bard"), Err(ConfigError::UnknownProvider(p)) if p == "bard"));
        assert!(matches!(
            parse_reasoning_effort("extreme"),
            Err(ConfigError::InvalidReasoningEffort(v)) if v == "extreme"
        ));
    }

    #[test]
    fn test_credentials_never_serialized() {
        let config = SessionConfig::builder(ProviderKind::OpenAi)
            .credentials(openai_keys())
            .build();
        let json = config.to_json().unwrap();
        assert!(!json.contains("sk-test"));
        assert!(!format!("{:?}", config.credentials).contains("sk-test"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"provider": "anthropic", "temperature": 0.3, "max_turns": 4}}"#).unwrap();

        let config = SessionConfig::from_file(file.path()).unwrap();
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.max_turns, 4);

        let missing = SessionConfig::from_file("/nonexistent/session.json").unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn test_compose_system_prompt() {
        let plain = SessionConfig::builder(ProviderKind::OpenAi)
            .system_prompt("Be brief.")
            .build();
        assert_eq!(
            plain.compose_system_prompt_at("2025-01-01 09:30:00"),
            "Be brief.\nCurrent Date and Time: 2025-01-01 09:30:00\n"
        );

        let react = SessionConfig::builder(ProviderKind::OpenAi)
            .system_prompt("Be brief.")
            .use_react(true)
            .build();
        let prompt = react.compose_system_prompt_at("2025-01-01 09:30:00");
        assert!(prompt.contains("ReAct"));
        assert!(prompt.contains("FINAL ANSWER"));
        assert!(prompt.ends_with("Be brief.\nCurrent Date and Time: 2025-01-01 09:30:00\n"));
    }
}
