//! Tool registry and provider schema adapter for augmented sessions.
//!
//! This crate provides the tool abstraction for LLM function calling:
//!
//! - [`ToolHandler`]: executable side of a tool, fed named arguments
//! - [`Tool`]: a handler that also describes itself
//! - [`ToolRegistry`]: declarations converted for one provider, plus handlers
//! - [`wire_declaration`]: the provider schema adapter
//!
//! # Registering a closure
//!
//! ```rust
//! use augmented_core::{FieldSpec, ProviderKind, ToolDeclaration};
//! use augmented_tools::{handler_fn, required_arg, ToolRegistry};
//!
//! let mut registry = ToolRegistry::new(ProviderKind::Anthropic);
//! registry.register(
//!     ToolDeclaration::new("add", "Add two integers")
//!         .field("a", FieldSpec::required("integer"))
//!         .field("b", FieldSpec::required("integer")),
//!     handler_fn(|args| {
//!         let a: i64 = required_arg(&args, "a")?;
//!         let b: i64 = required_arg(&args, "b")?;
//!         Ok((a + b).to_string())
//!     }),
//! );
//!
//! assert_eq!(registry.names(), vec!["add"]);
//! assert_eq!(registry.wire_declarations()[0]["input_schema"]["required"][0], "a");
//! ```
//!
//! # Implementing a Tool
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use augmented_core::ToolDeclaration;
//! use augmented_tools::{Tool, ToolArgs, ToolError, ToolHandler};
//!
//! struct Clock;
//!
//! #[async_trait]
//! impl ToolHandler for Clock {
//!     async fn call(&self, _args: ToolArgs) -> Result<String, ToolError> {
//!         Ok("12:00".to_string())
//!     }
//! }
//!
//! impl Tool for Clock {
//!     fn declaration(&self) -> ToolDeclaration {
//!         ToolDeclaration::new("current_time", "Returns the current time")
//!     }
//! }
//! ```

mod schema;

pub use schema::{anthropic_tool, openai_tool, wire_declaration};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use augmented_core::{ProviderKind, ToolDeclaration};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Named arguments passed to a handler.
pub type ToolArgs = Map<String, Value>;

/// Errors that can occur during tool lookup or execution.
///
/// These never cross [`ToolRegistry::execute`]; they are rendered to text
/// and handed back to the model as the tool result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// Requested tool was not found in the registry.
    #[error("Tool '{0}' not found in registry")]
    NotFound(String),

    /// Invalid arguments were passed to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Raised by a handler.
    #[error("{0}")]
    Failed(String),

    /// A handler failure, wrapped by the registry with the tool name.
    #[error("Error executing tool {tool}: {message}")]
    Execution { tool: String, kind: String, message: String },
}

impl ToolError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Short error class name, recorded in diagnostics.
    pub fn kind(&self) -> &str {
        match self {
            ToolError::NotFound(_) => "ToolNotFound",
            ToolError::InvalidArguments(_) => "InvalidArguments",
            ToolError::Failed(_) => "ToolFailed",
            ToolError::Execution { kind, .. } => kind,
        }
    }

    /// The message without the registry's wrapping.
    pub fn message(&self) -> String {
        match self {
            ToolError::Execution { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Executable side of a tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Runs the tool. The returned text becomes the tool result content.
    async fn call(&self, args: ToolArgs) -> Result<String, ToolError>;
}

/// A handler that knows its own declaration.
pub trait Tool: ToolHandler {
    fn declaration(&self) -> ToolDeclaration;
}

/// Adapts a synchronous closure into a [`ToolHandler`].
pub struct FnHandler<F>(F);

/// Wraps `f` as a [`ToolHandler`].
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(ToolArgs) -> Result<String, ToolError> + Send + Sync,
{
    FnHandler(f)
}

#[async_trait]
impl<F> ToolHandler for FnHandler<F>
where
    F: Fn(ToolArgs) -> Result<String, ToolError> + Send + Sync,
{
    async fn call(&self, args: ToolArgs) -> Result<String, ToolError> {
        (self.0)(args)
    }
}

/// Reads and deserializes a required argument.
pub fn required_arg<T: DeserializeOwned>(args: &ToolArgs, name: &str) -> Result<T, ToolError> {
    let value = args
        .get(name)
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing required argument '{}'", name)))?;
    serde_json::from_value(value.clone())
        .map_err(|e| ToolError::InvalidArguments(format!("argument '{}': {}", name, e)))
}

/// Reads an optional argument; `null` counts as absent.
pub fn optional_arg<T: DeserializeOwned>(args: &ToolArgs, name: &str) -> Result<Option<T>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| ToolError::InvalidArguments(format!("argument '{}': {}", name, e))),
    }
}

/// Registry of tools available to one session.
///
/// Declarations are converted to the session provider's wire schema at
/// registration time. Names are unique: registering an existing name
/// replaces both its declaration (in place) and its handler.
pub struct ToolRegistry {
    provider: ProviderKind,
    declarations: Vec<ToolDeclaration>,
    wire: Vec<Value>,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Creates an empty registry emitting schemas for `provider`.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            declarations: Vec::new(),
            wire: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Registers a declaration with its handler. Last registration wins.
    pub fn register<H: ToolHandler + 'static>(&mut self, declaration: ToolDeclaration, handler: H) {
        self.register_arc(declaration, Arc::new(handler));
    }

    /// Registers a self-describing tool.
    pub fn register_tool<T: Tool + 'static>(&mut self, tool: T) {
        let declaration = tool.declaration();
        self.register_arc(declaration, Arc::new(tool));
    }

    fn register_arc(&mut self, declaration: ToolDeclaration, handler: Arc<dyn ToolHandler>) {
        let wire = wire_declaration(&declaration, self.provider);
        let name = declaration.name.clone();

        match self.declarations.iter().position(|d| d.name == name) {
            Some(pos) => {
                warn!("Tool '{}' registered twice; replacing previous declaration", name);
                self.declarations[pos] = declaration;
                self.wire[pos] = wire;
            }
            None => {
                self.declarations.push(declaration);
                self.wire.push(wire);
            }
        }
        self.handlers.insert(name, handler);
    }

    /// Executes a tool, returning the typed error on failure.
    ///
    /// Non-object arguments and handler errors both come back as
    /// [`ToolError::Execution`].
    pub async fn try_execute(&self, name: &str, args: &Value) -> Result<String, ToolError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let args = match args {
            Value::Object(map) => map.clone(),
            Value::Null => ToolArgs::new(),
            other => {
                return Err(ToolError::Execution {
                    tool: name.to_string(),
                    kind: "InvalidArguments".to_string(),
                    message: format!("expected a JSON object of named arguments, got {}", other),
                })
            }
        };

        debug!("Executing tool '{}' with {} argument(s)", name, args.len());
        handler.call(args).await.map_err(|e| ToolError::Execution {
            tool: name.to_string(),
            kind: e.kind().to_string(),
            message: e.message(),
        })
    }

    /// Executes a tool; failures become a descriptive string.
    pub async fn execute(&self, name: &str, args: &Value) -> String {
        match self.try_execute(name, args).await {
            Ok(output) => output,
            Err(e) => e.to_string(),
        }
    }

    /// Provider wire schemas in registration order.
    pub fn wire_declarations(&self) -> &[Value] {
        &self.wire
    }

    pub fn declarations(&self) -> &[ToolDeclaration] {
        &self.declarations
    }

    /// Returns true if a tool with the given name is registered.
    pub fn has(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Returns the names of all registered tools, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.declarations.iter().map(|d| d.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augmented_core::FieldSpec;
    use serde_json::json;

    fn add_declaration() -> ToolDeclaration {
        ToolDeclaration::new("add", "Add two integers")
            .field("a", FieldSpec::required("integer"))
            .field("b", FieldSpec::required("integer"))
    }

    fn add_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new(ProviderKind::Anthropic);
        registry.register(
            add_declaration(),
            handler_fn(|args| {
                let a: i64 = required_arg(&args, "a")?;
                let b: i64 = required_arg(&args, "b")?;
                Ok((a + b).to_string())
            }),
        );
        registry
    }

    struct Clock;

    #[async_trait]
    impl ToolHandler for Clock {
        async fn call(&self, _args: ToolArgs) -> Result<String, ToolError> {
            Ok("12:00".to_string())
        }
    }

    impl Tool for Clock {
        fn declaration(&self) -> ToolDeclaration {
            ToolDeclaration::new("current_time", "Returns the current time")
        }
    }

    #[tokio::test]
    async fn test_execute_add() {
        let registry = add_registry();
        assert_eq!(registry.execute("add", &json!({"a": 2, "b": 3})).await, "5");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_text() {
        let registry = add_registry();
        let out = registry.execute("multiply", &json!({})).await;
        assert!(out.contains("not found"));
        assert_eq!(
            registry.try_execute("multiply", &json!({})).await,
            Err(ToolError::NotFound("multiply".into()))
        );
    }

    #[tokio::test]
    async fn test_handler_failure_is_wrapped() {
        let registry = add_registry();
        let err = registry.try_execute("add", &json!({"a": "two", "b": 3})).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidArguments");
        assert!(err.to_string().starts_with("Error executing tool add: Invalid arguments: argument 'a'"));

        let mut failing = ToolRegistry::new(ProviderKind::OpenAi);
        failing.register(
            ToolDeclaration::new("explode", "Always fails"),
            handler_fn(|_| Err(ToolError::failed("boom"))),
        );
        assert_eq!(failing.execute("explode", &json!({})).await, "Error executing tool explode: boom");
    }

    #[tokio::test]
    async fn test_non_object_arguments() {
        let registry = add_registry();
        let err = registry.try_execute("add", &json!("a=2")).await.unwrap_err();
        assert!(matches!(err, ToolError::Execution { ref kind, .. } if kind == "InvalidArguments"));
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let mut registry = add_registry();
        registry.register_tool(Clock);
        registry.register(
            ToolDeclaration::new("add", "Add, but wrong").field("a", FieldSpec::required("integer")),
            handler_fn(|_| Ok("always 42".to_string())),
        );

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["add", "current_time"]);
        assert_eq!(registry.execute("add", &json!({"a": 1, "b": 1})).await, "always 42");
        assert_eq!(registry.wire_declarations()[0]["description"], "Add, but wrong");
        assert_eq!(registry.wire_declarations()[0]["input_schema"]["required"], json!(["a"]));
    }

    #[tokio::test]
    async fn test_register_tool_and_null_args() {
        let mut registry = ToolRegistry::new(ProviderKind::OpenAi);
        registry.register_tool(Clock);
        assert!(registry.has("current_time"));
        assert_eq!(registry.execute("current_time", &Value::Null).await, "12:00");
        assert_eq!(registry.wire_declarations()[0]["function"]["name"], "current_time");
    }

    #[test]
    fn test_optional_arg() {
        let args = json!({"x": null, "y": 3}).as_object().cloned().unwrap();
        assert_eq!(optional_arg::<i64>(&args, "x").unwrap(), None);
        assert_eq!(optional_arg::<i64>(&args, "y").unwrap(), Some(3));
        assert_eq!(optional_arg::<i64>(&args, "z").unwrap(), None);
        assert!(required_arg::<i64>(&args, "z").is_err());
    }
}
