//! Tool declarations, tool calls and the structured-decode boundary.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::SessionError;

/// Arguments of a requested tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolArguments {
    Json(Value),
    /// Finalized argument text that did not parse.
    Malformed { raw: String, error: String },
}

impl ToolArguments {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ToolArguments::Json(value) => Some(value),
            ToolArguments::Malformed { .. } => None,
        }
    }

    /// The argument text as the provider sent it.
    pub fn raw_text(&self) -> String {
        match self {
            ToolArguments::Json(value) => value.to_string(),
            ToolArguments::Malformed { raw, .. } => raw.clone(),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned id, echoed back on the tool result.
    pub id: String,
    pub name: String,
    pub arguments: ToolArguments,
}

/// Declaration of one input field of a tool.
///
/// Any key other than `type` and `required` (`description`, `enum`,
/// `default`, `minimum`, ...) is kept as a constraint and forwarded to the
/// provider schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub constraints: Map<String, Value>,
}

impl FieldSpec {
    pub fn required(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), required: true, constraints: Map::new() }
    }

    pub fn optional(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), required: false, constraints: Map::new() }
    }

    pub fn describe(self, description: impl Into<String>) -> Self {
        self.constraint("description", Value::String(description.into()))
    }

    pub fn constraint(mut self, key: impl Into<String>, value: Value) -> Self {
        self.constraints.insert(key.into(), value);
        self
    }
}

/// Field name to field declaration.
pub type InputSchema = BTreeMap<String, FieldSpec>;

/// Provider-agnostic description of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Unique key in the registry.
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

impl ToolDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into(), input_schema: InputSchema::new() }
    }

    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.input_schema.insert(name.into(), spec);
        self
    }

    pub fn required_fields(&self) -> Vec<&str> {
        self.input_schema
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// A request for output conforming to a JSON schema.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Name the provider attaches to the schema.
    pub schema_name: String,
    pub schema: Value,
}

/// Provider capability returning schema-conformant JSON instead of free text.
#[async_trait]
pub trait StructuredDecoder: Send + Sync {
    async fn decode(&self, request: StructuredRequest) -> Result<Value, SessionError>;
}
