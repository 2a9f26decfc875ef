//! Converts provider-agnostic tool declarations into provider wire schemas.

use augmented_core::{FieldSpec, ProviderKind, ToolDeclaration};
use serde_json::{json, Map, Value};

/// Converts a declaration into the tool schema `provider` expects.
pub fn wire_declaration(declaration: &ToolDeclaration, provider: ProviderKind) -> Value {
    match provider {
        ProviderKind::Anthropic => anthropic_tool(declaration),
        ProviderKind::OpenAi => openai_tool(declaration),
    }
}

/// `{name, description, input_schema: {type: object, properties, required}}`
pub fn anthropic_tool(declaration: &ToolDeclaration) -> Value {
    let properties: Map<String, Value> = declaration
        .input_schema
        .iter()
        .map(|(name, spec)| (name.clone(), property(spec, &[])))
        .collect();

    json!({
        "name": declaration.name,
        "description": declaration.description,
        "input_schema": {
            "type": "object",
            "properties": properties,
            "required": declaration.required_fields(),
        }
    })
}

/// Strict-mode function tool.
///
/// Strict mode demands that `required` lists every property and that no
/// property carries a default, whatever the declaration says.
pub fn openai_tool(declaration: &ToolDeclaration) -> Value {
    let properties: Map<String, Value> = declaration
        .input_schema
        .iter()
        .map(|(name, spec)| (name.clone(), property(spec, &["default"])))
        .collect();
    let required: Vec<&String> = declaration.input_schema.keys().collect();

    json!({
        "type": "function",
        "function": {
            "name": declaration.name,
            "description": declaration.description,
            "strict": true,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": false,
            }
        }
    })
}

/// A field's JSON schema: its type plus constraints, minus `required` and `strip`.
fn property(spec: &FieldSpec, strip: &[&str]) -> Value {
    let mut out = Map::new();
    out.insert("type".to_string(), Value::String(spec.kind.clone()));
    for (key, value) in &spec.constraints {
        if key == "required" || strip.contains(&key.as_str()) {
            continue;
        }
        out.insert(key.clone(), value.clone());
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_declaration() -> ToolDeclaration {
        ToolDeclaration::new("add", "Add two integers")
            .field("a", FieldSpec::required("integer").describe("First operand"))
            .field("b", FieldSpec::required("integer"))
            .field("round", FieldSpec::optional("boolean").constraint("default", json!(false)))
    }

    #[test]
    fn test_anthropic_schema() {
        let tool = anthropic_tool(&add_declaration());
        assert_eq!(
            tool,
            json!({
                "name": "add",
                "description": "Add two integers",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "a": {"type": "integer", "description": "First operand"},
                        "b": {"type": "integer"},
                        "round": {"type": "boolean", "default": false}
                    },
                    "required": ["a", "b"]
                }
            })
        );
    }

    #[test]
    fn test_openai_schema_requires_every_property() {
        let tool = openai_tool(&add_declaration());
        let function = &tool["function"];
        assert_eq!(tool["type"], "function");
        assert_eq!(function["strict"], true);
        assert_eq!(function["parameters"]["additionalProperties"], false);
        assert_eq!(function["parameters"]["required"], json!(["a", "b", "round"]));
        assert_eq!(function["parameters"]["properties"]["round"], json!({"type": "boolean"}));
        assert_eq!(
            function["parameters"]["properties"]["a"],
            json!({"type": "integer", "description": "First operand"})
        );
    }

    #[test]
    fn test_empty_schema() {
        let decl = ToolDeclaration::new("current_time", "Returns the current time");
        let tool = wire_declaration(&decl, ProviderKind::OpenAi);
        assert_eq!(tool["function"]["parameters"]["required"], json!([]));
        assert_eq!(tool["function"]["parameters"]["properties"], json!({}));

        let tool = wire_declaration(&decl, ProviderKind::Anthropic);
        assert_eq!(tool["input_schema"]["required"], json!([]));
    }
}
