//! Strict JSON schemas for each knowledge-graph tier.
//!
//! Strict structured output requires every property to be listed in
//! `required` and forbids open objects, so optional fields become nullable
//! and string maps become arrays of `{key, value}` entries.

use serde_json::{json, Map, Value};

use crate::Complexity;

struct Field {
    name: &'static str,
    schema: Value,
    optional: bool,
}

fn required(name: &'static str, schema: Value) -> Field {
    Field { name, schema, optional: false }
}

fn optional(name: &'static str, schema: Value) -> Field {
    Field { name, schema, optional: true }
}

fn described(mut schema: Value, description: &str) -> Value {
    if let Some(obj) = schema.as_object_mut() {
        obj.insert("description".into(), json!(description));
    }
    schema
}

fn string(description: &str) -> Value {
    described(json!({"type": "string"}), description)
}

fn number(description: &str) -> Value {
    described(json!({"type": "number"}), description)
}

fn boolean(description: &str) -> Value {
    described(json!({"type": "boolean"}), description)
}

fn list(items: Value, description: &str) -> Value {
    described(json!({"type": "array", "items": items}), description)
}

/// A map encoded as `[{key, value}]`.
fn map(value_type: &str, description: &str) -> Value {
    let entry = object(vec![
        required("key", json!({"type": "string"})),
        required("value", json!({"type": value_type})),
    ]);
    list(entry, description)
}

fn nullable(schema: Value) -> Value {
    match schema.get("type") {
        Some(Value::String(t)) if t != "object" && t != "array" => {
            let mut schema = schema.clone();
            schema["type"] = json!([t, "null"]);
            schema
        }
        _ => json!({"anyOf": [schema, {"type": "null"}]}),
    }
}

fn object(fields: Vec<Field>) -> Value {
    let names: Vec<&str> = fields.iter().map(|f| f.name).collect();
    let properties: Map<String, Value> = fields
        .into_iter()
        .map(|f| {
            let schema = if f.optional { nullable(f.schema) } else { f.schema };
            (f.name.to_string(), schema)
        })
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": names,
        "additionalProperties": false,
    })
}

fn property(tier: Complexity) -> Value {
    let mut fields = vec![
        required("key", string("The property name")),
        required("value", string("The property value")),
        required("data_type", string("One of: string, number, boolean, date, url")),
    ];
    if tier >= Complexity::Standard {
        fields.push(optional("confidence", number("Confidence score (0-1)")));
        fields.push(optional("source", string("Source of this property information")));
    }
    if tier >= Complexity::Advanced {
        fields.push(optional("validated", boolean("Whether this property has been validated")));
        fields.push(optional("validated_by", string("Who validated this property")));
        fields.push(optional("last_updated", string("When this property was last updated (YYYY-MM-DD)")));
    }
    object(fields)
}

fn metadata(tier: Complexity) -> Value {
    let mut fields = vec![
        optional("created_at", string("Creation date (YYYY-MM-DD)")),
        optional("last_modified", string("Last modification date (YYYY-MM-DD)")),
        optional("source", string("Source of the information")),
        optional("confidence", number("Overall confidence score (0-1)")),
        optional("extraction_method", string("Method used to extract or create this entity")),
    ];
    if tier >= Complexity::Advanced {
        fields.push(optional("notes", string("Additional notes")));
        fields.push(optional("created_by", string("Creator of this entity")));
        fields.push(optional("modified_by", string("Last person to modify this entity")));
        fields.push(optional("tags", list(json!({"type": "string"}), "Tags for categorization")));
        fields.push(optional("verification_status", string("Verification status")));
    }
    object(fields)
}

fn node(tier: Complexity) -> Value {
    let mut fields = vec![
        required("id", string("Unique identifier for the node")),
        required("labels", list(json!({"type": "string"}), "Types of this node, e.g. ['Person', 'Author']")),
        required("name", string("Human-readable name")),
        optional("description", string("Brief description of this entity")),
        optional("properties", list(property(tier), "Key-value properties")),
    ];
    if tier >= Complexity::Standard {
        fields.push(optional("metadata", metadata(tier)));
        fields.push(optional("external_ids", map("string", "IDs in external systems, e.g. wikidata")));
    }
    if tier >= Complexity::Advanced {
        fields.push(optional("detailed_description", string("Detailed long-form description")));
        fields.push(optional("attributes", map("string", "Additional structured attributes")));
        fields.push(optional("display_properties", map("string", "Visualization properties such as color or size")));
        fields.push(optional("images", list(json!({"type": "string"}), "Image URLs")));
        fields.push(optional("urls", list(json!({"type": "string"}), "Related resource URLs")));
        fields.push(optional("hierarchy", map("string", "Hierarchical position information")));
        fields.push(optional("geo_coordinates", map("number", "Geographic coordinates")));
    }
    object(fields)
}

fn relationship(tier: Complexity) -> Value {
    let mut fields = vec![
        required("source", string("ID of the source node")),
        required("target", string("ID of the target node")),
        required("type", string("Relationship type, e.g. CREATED or KNOWS")),
        required("bidirectional", boolean("Whether the relationship applies in both directions")),
    ];
    if tier >= Complexity::Standard {
        fields.push(optional("weight", number("Strength of the relationship (0-1)")));
        fields.push(optional("start_date", string("When this relationship began (YYYY-MM-DD)")));
        fields.push(optional("end_date", string("When this relationship ended (YYYY-MM-DD)")));
        fields.push(optional("properties", list(property(tier), "Key-value properties")));
        fields.push(optional("metadata", metadata(tier)));
    }
    if tier >= Complexity::Advanced {
        fields.push(optional("duration", string("Duration of the relationship")));
        fields.push(optional("attributes", map("string", "Additional structured attributes")));
        fields.push(optional("display_properties", map("string", "Visualization properties such as color or thickness")));
        fields.push(optional("qualifiers", map("string", "Qualifiers that give the relationship context")));
        fields.push(optional("provenance", map("string", "Provenance information")));
        fields.push(optional("certainty", string("Certainty level beyond confidence")));
    }
    object(fields)
}

/// Strict schema for a whole graph at `tier`.
pub fn knowledge_graph_schema(tier: Complexity) -> Value {
    let mut fields = vec![
        required("nodes", list(node(tier), "Nodes in the knowledge graph")),
        required("relationships", list(relationship(tier), "Relationships between nodes")),
    ];
    if tier >= Complexity::Standard {
        fields.push(optional("metadata", metadata(tier)));
        fields.push(optional("domain", string("Domain or subject area")));
        fields.push(optional("version", string("Version of this knowledge graph")));
    }
    if tier >= Complexity::Advanced {
        fields.push(optional("stats", map("string", "Statistics such as node count by type")));
        fields.push(optional("config", map("string", "Configuration settings")));
        fields.push(optional("namespaces", map("string", "Namespace definitions")));
        fields.push(optional("ontology", map("string", "Ontology information")));
        fields.push(optional("license", string("License information")));
        fields.push(optional("citation", string("Citation information")));
    }
    object(fields)
}
