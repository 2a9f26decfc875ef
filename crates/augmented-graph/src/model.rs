//! Knowledge-graph data model.
//!
//! One set of types covers every tier; fields a tier does not define stay
//! `None` and are left out when serialized. Maps the strict schema encodes as
//! `[{key, value}]` arrays decode from either that form or a plain object.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub type StringMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: String,
    /// One of `string`, `number`, `boolean`, `date`, `url`.
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Explicit type, used in preference to the first label.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
    #[serde(default, deserialize_with = "entries", skip_serializing_if = "Option::is_none")]
    pub attributes: Option<StringMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// IDs in external systems, e.g. `{"wikidata": "Q937"}`.
    #[serde(default, deserialize_with = "entries", skip_serializing_if = "Option::is_none")]
    pub external_ids: Option<StringMap>,
    #[serde(default, deserialize_with = "entries", skip_serializing_if = "Option::is_none")]
    pub display_properties: Option<StringMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(default, deserialize_with = "entries", skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<StringMap>,
    #[serde(default, deserialize_with = "entries", skip_serializing_if = "Option::is_none")]
    pub geo_coordinates: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(rename = "type", default)]
    pub rel_type: String,
    #[serde(default)]
    pub bidirectional: bool,
    /// Strength in `0..=1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
    #[serde(default, deserialize_with = "entries", skip_serializing_if = "Option::is_none")]
    pub attributes: Option<StringMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, deserialize_with = "entries", skip_serializing_if = "Option::is_none")]
    pub display_properties: Option<StringMap>,
    #[serde(default, deserialize_with = "entries", skip_serializing_if = "Option::is_none")]
    pub qualifiers: Option<StringMap>,
    #[serde(default, deserialize_with = "entries", skip_serializing_if = "Option::is_none")]
    pub provenance: Option<StringMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certainty: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "entries", skip_serializing_if = "Option::is_none")]
    pub stats: Option<StringMap>,
    #[serde(default, deserialize_with = "entries", skip_serializing_if = "Option::is_none")]
    pub config: Option<StringMap>,
    #[serde(default, deserialize_with = "entries", skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<StringMap>,
    #[serde(default, deserialize_with = "entries", skip_serializing_if = "Option::is_none")]
    pub ontology: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
}

impl KnowledgeGraph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[derive(Deserialize)]
struct Entry<V> {
    key: String,
    value: V,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MapForm<V> {
    Object(BTreeMap<String, V>),
    Entries(Vec<Entry<V>>),
}

fn entries<'de, D, V>(deserializer: D) -> Result<Option<BTreeMap<String, V>>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    Ok(match Option::<MapForm<V>>::deserialize(deserializer)? {
        None => None,
        Some(MapForm::Object(map)) => Some(map),
        Some(MapForm::Entries(list)) => Some(list.into_iter().map(|e| (e.key, e.value)).collect()),
    })
}
