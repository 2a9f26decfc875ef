//! Conversion into the node/relationship batch graph stores ingest.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::{GraphError, KnowledgeGraph, Property};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub properties: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphRelationship {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub properties: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSource {
    /// Graph domain, `unknown_domain` when unset.
    pub id: String,
    pub version: String,
    pub origin: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphDocument {
    pub source: DocumentSource,
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<GraphRelationship>,
}

/// A graph database that accepts whole documents.
#[async_trait]
pub trait GraphSink: Send + Sync {
    async fn add_graph_document(&self, document: &GraphDocument) -> Result<(), GraphError>;
}

fn custom_properties(properties: &Option<Vec<Property>>, into: &mut BTreeMap<String, Value>) {
    for prop in properties.iter().flatten() {
        into.insert(prop.key.clone(), json!(prop.value));
    }
}

fn non_empty(value: &Option<String>) -> Option<&String> {
    value.as_ref().filter(|s| !s.is_empty())
}

/// Converts a graph into a document.
///
/// Nodes without an id or a type are dropped, as are relationships missing
/// an endpoint or type, or pointing at a dropped node.
pub fn to_graph_document(kg: &KnowledgeGraph) -> GraphDocument {
    let mut nodes: Vec<GraphNode> = Vec::new();
    for node in &kg.nodes {
        let node_type = node.node_type.clone().or_else(|| node.labels.first().cloned()).unwrap_or_default();
        if node.id.is_empty() || node_type.is_empty() {
            continue;
        }

        let mut properties = BTreeMap::new();
        if !node.name.is_empty() {
            properties.insert("name".to_string(), json!(node.name));
        }
        if let Some(description) = non_empty(&node.description) {
            properties.insert("description".to_string(), json!(description));
        }
        custom_properties(&node.properties, &mut properties);

        nodes.push(GraphNode { id: node.id.clone(), node_type, properties });
    }

    let known = |id: &str| nodes.iter().any(|n| n.id == id);
    let mut relationships = Vec::new();
    for rel in &kg.relationships {
        if rel.source.is_empty() || rel.target.is_empty() || rel.rel_type.is_empty() {
            continue;
        }
        if !known(&rel.source) || !known(&rel.target) {
            continue;
        }

        let mut properties = BTreeMap::new();
        if let Some(weight) = rel.weight {
            properties.insert("weight".to_string(), json!(weight));
        }
        for (key, value) in [("start_date", &rel.start_date), ("end_date", &rel.end_date), ("duration", &rel.duration)] {
            if let Some(value) = non_empty(value) {
                properties.insert(key.to_string(), json!(value));
            }
        }
        custom_properties(&rel.properties, &mut properties);

        relationships.push(GraphRelationship {
            source: rel.source.clone(),
            target: rel.target.clone(),
            rel_type: rel.rel_type.clone(),
            properties,
        });
    }

    let metadata = kg.metadata.as_ref();
    GraphDocument {
        source: DocumentSource {
            id: kg.domain.clone().unwrap_or_else(|| "unknown_domain".to_string()),
            version: kg.version.clone().unwrap_or_else(|| "1.0".to_string()),
            origin: metadata.and_then(|m| m.source.clone()),
            created_at: metadata.and_then(|m| m.created_at.clone()),
        },
        nodes,
        relationships,
    }
}

/// Converts `kg` and hands it to `sink`. Failures are logged, not raised.
pub async fn upload(kg: &KnowledgeGraph, sink: &dyn GraphSink) -> bool {
    let document = to_graph_document(kg);
    match sink.add_graph_document(&document).await {
        Ok(()) => {
            info!(
                "Uploaded {} nodes, {} relationships",
                document.nodes.len(),
                document.relationships.len()
            );
            true
        }
        Err(e) => {
            error!("Error uploading knowledge graph: {}", e);
            false
        }
    }
}

/// Counts by type, in first-seen order.
fn tally<'a>(types: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for t in types {
        match counts.iter_mut().find(|(seen, _)| *seen == t) {
            Some((_, n)) => *n += 1,
            None => counts.push((t, 1)),
        }
    }
    counts
}

/// Node and relationship counts by type.
pub fn document_summary(document: &GraphDocument) -> String {
    let mut out = String::new();
    out.push_str(&format!("Source: {} (version {})\n", document.source.id, document.source.version));
    out.push_str(&format!("  Nodes: {}\n", document.nodes.len()));
    out.push_str("  Node Types:\n");
    for (t, n) in tally(document.nodes.iter().map(|n| n.node_type.as_str())) {
        out.push_str(&format!("    - {}: {}\n", t, n));
    }
    out.push_str(&format!("  Relationships: {}\n", document.relationships.len()));
    out.push_str("  Relationship Types:\n");
    for (t, n) in tally(document.relationships.iter().map(|r| r.rel_type.as_str())) {
        out.push_str(&format!("    - {}: {}\n", t, n));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Metadata, Node, Relationship};

    fn node(id: &str, labels: &[&str]) -> Node {
        Node {
            id: id.into(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            name: id.to_uppercase(),
            ..Default::default()
        }
    }

    fn rel(source: &str, target: &str, rel_type: &str) -> Relationship {
        Relationship { source: source.into(), target: target.into(), rel_type: rel_type.into(), ..Default::default() }
    }

    fn family() -> KnowledgeGraph {
        let mut alice = node("alice", &["Person", "Parent"]);
        alice.description = Some("Mother".into());
        alice.properties = Some(vec![Property {
            key: "age".into(),
            value: "41".into(),
            data_type: "number".into(),
            ..Default::default()
        }]);

        let mut married = rel("alice", "bob", "MARRIED_TO");
        married.weight = Some(0.9);
        married.start_date = Some("2010-06-01".into());
        married.end_date = Some(String::new());

        KnowledgeGraph {
            nodes: vec![alice, node("bob", &["Person"]), node("carol", &["Person"]), node("ghost", &[])],
            relationships: vec![
                married,
                rel("alice", "carol", "PARENT_OF"),
                rel("alice", "ghost", "HAUNTS"),
                rel("alice", "", "BROKEN"),
            ],
            domain: Some("a simple family of 3".into()),
            metadata: Some(Metadata { source: Some("test".into()), ..Default::default() }),
            ..Default::default()
        }
    }

    #[test]
    fn test_nodes_take_first_label_and_drop_untyped() {
        let doc = to_graph_document(&family());
        let ids: Vec<&str> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);

        let alice = &doc.nodes[0];
        assert_eq!(alice.node_type, "Person");
        assert_eq!(alice.properties["name"], "ALICE");
        assert_eq!(alice.properties["description"], "Mother");
        assert_eq!(alice.properties["age"], "41");
    }

    #[test]
    fn test_explicit_type_wins_over_labels() {
        let mut n = node("x", &["Label"]);
        n.node_type = Some("Explicit".into());
        let doc = to_graph_document(&KnowledgeGraph { nodes: vec![n], ..Default::default() });
        assert_eq!(doc.nodes[0].node_type, "Explicit");
    }

    #[test]
    fn test_relationships_need_known_endpoints() {
        let doc = to_graph_document(&family());
        let types: Vec<&str> = doc.relationships.iter().map(|r| r.rel_type.as_str()).collect();
        assert_eq!(types, vec!["MARRIED_TO", "PARENT_OF"]);

        let married = &doc.relationships[0].properties;
        assert_eq!(married["weight"], json!(0.9));
        assert_eq!(married["start_date"], "2010-06-01");
        assert!(!married.contains_key("end_date"));
    }

    #[test]
    fn test_source_defaults() {
        let doc = to_graph_document(&family());
        assert_eq!(doc.source.id, "a simple family of 3");
        assert_eq!(doc.source.version, "1.0");
        assert_eq!(doc.source.origin.as_deref(), Some("test"));

        let empty = to_graph_document(&KnowledgeGraph::default());
        assert_eq!(empty.source.id, "unknown_domain");
        assert!(empty.source.origin.is_none());
    }

    #[test]
    fn test_summary_counts_by_type() {
        let summary = document_summary(&to_graph_document(&family()));
        assert!(summary.contains("  Nodes: 3\n"));
        assert!(summary.contains("    - Person: 3\n"));
        assert!(summary.contains("  Relationships: 2\n"));
        assert!(summary.contains("    - MARRIED_TO: 1\n"));
    }
}
