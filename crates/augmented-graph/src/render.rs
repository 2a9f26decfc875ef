use std::fs;
use std::path::Path;

use tracing::info;

use crate::{GraphError, KnowledgeGraph, Property};

fn write_properties(out: &mut String, properties: &Option<Vec<Property>>) {
    let Some(properties) = properties.as_ref().filter(|p| !p.is_empty()) else {
        return;
    };
    out.push_str("  Properties:\n");
    for prop in properties {
        let confidence = prop.confidence.map(|c| format!(" (confidence: {})", c)).unwrap_or_default();
        out.push_str(&format!("    {}: {} ({}){}\n", prop.key, prop.value, prop.data_type, confidence));
    }
}

/// Human-readable listing of a graph's nodes and relationships.
pub fn render_knowledge_graph(kg: &KnowledgeGraph) -> String {
    let mut out = String::new();
    out.push_str("=== KNOWLEDGE GRAPH ===\n");
    if let Some(domain) = &kg.domain {
        out.push_str(&format!("Domain: {}\n", domain));
    }
    if let Some(version) = &kg.version {
        out.push_str(&format!("Version: {}\n", version));
    }

    out.push_str(&format!("\n=== NODES ({}) ===\n", kg.nodes.len()));
    for node in &kg.nodes {
        out.push_str(&format!("Node: {} (ID: {})\n", node.name, node.id));
        out.push_str(&format!("  Labels: {}\n", node.labels.join(", ")));
        if let Some(description) = node.description.as_ref().filter(|d| !d.is_empty()) {
            out.push_str(&format!("  Description: {}\n", description));
        }
        write_properties(&mut out, &node.properties);
        if let Some(ids) = node.external_ids.as_ref().filter(|m| !m.is_empty()) {
            out.push_str("  External IDs:\n");
            for (system, id) in ids {
                out.push_str(&format!("    {}: {}\n", system, id));
            }
        }
        out.push('\n');
    }

    out.push_str(&format!("=== RELATIONSHIPS ({}) ===\n", kg.relationships.len()));
    for rel in &kg.relationships {
        let direction = if rel.bidirectional { "<-->" } else { "-->" };
        let weight = rel.weight.map(|w| format!(" [weight: {}]", w)).unwrap_or_default();
        out.push_str(&format!("Relationship: {} {}[{}]{} {}\n", rel.source, direction, rel.rel_type, weight, rel.target));

        let temporal: Vec<String> = [("started", &rel.start_date), ("ended", &rel.end_date), ("duration", &rel.duration)]
            .into_iter()
            .filter_map(|(label, value)| value.as_ref().filter(|v| !v.is_empty()).map(|v| format!("{}: {}", label, v)))
            .collect();
        if !temporal.is_empty() {
            out.push_str(&format!("  Temporal: {}\n", temporal.join(", ")));
        }
        write_properties(&mut out, &rel.properties);
        out.push('\n');
    }
    out
}

/// Writes `kg` as pretty JSON, creating parent directories.
pub fn save_knowledge_graph(kg: &KnowledgeGraph, path: &Path) -> Result<(), GraphError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(kg)?)?;
    info!("Knowledge graph saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, Relationship};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample() -> KnowledgeGraph {
        KnowledgeGraph {
            nodes: vec![Node {
                id: "marie".into(),
                labels: vec!["Person".into(), "Scientist".into()],
                name: "Marie Curie".into(),
                description: Some("Physicist".into()),
                properties: Some(vec![Property {
                    key: "born".into(),
                    value: "1867".into(),
                    data_type: "date".into(),
                    confidence: Some(0.95),
                    ..Default::default()
                }]),
                external_ids: Some(BTreeMap::from([("wikidata".to_string(), "Q7186".to_string())])),
                ..Default::default()
            }],
            relationships: vec![Relationship {
                source: "marie".into(),
                target: "pierre".into(),
                rel_type: "MARRIED_TO".into(),
                bidirectional: true,
                weight: Some(1.0),
                start_date: Some("1895".into()),
                end_date: Some("1906".into()),
                ..Default::default()
            }],
            domain: Some("Curie family".into()),
            version: Some("1.0".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_lists_nodes_and_relationships() {
        let text = render_knowledge_graph(&sample());
        assert!(text.starts_with("=== KNOWLEDGE GRAPH ===\nDomain: Curie family\nVersion: 1.0\n"));
        assert!(text.contains("=== NODES (1) ==="));
        assert!(text.contains("Node: Marie Curie (ID: marie)\n  Labels: Person, Scientist\n"));
        assert!(text.contains("    born: 1867 (date) (confidence: 0.95)\n"));
        assert!(text.contains("  External IDs:\n    wikidata: Q7186\n"));
        assert!(text.contains("Relationship: marie <-->[MARRIED_TO] [weight: 1] pierre\n"));
        assert!(text.contains("  Temporal: started: 1895, ended: 1906\n"));
    }

    #[test]
    fn test_render_full_text() {
        let kg = KnowledgeGraph {
            nodes: vec![Node {
                id: "a".into(),
                labels: vec!["Thing".into()],
                name: "A".into(),
                ..Default::default()
            }],
            relationships: vec![Relationship {
                source: "a".into(),
                target: "a".into(),
                rel_type: "SELF".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            render_knowledge_graph(&kg),
            "=== KNOWLEDGE GRAPH ===\n\n=== NODES (1) ===\nNode: A (ID: a)\n  Labels: Thing\n\n\
             === RELATIONSHIPS (1) ===\nRelationship: a -->[SELF] a\n\n"
        );
    }

    #[test]
    fn test_render_skips_empty_sections() {
        let kg = KnowledgeGraph {
            relationships: vec![Relationship {
                source: "a".into(),
                target: "b".into(),
                rel_type: "KNOWS".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let text = render_knowledge_graph(&kg);
        assert!(!text.contains("Domain:"));
        assert!(text.contains("Relationship: a -->[KNOWS] b\n"));
        assert!(!text.contains("Temporal"));
    }

    #[test]
    fn test_save_writes_pretty_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out").join("curie.json");
        save_knowledge_graph(&sample(), &path).unwrap();

        let body = fs::read_to_string(&path).unwrap();
        assert!(body.contains("\n  \"nodes\": ["));
        let back: KnowledgeGraph = serde_json::from_str(&body).unwrap();
        assert_eq!(back, sample());
    }
}
