//! Knowledge-graph generation through a structured decoder.

use std::sync::Arc;
use std::time::Instant;

use augmented_core::{SessionError, StructuredDecoder, StructuredRequest};
use chrono::Local;
use tracing::{error, info};

use crate::{knowledge_graph_schema, schema_description, Complexity, GraphError, KnowledgeGraph, Metadata};

/// Recorded as `metadata.source` on generated graphs.
pub const DEFAULT_SOURCE: &str = "OpenAI GPT-4o";

const SCHEMA_NAME: &str = "knowledge_graph";

const GUIDELINES: &str = "Follow these guidelines:
- Each node should have a unique ID, a name, and at least one label/type
- Provide a brief description for each node
- Nodes can have optional properties (key-value pairs)
- For properties, always specify a data_type as one of: \"string\", \"number\", \"boolean\", \"date\", \"url\"
- Relationships connect two nodes with a specific type (e.g., \"CREATED\", \"LOCATED_IN\", \"INFLUENCED\")
- For relationships, specify source, target, type, and set bidirectional to true or false
- Add weight values (0-1) to relationships to indicate their strength
- Add temporal information where relevant (when relationships began/ended)
- Make the graph rich and interconnected
- Include metadata like confidence scores where appropriate";

pub struct GraphGenerator {
    decoder: Arc<dyn StructuredDecoder>,
    source: String,
}

impl GraphGenerator {
    pub fn new(decoder: Arc<dyn StructuredDecoder>) -> Self {
        Self { decoder, source: DEFAULT_SOURCE.to_string() }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// The structured request sent for `topic` at `tier`.
    pub fn request(&self, topic: &str, tier: Complexity) -> StructuredRequest {
        StructuredRequest {
            system_prompt: format!(
                "You are an expert at knowledge graph generation.\nCreate a detailed knowledge graph on the given topic.\n\n{}\n\n{}",
                schema_description(tier),
                GUIDELINES
            ),
            user_prompt: format!("Generate a knowledge graph about: {}", topic),
            schema_name: SCHEMA_NAME.to_string(),
            schema: knowledge_graph_schema(tier),
        }
    }

    /// Generates a graph about `topic`.
    ///
    /// Tiers with graph metadata get it replaced by generation provenance
    /// (today's date, the source, `LLM-generated`). Every graph gets
    /// `domain = topic` and `version = "1.0"`.
    pub async fn generate(&self, topic: &str, tier: Complexity) -> Result<KnowledgeGraph, GraphError> {
        info!("Generating {} knowledge graph about: {}", tier, topic);
        let start = Instant::now();

        let value = self.decoder.decode(self.request(topic, tier)).await.map_err(|e| {
            error!("Error generating knowledge graph: {}", e);
            GraphError::Generation(e)
        })?;
        let mut kg: KnowledgeGraph = serde_json::from_value(value).map_err(|e| {
            error!("Generated graph does not match the {} schema: {}", tier, e);
            GraphError::Generation(SessionError::Parse(e.to_string()))
        })?;

        if tier >= Complexity::Standard {
            kg.metadata = Some(Metadata {
                created_at: Some(Local::now().format("%Y-%m-%d").to_string()),
                source: Some(self.source.clone()),
                extraction_method: Some("LLM-generated".to_string()),
                ..Default::default()
            });
        }
        kg.domain = Some(topic.to_string());
        kg.version = Some("1.0".to_string());

        info!(
            "Generated {} nodes, {} relationships in {:?}",
            kg.nodes.len(),
            kg.relationships.len(),
            start.elapsed()
        );
        Ok(kg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;

    struct Unused;

    #[async_trait]
    impl StructuredDecoder for Unused {
        async fn decode(&self, _request: StructuredRequest) -> Result<Value, SessionError> {
            Err(SessionError::Transport("unused".into()))
        }
    }

    #[test]
    fn test_request_embeds_tier_description_and_schema() {
        let generator = GraphGenerator::new(Arc::new(Unused));
        let request = generator.request("volcanoes", Complexity::Advanced);

        assert!(request.system_prompt.starts_with("You are an expert at knowledge graph generation."));
        assert!(request.system_prompt.contains("Advanced Knowledge Graph Schema"));
        assert!(request.system_prompt.contains("set bidirectional to true or false"));
        assert_eq!(request.user_prompt, "Generate a knowledge graph about: volcanoes");
        assert_eq!(request.schema_name, "knowledge_graph");
        assert_eq!(request.schema, knowledge_graph_schema(Complexity::Advanced));
    }
}
