use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::GraphError;

/// Schema tier. Each tier strictly extends the one before it, so tiers are
/// ordered and `tier >= Complexity::Standard` reads as "has standard fields".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Basic,
    #[default]
    Standard,
    Advanced,
}

impl Complexity {
    pub const ALL: [Complexity; 3] = [Complexity::Basic, Complexity::Standard, Complexity::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Basic => "basic",
            Complexity::Standard => "standard",
            Complexity::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Complexity {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Complexity::Basic),
            "standard" => Ok(Complexity::Standard),
            "advanced" => Ok(Complexity::Advanced),
            _ => Err(GraphError::InvalidComplexity(s.to_string())),
        }
    }
}

/// Prose summary of a tier, embedded in the generation system prompt.
pub fn schema_description(tier: Complexity) -> &'static str {
    match tier {
        Complexity::Basic => {
            "Basic Knowledge Graph Schema

A minimal schema with only essential fields:
- Nodes with ID, labels, name, and optional description and properties
- Relationships with source, target, type, and bidirectional flag
- Properties with key, value, and data type

Suitable for simple knowledge graphs with minimal metadata requirements."
        }
        Complexity::Standard => {
            "Standard Knowledge Graph Schema

A balanced schema with essential fields plus useful metadata:
- Nodes with ID, labels, name, description, properties, metadata, and external IDs
- Relationships with source, target, type, bidirectional flag, weight, and temporal information
- Properties with key, value, data type, confidence, and source
- Metadata with creation/modification dates, source, confidence, and extraction method

Suitable for most knowledge graph applications."
        }
        Complexity::Advanced => {
            "Advanced Knowledge Graph Schema

A comprehensive schema with all possible fields:
- Nodes with extensive metadata, visualization properties, and detailed attributes
- Relationships with comprehensive metadata, temporal information, and qualifiers
- Properties with validation information and detailed metadata
- Graph-level configuration, statistics, namespaces, and ontology information

Suitable for complex knowledge graph applications requiring rich metadata."
        }
    }
}
