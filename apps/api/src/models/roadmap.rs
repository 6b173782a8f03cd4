//! Roadmap graph model — the validated output of the response normalizer.
//!
//! Wire field names match the original API contract (`roadmap_title`,
//! `phase_id`, ...) so existing consumers keep working.

use serde::{Deserialize, Serialize};

/// Closed node-type vocabulary. Free-text provider output is mapped onto
/// these values by `roadmap::normalize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Core,
    Optional,
    Project,
    Alternative,
}

/// Closed difficulty vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Numeric level used by the personalization scorer.
    pub fn level(self) -> f64 {
        match self {
            Difficulty::Beginner => 1.0,
            Difficulty::Intermediate => 2.0,
            Difficulty::Advanced => 3.0,
        }
    }
}

/// Closed suggested-resource-type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Video,
    Doc,
    Project,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningResources {
    #[serde(default)]
    pub keywords: Vec<String>,
    pub suggested_type: ResourceType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subsection {
    pub id: String,
    pub name: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub name: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub subsections: Vec<Subsection>,
}

/// Legacy flat stage representation. Synthesized from sections when the
/// payload carries only the new shape, so old consumers keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub id: String,
    pub name: String,
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub label: String,
    pub description: String,
    pub estimated_hours: u32,
    pub difficulty: Difficulty,
    /// Free-text prerequisite labels, not guaranteed to be node ids.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
    pub learning_resources: LearningResources,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub section_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsection_id: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// True for branching concepts that fan out into several child topics.
    #[serde(default)]
    pub is_hub: bool,
    pub data: NodeData,
}

/// Directed edge. Endpoints are not verified against node ids and the graph
/// is not checked for cycles; the generator asks the model for a DAG but this
/// layer only coerces structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roadmap {
    pub roadmap_title: String,
    pub roadmap_description: String,
    pub total_estimated_hours: u32,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub phases: Vec<Phase>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Metadata about one generation run, returned alongside the roadmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub model: String,
    pub provider: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub latency_ms: u64,
    pub prompt_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalization_score: Option<f64>,
    pub generated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapResponse {
    pub success: bool,
    pub roadmap: Roadmap,
    pub metadata: GenerationMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&NodeType::Alternative).unwrap(),
            r#""alternative""#
        );
    }

    #[test]
    fn test_difficulty_levels_are_1_2_3() {
        assert_eq!(Difficulty::Beginner.level(), 1.0);
        assert_eq!(Difficulty::Intermediate.level(), 2.0);
        assert_eq!(Difficulty::Advanced.level(), 3.0);
    }

    #[test]
    fn test_node_serializes_type_field_name() {
        let node = Node {
            id: "n1".to_string(),
            section_id: "section-1".to_string(),
            subsection_id: None,
            node_type: NodeType::Core,
            is_hub: false,
            data: NodeData {
                label: "HTML".to_string(),
                description: String::new(),
                estimated_hours: 5,
                difficulty: Difficulty::Beginner,
                prerequisites: vec![],
                learning_outcomes: vec![],
                learning_resources: LearningResources {
                    keywords: vec![],
                    suggested_type: ResourceType::Video,
                },
            },
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "core");
        assert!(json.get("subsection_id").is_none());
    }
}
