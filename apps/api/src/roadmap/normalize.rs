//! Response normalization — coerces the untyped JSON a model returns into the
//! strict `Roadmap` model.
//!
//! Model output drifts in shape across prompt versions: enum values arrive in
//! arbitrary casing and synonyms, optional detail fields go missing, and the
//! legacy `phase_id` field was renamed to `section_id`. This layer is
//! maximally permissive on shape (malformed fields become defaults, nothing
//! present in the input is dropped) and maximally strict on the enums and
//! identifiers downstream code depends on. The only rejected input is a
//! payload that is not a JSON object at all.

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::models::roadmap::{
    Difficulty, Edge, LearningResources, Node, NodeData, NodeType, Phase, ResourceType, Roadmap,
    Section, Subsection,
};

/// Fixed fallback for nodes that carry neither `section_id` nor `phase_id`.
const DEFAULT_SECTION_ID: &str = "section-1";

/// Hours assigned to a node whose `estimated_hours` is missing or malformed.
const DEFAULT_ESTIMATED_HOURS: u32 = 5;

/// The payload could not be interpreted as a roadmap record at all.
/// Field-level anomalies never produce this; they are coerced to defaults.
#[derive(Debug, Error)]
#[error("roadmap payload is not a JSON object (got {got})")]
pub struct RoadmapParseError {
    pub got: &'static str,
}

/// Parses an untrusted roadmap payload into the validated graph model.
///
/// Never drops top-level sections, nodes, or edges present in the input.
/// Dangling section references are counted and logged, not rejected.
pub fn parse_roadmap(raw: &Value) -> Result<Roadmap, RoadmapParseError> {
    if !raw.is_object() {
        return Err(RoadmapParseError {
            got: json_type_name(raw),
        });
    }

    let sections = parse_sections(raw.get("sections"));
    let phases = parse_phases(raw.get("phases"), &sections);
    let nodes = parse_nodes(raw.get("nodes"));
    let edges = parse_edges(raw.get("edges"));

    let known_ids: HashSet<&str> = sections
        .iter()
        .map(|s| s.id.as_str())
        .chain(phases.iter().map(|p| p.id.as_str()))
        .collect();
    let dangling = nodes
        .iter()
        .filter(|n| !known_ids.contains(n.section_id.as_str()))
        .count();
    if dangling > 0 {
        warn!(dangling, "roadmap nodes reference undeclared sections");
    }

    Ok(Roadmap {
        roadmap_title: str_or(raw.get("roadmap_title"), "Learning Roadmap"),
        roadmap_description: str_or(raw.get("roadmap_description"), ""),
        total_estimated_hours: u32_or(raw.get("total_estimated_hours"), 0),
        sections,
        phases,
        nodes,
        edges,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Enum normalization — total over any JSON value
// ────────────────────────────────────────────────────────────────────────────

/// Maps a free-text suggested-resource-type onto the closed vocabulary.
/// Unknown, missing, or non-string input falls back to `Video`.
pub fn normalize_resource_type(value: Option<&Value>) -> ResourceType {
    match normalized(value).as_deref() {
        Some("video" | "videos") => ResourceType::Video,
        Some("doc" | "docs" | "documentation" | "document" | "reading" | "article") => {
            ResourceType::Doc
        }
        Some("project" | "projects" | "practice" | "hands-on") => ResourceType::Project,
        _ => ResourceType::Video,
    }
}

/// Maps a free-text difficulty onto the closed vocabulary, default `Beginner`.
pub fn normalize_difficulty(value: Option<&Value>) -> Difficulty {
    match normalized(value).as_deref() {
        Some("beginner" | "basic" | "easy") => Difficulty::Beginner,
        Some("intermediate" | "medium") => Difficulty::Intermediate,
        Some("advanced" | "expert" | "hard") => Difficulty::Advanced,
        _ => Difficulty::Beginner,
    }
}

/// Maps a free-text node type onto the closed vocabulary, default `Core`.
pub fn normalize_node_type(value: Option<&Value>) -> NodeType {
    match normalized(value).as_deref() {
        Some("core" | "required" | "essential") => NodeType::Core,
        Some("optional" | "elective") => NodeType::Optional,
        Some("project" | "practice" | "hands-on") => NodeType::Project,
        Some("alternative" | "alt") => NodeType::Alternative,
        _ => NodeType::Core,
    }
}

fn normalized(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
}

// ────────────────────────────────────────────────────────────────────────────
// Structural parsing
// ────────────────────────────────────────────────────────────────────────────

fn parse_sections(value: Option<&Value>) -> Vec<Section> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .map(|(i, s)| Section {
            id: str_or(s.get("id"), &format!("section-{}", i + 1)),
            name: str_or(s.get("name"), &format!("Section {}", i + 1)),
            order: u32_or(s.get("order"), (i + 1) as u32),
            description: s.get("description").and_then(Value::as_str).map(String::from),
            subsections: parse_subsections(s.get("subsections")),
        })
        .collect()
}

fn parse_subsections(value: Option<&Value>) -> Vec<Subsection> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .map(|(i, s)| Subsection {
            id: str_or(s.get("id"), &format!("subsection-{}", i + 1)),
            name: str_or(s.get("name"), &format!("Subsection {}", i + 1)),
            order: u32_or(s.get("order"), (i + 1) as u32),
            description: s.get("description").and_then(Value::as_str).map(String::from),
        })
        .collect()
}

/// Parses the legacy phases array, or synthesizes one phase per section when
/// the payload carries only the new sectioned shape (subsection detail is
/// dropped; id, name, and order are copied verbatim).
fn parse_phases(value: Option<&Value>, sections: &[Section]) -> Vec<Phase> {
    match value.and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .enumerate()
            .map(|(i, p)| Phase {
                id: str_or(p.get("id"), &format!("phase-{}", i + 1)),
                name: str_or(p.get("name"), &format!("Phase {}", i + 1)),
                order: u32_or(p.get("order"), (i + 1) as u32),
            })
            .collect(),
        None => sections
            .iter()
            .map(|s| Phase {
                id: s.id.clone(),
                name: s.name.clone(),
                order: s.order,
            })
            .collect(),
    }
}

fn parse_nodes(value: Option<&Value>) -> Vec<Node> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items.iter().map(parse_node).collect()
}

fn parse_node(n: &Value) -> Node {
    let data = n.get("data");
    let resources = field(data, "learning_resources");

    // New payloads carry section_id, older ones phase_id; both land on a
    // section reference so consumers never branch on payload age.
    let section_id = n
        .get("section_id")
        .and_then(Value::as_str)
        .or_else(|| n.get("phase_id").and_then(Value::as_str))
        .unwrap_or(DEFAULT_SECTION_ID)
        .to_string();

    Node {
        id: str_or(n.get("id"), ""),
        section_id,
        subsection_id: n.get("subsection_id").and_then(Value::as_str).map(String::from),
        node_type: normalize_node_type(n.get("type")),
        is_hub: n.get("is_hub").and_then(Value::as_bool).unwrap_or(false),
        data: NodeData {
            label: str_or(field(data, "label"), "Unknown Topic"),
            description: str_or(field(data, "description"), ""),
            estimated_hours: u32_or(field(data, "estimated_hours"), DEFAULT_ESTIMATED_HOURS).max(1),
            difficulty: normalize_difficulty(field(data, "difficulty")),
            prerequisites: string_list(field(data, "prerequisites")),
            learning_outcomes: string_list(field(data, "learning_outcomes")),
            learning_resources: LearningResources {
                keywords: string_list(field(resources, "keywords")),
                suggested_type: normalize_resource_type(field(resources, "suggested_type")),
            },
        },
    }
}

fn parse_edges(value: Option<&Value>) -> Vec<Edge> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .map(|(i, e)| Edge {
            id: str_or(e.get("id"), &format!("e{i}")),
            source: str_or(e.get("source"), ""),
            target: str_or(e.get("target"), ""),
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Field coercion helpers
// ────────────────────────────────────────────────────────────────────────────

fn field<'a>(value: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    value.and_then(|v| v.get(key))
}

fn str_or(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| default.to_string())
}

fn u32_or(value: Option<&Value>, default: u32) -> u32 {
    let Some(n) = value.and_then(Value::as_f64) else {
        return default;
    };
    if n.is_finite() && n >= 0.0 {
        n as u32
    } else {
        default
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_payload_parses() {
        let raw = json!({"nodes": [], "edges": [], "sections": []});
        let roadmap = parse_roadmap(&raw).unwrap();
        assert_eq!(roadmap.roadmap_title, "Learning Roadmap");
        assert_eq!(roadmap.roadmap_description, "");
        assert_eq!(roadmap.total_estimated_hours, 0);
        assert!(roadmap.sections.is_empty());
        assert!(roadmap.phases.is_empty());
        assert!(roadmap.nodes.is_empty());
        assert!(roadmap.edges.is_empty());
    }

    #[test]
    fn test_empty_object_parses() {
        let roadmap = parse_roadmap(&json!({})).unwrap();
        assert!(roadmap.nodes.is_empty());
        assert!(roadmap.phases.is_empty());
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        let err = parse_roadmap(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.got, "array");
        let err = parse_roadmap(&json!("not a roadmap")).unwrap_err();
        assert_eq!(err.got, "string");
        assert!(parse_roadmap(&Value::Null).is_err());
    }

    #[test]
    fn test_resource_type_synonyms() {
        for (input, expected) in [
            ("video", ResourceType::Video),
            ("Videos", ResourceType::Video),
            ("Docs", ResourceType::Doc),
            ("DOCUMENTATION", ResourceType::Doc),
            ("reading", ResourceType::Doc),
            ("article", ResourceType::Doc),
            ("hands-on", ResourceType::Project),
            ("practice", ResourceType::Project),
            ("  project  ", ResourceType::Project),
        ] {
            assert_eq!(
                normalize_resource_type(Some(&json!(input))),
                expected,
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_resource_type_fallback_is_video() {
        assert_eq!(normalize_resource_type(None), ResourceType::Video);
        assert_eq!(
            normalize_resource_type(Some(&json!("podcast"))),
            ResourceType::Video
        );
        assert_eq!(normalize_resource_type(Some(&json!(42))), ResourceType::Video);
        assert_eq!(normalize_resource_type(Some(&json!(""))), ResourceType::Video);
    }

    #[test]
    fn test_difficulty_synonyms() {
        for (input, expected) in [
            ("Easy", Difficulty::Beginner),
            ("basic", Difficulty::Beginner),
            ("Medium", Difficulty::Intermediate),
            ("intermediate", Difficulty::Intermediate),
            ("Hard", Difficulty::Advanced),
            ("EXPERT", Difficulty::Advanced),
        ] {
            assert_eq!(
                normalize_difficulty(Some(&json!(input))),
                expected,
                "input {input:?}"
            );
        }
        assert_eq!(normalize_difficulty(None), Difficulty::Beginner);
        assert_eq!(
            normalize_difficulty(Some(&json!("impossible"))),
            Difficulty::Beginner
        );
    }

    #[test]
    fn test_node_type_synonyms() {
        for (input, expected) in [
            ("Required", NodeType::Core),
            ("essential", NodeType::Core),
            ("Elective", NodeType::Optional),
            ("practice", NodeType::Project),
            ("hands-on", NodeType::Project),
            ("alt", NodeType::Alternative),
            ("Alternative", NodeType::Alternative),
        ] {
            assert_eq!(
                normalize_node_type(Some(&json!(input))),
                expected,
                "input {input:?}"
            );
        }
        assert_eq!(normalize_node_type(None), NodeType::Core);
        assert_eq!(normalize_node_type(Some(&json!(true))), NodeType::Core);
    }

    #[test]
    fn test_phases_synthesized_from_sections() {
        let raw = json!({
            "sections": [
                {"id": "s1", "name": "Basics", "order": 1},
                {"id": "s2", "name": "Advanced", "order": 2}
            ],
            "nodes": [],
            "edges": []
        });
        let roadmap = parse_roadmap(&raw).unwrap();
        assert_eq!(roadmap.phases.len(), 2);
        assert_eq!(
            roadmap.phases[0],
            Phase {
                id: "s1".to_string(),
                name: "Basics".to_string(),
                order: 1
            }
        );
        assert_eq!(roadmap.phases[1].id, "s2");
        assert_eq!(roadmap.phases[1].order, 2);
    }

    #[test]
    fn test_explicit_phases_win_over_synthesis() {
        let raw = json!({
            "sections": [{"id": "s1", "name": "Basics", "order": 1}],
            "phases": [{"id": "phase-1", "name": "Foundation", "order": 1}],
            "nodes": [],
            "edges": []
        });
        let roadmap = parse_roadmap(&raw).unwrap();
        assert_eq!(roadmap.phases.len(), 1);
        assert_eq!(roadmap.phases[0].id, "phase-1");
    }

    #[test]
    fn test_empty_phases_array_suppresses_synthesis() {
        let raw = json!({
            "sections": [{"id": "s1", "name": "Basics", "order": 1}],
            "phases": [],
            "nodes": [],
            "edges": []
        });
        let roadmap = parse_roadmap(&raw).unwrap();
        assert!(roadmap.phases.is_empty());
    }

    #[test]
    fn test_section_defaults_generated_positionally() {
        let raw = json!({"sections": [{}, {"name": "Named"}], "nodes": [], "edges": []});
        let roadmap = parse_roadmap(&raw).unwrap();
        assert_eq!(roadmap.sections[0].id, "section-1");
        assert_eq!(roadmap.sections[0].name, "Section 1");
        assert_eq!(roadmap.sections[0].order, 1);
        assert_eq!(roadmap.sections[1].id, "section-2");
        assert_eq!(roadmap.sections[1].name, "Named");
        assert_eq!(roadmap.sections[1].order, 2);
    }

    #[test]
    fn test_subsections_normalized_recursively() {
        let raw = json!({
            "sections": [{
                "id": "s1",
                "name": "Basics",
                "order": 1,
                "subsections": [
                    {"name": "Markup"},
                    {"id": "sub-b", "name": "Styling", "order": 7}
                ]
            }],
            "nodes": [],
            "edges": []
        });
        let roadmap = parse_roadmap(&raw).unwrap();
        let subs = &roadmap.sections[0].subsections;
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].id, "subsection-1");
        assert_eq!(subs[0].order, 1);
        assert_eq!(subs[1].id, "sub-b");
        assert_eq!(subs[1].order, 7);
    }

    #[test]
    fn test_legacy_phase_id_fallback() {
        let raw = json!({
            "phases": [{"id": "phase-1", "name": "Foundation", "order": 1}],
            "nodes": [{"id": "n1", "phase_id": "phase-1"}],
            "edges": []
        });
        let roadmap = parse_roadmap(&raw).unwrap();
        assert_eq!(roadmap.nodes[0].section_id, "phase-1");
    }

    #[test]
    fn test_section_id_preferred_over_phase_id() {
        let raw = json!({
            "nodes": [{"id": "n1", "section_id": "s1", "phase_id": "phase-1"}],
            "edges": []
        });
        let roadmap = parse_roadmap(&raw).unwrap();
        assert_eq!(roadmap.nodes[0].section_id, "s1");
    }

    #[test]
    fn test_node_without_any_section_reference_gets_default() {
        let raw = json!({"nodes": [{"id": "n1"}], "edges": []});
        let roadmap = parse_roadmap(&raw).unwrap();
        assert_eq!(roadmap.nodes[0].section_id, "section-1");
    }

    #[test]
    fn test_node_field_defaults() {
        let raw = json!({"nodes": [{}], "edges": []});
        let roadmap = parse_roadmap(&raw).unwrap();
        let node = &roadmap.nodes[0];
        assert_eq!(node.id, "");
        assert_eq!(node.node_type, NodeType::Core);
        assert!(!node.is_hub);
        assert!(node.subsection_id.is_none());
        assert_eq!(node.data.label, "Unknown Topic");
        assert_eq!(node.data.description, "");
        assert_eq!(node.data.estimated_hours, 5);
        assert_eq!(node.data.difficulty, Difficulty::Beginner);
        assert!(node.data.prerequisites.is_empty());
        assert!(node.data.learning_outcomes.is_empty());
        assert!(node.data.learning_resources.keywords.is_empty());
        assert_eq!(
            node.data.learning_resources.suggested_type,
            ResourceType::Video
        );
    }

    #[test]
    fn test_estimated_hours_floor_is_one() {
        let raw = json!({
            "nodes": [
                {"data": {"estimated_hours": 0}},
                {"data": {"estimated_hours": -3}},
                {"data": {"estimated_hours": 12}}
            ],
            "edges": []
        });
        let roadmap = parse_roadmap(&raw).unwrap();
        assert_eq!(roadmap.nodes[0].data.estimated_hours, 1);
        // negative is malformed, coerced to the default
        assert_eq!(roadmap.nodes[1].data.estimated_hours, 5);
        assert_eq!(roadmap.nodes[2].data.estimated_hours, 12);
    }

    #[test]
    fn test_node_detail_fields_carried_through() {
        let raw = json!({
            "nodes": [{
                "id": "n1",
                "section_id": "s1",
                "subsection_id": "sub-1",
                "is_hub": true,
                "data": {
                    "label": "React",
                    "prerequisites": ["JavaScript", "HTML"],
                    "learning_outcomes": ["Build SPAs"],
                    "learning_resources": {"keywords": ["react tutorial"]}
                }
            }],
            "edges": []
        });
        let roadmap = parse_roadmap(&raw).unwrap();
        let node = &roadmap.nodes[0];
        assert!(node.is_hub);
        assert_eq!(node.subsection_id.as_deref(), Some("sub-1"));
        assert_eq!(node.data.prerequisites, vec!["JavaScript", "HTML"]);
        assert_eq!(node.data.learning_outcomes, vec!["Build SPAs"]);
        assert_eq!(node.data.learning_resources.keywords, vec!["react tutorial"]);
    }

    #[test]
    fn test_malformed_nodes_are_coerced_not_dropped() {
        let raw = json!({
            "nodes": [
                {"id": 17, "type": 3, "data": "garbage"},
                {"id": "n2", "data": {"label": "Real"}}
            ],
            "edges": []
        });
        let roadmap = parse_roadmap(&raw).unwrap();
        assert_eq!(roadmap.nodes.len(), 2);
        assert_eq!(roadmap.nodes[0].id, "");
        assert_eq!(roadmap.nodes[0].data.label, "Unknown Topic");
        assert_eq!(roadmap.nodes[1].data.label, "Real");
    }

    #[test]
    fn test_edge_defaults() {
        let raw = json!({
            "nodes": [],
            "edges": [
                {"source": "n1", "target": "n2"},
                {"id": "custom"},
                "garbage"
            ]
        });
        let roadmap = parse_roadmap(&raw).unwrap();
        assert_eq!(roadmap.edges.len(), 3);
        assert_eq!(roadmap.edges[0].id, "e0");
        assert_eq!(roadmap.edges[0].source, "n1");
        assert_eq!(roadmap.edges[1].id, "custom");
        assert_eq!(roadmap.edges[1].source, "");
        assert_eq!(roadmap.edges[1].target, "");
        assert_eq!(roadmap.edges[2].id, "e2");
    }

    #[test]
    fn test_dangling_section_reference_is_tolerated() {
        let raw = json!({
            "sections": [{"id": "s1", "name": "Basics", "order": 1}],
            "nodes": [{"id": "n1", "section_id": "nowhere"}],
            "edges": []
        });
        let roadmap = parse_roadmap(&raw).unwrap();
        assert_eq!(roadmap.nodes[0].section_id, "nowhere");
    }

    #[test]
    fn test_total_hours_coercion() {
        let raw = json!({"total_estimated_hours": 120.9, "nodes": [], "edges": []});
        assert_eq!(parse_roadmap(&raw).unwrap().total_estimated_hours, 120);
        let raw = json!({"total_estimated_hours": "lots", "nodes": [], "edges": []});
        assert_eq!(parse_roadmap(&raw).unwrap().total_estimated_hours, 0);
        let raw = json!({"total_estimated_hours": -40, "nodes": [], "edges": []});
        assert_eq!(parse_roadmap(&raw).unwrap().total_estimated_hours, 0);
    }

    // Full scenario: legacy enum spellings plus new-style sections.
    #[test]
    fn test_sectioned_payload_with_synonym_enums() {
        let raw = json!({
            "sections": [{"id": "s1", "name": "Basics", "order": 1}],
            "nodes": [{
                "id": "n1",
                "section_id": "s1",
                "type": "Required",
                "data": {
                    "label": "HTML",
                    "estimated_hours": 5,
                    "difficulty": "Easy",
                    "learning_resources": {"suggested_type": "Docs"}
                }
            }],
            "edges": []
        });
        let roadmap = parse_roadmap(&raw).unwrap();
        let node = &roadmap.nodes[0];
        assert_eq!(node.node_type, NodeType::Core);
        assert_eq!(node.data.difficulty, Difficulty::Beginner);
        assert_eq!(node.data.learning_resources.suggested_type, ResourceType::Doc);
        assert_eq!(
            roadmap.phases,
            vec![Phase {
                id: "s1".to_string(),
                name: "Basics".to_string(),
                order: 1
            }]
        );
    }
}
