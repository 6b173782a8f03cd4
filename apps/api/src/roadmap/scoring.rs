//! Personalization scoring — measures how well a generated roadmap matches
//! the requesting profile.
//!
//! Pure and total: degenerate inputs (zero available hours, empty node list)
//! zero out the affected component instead of failing.

use std::collections::HashSet;

use crate::models::profile::UserProfileRequest;
use crate::models::roadmap::{NodeType, Roadmap};

const TIME_FIT_WEIGHT: f64 = 0.4;
const DIFFICULTY_MATCH_WEIGHT: f64 = 0.3;
const STRUCTURE_WEIGHT: f64 = 0.3;

/// Weighted sum of time-fit, starting-difficulty match, and structural
/// richness, clamped to `[0, 1]` and rounded to two decimals.
pub fn calculate_personalization_score(profile: &UserProfileRequest, roadmap: &Roadmap) -> f64 {
    let score = TIME_FIT_WEIGHT * time_fit_score(profile, roadmap)
        + DIFFICULTY_MATCH_WEIGHT * difficulty_match_score(profile, roadmap)
        + STRUCTURE_WEIGHT * structure_score(roadmap);

    (score.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// Maximal when the roadmap exactly fills the available time budget,
/// decaying linearly in either direction, floored at zero.
fn time_fit_score(profile: &UserProfileRequest, roadmap: &Roadmap) -> f64 {
    let available = profile.available_hours();
    if available == 0 {
        return 0.0;
    }
    let ratio = roadmap.total_estimated_hours as f64 / available as f64;
    (1.0 - (1.0 - ratio).abs()).max(0.0)
}

/// Compares the mean difficulty of the roadmap's first section (or first
/// legacy phase) against the user's level. Contributes 0 when the roadmap
/// declares no groups or the first group holds no nodes.
fn difficulty_match_score(profile: &UserProfileRequest, roadmap: &Roadmap) -> f64 {
    let first_group_id = roadmap
        .sections
        .first()
        .map(|s| s.id.as_str())
        .or_else(|| roadmap.phases.first().map(|p| p.id.as_str()));
    let Some(first_group_id) = first_group_id else {
        return 0.0;
    };

    let difficulties: Vec<f64> = roadmap
        .nodes
        .iter()
        .filter(|n| n.section_id == first_group_id)
        .map(|n| n.data.difficulty.level())
        .collect();
    if difficulties.is_empty() {
        return 0.0;
    }

    let mean = difficulties.iter().sum::<f64>() / difficulties.len() as f64;
    (1.0 - (mean - profile.skill_level.level()).abs() / 3.0).max(0.0)
}

/// Three independent bonuses: enough learning stages, good edge
/// connectivity, and node-type variety.
fn structure_score(roadmap: &Roadmap) -> f64 {
    let mut score = 0.0;

    let group_count = if roadmap.sections.is_empty() {
        roadmap.phases.len()
    } else {
        roadmap.sections.len()
    };
    if group_count >= 3 {
        score += 0.4;
    }

    if roadmap.edges.len() as f64 >= roadmap.nodes.len() as f64 * 0.8 {
        score += 0.3;
    }

    let node_types: HashSet<NodeType> = roadmap.nodes.iter().map(|n| n.node_type).collect();
    if node_types.len() >= 2 {
        score += 0.3;
    }

    score
}
