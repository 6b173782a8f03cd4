//! User learning-profile request models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    /// Numeric level used by the personalization scorer.
    pub fn level(self) -> f64 {
        match self {
            SkillLevel::Beginner => 1.0,
            SkillLevel::Intermediate => 2.0,
            SkillLevel::Advanced => 3.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    Documentation,
    Video,
    Project,
    Interactive,
}

impl LearningStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            LearningStyle::Documentation => "documentation",
            LearningStyle::Video => "video",
            LearningStyle::Project => "project",
            LearningStyle::Interactive => "interactive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredLanguage {
    #[default]
    Vi,
    En,
}

/// User profile driving roadmap personalization.
/// Defaults mirror the public API contract; range limits are enforced by
/// `validate` at the HTTP boundary, not by deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileRequest {
    pub current_role: String,
    pub target_role: String,
    #[serde(default)]
    pub current_skills: Vec<String>,
    #[serde(default)]
    pub skill_level: SkillLevel,
    #[serde(default = "default_learning_style")]
    pub learning_style: Vec<LearningStyle>,
    #[serde(default = "default_hours_per_week")]
    pub hours_per_week: u32,
    #[serde(default = "default_target_months")]
    pub target_months: u32,
    #[serde(default)]
    pub preferred_language: PreferredLanguage,
    #[serde(default)]
    pub focus_areas: Option<Vec<String>>,
}

fn default_learning_style() -> Vec<LearningStyle> {
    vec![LearningStyle::Video]
}

fn default_hours_per_week() -> u32 {
    10
}

fn default_target_months() -> u32 {
    6
}

impl UserProfileRequest {
    /// Total study hours available over the whole timeline (4 weeks/month).
    pub fn available_hours(&self) -> u32 {
        self.hours_per_week * self.target_months * 4
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.current_role.trim().is_empty() {
            return Err("current_role cannot be empty".to_string());
        }
        if self.target_role.trim().is_empty() {
            return Err("target_role cannot be empty".to_string());
        }
        if !(1..=60).contains(&self.hours_per_week) {
            return Err(format!(
                "hours_per_week must be between 1 and 60 (got {})",
                self.hours_per_week
            ));
        }
        if !(1..=24).contains(&self.target_months) {
            return Err(format!(
                "target_months must be between 1 and 24 (got {})",
                self.target_months
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRoadmapRequest {
    pub profile: UserProfileRequest,
}

/// Request for an AI explanation of a single roadmap topic.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeDetailRequest {
    pub topic: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default = "default_user_level")]
    pub user_level: SkillLevel,
}

fn default_user_level() -> SkillLevel {
    SkillLevel::Intermediate
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_profile() -> UserProfileRequest {
        serde_json::from_value(json!({
            "current_role": "Third-year student",
            "target_role": "Frontend Developer"
        }))
        .unwrap()
    }

    #[test]
    fn test_profile_defaults() {
        let profile = minimal_profile();
        assert_eq!(profile.skill_level, SkillLevel::Beginner);
        assert_eq!(profile.learning_style, vec![LearningStyle::Video]);
        assert_eq!(profile.hours_per_week, 10);
        assert_eq!(profile.target_months, 6);
        assert_eq!(profile.preferred_language, PreferredLanguage::Vi);
        assert!(profile.current_skills.is_empty());
        assert!(profile.focus_areas.is_none());
    }

    #[test]
    fn test_available_hours_arithmetic() {
        let profile = minimal_profile();
        // 10 h/week * 6 months * 4 weeks
        assert_eq!(profile.available_hours(), 240);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(minimal_profile().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_hours_out_of_range() {
        let mut profile = minimal_profile();
        profile.hours_per_week = 0;
        assert!(profile.validate().is_err());
        profile.hours_per_week = 61;
        assert!(profile.validate().is_err());
        profile.hours_per_week = 60;
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_months_out_of_range() {
        let mut profile = minimal_profile();
        profile.target_months = 0;
        assert!(profile.validate().is_err());
        profile.target_months = 25;
        assert!(profile.validate().is_err());
        profile.target_months = 24;
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_roles() {
        let mut profile = minimal_profile();
        profile.target_role = "  ".to_string();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_node_detail_default_level_is_intermediate() {
        let request: NodeDetailRequest =
            serde_json::from_value(json!({"topic": "CSS Grid"})).unwrap();
        assert_eq!(request.user_level, SkillLevel::Intermediate);
        assert!(request.context.is_none());
    }

    #[test]
    fn test_skill_level_deserializes_lowercase() {
        let level: SkillLevel = serde_json::from_str(r#""advanced""#).unwrap();
        assert_eq!(level, SkillLevel::Advanced);
    }
}
