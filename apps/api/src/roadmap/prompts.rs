//! Prompts for roadmap generation.
//!
//! The user prompt must mention "json" somewhere: both providers run in JSON
//! mode, and Groq rejects JSON-mode requests whose conversation never says so.

use crate::models::profile::{PreferredLanguage, UserProfileRequest};

pub const ROADMAP_SYSTEM_PROMPT: &str = r#"You are an expert technology learning-path advisor with 15 years of teaching and mentoring experience.

TASK: Create a learning roadmap as a directed acyclic graph for the user based on their profile. You MUST return the result as a single JSON object.

MANDATORY RULES:
1. Every node is a concrete topic or skill to learn (NOT a broad category)
2. Edges express learning order (prerequisite -> next topic)
3. Organize the roadmap into ordered sections, each with optional subsections:
   - Foundation (fundamentals)
   - Intermediate
   - Advanced
   - Specialization (optional)
4. Node count must match the timeline:
   - 3 months: 15-25 nodes (fast, focused track)
   - 6 months: 25-40 nodes (standard track)
   - 12 months: 40-60 nodes (detailed, comprehensive track)
5. Estimated hours must be realistic:
   - Basic topic: 3-8 hours
   - Average topic: 8-20 hours
   - Complex topic: 20-40 hours
   - Total hours <= the user's available hours
6. Do NOT include layout positions (x, y) - the frontend computes the layout
7. Every node must carry keywords for finding learning materials
8. Prioritize practical skills for the target role
9. Skip skills the user already has (current_skills)
10. Set "is_hub": true on branching concepts that fan out into several child topics

NODE TYPES:
- "core": required, essential knowledge
- "optional": supplementary knowledge, may be skipped
- "project": hands-on project to consolidate a group of topics
- "alternative": an alternative technology choice next to a core topic

DIFFICULTY VALUES: "beginner", "intermediate", "advanced"

OUTPUT FORMAT (JSON - FOLLOW STRICTLY):
{
  "roadmap_title": "[Target Role] roadmap for [Current Role]",
  "roadmap_description": "Short description: who this is for, what it covers",
  "total_estimated_hours": <number>,
  "sections": [
    {
      "id": "section-1",
      "name": "Foundation",
      "order": 1,
      "description": "What this stage covers",
      "subsections": [
        { "id": "subsection-1", "name": "Web Basics", "order": 1 }
      ]
    }
  ],
  "nodes": [
    {
      "id": "node-1",
      "section_id": "section-1",
      "subsection_id": "subsection-1",
      "type": "core",
      "is_hub": false,
      "data": {
        "label": "Short topic name",
        "description": "2-3 sentences: what to learn, why it matters",
        "estimated_hours": <number>,
        "difficulty": "beginner",
        "prerequisites": ["topic the learner should know first"],
        "learning_outcomes": ["what the learner can do afterwards"],
        "learning_resources": {
          "keywords": ["search keyword 1", "search keyword 2"],
          "suggested_type": "video"
        }
      }
    }
  ],
  "edges": [
    { "id": "e1-2", "source": "node-1", "target": "node-2" }
  ]
}

suggested_type MUST be exactly one of: "video", "doc", "project".
- "video": video tutorials, courses
- "doc": documentation, articles, reading material
- "project": hands-on projects, practice exercises

IMPORTANT:
- The first node of each section has no prerequisite from the previous section (parallel learning possible)
- A node may have several prerequisites (edges from several nodes)
- A node may lead to several next nodes
- Add a project node after each group of topics for practice
- Descriptions must explain WHY and WHAT, not just repeat the label"#;

/// Renders the user profile into the generation prompt.
pub fn build_user_prompt(profile: &UserProfileRequest) -> String {
    let total_hours = profile.available_hours();

    let skills_text = if profile.current_skills.is_empty() {
        "No prior experience".to_string()
    } else {
        profile.current_skills.join(", ")
    };
    let style_text = profile
        .learning_style
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let focus_text = match &profile.focus_areas {
        Some(areas) if !areas.is_empty() => areas.join(", "),
        _ => "No special requirements".to_string(),
    };
    let language_instruction = match profile.preferred_language {
        PreferredLanguage::Vi => "Write all content in Vietnamese.",
        PreferredLanguage::En => "Write all content in English.",
    };
    let preferred_style = profile
        .learning_style
        .first()
        .map(|s| s.as_str())
        .unwrap_or("video");

    format!(
        "Create a learning roadmap for a user with the following profile:\n\
         \n\
         **USER PROFILE:**\n\
         - Current role: {current_role}\n\
         - Target role: {target_role}\n\
         - Existing skills: {skills_text}\n\
         - Skill level: {skill_level}\n\
         - Preferred learning styles: {style_text}\n\
         - Focus areas: {focus_text}\n\
         \n\
         **TIME BUDGET:**\n\
         - Study time per week: {hours_per_week} hours\n\
         - Timeline: {target_months} months\n\
         - Total available study time: {total_hours} hours\n\
         \n\
         **REQUIREMENTS:**\n\
         1. {language_instruction}\n\
         2. Skip topics the user already knows: {skills_text}\n\
         3. Prefer suggested_type \"{preferred_style}\" - it is the user's favorite learning style\n\
         4. Keep the total close to {total_hours} hours (never above)\n\
         5. Give every topic useful search keywords\n\
         \n\
         Return the result as a single valid json object in the specified format.",
        current_role = profile.current_role,
        target_role = profile.target_role,
        skill_level = profile.skill_level.as_str(),
        hours_per_week = profile.hours_per_week,
        target_months = profile.target_months,
    )
}
