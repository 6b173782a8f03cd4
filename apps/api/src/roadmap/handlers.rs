//! Axum route handlers for the roadmap API.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::errors::AppError;
use crate::llm_client::LlmError;
use crate::models::profile::{GenerateRoadmapRequest, NodeDetailRequest, UserProfileRequest};
use crate::models::roadmap::RoadmapResponse;
use crate::roadmap::generator::generate_roadmap;
use crate::roadmap::prompts::{build_user_prompt, ROADMAP_SYSTEM_PROMPT};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ValidateProfileResponse {
    pub valid: bool,
    pub total_available_hours: u32,
    pub estimated_nodes: &'static str,
    pub profile_summary: ProfileSummary,
}

#[derive(Debug, Serialize)]
pub struct ProfileSummary {
    pub from: String,
    pub to: String,
    pub duration: String,
    pub intensity: String,
}

#[derive(Debug, Serialize)]
pub struct NodeDetailResponse {
    pub description: String,
    pub related_concepts: Vec<String>,
    pub free_resources: Vec<ResourceLink>,
    pub ai_tutor_content: String,
}

#[derive(Debug, Serialize)]
pub struct ResourceLink {
    #[serde(rename = "type")]
    pub resource_type: &'static str,
    pub title: String,
    pub url: String,
    pub source: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate-roadmap
///
/// Full generation pipeline: prompt → provider (with local fallback) →
/// normalization → personalization score.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRoadmapRequest>,
) -> Result<Json<RoadmapResponse>, AppError> {
    request.profile.validate().map_err(AppError::Validation)?;

    let response =
        generate_roadmap(&request.profile, &state.groq, &state.ollama, &state.config).await?;

    Ok(Json(response))
}

/// POST /api/generate-roadmap/stream
///
/// Streams the hosted provider's raw output over SSE: `chunk` events with
/// text forwarded untouched, one final `complete` event with the collected
/// text. The normalizer is not invoked on this path.
pub async fn handle_generate_stream(
    State(state): State<AppState>,
    Json(request): Json<GenerateRoadmapRequest>,
) -> Result<Sse<ReceiverStream<Result<Event, Infallible>>>, AppError> {
    request.profile.validate().map_err(AppError::Validation)?;

    let prompt = build_user_prompt(&request.profile);
    let chunks = state.groq.stream(ROADMAP_SYSTEM_PROMPT, &prompt).await?;

    Ok(Sse::new(sse_events(chunks)).keep_alive(KeepAlive::default()))
}

/// POST /api/validate-profile
///
/// Range validation plus a preview of the expected output size.
/// Useful for form validation before the expensive generation call.
pub async fn handle_validate_profile(
    Json(profile): Json<UserProfileRequest>,
) -> Result<Json<ValidateProfileResponse>, AppError> {
    profile.validate().map_err(AppError::Validation)?;

    Ok(Json(ValidateProfileResponse {
        valid: true,
        total_available_hours: profile.available_hours(),
        estimated_nodes: estimated_nodes_for(profile.target_months),
        profile_summary: ProfileSummary {
            from: profile.current_role.clone(),
            to: profile.target_role.clone(),
            duration: format!("{} months", profile.target_months),
            intensity: format!("{} hours/week", profile.hours_per_week),
        },
    }))
}

/// POST /api/node-detail
///
/// Level-tailored explanation and search resources for a single topic.
pub async fn handle_node_detail(
    Json(request): Json<NodeDetailRequest>,
) -> Result<Json<NodeDetailResponse>, AppError> {
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(AppError::Validation("topic cannot be empty".to_string()));
    }

    let query = search_query(topic);
    let mut description = level_description(topic, request.user_level.as_str());
    if let Some(context) = request.context.as_deref().filter(|c| !c.trim().is_empty()) {
        description.push_str(&format!(" It usually comes up while studying {context}."));
    }

    let free_resources = vec![
        ResourceLink {
            resource_type: "article",
            title: format!("Introduction to {topic}"),
            url: format!("https://developer.mozilla.org/en-US/search?q={query}"),
            source: "MDN Web Docs",
        },
        ResourceLink {
            resource_type: "article",
            title: format!("{topic} articles"),
            url: format!("https://dev.to/search?q={query}"),
            source: "DEV Community",
        },
        ResourceLink {
            resource_type: "video",
            title: format!("{topic} tutorial for beginners"),
            url: format!("https://www.youtube.com/results?search_query={query}+tutorial"),
            source: "YouTube",
        },
    ];

    let related_concepts = vec![
        format!("{topic} basics"),
        format!("{topic} best practices"),
        format!("Advanced {topic}"),
    ];

    let ai_tutor_content = format!(
        "## {topic}\n\n{description}\n\n\
         ### Key points\n\
         1. Understand the core concepts of {topic}\n\
         2. Practice with small, focused examples\n\
         3. Apply it in a real project\n\n\
         ### Study tips\n\
         - Start with the official documentation\n\
         - Watch a tutorial for a visual walkthrough\n\
         - Do hands-on exercises to consolidate what you learned\n"
    );

    Ok(Json(NodeDetailResponse {
        description,
        related_concepts,
        free_resources,
        ai_tutor_content,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Bridges a channel of raw text chunks into the SSE event protocol shared by
/// the streaming endpoints: `chunk` per piece, `complete` with the collected
/// text, `error` on failure.
pub(crate) fn sse_events(
    mut chunks: mpsc::Receiver<Result<String, LlmError>>,
) -> ReceiverStream<Result<Event, Infallible>> {
    let (tx, out) = mpsc::channel(32);

    tokio::spawn(async move {
        let mut collected = String::new();
        while let Some(item) = chunks.recv().await {
            match item {
                Ok(chunk) => {
                    collected.push_str(&chunk);
                    let event = Event::default()
                        .event("chunk")
                        .data(json!({ "content": chunk }).to_string());
                    if tx.send(Ok(event)).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    let event = Event::default()
                        .event("error")
                        .data(json!({ "error": e.to_string() }).to_string());
                    let _ = tx.send(Ok(event)).await;
                    return;
                }
            }
        }
        let event = Event::default()
            .event("complete")
            .data(json!({ "content": collected }).to_string());
        let _ = tx.send(Ok(event)).await;
    });

    ReceiverStream::new(out)
}

/// Expected node-count bucket for a timeline, mirroring the generation
/// prompt's guidance.
fn estimated_nodes_for(target_months: u32) -> &'static str {
    if target_months <= 3 {
        "15-25"
    } else if target_months <= 6 {
        "25-40"
    } else {
        "40-60"
    }
}

fn search_query(topic: &str) -> String {
    topic.split_whitespace().collect::<Vec<_>>().join("+")
}

fn level_description(topic: &str, level: &str) -> String {
    match level {
        "beginner" => format!(
            "{topic} is a foundational concept. You will learn how to use {topic} to build modern applications, starting from first principles."
        ),
        "advanced" => format!(
            "{topic} has advanced features and non-obvious patterns. Mastering {topic} helps you optimize and scale real systems."
        ),
        _ => format!(
            "{topic} is an important part of professional development work. A solid grasp of {topic} makes your code more effective and maintainable."
        ),
    }
}
