//! Route handlers for the local Ollama model surface: health, model listing,
//! chat (plain and SSE-streamed), and text generation.

use axum::{
    extract::State,
    http::StatusCode,
    response::{sse::KeepAlive, sse::Sse, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::errors::AppError;
use crate::llm_client::ollama::{OllamaGenerateResult, OllamaMessage};
use crate::roadmap::handlers::sse_events;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<OllamaMessage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_chat_temperature")]
    pub temperature: f64,
    #[serde(default = "default_chat_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub stream: bool,
}

fn default_chat_temperature() -> f64 {
    0.3
}

fn default_chat_max_tokens() -> u32 {
    2048
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_generate_temperature")]
    pub temperature: f64,
    #[serde(default = "default_generate_max_tokens")]
    pub max_tokens: u32,
}

fn default_generate_temperature() -> f64 {
    0.2
}

fn default_generate_max_tokens() -> u32 {
    256
}

/// GET /api/ollama/health
/// Reports server status and available models; 503 when unreachable.
pub async fn handle_health(State(state): State<AppState>) -> Response {
    let health = state.ollama.health().await;
    if health.status == "disconnected" {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "disconnected",
                "error": health.error,
                "hint": "Start Ollama with: ollama serve"
            })),
        )
            .into_response();
    }
    Json(health).into_response()
}

/// GET /api/ollama/models
pub async fn handle_models(State(state): State<AppState>) -> Response {
    let models = state.ollama.list_models().await;
    Json(json!({
        "count": models.len(),
        "models": models
    }))
    .into_response()
}

/// POST /api/ollama/chat
/// Chat completion on the local model, plain JSON or SSE-streamed.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    if request.messages.is_empty() {
        return Err(AppError::Validation("messages cannot be empty".to_string()));
    }

    if request.stream {
        let chunks = state
            .ollama
            .chat_stream(
                &request.messages,
                request.model.as_deref(),
                request.temperature,
                request.max_tokens,
            )
            .await?;
        return Ok(Sse::new(sse_events(chunks))
            .keep_alive(KeepAlive::default())
            .into_response());
    }

    let result = state
        .ollama
        .chat(
            &request.messages,
            request.model.as_deref(),
            request.temperature,
            request.max_tokens,
        )
        .await?;
    Ok(Json(result).into_response())
}

/// POST /api/ollama/generate
/// Plain text completion (non-chat) on the local model.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<OllamaGenerateResult>, AppError> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }

    let result = state
        .ollama
        .generate(
            &request.prompt,
            request.model.as_deref(),
            request.temperature,
            request.max_tokens,
        )
        .await?;
    Ok(Json(result))
}
