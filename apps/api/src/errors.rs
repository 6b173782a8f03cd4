use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::roadmap::normalize::RoadmapParseError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Roadmap parse error: {0}")]
    RoadmapParse(#[from] RoadmapParseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::RoadmapParse(e) => {
                tracing::error!("Roadmap parse error: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "ROADMAP_PARSE_ERROR",
                    "The AI response could not be interpreted as a roadmap".to_string(),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                match e {
                    LlmError::RateLimited { .. } | LlmError::Api { status: 429, .. } => (
                        StatusCode::TOO_MANY_REQUESTS,
                        "LLM_RATE_LIMITED",
                        "The AI provider is rate limiting requests. Wait a minute and retry."
                            .to_string(),
                    ),
                    LlmError::Http(_) => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "LLM_UNAVAILABLE",
                        "Could not reach the AI provider".to_string(),
                    ),
                    _ => (
                        StatusCode::BAD_GATEWAY,
                        "LLM_UPSTREAM_ERROR",
                        "The AI provider returned an unusable response".to_string(),
                    ),
                }
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
