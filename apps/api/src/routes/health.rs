use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
/// Returns a simple status object with service version.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "roadmap-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health
/// Detailed health check: configured provider and a key-prefix preview.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "groq_configured": !state.config.groq_api_key.is_empty(),
        "api_key_preview": state.config.api_key_preview(),
        "model": state.config.groq_model,
        "provider": "groq"
    }))
}
