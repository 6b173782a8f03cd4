pub mod health;
pub mod ollama;

use axum::{
    routing::{get, post},
    Router,
};

use crate::roadmap::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        // Roadmap API
        .route("/api/generate-roadmap", post(handlers::handle_generate))
        .route(
            "/api/generate-roadmap/stream",
            post(handlers::handle_generate_stream),
        )
        .route(
            "/api/validate-profile",
            post(handlers::handle_validate_profile),
        )
        .route("/api/node-detail", post(handlers::handle_node_detail))
        // Local model API
        .route("/api/ollama/health", get(ollama::handle_health))
        .route("/api/ollama/models", get(ollama::handle_models))
        .route("/api/ollama/chat", post(ollama::handle_chat))
        .route("/api/ollama/generate", post(ollama::handle_generate))
        .with_state(state)
}
