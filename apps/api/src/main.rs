mod config;
mod errors;
mod llm_client;
mod models;
mod roadmap;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::ollama::OllamaClient;
use crate::llm_client::GroqClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Roadmap AI Service v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Groq model: {} (key: {})",
        config.groq_model,
        config.api_key_preview()
    );

    // Initialize LLM clients: hosted primary plus local fallback
    let groq = GroqClient::new(
        config.groq_api_key.clone(),
        config.groq_model.clone(),
        config.groq_temperature,
        config.groq_max_tokens,
    );
    let ollama = OllamaClient::new(
        config.ollama_base_url.clone(),
        config.ollama_chat_model.clone(),
    );
    info!("LLM clients initialized (fallback: {})", config.ollama_chat_model);

    // Build app state
    let state = AppState {
        groq,
        ollama,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
