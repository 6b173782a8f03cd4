use crate::config::Config;
use crate::llm_client::ollama::OllamaClient;
use crate::llm_client::GroqClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Hosted provider, primary backend for roadmap generation.
    pub groq: GroqClient,
    /// Local model, generation fallback and the `/api/ollama/*` backend.
    pub ollama: OllamaClient,
    pub config: Config,
}
