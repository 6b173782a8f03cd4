use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub groq_model: String,
    pub groq_max_tokens: u32,
    pub groq_temperature: f64,
    pub ollama_base_url: String,
    pub ollama_chat_model: String,
    pub prompt_version: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            groq_api_key: require_env("GROQ_API_KEY")?,
            groq_model: env_or("GROQ_MODEL", "llama-3.3-70b-versatile"),
            // 8000 tokens fits the detailed 40-60 node roadmaps
            groq_max_tokens: env_or("GROQ_MAX_TOKENS", "8000")
                .parse::<u32>()
                .context("GROQ_MAX_TOKENS must be a number")?,
            groq_temperature: env_or("GROQ_TEMPERATURE", "0.7")
                .parse::<f64>()
                .context("GROQ_TEMPERATURE must be a number")?,
            ollama_base_url: env_or("OLLAMA_BASE_URL", "http://localhost:11434"),
            ollama_chat_model: env_or("OLLAMA_CHAT_MODEL", "qwen2.5-coder:7b-instruct"),
            prompt_version: env_or("PROMPT_VERSION", "2.0.0"),
            port: env_or("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// First characters of the Groq key for health reporting. Never the key.
    pub fn api_key_preview(&self) -> String {
        if self.groq_api_key.len() > 10 {
            format!("{}...", &self.groq_api_key[..10])
        } else {
            "NOT SET".to_string()
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
