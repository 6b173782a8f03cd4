/// LLM clients — the single point of entry for all model calls.
///
/// ARCHITECTURAL RULE: No other module may call a model API directly.
/// All LLM interactions MUST go through this module.
///
/// Hosted provider: Groq's OpenAI-compatible chat completions API (JSON mode).
/// Local fallback: Ollama (see `ollama`).
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

pub mod ollama;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const MAX_RETRIES: u32 = 3;
/// Buffer size for streamed chunk channels.
const STREAM_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("model returned empty content")]
    EmptyContent,
}

/// Output of one JSON-mode model call, provider-agnostic.
#[derive(Debug, Clone)]
pub struct ModelOutput {
    pub model: String,
    pub data: Value,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A model backend able to produce a roadmap JSON object from a prompt.
///
/// Implemented by `GroqClient` (hosted) and `ollama::OllamaClient` (local)
/// so the generator can fail over without knowing the concrete backend.
#[async_trait]
pub trait RoadmapModel: Send + Sync {
    fn name(&self) -> &'static str;
    async fn generate_json(&self, system: &str, prompt: &str) -> Result<ModelOutput, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (OpenAI-compatible chat completions)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f64,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the assistant text from the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Groq client
// ────────────────────────────────────────────────────────────────────────────

/// Client for the hosted Groq chat completions API.
/// Wraps the endpoint with retry logic, JSON-mode decoding, and streaming.
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl GroqClient {
    pub fn new(api_key: String, model: String, temperature: f64, max_tokens: u32) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model,
            temperature,
            max_tokens,
        }
    }

    /// Makes a JSON-mode call, returning the full response object.
    /// Retries on 429 (rate limit), 5xx, and connection errors with
    /// exponential backoff.
    pub async fn call(&self, system: &str, prompt: &str) -> Result<ChatResponse, LlmError> {
        let request_body = self.request_body(system, prompt, false);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Groq call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(GROQ_API_URL)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Groq API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorBody>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let chat_response: ChatResponse = response.json().await?;

            if let Some(usage) = &chat_response.usage {
                debug!(
                    "Groq call succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            return Ok(chat_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Streams raw assistant text chunks from the chat completions API.
    ///
    /// Chunks are forwarded untouched; the channel closes after the
    /// terminating `[DONE]` marker or on the first error.
    pub async fn stream(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<mpsc::Receiver<Result<String, LlmError>>, LlmError> {
        let request_body = self.request_body(system, prompt, true);

        let response = self
            .client
            .post(GROQ_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut buffer = String::new();
            let stream = response.bytes_stream();
            tokio::pin!(stream);

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(LlmError::Http(e))).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buffer.find('\n') {
                    let line: String = buffer.drain(..=pos).collect();
                    let Some(data) = line.trim().strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data == "[DONE]" {
                        return;
                    }
                    if let Some(content) = parse_stream_delta(data) {
                        if !content.is_empty() && tx.send(Ok(content)).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    fn request_body<'a>(&'a self, system: &'a str, prompt: &'a str, stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream,
        }
    }
}

#[async_trait]
impl RoadmapModel for GroqClient {
    fn name(&self) -> &'static str {
        "groq"
    }

    async fn generate_json(&self, system: &str, prompt: &str) -> Result<ModelOutput, LlmError> {
        let response = self.call(system, prompt).await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;
        let data: Value = serde_json::from_str(strip_json_fences(text))?;

        let usage = response.usage.clone().unwrap_or_default();
        Ok(ModelOutput {
            model: response.model.clone(),
            data,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
    }
}

/// Extracts the delta content from one streamed SSE data payload.
/// Returns `None` for keep-alives, partial lines, and empty deltas.
fn parse_stream_delta(data: &str) -> Option<String> {
    serde_json::from_str::<StreamChunk>(data)
        .ok()?
        .choices
        .into_iter()
        .next()?
        .delta
        .content
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
/// JSON mode should prevent fences, but smaller models wrap anyway.
pub(crate) fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_request_body_enables_json_mode() {
        let client = GroqClient::new(
            "key".to_string(),
            "llama-3.3-70b-versatile".to_string(),
            0.7,
            8000,
        );
        let body = client.request_body("system", "prompt", false);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "prompt");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_parse_stream_delta_extracts_content() {
        let data = r#"{"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(parse_stream_delta(data), Some("Hel".to_string()));
    }

    #[test]
    fn test_parse_stream_delta_tolerates_empty_delta() {
        assert_eq!(parse_stream_delta(r#"{"choices":[{"delta":{}}]}"#), None);
        assert_eq!(parse_stream_delta(r#"{"choices":[]}"#), None);
        assert_eq!(parse_stream_delta("not json"), None);
    }

    #[test]
    fn test_chat_response_text_takes_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"model":"llama-3.3-70b-versatile","choices":[{"message":{"content":"{}"}}],"usage":{"prompt_tokens":10,"completion_tokens":5}}"#,
        )
        .unwrap();
        assert_eq!(response.text(), Some("{}"));
        assert_eq!(response.usage.as_ref().unwrap().prompt_tokens, 10);
    }
}
