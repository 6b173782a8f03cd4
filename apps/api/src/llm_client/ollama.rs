//! Local model fallback via Ollama.
//!
//! Serves two roles: the `RoadmapModel` fallback when the hosted provider is
//! down, and the backing client for the `/api/ollama/*` endpoints (health,
//! model listing, chat, generation).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::debug;

use super::{strip_json_fences, LlmError, ModelOutput, RoadmapModel, STREAM_CHANNEL_CAPACITY};

const TIMEOUT_CHAT: Duration = Duration::from_secs(300);
const TIMEOUT_COMPLETION: Duration = Duration::from_secs(120);
const TIMEOUT_HEALTH: Duration = Duration::from_secs(10);

/// Sampling defaults for JSON-mode fallback generation.
const JSON_TEMPERATURE: f64 = 0.3;
const JSON_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [OllamaMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
    num_predict: u32,
    top_p: f64,
    num_ctx: u32,
}

impl OllamaOptions {
    fn new(temperature: f64, max_tokens: u32) -> Self {
        Self {
            temperature,
            num_predict: max_tokens,
            top_p: 0.9,
            num_ctx: 4096,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: String,
    message: OllamaResponseMessage,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
    #[serde(default)]
    total_duration: u64,
}

#[derive(Debug, Default, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    model: String,
    #[serde(default)]
    response: String,
    #[serde(default)]
    total_duration: u64,
}

#[derive(Debug, Default, Deserialize)]
struct OllamaStreamLine {
    #[serde(default)]
    message: OllamaResponseMessage,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Default, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

/// Health report for the local Ollama server. Producing this never fails;
/// connection problems degrade to a "disconnected" status.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaHealth {
    pub status: String,
    pub base_url: String,
    pub models: Vec<String>,
    pub model_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OllamaChatResult {
    pub content: String,
    pub model: String,
    pub total_duration: u64,
    pub eval_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OllamaGenerateResult {
    pub response: String,
    pub model: String,
    pub total_duration: u64,
}

/// Client for a local Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    chat_model: String,
}

impl OllamaClient {
    pub fn new(base_url: String, chat_model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            chat_model,
        }
    }

    /// Checks whether the Ollama server is running and lists its models.
    pub async fn health(&self) -> OllamaHealth {
        let url = format!("{}/api/tags", self.base_url);
        let result = self
            .client
            .get(&url)
            .timeout(TIMEOUT_HEALTH)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        match result {
            Ok(response) => match response.json::<OllamaTagsResponse>().await {
                Ok(tags) => {
                    let models: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
                    OllamaHealth {
                        status: "connected".to_string(),
                        base_url: self.base_url.clone(),
                        model_count: models.len(),
                        models,
                        error: None,
                    }
                }
                Err(e) => self.unhealthy("error", e.to_string()),
            },
            Err(e) if e.is_connect() => self.unhealthy(
                "disconnected",
                "Cannot connect to Ollama server. Is it running?".to_string(),
            ),
            Err(e) => self.unhealthy("error", e.to_string()),
        }
    }

    fn unhealthy(&self, status: &str, error: String) -> OllamaHealth {
        OllamaHealth {
            status: status.to_string(),
            base_url: self.base_url.clone(),
            models: vec![],
            model_count: 0,
            error: Some(error),
        }
    }

    /// Lists the models available locally, or an empty list on any error.
    pub async fn list_models(&self) -> Vec<OllamaModelInfo> {
        let url = format!("{}/api/tags", self.base_url);
        let response = match self.client.get(&url).timeout(TIMEOUT_HEALTH).send().await {
            Ok(r) => r,
            Err(_) => return vec![],
        };
        response
            .json::<OllamaTagsResponse>()
            .await
            .map(|tags| tags.models)
            .unwrap_or_default()
    }

    /// Sends a chat completion request, non-streaming.
    pub async fn chat(
        &self,
        messages: &[OllamaMessage],
        model: Option<&str>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<OllamaChatResult, LlmError> {
        let response = self
            .chat_raw(messages, model, temperature, max_tokens, false)
            .await?;
        Ok(OllamaChatResult {
            content: response.message.content,
            model: response.model,
            total_duration: response.total_duration,
            eval_count: response.eval_count,
        })
    }

    /// Streams chat completion chunks. Ollama emits newline-delimited JSON;
    /// message contents are forwarded untouched until the `done` marker.
    pub async fn chat_stream(
        &self,
        messages: &[OllamaMessage],
        model: Option<&str>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<mpsc::Receiver<Result<String, LlmError>>, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = OllamaChatRequest {
            model: model.unwrap_or(&self.chat_model),
            messages,
            stream: true,
            format: None,
            options: OllamaOptions::new(temperature, max_tokens),
        };

        let response = self
            .client
            .post(&url)
            .timeout(TIMEOUT_CHAT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
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
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let Ok(parsed) = serde_json::from_str::<OllamaStreamLine>(line) else {
                        continue;
                    };
                    if !parsed.message.content.is_empty()
                        && tx.send(Ok(parsed.message.content)).await.is_err()
                    {
                        return;
                    }
                    if parsed.done {
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    /// Plain text completion (non-chat, useful for FIM-style generation).
    pub async fn generate(
        &self,
        prompt: &str,
        model: Option<&str>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<OllamaGenerateResult, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = OllamaGenerateRequest {
            model: model.unwrap_or(&self.chat_model),
            prompt,
            stream: false,
            options: OllamaOptions::new(temperature, max_tokens),
        };

        let response = self
            .client
            .post(&url)
            .timeout(TIMEOUT_COMPLETION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let result: OllamaGenerateResponse = response.json().await?;
        Ok(OllamaGenerateResult {
            response: result.response,
            model: result.model,
            total_duration: result.total_duration,
        })
    }

    async fn chat_raw(
        &self,
        messages: &[OllamaMessage],
        model: Option<&str>,
        temperature: f64,
        max_tokens: u32,
        json_format: bool,
    ) -> Result<OllamaChatResponse, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = OllamaChatRequest {
            model: model.unwrap_or(&self.chat_model),
            messages,
            stream: false,
            format: json_format.then_some("json"),
            options: OllamaOptions::new(temperature, max_tokens),
        };

        let response = self
            .client
            .post(&url)
            .timeout(TIMEOUT_CHAT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let chat_response: OllamaChatResponse = response.json().await?;
        debug!(
            "Ollama chat succeeded: model={}, eval_count={}",
            chat_response.model, chat_response.eval_count
        );
        Ok(chat_response)
    }
}

#[async_trait]
impl RoadmapModel for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn generate_json(&self, system: &str, prompt: &str) -> Result<ModelOutput, LlmError> {
        let messages = [
            OllamaMessage {
                role: "system".to_string(),
                content: system.to_string(),
            },
            OllamaMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ];

        let response = self
            .chat_raw(&messages, None, JSON_TEMPERATURE, JSON_MAX_TOKENS, true)
            .await?;

        if response.message.content.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        let data: Value = serde_json::from_str(strip_json_fences(&response.message.content))?;

        Ok(ModelOutput {
            model: response.model,
            data,
            input_tokens: response.prompt_eval_count,
            output_tokens: response.eval_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_json_format_flag() {
        let messages = [OllamaMessage {
            role: "user".to_string(),
            content: "hello".to_string(),
        }];
        let request = OllamaChatRequest {
            model: "qwen2.5-coder:7b-instruct",
            messages: &messages,
            stream: false,
            format: Some("json"),
            options: OllamaOptions::new(0.3, 2048),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["format"], "json");
        assert_eq!(json["options"]["num_predict"], 2048);

        let request = OllamaChatRequest {
            model: "qwen2.5-coder:7b-instruct",
            messages: &messages,
            stream: false,
            format: None,
            options: OllamaOptions::new(0.3, 2048),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("format").is_none());
    }

    #[test]
    fn test_stream_line_parsing() {
        let line: OllamaStreamLine =
            serde_json::from_str(r#"{"message":{"role":"assistant","content":"Hi"},"done":false}"#)
                .unwrap();
        assert_eq!(line.message.content, "Hi");
        assert!(!line.done);

        let done: OllamaStreamLine = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(done.done);
        assert!(done.message.content.is_empty());
    }

    #[test]
    fn test_tags_response_tolerates_missing_fields() {
        let tags: OllamaTagsResponse =
            serde_json::from_str(r#"{"models":[{"name":"qwen2.5-coder:7b-instruct"}]}"#).unwrap();
        assert_eq!(tags.models.len(), 1);
        assert_eq!(tags.models[0].size, 0);
    }
}
