//! Language model client used by the crew.
//!
//! [`ChatCompletionsClient`] speaks the OpenAI chat-completions protocol via
//! `reqwest`, which also covers OpenAI-compatible servers (Ollama, vLLM,
//! LiteLLM proxies) through `OPENAI_API_BASE`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::StudioConfig;
use crate::error::WorkflowError;

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant".
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Completes a conversation with the named model.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, WorkflowError>;
}

/// OpenAI-compatible chat-completions client.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    /// Retries after rate limiting (429) or server errors (5xx).
    pub max_retries: u32,
}

impl ChatCompletionsClient {
    /// Request timeout for a single completion.
    pub const TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(api_base: impl Into<String>, api_key: Option<String>) -> Result<Self, WorkflowError> {
        let http = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| WorkflowError::Llm {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            http,
            api_base: api_base.into(),
            api_key,
            max_retries: 2,
        })
    }

    pub fn from_config(config: &StudioConfig) -> Result<Self, WorkflowError> {
        Self::new(config.api_base.clone(), config.api_key.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, WorkflowError> {
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        let mut last_error: Option<String> = None;
        let mut retry_delay = Duration::from_secs(1);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                log::warn!("Chat completion retry attempt {} after {:?}", attempt, retry_delay);
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2;
            }

            let mut request = self.http.post(self.endpoint()).json(&body);
            if let Some(ref key) = self.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(e.to_string());
                    continue;
                }
            };

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = Some(format!("chat completions returned {}", status));
                continue;
            }

            let text = response.text().await.map_err(|e| WorkflowError::Llm {
                message: format!("failed to read response body: {}", e),
            })?;

            if status.is_client_error() {
                return Err(WorkflowError::Llm {
                    message: format!("chat completions error ({}): {}", status, text),
                });
            }

            let json: Value = serde_json::from_str(&text).map_err(|e| WorkflowError::Llm {
                message: format!(
                    "failed to parse response: {} - body: {}",
                    e,
                    text.chars().take(500).collect::<String>()
                ),
            })?;
            return parse_completion(&json);
        }

        Err(WorkflowError::Llm {
            message: last_error.unwrap_or_else(|| "chat completion failed after all retries".to_string()),
        })
    }
}

/// Extract `choices[0].message.content` from a completions response.
pub fn parse_completion(response: &Value) -> Result<String, WorkflowError> {
    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| WorkflowError::Llm {
            message: "response has no choices[0].message.content".to_string(),
        })
}
