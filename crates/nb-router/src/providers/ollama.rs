//! Ollama classifier — local or LAN-hosted model over `/api/chat`.

use std::time::Duration;

use async_trait::async_trait;
use nb_protocol::ConversationContext;
use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::error::ProviderError;

/// Configuration for an Ollama endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    /// Ollama HTTP API base URL.
    #[serde(default = "default_host")]
    pub host: String,
    /// Model to use for classification.
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "qwen2.5:3b".into()
}
fn default_timeout_secs() -> u64 {
    3
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    format: &'a str,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Ollama chat API response (only fields we need).
#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

pub struct OllamaClassifier {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClassifier {
    pub fn new(config: OllamaConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Classifier for OllamaClassifier {
    async fn classify(
        &self,
        system_prompt: &str,
        user_text: &str,
        _ctx: &ConversationContext,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/api/chat", self.config.host.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            format: "json",
            stream: false,
        };

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("unreadable response body: {e}")))?;

        match chat.message {
            Some(message) if !message.content.trim().is_empty() => Ok(message.content),
            _ => Err(ProviderError::EmptyResponse),
        }
    }

    fn provider_id(&self) -> &str {
        "ollama"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }
}
