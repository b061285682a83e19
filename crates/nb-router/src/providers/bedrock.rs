//! AWS Bedrock classifier using the model-agnostic Converse API.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, ConverseOutput, InferenceConfiguration, Message,
    SystemContentBlock,
};
use nb_protocol::ConversationContext;
use serde::Deserialize;

use super::Classifier;
use crate::error::ProviderError;

#[derive(Debug, Clone, Deserialize)]
pub struct BedrockConfig {
    /// Bedrock model ID (e.g., "us.amazon.nova-lite-v1:0").
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model_id() -> String {
    "us.amazon.nova-lite-v1:0".into()
}
fn default_timeout_secs() -> u64 {
    3
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub struct BedrockClassifier {
    client: BedrockClient,
    config: BedrockConfig,
}

impl BedrockClassifier {
    /// Create a classifier with a pre-built Bedrock client.
    pub fn new(client: BedrockClient, config: BedrockConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Classifier for BedrockClassifier {
    async fn classify(
        &self,
        system_prompt: &str,
        user_text: &str,
        _ctx: &ConversationContext,
    ) -> Result<String, ProviderError> {
        let user_message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(user_text.to_string()))
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build message: {e}")))?;

        let response = self
            .client
            .converse()
            .model_id(&self.config.model_id)
            .system(SystemContentBlock::Text(system_prompt.to_string()))
            .messages(user_message)
            .inference_config(InferenceConfiguration::builder().temperature(0.0).build())
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                if err.is_throttling_exception() {
                    ProviderError::RateLimited
                } else {
                    ProviderError::Transport(format!("bedrock converse error: {err}"))
                }
            })?;

        let text = match response.output() {
            Some(ConverseOutput::Message(msg)) => msg.content().iter().find_map(|block| {
                if let ContentBlock::Text(t) = block {
                    Some(t.clone())
                } else {
                    None
                }
            }),
            _ => None,
        };

        text.filter(|t| !t.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)
    }

    fn provider_id(&self) -> &str {
        "bedrock"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }
}
