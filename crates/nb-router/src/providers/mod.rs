//! Language-model-backed classifiers that make up the provider chain.
//!
//! Every provider honours the same contract: given the system prompt, the
//! user text and the context, return raw text expected to parse as a JSON
//! decision object, or fail. Providers differ only in latency, cost and
//! availability.

pub mod bedrock;
pub mod ollama;
pub mod openai;
pub mod rules;

use std::time::Duration;

use async_trait::async_trait;
use nb_protocol::ConversationContext;

use crate::error::ProviderError;

/// Per-call bound applied by the engine when a provider does not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// One link of the provider chain.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify `user_text`, returning raw (unvalidated) provider output.
    async fn classify(
        &self,
        system_prompt: &str,
        user_text: &str,
        ctx: &ConversationContext,
    ) -> Result<String, ProviderError>;

    /// Stable identifier for logs and attempt records.
    fn provider_id(&self) -> &str;

    /// Upper bound on a single `classify` call.
    fn timeout(&self) -> Duration {
        DEFAULT_TIMEOUT
    }
}

pub use bedrock::{BedrockClassifier, BedrockConfig};
pub use ollama::{OllamaClassifier, OllamaConfig};
pub use openai::{OpenAiClassifier, OpenAiConfig};
pub use rules::RuleClassifier;
