//! Build the ordered provider chain from `[[providers]]`.

use std::sync::Arc;

use anyhow::Context;
use nb_router::Classifier;
use nb_router::providers::{BedrockClassifier, OllamaClassifier, OpenAiClassifier, RuleClassifier};

use crate::config::ProviderConfig;

/// Instantiate every configured provider, preserving order.
///
/// The AWS client is shared by all Bedrock entries and is only loaded when
/// at least one is configured.
pub async fn build_chain(configs: &[ProviderConfig]) -> anyhow::Result<Vec<Arc<dyn Classifier>>> {
    let aws = if configs.iter().any(|c| matches!(c, ProviderConfig::Bedrock(_))) {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Some(aws_sdk_bedrockruntime::Client::new(&sdk_config))
    } else {
        None
    };

    let mut chain: Vec<Arc<dyn Classifier>> = Vec::with_capacity(configs.len());
    for (position, config) in configs.iter().enumerate() {
        let provider: Arc<dyn Classifier> = match config {
            ProviderConfig::Rules => Arc::new(RuleClassifier::new()),
            ProviderConfig::Ollama(c) => Arc::new(
                OllamaClassifier::new(c.clone())
                    .with_context(|| format!("provider #{position} (ollama)"))?,
            ),
            ProviderConfig::Openai(c) => Arc::new(
                OpenAiClassifier::new(c.clone())
                    .with_context(|| format!("provider #{position} (openai)"))?,
            ),
            ProviderConfig::Bedrock(c) => {
                let client = aws
                    .clone()
                    .context("bedrock client not initialized")?;
                Arc::new(BedrockClassifier::new(client, c.clone()))
            }
        };
        tracing::info!(
            position,
            provider = provider.provider_id(),
            timeout_ms = provider.timeout().as_millis() as u64,
            "provider registered"
        );
        chain.push(provider);
    }

    if chain.is_empty() {
        tracing::warn!("no providers configured, unmatched messages will route as UNKNOWN");
    }
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nb_router::providers::{OllamaConfig, OpenAiConfig};

    #[tokio::test]
    async fn chain_preserves_configured_order() {
        let configs = vec![
            ProviderConfig::Ollama(OllamaConfig::default()),
            ProviderConfig::Rules,
        ];
        let chain = build_chain(&configs).await.unwrap();
        let ids: Vec<_> = chain.iter().map(|p| p.provider_id().to_string()).collect();
        assert_eq!(ids, vec!["ollama", "rules"]);
    }

    #[tokio::test]
    async fn missing_api_key_fails_startup() {
        let configs = vec![ProviderConfig::Openai(OpenAiConfig {
            api_key_env: "NB_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..OpenAiConfig::default()
        })];
        let err = build_chain(&configs).await.err().unwrap();
        assert!(err.to_string().contains("openai"));
    }

    #[tokio::test]
    async fn empty_chain_is_allowed() {
        assert!(build_chain(&[]).await.unwrap().is_empty());
    }
}
