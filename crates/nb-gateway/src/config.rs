//! Gateway configuration, loaded from a TOML file.

use nb_router::RouterConfig;
use nb_router::providers::{BedrockConfig, OllamaConfig, OpenAiConfig};
use serde::Deserialize;

/// Top-level gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub downstream: DownstreamConfig,
    /// Provider chain, consulted in array order.
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
}

/// Listen address.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Business-logic service that owns handlers and user preferences.
#[derive(Debug, Clone, Deserialize)]
pub struct DownstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_downstream_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_downstream_timeout() -> u64 {
    10
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_downstream_timeout(),
        }
    }
}

/// One entry of the `[[providers]]` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    Rules,
    Ollama(OllamaConfig),
    Openai(OpenAiConfig),
    Bedrock(BedrockConfig),
}

impl ProviderConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderConfig::Rules => "rules",
            ProviderConfig::Ollama(_) => "ollama",
            ProviderConfig::Openai(_) => "openai",
            ProviderConfig::Bedrock(_) => "bedrock",
        }
    }
}

/// Rules first, then a local Ollama model.
fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::Rules,
        ProviderConfig::Ollama(OllamaConfig::default()),
    ]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            router: RouterConfig::default(),
            downstream: DownstreamConfig::default(),
            providers: default_providers(),
        }
    }
}

impl GatewayConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn needs_aws(&self) -> bool {
        self.providers
            .iter()
            .any(|p| matches!(p, ProviderConfig::Bedrock(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.router.min_confidence, 0.3);
        assert_eq!(config.router.dedup_capacity, 1024);
        assert_eq!(config.downstream.base_url, "http://localhost:8081");
        let kinds: Vec<_> = config.providers.iter().map(ProviderConfig::kind).collect();
        assert_eq!(kinds, vec!["rules", "ollama"]);
        assert!(!config.needs_aws());
    }

    #[test]
    fn full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[router]
min_confidence = 0.5
dedup_capacity = 0

[downstream]
base_url = "http://nutribot-core:7000"
timeout_secs = 4

[[providers]]
kind = "rules"

[[providers]]
kind = "openai"
model = "gpt-4.1-mini"
api_key_env = "NB_OPENAI_KEY"

[[providers]]
kind = "bedrock"
model_id = "us.amazon.nova-micro-v1:0"
timeout_secs = 2

[[providers]]
kind = "ollama"
host = "http://gpu-box:11434"
"#;
        let config: GatewayConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.router.min_confidence, 0.5);
        assert_eq!(config.router.dedup_capacity, 0);
        assert_eq!(config.downstream.timeout_secs, 4);

        let kinds: Vec<_> = config.providers.iter().map(ProviderConfig::kind).collect();
        assert_eq!(kinds, vec!["rules", "openai", "bedrock", "ollama"]);
        assert!(config.needs_aws());

        match &config.providers[1] {
            ProviderConfig::Openai(c) => {
                assert_eq!(c.model, "gpt-4.1-mini");
                assert_eq!(c.api_key_env, "NB_OPENAI_KEY");
                assert_eq!(c.timeout_secs, 3);
            }
            other => panic!("expected openai, got {other:?}"),
        }
        match &config.providers[2] {
            ProviderConfig::Bedrock(c) => assert_eq!(c.timeout_secs, 2),
            other => panic!("expected bedrock, got {other:?}"),
        }
        match &config.providers[3] {
            ProviderConfig::Ollama(c) => {
                assert_eq!(c.host, "http://gpu-box:11434");
                assert_eq!(c.model, "qwen2.5:3b");
            }
            other => panic!("expected ollama, got {other:?}"),
        }
    }

    #[test]
    fn unknown_provider_kind_rejected() {
        let toml = r#"
[[providers]]
kind = "carrier-pigeon"
"#;
        assert!(toml::from_str::<GatewayConfig>(toml).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(GatewayConfig::from_file("/nonexistent/gateway.toml").is_err());
    }
}
