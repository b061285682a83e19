//! Shared application state for the Axum server.

use std::sync::Arc;

use nb_router::{CommandTable, DecisionEngine, Router};

use crate::config::GatewayConfig;
use crate::downstream::{ChatForwarder, Downstream, HttpLanguageStore, forwarding_registry};
use crate::providers::build_chain;

/// Cloned into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
}

impl AppState {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// Wire the routing core against the configured providers and the
    /// downstream service.
    pub async fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let table = CommandTable::standard();
        tracing::info!(aliases = table.len(), "command table initialized");

        let engine = DecisionEngine::new(build_chain(&config.providers).await?);

        let downstream = Downstream::new(&config.downstream)?;
        let registry = forwarding_registry(&downstream);
        tracing::info!(handlers = registry.len(), "handler registry initialized");

        let router = Router::new(
            &config.router,
            table,
            engine,
            registry,
            Arc::new(ChatForwarder::new(downstream.clone())),
            Arc::new(HttpLanguageStore::new(downstream)),
        );
        Ok(Self::new(router))
    }
}
