//! NutriBot gateway — receives channel webhooks and routes each message to
//! exactly one downstream handler.

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use nb_gateway::config::GatewayConfig;
use nb_gateway::routes;
use nb_gateway::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "nb-gateway starting");

    // ── Load config ─────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/nutribot/gateway.toml".to_string());

    let config = GatewayConfig::from_file(&config_path)?;
    tracing::info!(
        path = %config_path,
        providers = config.providers.len(),
        aws = config.needs_aws(),
        downstream = %config.downstream.base_url,
        "config loaded"
    );

    // ── Routing core ────────────────────────────────────────────
    let state = AppState::from_config(&config).await?;

    // ── HTTP server ─────────────────────────────────────────────
    let app = routes::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
