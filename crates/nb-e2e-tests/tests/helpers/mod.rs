//! Shared test harness for E2E integration tests.
//!
//! Builds the real gateway (config → provider chain → router → axum app)
//! against a wiremock downstream service, so every assertion is made on
//! the HTTP traffic the gateway actually produces.

#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

use nb_gateway::config::{DownstreamConfig, GatewayConfig, ProviderConfig};
use nb_gateway::routes::build_router;
use nb_gateway::state::AppState;
use nb_router::RouterConfig;
use nb_router::providers::OllamaConfig;

/// How long to wait for detached routing to reach the downstream service.
const SETTLE: Duration = Duration::from_secs(3);

pub struct TestHarness {
    /// Gateway HTTP surface.
    pub app: Router,
    /// Stand-in for the business-logic service (handlers + preferences).
    pub downstream: MockServer,
}

impl TestHarness {
    /// Gateway with the given provider chain. Mount extra downstream mocks
    /// via [`TestHarness::downstream`]; anything unmatched answers 200.
    pub async fn start(providers: Vec<ProviderConfig>) -> Self {
        Self::with_router_config(providers, RouterConfig::default()).await
    }

    pub async fn with_router_config(providers: Vec<ProviderConfig>, router: RouterConfig) -> Self {
        let downstream = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .with_priority(u8::MAX)
            .mount(&downstream)
            .await;

        let config = GatewayConfig {
            router,
            downstream: DownstreamConfig {
                base_url: downstream.uri(),
                timeout_secs: 2,
            },
            providers,
            ..GatewayConfig::default()
        };
        let state = AppState::from_config(&config).await.unwrap();

        Self {
            app: build_router(state),
            downstream,
        }
    }

    /// POST /webhook with an arbitrary body.
    pub async fn post_webhook(&self, body: Value) -> (StatusCode, Value) {
        let response = self
            .app
            .clone()
            .oneshot(
                Request::post("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// Send `text` from user `u-1` with English as the stored preference.
    pub async fn send(&self, id: &str, text: &str) -> (StatusCode, Value) {
        self.post_webhook(json!({
            "id": id,
            "text": text,
            "sender_id": "u-1",
            "language": "en",
        }))
        .await
    }

    /// Downstream requests whose path starts with `prefix`.
    pub async fn requests_to(&self, prefix: &str) -> Vec<wiremock::Request> {
        self.downstream
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path().starts_with(prefix))
            .collect()
    }

    /// Poll until at least `n` handler calls arrived, then give stragglers a
    /// moment so "exactly n" assertions are meaningful.
    pub async fn handler_calls(&self, n: usize) -> Vec<(String, Value)> {
        let deadline = tokio::time::Instant::now() + SETTLE;
        while self.requests_to("/handlers/").await.len() < n
            && tokio::time::Instant::now() < deadline
        {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        self.requests_to("/handlers/")
            .await
            .into_iter()
            .map(|r| {
                let body: Value = serde_json::from_slice(&r.body).unwrap_or(Value::Null);
                (r.url.path().to_string(), body)
            })
            .collect()
    }

    /// Poll until a preference update arrives or the settle window passes.
    pub async fn language_updates(&self) -> Vec<(String, Value)> {
        let deadline = tokio::time::Instant::now() + SETTLE;
        while self.requests_to("/users/").await.is_empty()
            && tokio::time::Instant::now() < deadline
        {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        self.requests_to("/users/")
            .await
            .into_iter()
            .map(|r| {
                let body: Value = serde_json::from_slice(&r.body).unwrap_or(Value::Null);
                (r.url.path().to_string(), body)
            })
            .collect()
    }
}

/// Ollama provider pointed at `server`.
pub fn ollama(server: &MockServer) -> ProviderConfig {
    ProviderConfig::Ollama(OllamaConfig {
        host: server.uri(),
        model: "qwen2.5:3b".into(),
        timeout_secs: 1,
    })
}

/// Ollama `/api/chat` response carrying `content`.
pub fn ollama_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "qwen2.5:3b",
        "message": { "role": "assistant", "content": content },
        "done": true,
    }))
}
