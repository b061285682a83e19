//! E2E tests for the ordered provider chain behind the webhook.

mod helpers;

use nb_gateway::config::ProviderConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{TestHarness, ollama, ollama_reply};

const STATS: &str = r#"{"action": "VIEW_STATS", "confidence": 0.85, "reasoning": "asks for totals"}"#;

/// First provider errors; the second answers and is accepted. The first
/// is not retried.
#[tokio::test]
async fn e2e_failing_provider_falls_back() {
    let p1 = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&p1)
        .await;

    let p2 = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ollama_reply(STATS))
        .expect(1)
        .mount(&p2)
        .await;

    let h = TestHarness::start(vec![ProviderConfig::Rules, ollama(&p1), ollama(&p2)]).await;
    h.send("m-1", "how did I do this week").await;

    let calls = h.handler_calls(1).await;
    assert_eq!(calls.len(), 1);
    let (route, payload) = &calls[0];
    assert_eq!(route, "/handlers/view_stats");
    assert_eq!(payload["decision"]["action"], "VIEW_STATS");
    assert_eq!(payload["decision"]["confidence"], 0.85);
}

/// Prose-wrapped or fenced JSON still validates.
#[tokio::test]
async fn e2e_fenced_model_output_is_accepted() {
    let p1 = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ollama_reply(&format!("Here you go:\n```json\n{STATS}\n```")))
        .mount(&p1)
        .await;

    let h = TestHarness::start(vec![ollama(&p1)]).await;
    h.send("m-1", "numbers please").await;

    let calls = h.handler_calls(1).await;
    assert_eq!(calls[0].0, "/handlers/view_stats");
}

/// Unparsable output from the first provider counts as a failure.
#[tokio::test]
async fn e2e_malformed_output_falls_back() {
    let p1 = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ollama_reply("I think the user wants their stats."))
        .mount(&p1)
        .await;
    let p2 = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ollama_reply(STATS))
        .expect(1)
        .mount(&p2)
        .await;

    let h = TestHarness::start(vec![ollama(&p1), ollama(&p2)]).await;
    h.send("m-1", "numbers please").await;

    let calls = h.handler_calls(1).await;
    assert_eq!(calls[0].0, "/handlers/view_stats");
}

/// Every provider failing yields UNKNOWN at confidence 0 on the chat handler.
#[tokio::test]
async fn e2e_exhausted_chain_goes_to_chat() {
    let p1 = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&p1)
        .await;
    let p2 = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ollama_reply("not json at all"))
        .mount(&p2)
        .await;

    let h = TestHarness::start(vec![ProviderConfig::Rules, ollama(&p1), ollama(&p2)]).await;
    h.send("m-1", "what's for dinner").await;

    let calls = h.handler_calls(1).await;
    assert_eq!(calls.len(), 1);
    let (route, payload) = &calls[0];
    assert_eq!(route, "/handlers/chat");
    assert_eq!(payload["decision"]["action"], "UNKNOWN");
    assert_eq!(payload["decision"]["confidence"], 0.0);
}

/// A slow provider is cut off by its timeout and the next one answers.
#[tokio::test]
async fn e2e_slow_provider_times_out() {
    let p1 = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ollama_reply(STATS).set_delay(std::time::Duration::from_secs(10)))
        .mount(&p1)
        .await;
    let p2 = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ollama_reply(
            r#"{"action": "VIEW_HISTORY", "confidence": 0.9}"#,
        ))
        .mount(&p2)
        .await;

    let h = TestHarness::start(vec![ollama(&p1), ollama(&p2)]).await;
    h.send("m-1", "what did I eat").await;

    let calls = h.handler_calls(1).await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "/handlers/view_history");
}

/// A confident-looking action below the threshold is served conversationally.
#[tokio::test]
async fn e2e_low_confidence_goes_to_chat() {
    let p1 = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ollama_reply(r#"{"action": "VIEW_PROFILE", "confidence": 0.1}"#))
        .mount(&p1)
        .await;

    let h = TestHarness::start(vec![ollama(&p1)]).await;
    h.send("m-1", "me?").await;

    let calls = h.handler_calls(1).await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "/handlers/chat");
    assert_eq!(calls[0].1["decision"]["action"], "VIEW_PROFILE");
}

/// A matched command never consults the providers.
#[tokio::test]
async fn e2e_command_bypasses_providers() {
    let p1 = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ollama_reply(STATS))
        .expect(0)
        .mount(&p1)
        .await;

    let h = TestHarness::start(vec![ollama(&p1)]).await;
    h.send("m-1", "progress").await;

    let calls = h.handler_calls(1).await;
    assert_eq!(calls[0].0, "/handlers/progress");
}
