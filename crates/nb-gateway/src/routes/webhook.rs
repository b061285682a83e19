//! Inbound message webhook.
//!
//! Acknowledges immediately and routes the message on a detached task, so
//! handler side effects may land after the 202 has been sent.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use nb_protocol::{ConversationContext, InboundMessage, Language};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body delivered by the messaging channel.
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    /// Delivery id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    pub sender_id: String,
    /// Defaults to `sender_id`.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Stored language preference; defaults to English.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

/// POST /webhook — accept one inbound message.
pub async fn receive(
    State(state): State<AppState>,
    Json(req): Json<WebhookRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".into()));
    }

    let language = match req.language.as_deref() {
        Some(code) => code
            .parse::<Language>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => Language::default(),
    };

    let id = req.id.unwrap_or_else(|| Uuid::now_v7().to_string());
    let user_id = req.user_id.unwrap_or_else(|| req.sender_id.clone());
    let message = InboundMessage::new(
        id.clone(),
        req.text,
        req.sender_id,
        req.received_at.unwrap_or_else(Utc::now),
    );
    let ctx = ConversationContext::new(user_id, language);

    let router = state.router.clone();
    tokio::spawn(async move {
        let report = router.route(&message, &ctx).await;
        tracing::debug!(
            message_id = %message.id,
            path = ?report.path,
            handled = report.outcome.as_ref().is_some_and(|o| o.is_ok()),
            "message routed"
        );
    });

    tracing::info!(message_id = %id, "message accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"status": "accepted", "id": id})),
    ))
}
