//! HTTP collaborators: handlers and the language-preference store live in
//! the downstream business-logic service.
//!
//! - [`ForwardingHandler`] posts one route's requests to
//!   `{base_url}/handlers/{route_slug}`.
//! - [`ChatForwarder`] is the conversational handler (`/handlers/chat`) and
//!   receives failure notifications (`/handlers/failure`).
//! - [`HttpLanguageStore`] issues `PUT {base_url}/users/{id}/language`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nb_protocol::{Action, Command, Decision, Language, Route};
use nb_router::{
    ConversationalHandler, Handler, HandlerContext, HandlerError, HandlerRegistry, HandlerRequest,
    LanguageStore, StoreError,
};
use serde::Serialize;

use crate::config::DownstreamConfig;

/// Shared HTTP client bound to the downstream base URL.
#[derive(Clone)]
pub struct Downstream {
    client: reqwest::Client,
    base_url: String,
}

impl Downstream {
    pub fn new(config: &DownstreamConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), HandlerError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| HandlerError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HandlerError::Downstream {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Wire body for a handler invocation.
#[derive(Serialize)]
struct HandlerCall<'a> {
    route: &'a str,
    message_id: &'a str,
    user_id: &'a str,
    language: &'static str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    decision: Option<&'a Decision>,
}

impl<'a> HandlerCall<'a> {
    fn new(route: &'a str, request: &'a HandlerRequest, ctx: &'a HandlerContext) -> Self {
        let (args, decision) = match request {
            HandlerRequest::Command(command) => (Some(command.args.as_slice()), None),
            HandlerRequest::Decision(decision) => (None, Some(decision)),
        };
        Self {
            route,
            message_id: &ctx.message.id,
            user_id: &ctx.conversation.user_id,
            language: ctx.detected_language.code(),
            text: &ctx.message.text,
            args,
            decision,
        }
    }
}

/// Forwards one route to its downstream endpoint.
pub struct ForwardingHandler {
    downstream: Downstream,
    slug: String,
}

impl ForwardingHandler {
    pub fn new(downstream: Downstream, route: Route) -> Self {
        Self {
            downstream,
            slug: route.slug(),
        }
    }
}

#[async_trait]
impl Handler for ForwardingHandler {
    fn name(&self) -> &str {
        &self.slug
    }

    async fn handle(&self, request: &HandlerRequest, ctx: &HandlerContext) -> Result<(), HandlerError> {
        let body = HandlerCall::new(&self.slug, request, ctx);
        self.downstream
            .post(&format!("/handlers/{}", self.slug), &body)
            .await
    }
}

/// Conversational fallback handler.
pub struct ChatForwarder {
    downstream: Downstream,
}

impl ChatForwarder {
    pub fn new(downstream: Downstream) -> Self {
        Self { downstream }
    }
}

#[derive(Serialize)]
struct FailureNotice<'a> {
    message_id: &'a str,
    user_id: &'a str,
    language: &'static str,
    error: String,
}

#[async_trait]
impl Handler for ChatForwarder {
    fn name(&self) -> &str {
        "chat"
    }

    async fn handle(&self, request: &HandlerRequest, ctx: &HandlerContext) -> Result<(), HandlerError> {
        let body = HandlerCall::new("chat", request, ctx);
        self.downstream.post("/handlers/chat", &body).await
    }
}

#[async_trait]
impl ConversationalHandler for ChatForwarder {
    async fn notify_failure(&self, error: &HandlerError, ctx: &HandlerContext) {
        let body = FailureNotice {
            message_id: &ctx.message.id,
            user_id: &ctx.conversation.user_id,
            language: ctx.detected_language.code(),
            error: error.to_string(),
        };
        if let Err(e) = self.downstream.post("/handlers/failure", &body).await {
            tracing::warn!(
                message_id = %ctx.message.id,
                error = %e,
                "failure notification not delivered"
            );
        }
    }
}

/// Register a [`ForwardingHandler`] for every command and every
/// non-conversational action.
pub fn forwarding_registry(downstream: &Downstream) -> HandlerRegistry {
    let routes = Action::ALL
        .iter()
        .filter(|a| !a.is_conversational())
        .map(|&a| Route::Action(a))
        .chain(Command::ALL.iter().map(|&c| Route::Command(c)));

    let mut registry = HandlerRegistry::new();
    for route in routes {
        registry.register(route, Arc::new(ForwardingHandler::new(downstream.clone(), route)));
    }
    registry
}

#[derive(Serialize)]
struct LanguageUpdate {
    language: &'static str,
}

/// Language preference store backed by the downstream user service.
pub struct HttpLanguageStore {
    downstream: Downstream,
}

impl HttpLanguageStore {
    pub fn new(downstream: Downstream) -> Self {
        Self { downstream }
    }
}

#[async_trait]
impl LanguageStore for HttpLanguageStore {
    async fn set_language(&self, user_id: &str, language: Language) -> Result<(), StoreError> {
        let url = format!("{}/users/{user_id}/language", self.downstream.base_url);
        let resp = self
            .downstream
            .client
            .put(&url)
            .json(&LanguageUpdate {
                language: language.code(),
            })
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
