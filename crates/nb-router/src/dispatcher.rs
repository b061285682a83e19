//! Dispatcher — maps a matched command or a classified decision to exactly
//! one handler invocation.
//!
//! Handlers are registered per [`Route`] at startup. Anything without a
//! confident, registered destination lands on the conversational handler.
//! A handler error or panic is logged and followed by a best-effort
//! failure notification; it never propagates to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use nb_protocol::{
    Action, CommandMatch, ConversationContext, Decision, InboundMessage, Language, Route,
};
use serde::Serialize;

use crate::error::HandlerError;

/// Payload handed to a handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandlerRequest {
    /// A deterministic alias match with its argument tokens.
    Command(CommandMatch),
    /// A classified decision, including any extracted profile data.
    Decision(Decision),
}

/// Everything a handler may need about the message being served.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub message: InboundMessage,
    pub conversation: ConversationContext,
    /// Language detected from this message; may differ from the stored
    /// preference in `conversation`.
    pub detected_language: Language,
}

/// A business-logic module that executes the user's intent.
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, request: &HandlerRequest, ctx: &HandlerContext)
    -> Result<(), HandlerError>;
}

/// The generic conversational handler. Also receives failure notifications.
#[async_trait]
pub trait ConversationalHandler: Handler {
    /// Tell the user something went wrong. Best effort.
    async fn notify_failure(&self, error: &HandlerError, ctx: &HandlerContext);
}

/// Route → handler table, immutable once the dispatcher is built.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Route, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `route`, replacing any previous entry.
    pub fn register(&mut self, route: impl Into<Route>, handler: Arc<dyn Handler>) -> &mut Self {
        let route = route.into();
        if self.handlers.insert(route, handler).is_some() {
            tracing::warn!(%route, "handler replaced");
        }
        self
    }

    pub fn get(&self, route: Route) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(&route)
    }

    pub fn contains(&self, route: Route) -> bool {
        self.handlers.contains_key(&route)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// What the dispatcher did with one message.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Name of the handler that was invoked.
    pub handler: String,
    /// Route that was requested (a command or the decision's action).
    pub route: Route,
    /// True when the conversational handler served the message.
    pub fallback: bool,
    pub result: Result<(), HandlerError>,
}

impl DispatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct Dispatcher {
    registry: HandlerRegistry,
    fallback: Arc<dyn ConversationalHandler>,
    min_confidence: f64,
}

impl Dispatcher {
    pub fn new(
        registry: HandlerRegistry,
        fallback: Arc<dyn ConversationalHandler>,
        min_confidence: f64,
    ) -> Self {
        Self {
            registry,
            fallback,
            min_confidence,
        }
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Serve a deterministic alias match.
    pub async fn dispatch_command(
        &self,
        command: CommandMatch,
        ctx: &HandlerContext,
    ) -> DispatchOutcome {
        let route = command.route;
        if !command.has_required_args() {
            tracing::debug!(
                %route,
                args = command.args.len(),
                min_args = command.min_args,
                "command has fewer arguments than declared"
            );
        }

        let request = HandlerRequest::Command(command);
        match self.registry.get(route) {
            Some(handler) => self.invoke(Arc::clone(handler), route, request, ctx).await,
            None => {
                tracing::warn!(%route, "no handler registered, using conversational handler");
                self.invoke_fallback(route, request, ctx).await
            }
        }
    }

    /// Serve a classified decision.
    pub async fn dispatch_decision(
        &self,
        decision: Decision,
        ctx: &HandlerContext,
    ) -> DispatchOutcome {
        let route = Route::Action(decision.action);

        if !has_action_handler(decision.action) {
            return self
                .invoke_fallback(route, HandlerRequest::Decision(decision), ctx)
                .await;
        }

        if decision.confidence < self.min_confidence {
            tracing::info!(
                action = %decision.action,
                confidence = decision.confidence,
                min_confidence = self.min_confidence,
                "low confidence, using conversational handler"
            );
            return self
                .invoke_fallback(route, HandlerRequest::Decision(decision), ctx)
                .await;
        }

        let request = HandlerRequest::Decision(decision);
        match self.registry.get(route) {
            Some(handler) => self.invoke(Arc::clone(handler), route, request, ctx).await,
            None => {
                tracing::warn!(%route, "no handler registered, using conversational handler");
                self.invoke_fallback(route, request, ctx).await
            }
        }
    }

    async fn invoke_fallback(
        &self,
        route: Route,
        request: HandlerRequest,
        ctx: &HandlerContext,
    ) -> DispatchOutcome {
        let mut outcome = self
            .invoke(Arc::clone(&self.fallback), route, request, ctx)
            .await;
        outcome.fallback = true;
        outcome
    }

    async fn invoke<H>(
        &self,
        handler: Arc<H>,
        route: Route,
        request: HandlerRequest,
        ctx: &HandlerContext,
    ) -> DispatchOutcome
    where
        H: Handler + ?Sized + 'static,
    {
        let name = handler.name().to_string();
        tracing::debug!(handler = %name, %route, message_id = %ctx.message.id, "dispatching");

        let result = run_contained(handler, request, ctx.clone()).await;
        if let Err(e) = &result {
            tracing::error!(
                handler = %name,
                %route,
                message_id = %ctx.message.id,
                error = %e,
                "handler failed"
            );
            self.notify_failure(e.clone(), ctx.clone()).await;
        }

        DispatchOutcome {
            handler: name,
            route,
            fallback: false,
            result,
        }
    }

    async fn notify_failure(&self, error: HandlerError, ctx: HandlerContext) {
        let fallback = Arc::clone(&self.fallback);
        let task = tokio::spawn(async move { fallback.notify_failure(&error, &ctx).await });
        if let Err(e) = task.await {
            tracing::error!(error = %e, "failure notification panicked");
        }
    }
}

/// Whether a classified action is served by a registered handler. Chat and
/// unknown input always go to the conversational handler.
fn has_action_handler(action: Action) -> bool {
    match action {
        Action::UpdateProfile
        | Action::ViewProfile
        | Action::ViewStats
        | Action::ViewHistory
        | Action::Help
        | Action::Start
        | Action::Settings => true,
        Action::Chat | Action::Unknown => false,
    }
}

/// Run a handler on its own task so a panic surfaces as an error.
async fn run_contained<H>(
    handler: Arc<H>,
    request: HandlerRequest,
    ctx: HandlerContext,
) -> Result<(), HandlerError>
where
    H: Handler + ?Sized + 'static,
{
    let task = tokio::spawn(async move { handler.handle(&request, &ctx).await });
    match task.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(HandlerError::Panicked(panic_message(e.into_panic()))),
        Err(e) => Err(HandlerError::Failed(e.to_string())),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
