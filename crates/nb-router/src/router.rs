//! Top-level entry point: one inbound message in, one handler invocation out.

use std::sync::Arc;

use nb_protocol::{
    CommandMatch, ConversationContext, Decision, InboundMessage, Language, ProviderAttempt,
};
use serde::Deserialize;
use tracing::Instrument;

use crate::dedup::DeliveryGuard;
use crate::dispatcher::{
    ConversationalHandler, DispatchOutcome, Dispatcher, HandlerContext, HandlerRegistry,
};
use crate::engine::DecisionEngine;
use crate::language::{self, LanguageStore};
use crate::matcher::CommandTable;

/// Router tuning knobs (`[router]` table of the gateway config).
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Classified decisions below this confidence go to the conversational
    /// handler.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// How many recent message ids to remember for duplicate suppression.
    /// 0 disables suppression.
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,
}

fn default_min_confidence() -> f64 {
    0.3
}

fn default_dedup_capacity() -> usize {
    1024
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            dedup_capacity: default_dedup_capacity(),
        }
    }
}

/// Which branch of the pipeline served the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePath {
    /// Repeat delivery; nothing ran.
    Duplicate,
    /// Matched the alias table.
    Command,
    /// Went through the decision engine.
    Classified,
}

/// Diagnostic summary of one `route` call.
#[derive(Debug, Clone)]
pub struct RouteReport {
    pub path: RoutePath,
    pub detected_language: Language,
    pub command: Option<CommandMatch>,
    pub decision: Option<Decision>,
    /// Provider whose output was accepted.
    pub provider: Option<String>,
    pub attempts: Vec<ProviderAttempt>,
    /// `None` only for duplicates.
    pub outcome: Option<DispatchOutcome>,
}

pub struct Router {
    table: CommandTable,
    engine: DecisionEngine,
    dispatcher: Dispatcher,
    language_store: Arc<dyn LanguageStore>,
    guard: DeliveryGuard,
}

impl Router {
    pub fn new(
        config: &RouterConfig,
        table: CommandTable,
        engine: DecisionEngine,
        registry: HandlerRegistry,
        fallback: Arc<dyn ConversationalHandler>,
        language_store: Arc<dyn LanguageStore>,
    ) -> Self {
        Self {
            table,
            engine,
            dispatcher: Dispatcher::new(registry, fallback, config.min_confidence),
            language_store,
            guard: DeliveryGuard::new(config.dedup_capacity),
        }
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Process one message end to end.
    ///
    /// Never fails: classification falls back to `UNKNOWN` and handler
    /// errors are logged and reported in the returned [`RouteReport`].
    pub async fn route(&self, message: &InboundMessage, ctx: &ConversationContext) -> RouteReport {
        let span = tracing::info_span!(
            "route",
            message_id = %message.id,
            user_id = %ctx.user_id,
        );
        self.route_inner(message, ctx).instrument(span).await
    }

    async fn route_inner(&self, message: &InboundMessage, ctx: &ConversationContext) -> RouteReport {
        if !self.guard.first_delivery(&message.id) {
            tracing::info!("duplicate delivery skipped");
            return RouteReport {
                path: RoutePath::Duplicate,
                detected_language: ctx.language,
                command: None,
                decision: None,
                provider: None,
                attempts: Vec::new(),
                outcome: None,
            };
        }

        let detected_language =
            language::detect_and_update(&self.language_store, &ctx.user_id, &message.text, ctx.language);
        let handler_ctx = HandlerContext {
            message: message.clone(),
            conversation: ctx.clone(),
            detected_language,
        };

        if let Some(command) = self.table.match_text(&message.text) {
            tracing::info!(
                route = %command.route,
                args = command.args.len(),
                "command matched"
            );
            let outcome = self
                .dispatcher
                .dispatch_command(command.clone(), &handler_ctx)
                .await;
            return RouteReport {
                path: RoutePath::Command,
                detected_language,
                command: Some(command),
                decision: None,
                provider: None,
                attempts: Vec::new(),
                outcome: Some(outcome),
            };
        }

        // Classify in the language the user is writing in now.
        let classify_ctx = ConversationContext {
            language: detected_language,
            ..ctx.clone()
        };
        let classification = self.engine.decide(&message.text, &classify_ctx).await;
        let outcome = self
            .dispatcher
            .dispatch_decision(classification.decision.clone(), &handler_ctx)
            .await;

        RouteReport {
            path: RoutePath::Classified,
            detected_language,
            command: None,
            decision: Some(classification.decision),
            provider: classification.provider,
            attempts: classification.attempts,
            outcome: Some(outcome),
        }
    }
}
