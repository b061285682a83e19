//! Conversation decision engine — ordered provider chain with fallback.
//!
//! Providers are tried strictly in order, one at a time. The first output
//! that validates is accepted without consulting later providers. Errors,
//! timeouts, panics and malformed output all move on to the next provider.
//! When the chain is exhausted the engine answers `UNKNOWN` with zero
//! confidence; it never fails.

use std::sync::Arc;
use std::time::Instant;

use nb_protocol::{AttemptOutcome, ConversationContext, Decision, ProviderAttempt};

use crate::error::ProviderError;
use crate::prompt;
use crate::providers::Classifier;
use crate::validate;

/// Reasoning attached to the fail-safe decision.
pub const EXHAUSTED_REASONING: &str = "classification unavailable";

/// Output of one pass over the chain.
#[derive(Debug, Clone)]
pub struct Classification {
    pub decision: Decision,
    /// Provider whose output was accepted, if any.
    pub provider: Option<String>,
    pub attempts: Vec<ProviderAttempt>,
}

pub struct DecisionEngine {
    providers: Vec<Arc<dyn Classifier>>,
}

impl DecisionEngine {
    /// Providers are consulted in the order given.
    pub fn new(providers: Vec<Arc<dyn Classifier>>) -> Self {
        Self { providers }
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.provider_id()).collect()
    }

    pub async fn decide(&self, text: &str, ctx: &ConversationContext) -> Classification {
        let system_prompt = prompt::system_prompt(ctx);
        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let attempt = attempt(provider, &system_prompt, text, ctx).await;

            match &attempt.outcome {
                AttemptOutcome::Success(decision) => {
                    tracing::info!(
                        provider = %attempt.provider_id,
                        latency_ms = attempt.latency_ms,
                        action = %decision.action,
                        confidence = decision.confidence,
                        "classification accepted"
                    );
                    let decision = decision.clone();
                    let provider = Some(attempt.provider_id.clone());
                    attempts.push(attempt);
                    return Classification {
                        decision,
                        provider,
                        attempts,
                    };
                }
                AttemptOutcome::Abstained => {
                    tracing::debug!(provider = %attempt.provider_id, "provider abstained");
                }
                AttemptOutcome::ParseError(e) => {
                    tracing::warn!(
                        provider = %attempt.provider_id,
                        latency_ms = attempt.latency_ms,
                        error = %e,
                        "provider returned malformed output, falling back"
                    );
                }
                AttemptOutcome::TransportError(e) => {
                    tracing::warn!(
                        provider = %attempt.provider_id,
                        latency_ms = attempt.latency_ms,
                        error = %e,
                        "provider failed, falling back"
                    );
                }
            }
            attempts.push(attempt);
        }

        tracing::warn!(
            attempts = attempts.len(),
            "all providers exhausted, returning UNKNOWN"
        );
        Classification {
            decision: Decision::unknown(EXHAUSTED_REASONING),
            provider: None,
            attempts,
        }
    }
}

/// One bounded provider call.
///
/// The call runs in its own task so a panic is contained and a timed-out
/// call is aborted rather than left running.
async fn attempt(
    provider: &Arc<dyn Classifier>,
    system_prompt: &str,
    text: &str,
    ctx: &ConversationContext,
) -> ProviderAttempt {
    let provider_id = provider.provider_id().to_string();
    let limit = provider.timeout();
    let start = Instant::now();

    let task = tokio::spawn({
        let provider = Arc::clone(provider);
        let system_prompt = system_prompt.to_string();
        let text = text.to_string();
        let ctx = ctx.clone();
        async move { provider.classify(&system_prompt, &text, &ctx).await }
    });
    let abort = task.abort_handle();

    let outcome = match tokio::time::timeout(limit, task).await {
        Err(_) => {
            abort.abort();
            let e = ProviderError::Timeout {
                timeout_ms: limit.as_millis() as u64,
            };
            AttemptOutcome::TransportError(e.to_string())
        }
        Ok(Err(join_err)) => {
            AttemptOutcome::TransportError(format!("provider task failed: {join_err}"))
        }
        Ok(Ok(Err(ProviderError::Abstained))) => AttemptOutcome::Abstained,
        Ok(Ok(Err(e))) => AttemptOutcome::TransportError(e.to_string()),
        Ok(Ok(Ok(raw))) => match validate::parse_decision(&raw) {
            Ok(decision) => AttemptOutcome::Success(decision),
            Err(e) => AttemptOutcome::ParseError(e.to_string()),
        },
    };

    ProviderAttempt {
        provider_id,
        latency_ms: start.elapsed().as_millis() as u64,
        outcome,
    }
}
