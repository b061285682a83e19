use serde::{Deserialize, Serialize};

use crate::decision::Decision;

/// Record of one provider call inside a classification pass.
///
/// Diagnostics only; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    pub provider_id: String,
    pub latency_ms: u64,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Output validated into a decision; the chain stops here.
    Success(Decision),
    /// Output was not a well-formed decision object.
    ParseError(String),
    /// Timeout, network failure, non-success status or rate limiting.
    TransportError(String),
    /// The provider had no opinion on this input (local rule tier).
    Abstained,
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success(_))
    }
}
