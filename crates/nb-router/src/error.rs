//! Error types for the routing core.

use thiserror::Error;

/// A provider could not produce raw output.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("provider returned HTTP {status}")]
    Status { status: u16 },

    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider returned an empty response")]
    EmptyResponse,

    /// No rule fired; not a failure of the provider itself.
    #[error("provider abstained")]
    Abstained,

    #[error("provider misconfigured: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            ProviderError::Status {
                status: status.as_u16(),
            }
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

/// Provider output that is not a well-formed decision object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("output is not valid JSON: {0}")]
    NotJson(String),

    #[error("output is JSON but not an object")]
    NotObject,

    #[error("output has no string `action` field")]
    MissingAction,

    #[error("unrecognized action {0:?}")]
    UnrecognizedAction(String),
}

/// Command table construction failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("alias {alias:?} registered for both {existing} and {incoming}")]
    DuplicateAlias {
        alias: String,
        existing: String,
        incoming: String,
    },

    #[error("empty alias registered for {0}")]
    EmptyAlias(String),
}

/// A downstream handler failed.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Failed(String),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("downstream returned HTTP {status}")]
    Downstream { status: u16 },

    #[error("downstream transport error: {0}")]
    Transport(String),
}

/// Language preference persistence failed.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("preference store unavailable: {0}")]
    Unavailable(String),

    #[error("preference store rejected update: HTTP {status}")]
    Rejected { status: u16 },
}
