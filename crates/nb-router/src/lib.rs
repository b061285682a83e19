//! NutriBot routing core.
//!
//! Turns one inbound message plus a caller-supplied context snapshot into
//! exactly one handler invocation:
//!
//! 1. **Language detection** (best-effort, non-blocking preference update).
//! 2. **Deterministic command matching** against a fixed alias table.
//! 3. **Decision engine** over an ordered provider chain when no alias matched.
//! 4. **Dispatch** to the registered handler, or to the conversational
//!    fallback for chat, unknown and low-confidence results.

pub mod dedup;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod language;
pub mod matcher;
pub mod prompt;
pub mod providers;
pub mod router;
pub mod validate;

pub use dedup::DeliveryGuard;
pub use dispatcher::{
    ConversationalHandler, DispatchOutcome, Dispatcher, Handler, HandlerContext, HandlerRegistry,
    HandlerRequest,
};
pub use engine::{Classification, DecisionEngine};
pub use error::{HandlerError, ProviderError, RegistryError, StoreError, ValidationError};
pub use language::{LanguageStore, detect_language};
pub use matcher::{CommandDefinition, CommandTable};
pub use providers::Classifier;
pub use router::{RouteReport, RoutePath, Router, RouterConfig};
