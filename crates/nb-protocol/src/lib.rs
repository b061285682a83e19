//! Shared NutriBot data model: messages, decisions, routes and provider
//! attempt records. Pure data; no I/O.

pub mod attempt;
pub mod decision;
pub mod error;
pub mod message;
pub mod route;

pub use attempt::*;
pub use decision::*;
pub use error::*;
pub use message::*;
pub use route::*;
