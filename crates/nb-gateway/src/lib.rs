//! NutriBot gateway — library crate for the webhook server.
//!
//! Re-exports all modules so the binary (`main.rs`) and `nb-e2e-tests` can
//! build an [`AppState`](state::AppState) and router without a socket.

pub mod config;
pub mod downstream;
pub mod error;
pub mod providers;
pub mod routes;
pub mod state;
