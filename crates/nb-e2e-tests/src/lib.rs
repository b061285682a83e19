//! End-to-end tests for NutriBot live under `tests/`.
//!
//! Each test drives the gateway's HTTP surface with `tower::oneshot`,
//! backed by wiremock servers standing in for model providers and the
//! downstream business-logic service.
