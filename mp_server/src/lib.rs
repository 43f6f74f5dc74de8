//! HTTP server for the matchplay tournament engine.
//!
//! The binary wires a [`matchplay::TournamentController`] to an axum router,
//! a Prometheus exporter and the periodic check-in sweep. The pieces are
//! exposed here so integration tests can drive the router directly.

pub mod api;
pub mod config;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod notifier;
