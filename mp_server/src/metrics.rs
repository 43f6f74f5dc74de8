//! Prometheus metrics for the tournament server.
//!
//! Metrics are exposed in Prometheus text format on a separate listener,
//! configured through `METRICS_BIND`.
//!
//! # Metrics
//!
//! - **HTTP**: request counts and durations by route and status
//! - **Brackets**: brackets built, byes granted, tournaments completed or cancelled
//! - **Matches**: matches completed, disputes opened and resolved
//! - **Jobs**: check-ins closed by the sweep
//!
//! Recording without an installed exporter is a no-op, so handlers and tests
//! call these freely.

use matchplay::TournamentEvent;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Tournament Metrics
// ============================================================================

/// Count a tournament event under its own metric.
pub fn record_event(event: &TournamentEvent) {
    match event {
        TournamentEvent::BracketBuilt { matches, byes, .. } => {
            metrics::counter!("brackets_built_total").increment(1);
            metrics::histogram!("bracket_matches").record(*matches as f64);
            metrics::counter!("byes_total").increment(*byes as u64);
        }
        TournamentEvent::MatchCompleted { .. } => {
            metrics::counter!("matches_completed_total").increment(1);
        }
        TournamentEvent::DisputeOpened { .. } => {
            metrics::counter!("disputes_opened_total").increment(1);
        }
        TournamentEvent::DisputeResolved { .. } => {
            metrics::counter!("disputes_resolved_total").increment(1);
        }
        TournamentEvent::TournamentCompleted { .. } => {
            metrics::counter!("tournaments_completed_total").increment(1);
        }
        TournamentEvent::TournamentCancelled { .. } => {
            metrics::counter!("tournaments_cancelled_total").increment(1);
        }
        TournamentEvent::BracketHalted { .. } => {
            metrics::counter!("brackets_halted_total").increment(1);
        }
        _ => {}
    }
}

// ============================================================================
// Job Metrics
// ============================================================================

/// Increment check-ins closed by the periodic sweep.
pub fn check_ins_closed_total(count: usize) {
    metrics::counter!("check_ins_closed_total").increment(count as u64);
}
