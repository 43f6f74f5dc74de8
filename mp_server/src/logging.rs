//! Structured logging configuration.
//!
//! The library logs through the `log` facade. `init` installs a `tracing`
//! subscriber that also receives those records, so engine and HTTP logs share
//! one formatter and one `RUST_LOG` filter.

use matchplay::TournamentEvent;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, falling back to `info,sqlx=warn,hyper=warn`.
///
/// # Example
///
/// ```no_run
/// use mp_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a tournament event with its identifiers as fields
pub fn log_tournament_event(event: &TournamentEvent) {
    match event {
        TournamentEvent::TournamentCompleted { champion, .. } => tracing::info!(
            tournament_id = event.tournament_id(),
            champion = champion,
            "{}",
            event
        ),
        TournamentEvent::TournamentCancelled { .. }
        | TournamentEvent::DisputeOpened { .. }
        | TournamentEvent::BracketRepaired { .. } => {
            tracing::warn!(tournament_id = event.tournament_id(), "{}", event)
        }
        TournamentEvent::BracketHalted { match_id, .. } => tracing::error!(
            tournament_id = event.tournament_id(),
            match_id = match_id,
            "{}",
            event
        ),
        _ => tracing::info!(tournament_id = event.tournament_id(), "{}", event),
    }
}

/// Log a background operation, warning when it ran long
///
/// # Arguments
///
/// * `operation` - Operation name
/// * `duration_ms` - Duration in milliseconds
/// * `metadata` - Additional metadata
pub fn log_performance(operation: &str, duration_ms: u64, metadata: Option<&str>) {
    if duration_ms > 1000 {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_tournament_event() {
        // Just ensure it doesn't panic without a subscriber
        log_tournament_event(&TournamentEvent::TournamentCompleted {
            tournament_id: 1,
            champion: 7,
            runner_up: Some(3),
        });
        log_tournament_event(&TournamentEvent::CheckInOpened { tournament_id: 2 });
    }

    #[test]
    fn test_log_performance() {
        log_performance("check_in_sweep", 500, Some("3 tournaments"));
        log_performance("check_in_sweep", 2000, None);
    }
}
