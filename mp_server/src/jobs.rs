//! Background jobs.

use chrono::Utc;
use matchplay::TournamentController;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};

use crate::{logging, metrics};

/// Closes check-in of tournaments whose deadline has passed
pub struct CheckInSweeper {
    controller: TournamentController,
    period: Duration,
}

impl CheckInSweeper {
    pub fn new(controller: TournamentController, period: Duration) -> Self {
        Self { controller, period }
    }

    /// Run one sweep, returning how many tournaments were closed
    pub async fn sweep(&self) -> usize {
        let started = Instant::now();
        let closed = match self.controller.close_expired_check_ins(Utc::now()).await {
            Ok(closed) => closed,
            Err(e) => {
                tracing::error!(error = %e, "Check-in sweep failed");
                return 0;
            }
        };

        for (tournament_id, outcome) in &closed {
            tracing::info!(tournament_id = tournament_id, ?outcome, "Check-in closed by sweep");
        }
        metrics::check_ins_closed_total(closed.len());
        logging::log_performance(
            "check_in_sweep",
            started.elapsed().as_millis() as u64,
            Some(&format!("{} closed", closed.len())),
        );
        closed.len()
    }

    /// Sweep on every tick until `shutdown` flips to true
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(period_secs = self.period.as_secs(), "Check-in sweeper starting");

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.sweep().await;
                }
            }
        }

        tracing::info!("Check-in sweeper stopped");
    }
}
