//! Notification collaborator.

use async_trait::async_trait;

use super::errors::ServiceResult;
use crate::tournament::events::TournamentEvent;

/// Delivers tournament events to participants.
///
/// Called after the state change committed. Failures are logged by the caller
/// and never undo bracket state.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &TournamentEvent) -> ServiceResult<()>;
}

/// Notifier that writes events to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &TournamentEvent) -> ServiceResult<()> {
        log::info!("[notify] {event}");
        Ok(())
    }
}
