//! Server-side event delivery.

use async_trait::async_trait;
use matchplay::TournamentEvent;
use matchplay::services::{Notifier, ServiceResult};
use std::sync::Arc;

use crate::{logging, metrics};

/// Records metrics and structured logs for every event, then hands it on
pub struct ObservedNotifier {
    inner: Arc<dyn Notifier>,
}

impl ObservedNotifier {
    pub fn new(inner: Arc<dyn Notifier>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Notifier for ObservedNotifier {
    async fn notify(&self, event: &TournamentEvent) -> ServiceResult<()> {
        metrics::record_event(event);
        logging::log_tournament_event(event);
        self.inner.notify(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchplay::services::ServiceError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl Notifier for Counting {
        async fn notify(&self, _event: &TournamentEvent) -> ServiceResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(ServiceError::Unavailable("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_forwards_and_keeps_inner_result() {
        let inner = Arc::new(Counting::default());
        let notifier = ObservedNotifier::new(inner.clone());

        let result = notifier
            .notify(&TournamentEvent::CheckInOpened { tournament_id: 4 })
            .await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
        assert_eq!(inner.0.load(Ordering::SeqCst), 1);
    }
}
