//! Shared helpers for controller integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use matchplay::db::MemoryBracketStore;
use matchplay::matches::{BracketPosition, Match};
use matchplay::services::{
    EntryRefund, Notifier, PrizePayout, PrizeService, ServiceError, ServiceResult,
};
use matchplay::tournament::{
    IncompleteAction, Tournament, TournamentConfig, TournamentController, TournamentEvent, UserId,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Notifier that keeps every event
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<TournamentEvent>>,
    fail: bool,
}

impl RecordingNotifier {
    /// Records events but reports every delivery as failed
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<TournamentEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&TournamentEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &TournamentEvent) -> ServiceResult<()> {
        self.events.lock().unwrap().push(event.clone());
        if self.fail {
            return Err(ServiceError::Unavailable("push gateway down".to_string()));
        }
        Ok(())
    }
}

/// Prize service that keeps every request and enforces idempotency keys
#[derive(Default)]
pub struct RecordingPrizes {
    payouts: Mutex<Vec<PrizePayout>>,
    refunds: Mutex<Vec<EntryRefund>>,
    keys: Mutex<HashSet<String>>,
}

impl RecordingPrizes {
    pub fn payouts(&self) -> Vec<PrizePayout> {
        self.payouts.lock().unwrap().clone()
    }

    pub fn refunds(&self) -> Vec<EntryRefund> {
        self.refunds.lock().unwrap().clone()
    }

    fn claim(&self, key: &str) -> ServiceResult<()> {
        if !self.keys.lock().unwrap().insert(key.to_string()) {
            return Err(ServiceError::Duplicate(key.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PrizeService for RecordingPrizes {
    async fn distribute(&self, payout: &PrizePayout) -> ServiceResult<()> {
        self.claim(&payout.idempotency_key)?;
        self.payouts.lock().unwrap().push(payout.clone());
        Ok(())
    }

    async fn refund(&self, refund: &EntryRefund) -> ServiceResult<()> {
        self.claim(&refund.idempotency_key)?;
        self.refunds.lock().unwrap().push(refund.clone());
        Ok(())
    }
}

pub struct Harness {
    pub controller: TournamentController,
    pub store: Arc<MemoryBracketStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub prizes: Arc<RecordingPrizes>,
}

pub fn harness() -> Harness {
    harness_with(RecordingNotifier::default())
}

pub fn harness_with(notifier: RecordingNotifier) -> Harness {
    let store = Arc::new(MemoryBracketStore::new());
    let notifier = Arc::new(notifier);
    let prizes = Arc::new(RecordingPrizes::default());
    let controller = TournamentController::new(store.clone(), notifier.clone(), prizes.clone());
    Harness {
        controller,
        store,
        notifier,
        prizes,
    }
}

impl Harness {
    /// Tournament in check-in with `users` registered and checked in
    pub async fn checked_in(
        &self,
        size: u32,
        users: &[UserId],
        action: IncompleteAction,
        entry_fee: i64,
    ) -> Tournament {
        let config = TournamentConfig::knockout("Integration Cup".to_string(), size)
            .with_incomplete_action(action)
            .with_entry_fee(entry_fee);
        let tournament = self.controller.create_tournament(config).await.unwrap();

        for &user in users {
            self.controller
                .register_participant(tournament.id, user, Some(format!("team-{user}")))
                .await
                .unwrap();
        }
        self.controller
            .open_check_in(tournament.id, None)
            .await
            .unwrap();
        for &user in users {
            self.controller.check_in(tournament.id, user).await.unwrap();
        }
        self.controller.get_tournament(tournament.id).await.unwrap()
    }

    pub async fn match_at(&self, tournament_id: i64, round: u32, index: u32) -> Match {
        self.controller
            .get_bracket(tournament_id)
            .await
            .unwrap()
            .match_at(BracketPosition::new(round, index))
            .cloned()
            .unwrap()
    }
}
