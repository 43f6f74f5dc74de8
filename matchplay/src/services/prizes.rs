//! Prize payout and refund collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Mutex;

use super::errors::{ServiceError, ServiceResult};
use crate::tournament::models::{PrizeDistribution, Tournament, TournamentId, UserId};

/// Amount owed to one finishing place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeAward {
    /// 1-indexed finishing place
    pub place: usize,
    pub user_id: UserId,
    pub amount: i64,
}

/// Prize payout request for a completed tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizePayout {
    pub tournament_id: TournamentId,
    pub champion: UserId,
    pub runner_up: Option<UserId>,
    pub prize_pool: i64,
    pub distribution: PrizeDistribution,
    pub awards: Vec<PrizeAward>,
    pub idempotency_key: String,
}

impl PrizePayout {
    /// Split the prize pool of `tournament` between champion and runner-up
    pub fn for_tournament(
        tournament: &Tournament,
        champion: UserId,
        runner_up: Option<UserId>,
    ) -> Self {
        let prize_pool = tournament.prize_pool();
        let distribution = tournament.prizes_distribution.clone();

        let awards = [Some(champion), runner_up]
            .into_iter()
            .enumerate()
            .filter_map(|(i, user)| {
                let place = i + 1;
                let amount = distribution.payout_for_place(place, prize_pool)?;
                Some(PrizeAward {
                    place,
                    user_id: user?,
                    amount,
                })
            })
            .filter(|award| award.amount > 0)
            .collect();

        Self {
            tournament_id: tournament.id,
            champion,
            runner_up,
            prize_pool,
            distribution,
            awards,
            idempotency_key: format!("tournament-{}-payout", tournament.id),
        }
    }
}

/// Entry fee refund request for a cancelled tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRefund {
    pub tournament_id: TournamentId,
    pub user_ids: Vec<UserId>,
    pub amount_each: i64,
    pub idempotency_key: String,
}

impl EntryRefund {
    /// Refund every participant whose fee is still held: all registrations
    /// before the bracket was built, the bracket's entrants afterwards.
    pub fn for_tournament(tournament: &Tournament) -> Self {
        let user_ids = if tournament.started_at.is_some() {
            tournament.checked_in()
        } else {
            tournament.participants.iter().map(|p| p.user_id).collect()
        };
        Self {
            tournament_id: tournament.id,
            user_ids,
            amount_each: tournament.entry_fee,
            idempotency_key: format!("tournament-{}-refund", tournament.id),
        }
    }

    /// Refund participants who registered but never checked in.
    ///
    /// `None` when the tournament is free or everyone showed up.
    pub fn for_no_shows(tournament: &Tournament) -> Option<Self> {
        let user_ids = tournament.no_shows();
        if tournament.entry_fee <= 0 || user_ids.is_empty() {
            return None;
        }
        Some(Self {
            tournament_id: tournament.id,
            user_ids,
            amount_each: tournament.entry_fee,
            idempotency_key: format!("tournament-{}-refund-no-shows", tournament.id),
        })
    }
}

/// Wallet-side prize handling
#[async_trait]
pub trait PrizeService: Send + Sync {
    /// Pay out a completed tournament
    async fn distribute(&self, payout: &PrizePayout) -> ServiceResult<()>;

    /// Return entry fees of a cancelled tournament
    async fn refund(&self, refund: &EntryRefund) -> ServiceResult<()>;
}

/// Prize service that logs requests and rejects reused idempotency keys
#[derive(Debug, Default)]
pub struct LogPrizeService {
    seen_keys: Mutex<HashSet<String>>,
}

impl LogPrizeService {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim(&self, key: &str) -> ServiceResult<()> {
        let mut keys = self
            .seen_keys
            .lock()
            .map_err(|_| ServiceError::Unavailable("prize ledger poisoned".to_string()))?;
        if !keys.insert(key.to_string()) {
            return Err(ServiceError::Duplicate(key.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PrizeService for LogPrizeService {
    async fn distribute(&self, payout: &PrizePayout) -> ServiceResult<()> {
        self.claim(&payout.idempotency_key)?;
        for award in &payout.awards {
            log::info!(
                "[prizes] tournament {}: place {} -> user {} ({})",
                payout.tournament_id,
                award.place,
                award.user_id,
                award.amount
            );
        }
        Ok(())
    }

    async fn refund(&self, refund: &EntryRefund) -> ServiceResult<()> {
        self.claim(&refund.idempotency_key)?;
        log::info!(
            "[prizes] tournament {}: refunding {} to {} participants",
            refund.tournament_id,
            refund.amount_each,
            refund.user_ids.len()
        );
        Ok(())
    }
}
