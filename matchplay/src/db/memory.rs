//! In-process implementation of [`BracketStore`].
//!
//! Every tournament lives behind its own `tokio::sync::Mutex`. A session takes
//! the owned guard, works on a copy of the record and writes the copy back on
//! commit, so an uncommitted session leaves no trace and sessions of different
//! tournaments never wait on each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::errors::{StoreError, StoreResult};
use super::repository::{BracketSession, BracketStore, SlotWrite};
use super::timeouts::{LOCK_TIMEOUT, with_timeout};
use crate::matches::{BracketPosition, Match, MatchId, NewMatch, Slot};
use crate::tournament::models::{
    Tournament, TournamentConfig, TournamentId, TournamentStatus, UserId,
};

#[derive(Debug, Clone)]
struct TournamentRecord {
    tournament: Tournament,
    matches: BTreeMap<MatchId, Match>,
}

type SharedRecord = Arc<AsyncMutex<TournamentRecord>>;

/// Tournament and match lookups shared by the store and its sessions
#[derive(Default)]
struct Registry {
    tournaments: Mutex<HashMap<TournamentId, SharedRecord>>,
    match_owners: Mutex<HashMap<MatchId, TournamentId>>,
    next_tournament_id: AtomicI64,
    next_match_id: AtomicI64,
}

impl Registry {
    fn record(&self, tournament_id: TournamentId) -> StoreResult<SharedRecord> {
        self.tournaments
            .lock()
            .map_err(|_| StoreError::Corrupt("tournament registry poisoned".to_string()))?
            .get(&tournament_id)
            .cloned()
            .ok_or(StoreError::TournamentNotFound(tournament_id))
    }

    fn owner_of(&self, match_id: MatchId) -> StoreResult<Option<TournamentId>> {
        Ok(self
            .match_owners
            .lock()
            .map_err(|_| StoreError::Corrupt("match registry poisoned".to_string()))?
            .get(&match_id)
            .copied())
    }
}

/// In-memory bracket store for tests, demos and single-node deployments
#[derive(Clone, Default)]
pub struct MemoryBracketStore {
    registry: Arc<Registry>,
}

impl MemoryBracketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BracketStore for MemoryBracketStore {
    async fn create_tournament(&self, config: &TournamentConfig) -> StoreResult<Tournament> {
        let id = self.registry.next_tournament_id.fetch_add(1, Ordering::SeqCst) + 1;
        let tournament = Tournament {
            id,
            name: config.name.clone(),
            max_participants: config.max_participants,
            format: config.format,
            incomplete_action: config.incomplete_action,
            status: TournamentStatus::Open,
            participants: Vec::new(),
            entry_fee: config.entry_fee,
            prizes_distribution: config.prizes_distribution.clone(),
            check_in_deadline: config.check_in_deadline,
            champion_user: None,
            halted_reason: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        };

        let record = TournamentRecord {
            tournament: tournament.clone(),
            matches: BTreeMap::new(),
        };
        self.registry
            .tournaments
            .lock()
            .map_err(|_| StoreError::Corrupt("tournament registry poisoned".to_string()))?
            .insert(id, Arc::new(AsyncMutex::new(record)));

        Ok(tournament)
    }

    async fn get_tournament(&self, tournament_id: TournamentId) -> StoreResult<Option<Tournament>> {
        match self.registry.record(tournament_id) {
            Ok(record) => Ok(Some(record.lock().await.tournament.clone())),
            Err(StoreError::TournamentNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_matches(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>> {
        let record = self.registry.record(tournament_id)?;
        let record = record.lock().await;
        let mut matches: Vec<Match> = record.matches.values().cloned().collect();
        matches.sort_by_key(|m| m.position());
        Ok(matches)
    }

    async fn find_match(&self, match_id: MatchId) -> StoreResult<Option<Match>> {
        let Some(tournament_id) = self.registry.owner_of(match_id)? else {
            return Ok(None);
        };
        let record = self.registry.record(tournament_id)?;
        let record = record.lock().await;
        Ok(record.matches.get(&match_id).cloned())
    }

    async fn check_ins_due(&self, now: DateTime<Utc>) -> StoreResult<Vec<TournamentId>> {
        let records: Vec<SharedRecord> = self
            .registry
            .tournaments
            .lock()
            .map_err(|_| StoreError::Corrupt("tournament registry poisoned".to_string()))?
            .values()
            .cloned()
            .collect();

        let mut due = Vec::new();
        for record in records {
            let record = record.lock().await;
            let tournament = &record.tournament;
            if tournament.status == TournamentStatus::CheckIn
                && tournament.check_in_deadline.is_some_and(|deadline| deadline <= now)
            {
                due.push(tournament.id);
            }
        }
        due.sort_unstable();
        Ok(due)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn begin(&self, tournament_id: TournamentId) -> StoreResult<Box<dyn BracketSession>> {
        let record = self.registry.record(tournament_id)?;
        let guard = with_timeout(LOCK_TIMEOUT, async {
            Ok::<_, StoreError>(record.lock_owned().await)
        })
        .await?;
        let working = (*guard).clone();

        Ok(Box::new(MemoryBracketSession {
            registry: Arc::clone(&self.registry),
            guard: Some(guard),
            working,
            inserted: Vec::new(),
        }))
    }
}

/// Session over one tournament record
pub struct MemoryBracketSession {
    registry: Arc<Registry>,
    guard: Option<OwnedMutexGuard<TournamentRecord>>,
    working: TournamentRecord,
    inserted: Vec<MatchId>,
}

impl MemoryBracketSession {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.guard.is_none() {
            return Err(StoreError::SessionClosed);
        }
        Ok(())
    }

    fn working_match(&mut self, match_id: MatchId) -> StoreResult<&mut Match> {
        self.working
            .matches
            .get_mut(&match_id)
            .ok_or(StoreError::MatchNotFound(match_id))
    }
}

#[async_trait]
impl BracketSession for MemoryBracketSession {
    fn tournament(&self) -> &Tournament {
        &self.working.tournament
    }

    async fn save_tournament(&mut self, tournament: &Tournament) -> StoreResult<()> {
        self.ensure_open()?;
        if tournament.id != self.working.tournament.id {
            return Err(StoreError::TournamentNotFound(tournament.id));
        }
        self.working.tournament = tournament.clone();
        Ok(())
    }

    async fn insert_matches(&mut self, matches: &[NewMatch]) -> StoreResult<Vec<Match>> {
        self.ensure_open()?;
        let tournament_id = self.working.tournament.id;
        let now = Utc::now();

        let positions_taken = self
            .working
            .matches
            .values()
            .any(|existing| matches.iter().any(|new| new.position() == existing.position()));
        if positions_taken {
            return Err(StoreError::Corrupt(format!(
                "tournament {tournament_id} already has matches at the requested positions"
            )));
        }

        let mut inserted = Vec::with_capacity(matches.len());
        for new in matches {
            let id = self.registry.next_match_id.fetch_add(1, Ordering::SeqCst) + 1;
            let game = Match {
                id,
                tournament_id,
                round: new.round,
                match_index: new.match_index,
                player1: new.player1,
                player2: new.player2,
                status: new.status,
                is_bye: new.is_bye,
                winner: new.winner,
                loser: None,
                score: None,
                reported_by: None,
                reported_score: None,
                dispute: None,
                created_at: now,
                completed_at: new.is_bye.then_some(now),
            };
            self.working.matches.insert(id, game.clone());
            self.inserted.push(id);
            inserted.push(game);
        }
        Ok(inserted)
    }

    async fn match_at(&mut self, position: BracketPosition) -> StoreResult<Option<Match>> {
        self.ensure_open()?;
        Ok(self
            .working
            .matches
            .values()
            .find(|m| m.position() == position)
            .cloned())
    }

    async fn match_by_id(&mut self, match_id: MatchId) -> StoreResult<Option<Match>> {
        self.ensure_open()?;
        Ok(self.working.matches.get(&match_id).cloned())
    }

    async fn fill_slot_if_empty(
        &mut self,
        match_id: MatchId,
        slot: Slot,
        user_id: UserId,
    ) -> StoreResult<SlotWrite> {
        self.ensure_open()?;
        let game = self.working_match(match_id)?;
        let current = match slot {
            Slot::One => &mut game.player1,
            Slot::Two => &mut game.player2,
        };

        Ok(match *current {
            None => {
                *current = Some(user_id);
                SlotWrite::Written
            }
            Some(existing) if existing == user_id => SlotWrite::AlreadyHeld,
            Some(existing) => SlotWrite::Conflict { existing },
        })
    }

    async fn save_match(&mut self, game: &Match) -> StoreResult<()> {
        self.ensure_open()?;
        if game.tournament_id != self.working.tournament.id {
            return Err(StoreError::MatchNotFound(game.id));
        }
        let stored = self.working_match(game.id)?;
        let (player1, player2) = (stored.player1, stored.player2);
        *stored = game.clone();
        stored.player1 = player1;
        stored.player2 = player2;
        Ok(())
    }

    async fn set_slot(
        &mut self,
        match_id: MatchId,
        slot: Slot,
        user_id: Option<UserId>,
    ) -> StoreResult<()> {
        self.ensure_open()?;
        let game = self.working_match(match_id)?;
        match slot {
            Slot::One => game.player1 = user_id,
            Slot::Two => game.player2 = user_id,
        }
        Ok(())
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let mut guard = self.guard.take().ok_or(StoreError::SessionClosed)?;
        let tournament_id = self.working.tournament.id;
        *guard = self.working.clone();

        let mut owners = self
            .registry
            .match_owners
            .lock()
            .map_err(|_| StoreError::Corrupt("match registry poisoned".to_string()))?;
        for match_id in self.inserted.drain(..) {
            owners.insert(match_id, tournament_id);
        }
        Ok(())
    }
}
