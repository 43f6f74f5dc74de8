//! Repository trait definitions for the bracket engine.
//!
//! All mutations go through a [`BracketSession`]: a unit of work scoped to a
//! single tournament that holds that tournament's lock until it commits or is
//! dropped. Dropping a session without committing discards every write made
//! through it, so a bracket is either fully persisted or not at all.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::sync::Arc;

use super::errors::{StoreError, StoreResult};
use super::timeouts::{LOCK_TIMEOUT, with_timeout};
use crate::matches::{
    BracketPosition, Dispute, Match, MatchId, MatchStatus, NewMatch, Score, Slot,
};
use crate::tournament::models::{
    IncompleteAction, Participant, PrizeDistribution, Tournament, TournamentConfig,
    TournamentFormat, TournamentId, TournamentStatus, UserId,
};

/// Outcome of a conditional slot write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotWrite {
    /// Slot was empty and now holds the participant
    Written,
    /// Slot already holds this very participant (replayed advancement)
    AlreadyHeld,
    /// Slot holds somebody else; nothing was written
    Conflict { existing: UserId },
}

/// Trait for tournament and match storage
#[async_trait]
pub trait BracketStore: Send + Sync {
    /// Create a tournament in `open` status
    async fn create_tournament(&self, config: &TournamentConfig) -> StoreResult<Tournament>;

    /// Get tournament by ID
    async fn get_tournament(&self, tournament_id: TournamentId) -> StoreResult<Option<Tournament>>;

    /// All matches of a tournament ordered by round and index
    async fn list_matches(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>>;

    /// Get match by ID
    async fn find_match(&self, match_id: MatchId) -> StoreResult<Option<Match>>;

    /// Tournaments in check-in whose deadline is at or before `now`
    async fn check_ins_due(&self, now: DateTime<Utc>) -> StoreResult<Vec<TournamentId>>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> StoreResult<()>;

    /// Open a session holding the tournament's lock
    async fn begin(&self, tournament_id: TournamentId) -> StoreResult<Box<dyn BracketSession>>;
}

/// Unit of work over one tournament and its match tree
#[async_trait]
pub trait BracketSession: Send {
    /// Tournament as loaded (and updated) through this session
    fn tournament(&self) -> &Tournament;

    /// Persist tournament-level fields (status, participants, champion, timestamps)
    async fn save_tournament(&mut self, tournament: &Tournament) -> StoreResult<()>;

    /// Insert a full set of matches
    async fn insert_matches(&mut self, matches: &[NewMatch]) -> StoreResult<Vec<Match>>;

    /// Match at a bracket position
    async fn match_at(&mut self, position: BracketPosition) -> StoreResult<Option<Match>>;

    /// Match by ID, restricted to this session's tournament
    async fn match_by_id(&mut self, match_id: MatchId) -> StoreResult<Option<Match>>;

    /// Write `user_id` into `slot` only if the slot is empty
    async fn fill_slot_if_empty(
        &mut self,
        match_id: MatchId,
        slot: Slot,
        user_id: UserId,
    ) -> StoreResult<SlotWrite>;

    /// Persist a match's status and contest outcome. Player slots are left
    /// untouched; they only change through [`Self::fill_slot_if_empty`].
    async fn save_match(&mut self, game: &Match) -> StoreResult<()>;

    /// Overwrite a slot regardless of its content. Admin repair only.
    async fn set_slot(
        &mut self,
        match_id: MatchId,
        slot: Slot,
        user_id: Option<UserId>,
    ) -> StoreResult<()>;

    /// Make every write of this session visible
    async fn commit(&mut self) -> StoreResult<()>;
}

const TOURNAMENT_COLUMNS: &str = "id, name, max_participants, format, incomplete_action, status, \
     participants, entry_fee, prizes_distribution, check_in_deadline, champion_user, \
     halted_reason, created_at, started_at, finished_at";

const MATCH_COLUMNS: &str = "id, tournament_id, round, match_index, player1_id, player2_id, \
     status, is_bye, winner_id, loser_id, player1_score, player2_score, reported_by, \
     reported_score, dispute, created_at, completed_at";

fn tournament_from_row(row: &PgRow) -> StoreResult<Tournament> {
    let format: String = row.try_get("format")?;
    let incomplete_action: String = row.try_get("incomplete_action")?;
    let status: String = row.try_get("status")?;

    Ok(Tournament {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        max_participants: row.try_get::<i32, _>("max_participants")? as u32,
        format: TournamentFormat::parse(&format)
            .ok_or_else(|| StoreError::Corrupt(format!("tournament format '{format}'")))?,
        incomplete_action: IncompleteAction::parse(&incomplete_action).ok_or_else(|| {
            StoreError::Corrupt(format!("incomplete action '{incomplete_action}'"))
        })?,
        status: TournamentStatus::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("tournament status '{status}'")))?,
        participants: row
            .try_get::<Json<Vec<Participant>>, _>("participants")?
            .0,
        entry_fee: row.try_get("entry_fee")?,
        prizes_distribution: row
            .try_get::<Json<PrizeDistribution>, _>("prizes_distribution")?
            .0,
        check_in_deadline: row
            .try_get::<Option<NaiveDateTime>, _>("check_in_deadline")?
            .map(|dt| dt.and_utc()),
        champion_user: row.try_get("champion_user")?,
        halted_reason: row.try_get("halted_reason")?,
        created_at: row.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
        started_at: row
            .try_get::<Option<NaiveDateTime>, _>("started_at")?
            .map(|dt| dt.and_utc()),
        finished_at: row
            .try_get::<Option<NaiveDateTime>, _>("finished_at")?
            .map(|dt| dt.and_utc()),
    })
}

fn match_from_row(row: &PgRow) -> StoreResult<Match> {
    let status: String = row.try_get("status")?;
    let player1_score: Option<i32> = row.try_get("player1_score")?;
    let player2_score: Option<i32> = row.try_get("player2_score")?;

    Ok(Match {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        round: row.try_get::<i32, _>("round")? as u32,
        match_index: row.try_get::<i32, _>("match_index")? as u32,
        player1: row.try_get("player1_id")?,
        player2: row.try_get("player2_id")?,
        status: MatchStatus::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("match status '{status}'")))?,
        is_bye: row.try_get("is_bye")?,
        winner: row.try_get("winner_id")?,
        loser: row.try_get("loser_id")?,
        score: player1_score
            .zip(player2_score)
            .map(|(p1, p2)| Score::new(p1 as u32, p2 as u32)),
        reported_by: row.try_get("reported_by")?,
        reported_score: row
            .try_get::<Option<Json<Score>>, _>("reported_score")?
            .map(|json| json.0),
        dispute: row
            .try_get::<Option<Json<Dispute>>, _>("dispute")?
            .map(|json| json.0),
        created_at: row.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
        completed_at: row
            .try_get::<Option<NaiveDateTime>, _>("completed_at")?
            .map(|dt| dt.and_utc()),
    })
}

/// PostgreSQL implementation of [`BracketStore`]
#[derive(Clone)]
pub struct PgBracketStore {
    pool: Arc<PgPool>,
}

impl PgBracketStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BracketStore for PgBracketStore {
    async fn create_tournament(&self, config: &TournamentConfig) -> StoreResult<Tournament> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO tournaments (name, max_participants, format, incomplete_action, status,
                                     participants, entry_fee, prizes_distribution, check_in_deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TOURNAMENT_COLUMNS}
            "#
        ))
        .bind(&config.name)
        .bind(config.max_participants as i32)
        .bind(config.format.as_str())
        .bind(config.incomplete_action.as_str())
        .bind(TournamentStatus::Open.as_str())
        .bind(Json(Vec::<Participant>::new()))
        .bind(config.entry_fee)
        .bind(Json(&config.prizes_distribution))
        .bind(config.check_in_deadline.map(|dt| dt.naive_utc()))
        .fetch_one(self.pool.as_ref())
        .await?;

        tournament_from_row(&row)
    }

    async fn get_tournament(&self, tournament_id: TournamentId) -> StoreResult<Option<Tournament>> {
        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"
        ))
        .bind(tournament_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn list_matches(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM tournament_matches
             WHERE tournament_id = $1
             ORDER BY round, match_index"
        ))
        .bind(tournament_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn find_match(&self, match_id: MatchId) -> StoreResult<Option<Match>> {
        let row = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM tournament_matches WHERE id = $1"
        ))
        .bind(match_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn check_ins_due(&self, now: DateTime<Utc>) -> StoreResult<Vec<TournamentId>> {
        let rows = sqlx::query(
            "SELECT id FROM tournaments
             WHERE status = $1 AND check_in_deadline IS NOT NULL AND check_in_deadline <= $2
             ORDER BY check_in_deadline",
        )
        .bind(TournamentStatus::CheckIn.as_str())
        .bind(now.naive_utc())
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter()
            .map(|row| row.try_get("id").map_err(StoreError::from))
            .collect()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }

    async fn begin(&self, tournament_id: TournamentId) -> StoreResult<Box<dyn BracketSession>> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes every session of this tournament
        let query = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1 FOR UPDATE");
        let row = with_timeout(
            LOCK_TIMEOUT,
            sqlx::query(&query)
                .bind(tournament_id)
                .fetch_optional(&mut *tx),
        )
        .await?
        .ok_or(StoreError::TournamentNotFound(tournament_id))?;

        let tournament = tournament_from_row(&row)?;

        Ok(Box::new(PgBracketSession {
            tx: Some(tx),
            tournament,
        }))
    }
}

/// PostgreSQL session backed by a transaction holding the tournament row lock
pub struct PgBracketSession {
    tx: Option<Transaction<'static, Postgres>>,
    tournament: Tournament,
}

impl PgBracketSession {
    fn tx(&mut self) -> StoreResult<&mut Transaction<'static, Postgres>> {
        self.tx.as_mut().ok_or(StoreError::SessionClosed)
    }
}

#[async_trait]
impl BracketSession for PgBracketSession {
    fn tournament(&self) -> &Tournament {
        &self.tournament
    }

    async fn save_tournament(&mut self, tournament: &Tournament) -> StoreResult<()> {
        let tx = self.tx()?;
        sqlx::query(
            r#"
            UPDATE tournaments
            SET status = $1, participants = $2, champion_user = $3, check_in_deadline = $4,
                started_at = $5, finished_at = $6, halted_reason = $7
            WHERE id = $8
            "#,
        )
        .bind(tournament.status.as_str())
        .bind(Json(&tournament.participants))
        .bind(tournament.champion_user)
        .bind(tournament.check_in_deadline.map(|dt| dt.naive_utc()))
        .bind(tournament.started_at.map(|dt| dt.naive_utc()))
        .bind(tournament.finished_at.map(|dt| dt.naive_utc()))
        .bind(tournament.halted_reason.as_deref())
        .bind(tournament.id)
        .execute(&mut **tx)
        .await?;

        self.tournament = tournament.clone();
        Ok(())
    }

    async fn insert_matches(&mut self, matches: &[NewMatch]) -> StoreResult<Vec<Match>> {
        let tournament_id = self.tournament.id;
        let tx = self.tx()?;
        let mut inserted = Vec::with_capacity(matches.len());

        for new in matches {
            let row = sqlx::query(&format!(
                r#"
                INSERT INTO tournament_matches (tournament_id, round, match_index, player1_id,
                                                player2_id, status, is_bye, winner_id, completed_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING {MATCH_COLUMNS}
                "#
            ))
            .bind(tournament_id)
            .bind(new.round as i32)
            .bind(new.match_index as i32)
            .bind(new.player1)
            .bind(new.player2)
            .bind(new.status.as_str())
            .bind(new.is_bye)
            .bind(new.winner)
            .bind(new.is_bye.then(|| Utc::now().naive_utc()))
            .fetch_one(&mut **tx)
            .await?;

            inserted.push(match_from_row(&row)?);
        }

        Ok(inserted)
    }

    async fn match_at(&mut self, position: BracketPosition) -> StoreResult<Option<Match>> {
        let tournament_id = self.tournament.id;
        let tx = self.tx()?;
        let row = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM tournament_matches
             WHERE tournament_id = $1 AND round = $2 AND match_index = $3"
        ))
        .bind(tournament_id)
        .bind(position.round as i32)
        .bind(position.index as i32)
        .fetch_optional(&mut **tx)
        .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn match_by_id(&mut self, match_id: MatchId) -> StoreResult<Option<Match>> {
        let tournament_id = self.tournament.id;
        let tx = self.tx()?;
        let row = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM tournament_matches WHERE id = $1 AND tournament_id = $2"
        ))
        .bind(match_id)
        .bind(tournament_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn fill_slot_if_empty(
        &mut self,
        match_id: MatchId,
        slot: Slot,
        user_id: UserId,
    ) -> StoreResult<SlotWrite> {
        let column = slot.column();
        let tx = self.tx()?;

        let result = sqlx::query(&format!(
            "UPDATE tournament_matches SET {column} = $1 WHERE id = $2 AND {column} IS NULL"
        ))
        .bind(user_id)
        .bind(match_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(SlotWrite::Written);
        }

        let existing: Option<UserId> = sqlx::query(&format!(
            "SELECT {column} FROM tournament_matches WHERE id = $1"
        ))
        .bind(match_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::MatchNotFound(match_id))?
        .try_get(column)?;

        match existing {
            Some(existing) if existing == user_id => Ok(SlotWrite::AlreadyHeld),
            Some(existing) => Ok(SlotWrite::Conflict { existing }),
            None => Err(StoreError::Corrupt(format!(
                "slot {column} of match {match_id} neither empty nor filled"
            ))),
        }
    }

    async fn save_match(&mut self, game: &Match) -> StoreResult<()> {
        let tx = self.tx()?;
        let result = sqlx::query(
            r#"
            UPDATE tournament_matches
            SET status = $1, is_bye = $2, winner_id = $3, loser_id = $4,
                player1_score = $5, player2_score = $6, reported_by = $7, reported_score = $8,
                dispute = $9, completed_at = $10
            WHERE id = $11 AND tournament_id = $12
            "#,
        )
        .bind(game.status.as_str())
        .bind(game.is_bye)
        .bind(game.winner)
        .bind(game.loser)
        .bind(game.score.map(|s| s.player1 as i32))
        .bind(game.score.map(|s| s.player2 as i32))
        .bind(game.reported_by)
        .bind(game.reported_score.map(Json))
        .bind(game.dispute.as_ref().map(Json))
        .bind(game.completed_at.map(|dt| dt.naive_utc()))
        .bind(game.id)
        .bind(game.tournament_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MatchNotFound(game.id));
        }
        Ok(())
    }

    async fn set_slot(
        &mut self,
        match_id: MatchId,
        slot: Slot,
        user_id: Option<UserId>,
    ) -> StoreResult<()> {
        let column = slot.column();
        let tournament_id = self.tournament.id;
        let tx = self.tx()?;

        let result = sqlx::query(&format!(
            "UPDATE tournament_matches SET {column} = $1 WHERE id = $2 AND tournament_id = $3"
        ))
        .bind(user_id)
        .bind(match_id)
        .bind(tournament_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MatchNotFound(match_id));
        }
        Ok(())
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let tx = self.tx.take().ok_or(StoreError::SessionClosed)?;
        tx.commit().await?;
        Ok(())
    }
}
