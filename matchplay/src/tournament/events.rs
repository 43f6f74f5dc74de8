//! Events emitted by tournament state transitions.
//!
//! Events are collected while a bracket session is open and handed to the
//! notifier only after the session committed.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::models::{TournamentId, UserId};
use crate::matches::{MatchId, Score};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TournamentEvent {
    /// Check-in opened
    CheckInOpened { tournament_id: TournamentId },
    /// Bracket persisted and tournament active
    BracketBuilt {
        tournament_id: TournamentId,
        matches: usize,
        byes: usize,
    },
    /// Both players of a match are known
    MatchScheduled {
        tournament_id: TournamentId,
        match_id: MatchId,
        round: u32,
        player1: UserId,
        player2: UserId,
    },
    /// A participant moved on without playing
    ByeAdvanced {
        tournament_id: TournamentId,
        match_id: MatchId,
        round: u32,
        user_id: UserId,
    },
    /// A score waits for the opponent's confirmation
    ResultSubmitted {
        tournament_id: TournamentId,
        match_id: MatchId,
        reported_by: UserId,
        score: Score,
    },
    /// A played match has a final result
    MatchCompleted {
        tournament_id: TournamentId,
        match_id: MatchId,
        winner: UserId,
        loser: UserId,
    },
    DisputeOpened {
        tournament_id: TournamentId,
        match_id: MatchId,
        opened_by: UserId,
    },
    DisputeResolved {
        tournament_id: TournamentId,
        match_id: MatchId,
        winner: UserId,
        resolved_by: UserId,
    },
    /// Final match decided
    TournamentCompleted {
        tournament_id: TournamentId,
        champion: UserId,
        runner_up: Option<UserId>,
    },
    TournamentCancelled {
        tournament_id: TournamentId,
        reason: String,
    },
    /// Advancement stopped on an inconsistent bracket
    BracketHalted {
        tournament_id: TournamentId,
        match_id: MatchId,
        reason: String,
    },
    /// An admin repaired a halted bracket
    BracketRepaired {
        tournament_id: TournamentId,
        repaired_by: UserId,
    },
}

impl TournamentEvent {
    pub fn tournament_id(&self) -> TournamentId {
        match self {
            TournamentEvent::CheckInOpened { tournament_id }
            | TournamentEvent::BracketBuilt { tournament_id, .. }
            | TournamentEvent::MatchScheduled { tournament_id, .. }
            | TournamentEvent::ByeAdvanced { tournament_id, .. }
            | TournamentEvent::ResultSubmitted { tournament_id, .. }
            | TournamentEvent::MatchCompleted { tournament_id, .. }
            | TournamentEvent::DisputeOpened { tournament_id, .. }
            | TournamentEvent::DisputeResolved { tournament_id, .. }
            | TournamentEvent::TournamentCompleted { tournament_id, .. }
            | TournamentEvent::TournamentCancelled { tournament_id, .. }
            | TournamentEvent::BracketHalted { tournament_id, .. }
            | TournamentEvent::BracketRepaired { tournament_id, .. } => *tournament_id,
        }
    }
}

impl fmt::Display for TournamentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CheckInOpened { tournament_id } => {
                write!(f, "check-in opened for tournament {tournament_id}")
            }
            Self::BracketBuilt {
                tournament_id,
                matches,
                byes,
            } => write!(
                f,
                "tournament {tournament_id} bracket built with {matches} matches and {byes} byes"
            ),
            Self::MatchScheduled {
                match_id,
                round,
                player1,
                player2,
                ..
            } => write!(
                f,
                "match {match_id} (round {round}) scheduled: {player1} vs {player2}"
            ),
            Self::ByeAdvanced {
                match_id,
                round,
                user_id,
                ..
            } => write!(f, "user {user_id} advanced by bye in match {match_id} (round {round})"),
            Self::ResultSubmitted {
                match_id,
                reported_by,
                score,
                ..
            } => write!(f, "user {reported_by} reported {score} for match {match_id}"),
            Self::MatchCompleted {
                match_id,
                winner,
                loser,
                ..
            } => write!(f, "user {winner} beat user {loser} in match {match_id}"),
            Self::DisputeOpened {
                match_id,
                opened_by,
                ..
            } => write!(f, "user {opened_by} disputed match {match_id}"),
            Self::DisputeResolved {
                match_id,
                winner,
                resolved_by,
                ..
            } => write!(
                f,
                "admin {resolved_by} resolved match {match_id} in favour of user {winner}"
            ),
            Self::TournamentCompleted {
                tournament_id,
                champion,
                ..
            } => write!(f, "user {champion} won tournament {tournament_id}"),
            Self::TournamentCancelled {
                tournament_id,
                reason,
            } => write!(f, "tournament {tournament_id} cancelled: {reason}"),
            Self::BracketHalted {
                tournament_id,
                match_id,
                reason,
            } => write!(
                f,
                "tournament {tournament_id} halted at match {match_id}: {reason}"
            ),
            Self::BracketRepaired {
                tournament_id,
                repaired_by,
            } => write!(f, "admin {repaired_by} repaired tournament {tournament_id}"),
        }
    }
}
