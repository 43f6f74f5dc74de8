//! Tournament error types.

use thiserror::Error;

use super::models::{TournamentFormat, TournamentId, TournamentStatus, UserId};
use crate::bracket::BracketError;
use crate::db::StoreError;
use crate::matches::{MatchError, MatchId};

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Tournament not in correct state: expected {expected}, got {actual}")]
    InvalidState {
        expected: TournamentStatus,
        actual: TournamentStatus,
    },

    /// Bracket size outside 8, 16 or 32
    #[error("Unsupported participant count: {0}")]
    UnsupportedParticipantCount(u32),

    #[error("Unsupported tournament format: {}", .0.as_str())]
    UnsupportedFormat(TournamentFormat),

    #[error("Tournament name must not be empty")]
    InvalidName,

    #[error("Invalid entry fee: {0}")]
    InvalidEntryFee(i64),

    #[error("Prize distribution must hold shares between 0 and 1 summing to at most 1")]
    InvalidPrizes,

    #[error("Tournament is full")]
    TournamentFull,

    #[error("User {0} already registered")]
    AlreadyRegistered(UserId),

    #[error("User {0} is not registered")]
    NotRegistered(UserId),

    /// Manual seeding must list every checked-in participant exactly once
    #[error("Seeds do not match the checked-in participants")]
    SeedsMismatch,

    /// Advancement stopped on an inconsistent bracket
    #[error("Tournament {0} is halted until an admin repairs its bracket")]
    Halted(TournamentId),

    #[error("Tournament {0} is not halted")]
    NotHalted(TournamentId),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Bracket(#[from] BracketError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TournamentError {
    /// Get a client-safe error message that doesn't leak storage internals
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Store(e) | TournamentError::Bracket(BracketError::Store(e)) => {
                e.client_message()
            }
            TournamentError::Bracket(e) if e.is_invariant_violation() => {
                "Bracket is inconsistent and needs admin repair".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;
