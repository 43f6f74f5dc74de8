//! Bracket construction and advancement errors.

use thiserror::Error;

use crate::db::StoreError;
use crate::matches::{BracketPosition, MatchId};
use crate::tournament::models::UserId;

/// Bracket errors
#[derive(Debug, Error)]
pub enum BracketError {
    #[error("Bracket size {0} is not a power of two")]
    NotPowerOfTwo(usize),

    /// Brackets need at least one round
    #[error("Unsupported bracket size: {0}")]
    UnsupportedSize(u32),

    /// No checked-in participant to build a bracket for
    #[error("No entrants")]
    NoEntrants,

    #[error("{entrants} entrants do not fit into {slots} bracket slots")]
    TooManyEntrants { entrants: usize, slots: usize },

    #[error("No match at {0}")]
    MissingMatch(BracketPosition),

    /// A match references a feeder pair that does not exist
    #[error("Missing feeder match at {0}")]
    MissingFeeder(BracketPosition),

    #[error("Match {0} is not completed")]
    NotCompleted(MatchId),

    #[error("Completed match {0} has no winner")]
    MissingWinner(MatchId),

    /// Settled slot holds a different winner
    #[error("Slot conflict at {position}: holds user {existing}, refused user {incoming}")]
    SlotConflict {
        position: BracketPosition,
        existing: UserId,
        incoming: UserId,
    },

    /// A winner was routed into a match constructed as a dead path
    #[error("Winner routed into cancelled match at {0}")]
    DeadPathReached(BracketPosition),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BracketError {
    /// Whether the match tree is inconsistent and needs admin repair
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            BracketError::MissingMatch(_)
                | BracketError::MissingFeeder(_)
                | BracketError::MissingWinner(_)
                | BracketError::SlotConflict { .. }
                | BracketError::DeadPathReached(_)
        )
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;
