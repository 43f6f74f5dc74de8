//! Match error types.

use thiserror::Error;

use super::models::{MatchId, MatchStatus, Score};
use crate::tournament::models::UserId;

/// Errors raised by match lifecycle transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// Match does not exist
    #[error("Match not found: {0}")]
    NotFound(MatchId),

    /// Actor is not one of the two players
    #[error("User {0} is not playing this match")]
    NotAParticipant(UserId),

    /// One or both slots still wait on a feeder match
    #[error("Match {0} is still waiting for its players")]
    PlayersNotAssigned(MatchId),

    /// Transition not allowed from the current status
    #[error("Cannot {action} a match in status {status}")]
    InvalidTransition {
        status: MatchStatus,
        action: &'static str,
    },

    /// Knockout scores need a winner
    #[error("Score {0} has no winner")]
    IndecisiveScore(Score),

    /// Reporter tried to confirm their own report
    #[error("A reported score must be confirmed by the opponent")]
    SelfConfirmation,

    /// Admin decision names someone outside the match or contradicts its own score
    #[error("Invalid dispute decision: {0}")]
    InvalidDecision(String),
}

/// Result type for match operations
pub type MatchResult<T> = Result<T, MatchError>;
