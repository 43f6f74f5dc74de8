//! Storage error types.

use std::time::Duration;
use thiserror::Error;

use crate::matches::MatchId;
use crate::tournament::models::TournamentId;

/// Errors raised by bracket stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON column could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// Stored row holds a value the model does not know
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Session used after commit
    #[error("Bracket session already closed")]
    SessionClosed,

    /// Tournament lock not acquired in time
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    /// Client-safe message that does not leak storage internals
    pub fn client_message(&self) -> String {
        match self {
            StoreError::Database(_) | StoreError::Serialization(_) | StoreError::Corrupt(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
