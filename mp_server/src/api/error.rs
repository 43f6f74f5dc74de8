//! Mapping of engine errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use matchplay::TournamentError;
use matchplay::bracket::BracketError;
use matchplay::db::StoreError;
use matchplay::matches::MatchError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<TournamentError> for ApiError {
    fn from(e: TournamentError) -> Self {
        let status = status_for(&e);
        if status.is_server_error() {
            tracing::error!(error = %e, status = status.as_u16(), "Request failed");
        }
        ApiError::new(status, e.client_message())
    }
}

fn status_for(e: &TournamentError) -> StatusCode {
    match e {
        TournamentError::NotFound(_) | TournamentError::MatchNotFound(_) => StatusCode::NOT_FOUND,

        TournamentError::InvalidState { .. }
        | TournamentError::TournamentFull
        | TournamentError::AlreadyRegistered(_)
        | TournamentError::Halted(_)
        | TournamentError::NotHalted(_) => StatusCode::CONFLICT,

        TournamentError::UnsupportedParticipantCount(_)
        | TournamentError::UnsupportedFormat(_)
        | TournamentError::InvalidName
        | TournamentError::InvalidEntryFee(_)
        | TournamentError::InvalidPrizes
        | TournamentError::NotRegistered(_)
        | TournamentError::SeedsMismatch => StatusCode::BAD_REQUEST,

        TournamentError::Match(e) => match e {
            MatchError::NotFound(_) => StatusCode::NOT_FOUND,
            MatchError::NotAParticipant(_) | MatchError::SelfConfirmation => StatusCode::FORBIDDEN,
            MatchError::PlayersNotAssigned(_) | MatchError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            MatchError::IndecisiveScore(_) | MatchError::InvalidDecision(_) => {
                StatusCode::BAD_REQUEST
            }
        },

        TournamentError::Bracket(BracketError::Store(e)) | TournamentError::Store(e) => {
            store_status(e)
        }
        TournamentError::Bracket(e) if e.is_invariant_violation() => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        TournamentError::Bracket(BracketError::NotCompleted(_)) => StatusCode::CONFLICT,
        TournamentError::Bracket(_) => StatusCode::BAD_REQUEST,
    }
}

fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::TournamentNotFound(_) | StoreError::MatchNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchplay::matches::BracketPosition;
    use matchplay::tournament::TournamentStatus;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&TournamentError::NotFound(1)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&TournamentError::InvalidState {
                expected: TournamentStatus::Open,
                actual: TournamentStatus::Active,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(&TournamentError::Halted(3)), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&TournamentError::UnsupportedParticipantCount(12)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&TournamentError::Match(MatchError::SelfConfirmation)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&TournamentError::Bracket(BracketError::DeadPathReached(
                BracketPosition::new(2, 0)
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&TournamentError::Store(StoreError::Timeout(
                Duration::from_secs(10)
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_database_details_redacted() {
        let err = ApiError::from(TournamentError::Store(StoreError::Corrupt(
            "status column holds 'paused'".to_string(),
        )));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }
}
