//! Collaborator error types.

use thiserror::Error;

/// Errors reported by notification and prize collaborators
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Collaborator could not be reached
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Idempotency key already used
    #[error("Duplicate request: {0}")]
    Duplicate(String),

    /// Collaborator refused the request
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Result type for collaborator calls
pub type ServiceResult<T> = Result<T, ServiceError>;
