//! Error taxonomy shared by the collaborators and the client core.
//!
//! Both enums are `Clone + PartialEq` so they can live inside reactive state
//! (a failed load is displayed, not just logged) and be asserted on in tests.

use thiserror::Error;

/// Failures of the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("Authentication backend is not configured")]
    BackendUnavailable,
    #[error("Network error: {0}")]
    Network(String),
    /// The backend refused the request (duplicate account, weak password, ...).
    #[error("{0}")]
    Rejected(String),
}

/// Failures of row storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Not authorized")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Backend is not configured")]
    Unavailable,
    #[error("Malformed row: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Malformed(err.to_string())
    }
}
