/// Domain error type shared by every service
///
/// Services return [`CoreResult`]; the API layer maps each variant onto an
/// HTTP status in one place.

use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Errors produced by the domain services
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Invitation token is unknown or already consumed
    #[error("invalid invitation token")]
    InvalidToken,

    /// Invitation token is past its expiry
    #[error("invitation expired")]
    Expired,

    /// Caller is authenticated but not allowed to touch the resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Uniqueness violation (e.g. username already taken)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing, bad or expired credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Hashing or signing failure
    #[error("credential error: {0}")]
    Credential(String),

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

impl From<PasswordError> for CoreError {
    fn from(err: PasswordError) -> Self {
        CoreError::Credential(err.to_string())
    }
}

/// Result alias for domain operations
pub type CoreResult<T> = Result<T, CoreError>;
