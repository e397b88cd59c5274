use thiserror::Error;

/// Failure taxonomy for every account, session, and query operation.
///
/// The HTTP layer maps each kind onto a status code; nothing below it
/// inspects transport concerns.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Missing or blank required input, user-correctable.
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation (email or handle already taken).
    #[error("{0}")]
    Conflict(String),

    /// No matching identity or resource.
    #[error("{0}")]
    NotFound(String),

    /// Stored secret does not match the presented one.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing, invalid, expired, or reused token.
    #[error("unauthorized")]
    Unauthorized,

    /// A required media upload did not produce a usable reference.
    #[error("{0}")]
    Upload(String),

    /// Unexpected storage or signing failure. Details are logged
    /// server-side and never shown to the caller.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
