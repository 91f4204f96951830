//! Error types for session lifecycle operations

/// Errors surfaced by the session coordinator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] hotelaria_auth::Error),

    #[error(transparent)]
    Common(#[from] common::Error),

    /// Renewal failed for any reason; the session has been logged out.
    /// This is the generic "session expired" outcome shown to the user.
    #[error("session expired, sign in again")]
    SessionExpired,
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
