//! Error types for session authentication operations

/// Errors from credential storage and the auth REST endpoints.
///
/// `AuthRejected` and `RefreshRejected` are the two credential-level
/// rejections the coordinator reacts to: the first keeps the user on the
/// login screen, the second is terminal for the running session. Transport
/// and server-side problems stay in `Http`/`Api` so logs can distinguish
/// "token rejected" from "backend unreachable" even where the session
/// outcome is the same.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("token decode failed: {0}")]
    Decode(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("server error: {0}")]
    Api(String),

    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    #[error("refresh token rejected: {0}")]
    RefreshRejected(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
