use thiserror::Error;

/// The crate's error type.
#[derive(Error, Debug)]
pub enum SessionError {
    /// An authentication error (rejected login, malformed login response).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A 401 from the backend on an authenticated call. By the time the
    /// caller sees this, the local session has already been invalidated.
    #[error("Unauthorized")]
    Unauthorized,

    /// A transport-level error. Never invalidates the session: a slow
    /// network is not an auth failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An I/O error from the session file.
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization error on the session document.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `SessionError` as the error type.
pub type Result<T> = std::result::Result<T, SessionError>;
