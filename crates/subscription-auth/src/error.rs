//! Error types for credential management

/// Errors from token exchange, persistence and the interactive flow.
///
/// A missing or unreadable credential file is not an error; the store
/// reports it as `None`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("could not open browser: {0}")]
    Browser(String),

    #[error("authorization code prompt failed: {0}")]
    Prompt(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
