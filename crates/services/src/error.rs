//! Shared error types for the services crate.

use thiserror::Error;

/// Errors from the raw HTTP transport.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while acquiring the movie dataset.
///
/// Transport and decode failures are both recoverable; the caller
/// decides whether to retry the load.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to decode movie list: {0}")]
    Decode(String),
    #[error("movie service reported an error: {0}")]
    Api(String),
}

/// Errors emitted by `QuestionGenerator`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GeneratorError {
    #[error("no movies available to build a question")]
    Empty,
}

/// Errors emitted by `SessionController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("a session is already running")]
    AlreadyStarted,
    #[error("session was reset while a request was in flight")]
    Cancelled,
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Question(#[from] GeneratorError),
}
