//! Crate-wide error type

use thiserror::Error;

/// Errors surfaced by the EventOps core
#[derive(Debug, Error)]
pub enum EventOpsError {
    /// MongoDB connection or query failure
    #[error("database error: {0}")]
    Database(String),

    /// HTTP request/response handling failure
    #[error("http error: {0}")]
    Http(String),

    /// Missing or invalid session credential
    #[error("unauthorized: {0}")]
    Auth(String),

    /// External routing service failure (unreachable, malformed, no route)
    #[error("routing error: {0}")]
    Routing(String),

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EventOpsError>;
