use std::time::Duration;

use thiserror::Error;

/// Errors from the message store gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("message store unavailable: {0}")]
    Unavailable(String),

    #[error("room not found")]
    NotFound,
}

/// Errors from the query backend client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("query backend unavailable: {0}")]
    Unavailable(String),

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("no signed-in user")]
    Unauthenticated,
}

/// Errors from a chart rendering surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("chart surface error: {0}")]
    Surface(String),
}
