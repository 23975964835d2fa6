//! Backend error types

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Classified failure of a backend call.
///
/// Engine response bodies are carried for server-side logging only; the
/// `Display` text never includes them.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, DNS failure, reset
    #[error("search engine unreachable: {0}")]
    Unreachable(String),

    /// Request exceeded the configured timeout
    #[error("search engine timed out after {0:?}")]
    Timeout(Duration),

    /// Engine answered 4xx (other than 404)
    #[error("search engine rejected the request (HTTP {status})")]
    Rejected { status: StatusCode, body: String },

    /// Engine answered 404
    #[error("search engine resource not found")]
    NotFound { body: String },

    /// Engine answered 5xx
    #[error("search engine internal error (HTTP {status})")]
    Internal { status: StatusCode, body: String },

    /// Success status with a body that is not JSON
    #[error("search engine returned an unreadable response: {0}")]
    InvalidResponse(String),

    /// Client could not be built from configuration
    #[error("invalid backend configuration: {0}")]
    Config(String),
}

/// Failure classes the router maps to HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    Unreachable,
    Timeout,
    BadRequestRejectedByEngine,
    ResourceNotFound,
    InternalEngineError,
}

impl BackendError {
    pub fn kind(&self) -> BackendErrorKind {
        match self {
            BackendError::Unreachable(_) => BackendErrorKind::Unreachable,
            BackendError::Timeout(_) => BackendErrorKind::Timeout,
            BackendError::Rejected { .. } => BackendErrorKind::BadRequestRejectedByEngine,
            BackendError::NotFound { .. } => BackendErrorKind::ResourceNotFound,
            BackendError::Internal { .. }
            | BackendError::InvalidResponse(_)
            | BackendError::Config(_) => BackendErrorKind::InternalEngineError,
        }
    }

    /// Only connectivity failures are worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            BackendErrorKind::Unreachable | BackendErrorKind::Timeout
        )
    }

    /// Raw engine response body, when the engine produced one
    pub fn engine_body(&self) -> Option<&str> {
        match self {
            BackendError::Rejected { body, .. }
            | BackendError::NotFound { body }
            | BackendError::Internal { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        if status == StatusCode::NOT_FOUND {
            BackendError::NotFound { body }
        } else if status.is_client_error() {
            BackendError::Rejected { status, body }
        } else {
            BackendError::Internal { status, body }
        }
    }

    /// Classify a transport-level reqwest failure.
    pub fn from_transport(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            BackendError::Timeout(timeout)
        } else if error.is_builder() {
            BackendError::Config(error.to_string())
        } else if error.is_decode() {
            BackendError::InvalidResponse(error.to_string())
        } else {
            BackendError::Unreachable(error.to_string())
        }
    }
}
