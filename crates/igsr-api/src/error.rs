//! API error types and handling
//!
//! Every failure a handler can return funnels through [`ApiError`], which
//! owns the single status and kind table. Engine response bodies are logged
//! here and never reach the client.

use axum::{
    extract::rejection::{BytesRejection, FormRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use igsr_backend::{BackendError, BackendErrorKind};
use igsr_config::ConfigError;
use igsr_query::ValidationError;
use thiserror::Error;
use tracing::{error, warn};

use crate::{models::ErrorBody, normalizer::NormalizationError};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown resource or missing document
    #[error("not found: {0}")]
    ResourceNotFound(String),

    /// Body could not be read, parsed or validated
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Known path, unsupported method
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Request body over the configured limit
    #[error("request body too large")]
    PayloadTooLarge,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::InvalidQuery(error.to_string())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::InvalidQuery(format!("request body unreadable: {}", rejection.body_text()))
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::InvalidQuery(format!("invalid export form: {}", rejection.body_text()))
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidQuery(format!("invalid path: {}", rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Backend(e) => match e.kind() {
                BackendErrorKind::Unreachable => StatusCode::SERVICE_UNAVAILABLE,
                BackendErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                BackendErrorKind::BadRequestRejectedByEngine => StatusCode::BAD_REQUEST,
                BackendErrorKind::ResourceNotFound => StatusCode::NOT_FOUND,
                BackendErrorKind::InternalEngineError => StatusCode::BAD_GATEWAY,
            },
            ApiError::Normalization(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::ResourceNotFound(_) => "resource_not_found",
            ApiError::InvalidQuery(_) => "invalid_query",
            ApiError::MethodNotAllowed => "method_not_allowed",
            ApiError::PayloadTooLarge => "payload_too_large",
            ApiError::Backend(e) => match e.kind() {
                BackendErrorKind::Unreachable => "backend_unreachable",
                BackendErrorKind::Timeout => "backend_timeout",
                BackendErrorKind::BadRequestRejectedByEngine => "backend_rejected",
                BackendErrorKind::ResourceNotFound => "resource_not_found",
                BackendErrorKind::InternalEngineError => "backend_error",
            },
            ApiError::Normalization(_) => "normalization_error",
        }
    }

    /// Client-facing text. Only `InvalidQuery` carries detail, and that
    /// detail describes the caller's own input.
    pub fn message(&self) -> String {
        match self {
            ApiError::ResourceNotFound(_) => "resource not found".to_string(),
            ApiError::InvalidQuery(detail) => detail.clone(),
            ApiError::MethodNotAllowed => "method not allowed".to_string(),
            ApiError::PayloadTooLarge => "request body too large".to_string(),
            ApiError::Backend(e) => match e.kind() {
                BackendErrorKind::Unreachable => "search backend unavailable".to_string(),
                BackendErrorKind::Timeout => "search backend timed out".to_string(),
                BackendErrorKind::BadRequestRejectedByEngine => {
                    "search backend rejected the query".to_string()
                }
                BackendErrorKind::ResourceNotFound => "resource not found".to_string(),
                BackendErrorKind::InternalEngineError => "search backend error".to_string(),
            },
            ApiError::Normalization(_) => "unexpected search backend response".to_string(),
        }
    }

    fn log(&self) {
        match self {
            ApiError::Backend(e) => warn!(
                kind = self.kind(),
                error = %e,
                engine_body = e.engine_body().unwrap_or(""),
                "backend call failed"
            ),
            ApiError::Normalization(e) => error!(
                error = %e,
                "engine response does not match the expected shape, backend compatibility issue"
            ),
            _ => {}
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let body = ErrorBody {
            kind: self.kind().to_string(),
            message: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures while assembling the server
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
