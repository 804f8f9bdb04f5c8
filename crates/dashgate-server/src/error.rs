//! HTTP error types for `dashgate` server.
//!
//! Maps resolver errors from `dashgate-core` into HTTP responses. Every
//! error produces a JSON body with a single `error` field. Client errors
//! use fixed messages so nothing about the filesystem leaks; internal errors
//! surface their message since this is an operator tool.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{debug, warn};

use dashgate_core::error::ResolveError;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// No authenticated session on an API route.
    Unauthorized,
    /// Client sent an invalid path or folder.
    BadRequest(String),
    /// Resource exists in principle but is not allowlisted.
    Forbidden(String),
    /// Requested resource not found.
    NotFound(String),
    /// Internal server error.
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_owned()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, axum::Json(ErrorBody { error })).into_response()
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidPath { .. } => {
                debug!(error = %err, "rejected path");
                Self::BadRequest("Invalid path".to_owned())
            }
            ResolveError::InvalidFolder { .. } => {
                debug!(error = %err, "rejected folder");
                Self::BadRequest("Invalid folder".to_owned())
            }
            ResolveError::NotAllowed { .. } => {
                debug!(error = %err, "rejected document");
                Self::Forbidden("Document not allowed".to_owned())
            }
            ResolveError::NotFound { .. } => Self::NotFound("File not found".to_owned()),
            ResolveError::Io { .. } => {
                warn!(error = %err, "resource check failed");
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        warn!(error = %err, "file read failed");
        Self::Internal(err.to_string())
    }
}
