//! Application error type mapping to HTTP status codes.
//!
//! The wire shape is a flat `{ "error": "<message>" }` object so the embed
//! script can surface the message without unwrapping an envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use botdesk_types::error::{RelayError, RepositoryError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Relay pipeline errors (entitlement, rate limit, upstream).
    Relay(RelayError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// Resource does not exist (or belongs to another tenant).
    NotFound(String),
    /// Generic internal error.
    Internal(String),
}

impl From<RelayError> for AppError {
    fn from(e: RelayError) -> Self {
        AppError::Relay(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Relay(RelayError::InvalidRequest(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Relay(e @ RelayError::EntitlementDenied) => {
                (StatusCode::FORBIDDEN, e.to_string())
            }
            AppError::Relay(e @ RelayError::RateLimited) => {
                (StatusCode::TOO_MANY_REQUESTS, e.to_string())
            }
            AppError::Relay(e @ RelayError::UpstreamUnavailable) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::Relay(RelayError::Stream(msg)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}
