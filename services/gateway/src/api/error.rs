//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every rejection the
//! gateway produces has the same JSON shape.
//!
//! # Key invariants and assumptions
//! - Error responses carry a stable upper-case `code` and a human-readable
//!   `message`.
//! - Status codes must align with the error category.
//!
//! # Security considerations
//! - Internal errors log details server-side but return generic messages.
//! - Messages never echo token material.
use crate::api::types::ErrorResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

pub const CODE_UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const CODE_INVALID_TOKEN: &str = "INVALID_TOKEN";
pub const CODE_TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
pub const CODE_FORBIDDEN: &str = "FORBIDDEN";
pub const CODE_RATE_LIMITED: &str = "RATE_LIMIT_EXCEEDED";
pub const CODE_VALIDATION: &str = "VALIDATION_ERROR";
pub const CODE_NOT_FOUND: &str = "NOT_FOUND";
pub const CODE_INTERNAL: &str = "INTERNAL_ERROR";

/// Structured API error returned by handlers and middleware.
///
/// # Invariants
/// - `status` must match the semantics of `body.code`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
                request_id: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Build a 400 Bad Request validation error.
pub fn api_validation_error(message: &str) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, CODE_VALIDATION, message)
}

pub fn api_not_found(message: &str) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, CODE_NOT_FOUND, message)
}

/// Build a 500 Internal Server Error, logging `err` server-side only.
pub fn api_internal(message: &str, err: &dyn std::error::Error) -> ApiError {
    tracing::error!(error = %err, "gateway internal error");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, CODE_INTERNAL, message)
}
