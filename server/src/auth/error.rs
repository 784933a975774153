//! Authentication Error Types

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sortie_common::ValidationReport;
use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Password did not verify against the stored hash.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("User not found")]
    UserNotFound,

    /// Email already registered.
    #[error("Email already registered")]
    DuplicateEmail,

    /// Invalid or expired token.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// No token in `x-auth-token` or `Authorization`.
    #[error("Missing authentication token")]
    MissingAuthHeader,

    /// Payload failed field validation.
    #[error("Validation failed")]
    Validation(ValidationReport),

    /// Password hashing error.
    #[error("Password processing failed")]
    PasswordHash,

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    /// JWT error.
    #[error("Token error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Internal server error.
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Per-field messages for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: code.to_string(),
            message: message.into(),
            fields: None,
        }
    }

    /// 400 response carrying a validation report.
    pub fn validation(report: ValidationReport) -> Response {
        let body = Self {
            error: "VALIDATION_ERROR".to_string(),
            message: "Validation failed".to_string(),
            fields: Some(report.errors),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            Self::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            Self::DuplicateEmail => (StatusCode::CONFLICT, "DUPLICATE_EMAIL"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            Self::MissingAuthHeader => (StatusCode::UNAUTHORIZED, "MISSING_AUTH"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::PasswordHash => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Jwt(_) => (StatusCode::UNAUTHORIZED, "TOKEN_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        match self {
            Self::Validation(report) => ErrorResponse::validation(report),
            Self::Database(ref e) => {
                tracing::error!(error = %e, "Auth database error");
                (status, Json(ErrorResponse::new(code, self.to_string()))).into_response()
            }
            Self::Internal(ref detail) => {
                tracing::error!(detail = %detail, "Auth internal error");
                (status, Json(ErrorResponse::new(code, self.to_string()))).into_response()
            }
            _ => (status, Json(ErrorResponse::new(code, self.to_string()))).into_response(),
        }
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
