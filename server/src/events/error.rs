//! Event Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sortie_common::{ParticipationError, ValidationReport};

use crate::auth::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Event not found")]
    NotFound,

    #[error("Only the event owner can do this")]
    NotOwner,

    #[error("Validation failed")]
    Validation(ValidationReport),

    #[error(transparent)]
    Participation(#[from] ParticipationError),

    #[error("Capacity is below the current number of participants")]
    CapacityBelowParticipants,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ValidationReport> for EventError {
    fn from(report: ValidationReport) -> Self {
        Self::Validation(report)
    }
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::NotFound => (StatusCode::NOT_FOUND, "EVENT_NOT_FOUND"),
            Self::NotOwner => (StatusCode::FORBIDDEN, "NOT_OWNER"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Participation(e) => match e {
                ParticipationError::AlreadyWaiting => (StatusCode::CONFLICT, "ALREADY_WAITING"),
                ParticipationError::AlreadyApproved => (StatusCode::CONFLICT, "ALREADY_APPROVED"),
                ParticipationError::EventFull => (StatusCode::BAD_REQUEST, "EVENT_FULL"),
                ParticipationError::NotWaiting => (StatusCode::BAD_REQUEST, "NOT_WAITING"),
                ParticipationError::NotApproved => (StatusCode::BAD_REQUEST, "NOT_APPROVED"),
            },
            Self::CapacityBelowParticipants => (StatusCode::BAD_REQUEST, "CAPACITY_EXCEEDED"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        match self {
            Self::Validation(report) => ErrorResponse::validation(report),
            Self::Database(e) => {
                tracing::error!(error = %e, "Event database error");
                (
                    status,
                    Json(ErrorResponse::new(code, "Internal server error")),
                )
                    .into_response()
            }
            other => (status, Json(ErrorResponse::new(code, other.to_string()))).into_response(),
        }
    }
}

pub type EventResult<T> = Result<T, EventError>;
