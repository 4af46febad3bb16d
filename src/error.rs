//! Service error types with HTTP status code mapping.
//!
//! [`EventlyError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{BookingId, BookingStatus, EventId, UserId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "event not found: 6f1c...",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see ranges on [`EventlyError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
/// | 5000–5999 | Access          | 401 / 403                    |
#[derive(Debug, thiserror::Error)]
pub enum EventlyError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Field-level validation failed.
    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Ticket quantity below one.
    #[error("invalid quantity: {0}; at least one ticket is required")]
    InvalidQuantity(i32),

    /// Unrecognized booking status string.
    #[error("invalid booking status: {0}")]
    InvalidStatus(String),

    /// Unsupported UI language.
    #[error("unsupported locale: {0}")]
    InvalidLocale(String),

    /// Event with the given ID was not found.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// Booking with the given ID was not found for the caller.
    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),

    /// User with the given ID was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// The event date has already passed.
    #[error("event {0} is in the past and cannot be booked")]
    EventInPast(EventId),

    /// The booking cannot be cancelled anymore.
    #[error("booking {0} can no longer be cancelled")]
    NotCancellable(BookingId),

    /// The booking state machine forbids this status change.
    #[error("booking status cannot change from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: BookingStatus,
        /// Requested status.
        to: BookingStatus,
    },

    /// Another user already registered this username.
    #[error("username already taken: {0}")]
    UsernameTaken(String),

    /// No caller identity on the request.
    #[error("authentication required")]
    Unauthorized,

    /// The caller lacks the required role or does not own the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EventlyError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Validation(_) => 1002,
            Self::InvalidQuantity(_) => 1003,
            Self::InvalidStatus(_) => 1004,
            Self::InvalidLocale(_) => 1005,
            Self::EventNotFound(_) => 2001,
            Self::BookingNotFound(_) => 2002,
            Self::UserNotFound(_) => 2003,
            Self::EventInPast(_) => 2101,
            Self::NotCancellable(_) => 2102,
            Self::InvalidTransition { .. } => 2103,
            Self::UsernameTaken(_) => 2104,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::Unauthorized => 5001,
            Self::Forbidden(_) => 5003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::Validation(_)
            | Self::InvalidQuantity(_)
            | Self::InvalidStatus(_)
            | Self::InvalidLocale(_) => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_) | Self::BookingNotFound(_) | Self::UserNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::EventInPast(_)
            | Self::NotCancellable(_)
            | Self::InvalidTransition { .. }
            | Self::UsernameTaken(_) => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl From<sqlx::Error> for EventlyError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for EventlyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Driver and internal messages stay in the logs.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message,
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = EventlyError::EventNotFound(EventId::new());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2001);
    }

    #[test]
    fn rule_violations_map_to_409() {
        let err = EventlyError::InvalidTransition {
            from: BookingStatus::Cancelled,
            to: BookingStatus::Confirmed,
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            err.to_string(),
            "booking status cannot change from Cancelled to Confirmed"
        );
    }

    #[test]
    fn server_errors_hide_details() {
        let response = EventlyError::PersistenceError("connection refused".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
