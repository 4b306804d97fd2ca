//! Error types for web handlers.
//!
//! [`AppError`] is the single error type handlers return. Domain errors
//! convert into it with their HTTP status and a stable machine-readable
//! `code`; server-side failures are logged with their source and reach the
//! client only as a generic message.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use venue_booking_core::DomainError;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```
/// use axum::http::StatusCode;
/// use venue_booking_core::{DomainError, VenueId};
/// use venue_booking_web::AppError;
///
/// let err = AppError::from(DomainError::Unavailable { venue_id: VenueId::new() });
/// assert_eq!(err.status(), StatusCode::CONFLICT);
/// assert_eq!(err.code(), "VENUE_UNAVAILABLE");
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach the underlying cause, logged but never sent to the client.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST")
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message.into(), "UNAUTHORIZED")
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message.into(), "FORBIDDEN")
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message.into(), "NOT_FOUND")
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>, code: &'static str) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), code)
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            message.into(),
            "VALIDATION_ERROR",
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE",
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    /// Error code (for client error handling).
    code: &'a str,
    /// Human-readable error message.
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::NotFound { .. } => Self::not_found(message),
            DomainError::Forbidden(_) => Self::forbidden(message),
            DomainError::Unavailable { .. } => Self::conflict(message, "VENUE_UNAVAILABLE"),
            DomainError::InvalidInterval(_) => {
                Self::new(StatusCode::BAD_REQUEST, message, "INVALID_INTERVAL")
            }
            DomainError::CannotConfirm { .. } => {
                Self::new(StatusCode::BAD_REQUEST, message, "CANNOT_CONFIRM")
            }
            DomainError::InvalidTransition { .. } => {
                Self::new(StatusCode::BAD_REQUEST, message, "INVALID_TRANSITION")
            }
            DomainError::BookingCancelled(_) => Self::conflict(message, "BOOKING_CANCELLED"),
            DomainError::VenueInactive(_) => Self::conflict(message, "VENUE_INACTIVE"),
            DomainError::Validation(_) => Self::validation(message),
            DomainError::EmailTaken(_) => Self::conflict(message, "CONFLICT"),
            DomainError::InvalidCredentials | DomainError::Unauthenticated(_) => {
                Self::unauthorized(message)
            }
            DomainError::Storage(_) | DomainError::Internal(_) => {
                Self::internal("An internal error occurred").with_source(anyhow::Error::new(err))
            }
        }
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonSyntaxError(_) | JsonRejection::MissingJsonContentType(_) => {
                Self::bad_request(rejection.body_text())
            }
            _ => Self::validation(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use venue_booking_core::{BookingId, BookingStatus, VenueId};

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_domain_mapping_table() {
        let booking_id = BookingId::new();
        let venue_id = VenueId::new();
        let cases = [
            (DomainError::not_found("Venue", venue_id), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (DomainError::Forbidden("no".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (DomainError::Unavailable { venue_id }, StatusCode::CONFLICT, "VENUE_UNAVAILABLE"),
            (
                DomainError::InvalidInterval("x".into()),
                StatusCode::BAD_REQUEST,
                "INVALID_INTERVAL",
            ),
            (
                DomainError::CannotConfirm {
                    booking_id,
                    status: BookingStatus::Cancelled,
                },
                StatusCode::BAD_REQUEST,
                "CANNOT_CONFIRM",
            ),
            (
                DomainError::BookingCancelled(booking_id),
                StatusCode::CONFLICT,
                "BOOKING_CANCELLED",
            ),
            (DomainError::VenueInactive(venue_id), StatusCode::CONFLICT, "VENUE_INACTIVE"),
            (
                DomainError::Validation("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
            ),
            (DomainError::EmailTaken("a@b.c".into()), StatusCode::CONFLICT, "CONFLICT"),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        ];

        for (domain, status, code) in cases {
            let err = AppError::from(domain);
            assert_eq!(err.status(), status, "{err}");
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let err = AppError::from(DomainError::Storage("connection refused on 10.0.0.5".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("10.0.0.5"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn test_response_body_shape() {
        let response = AppError::forbidden("nope").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "FORBIDDEN");
        assert_eq!(json["message"], "nope");
    }
}
