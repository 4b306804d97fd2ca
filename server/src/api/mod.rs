//! HTTP API handlers.
//!
//! Handlers are thin: extract, call a service, wrap the result. Business
//! rules and access checks live in [`crate::app`].

pub mod auth;
pub mod bookings;
pub mod users;
pub mod venues;

use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use venue_booking_core::pagination::DEFAULT_LIMIT;
use venue_booking_core::{DomainError, Page, Pagination, timestamp};

/// Service banner served at `/`.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    /// Greeting
    pub message: &'static str,
    /// Where the JSON API is mounted
    pub api: String,
}

/// `GET /` banner.
#[allow(clippy::unused_async)]
pub async fn root(prefix: String) -> Json<RootResponse> {
    Json(RootResponse {
        message: "Welcome to the Venue Booking API",
        api: prefix,
    })
}

/// `skip`/`limit` query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    /// Records to skip
    #[serde(default)]
    pub skip: u32,
    /// Records to return (clamped to 1..=100)
    #[serde(default = "default_limit")]
    pub limit: u32,
}

pub(crate) const fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl PageQuery {
    /// The clamped pagination window.
    #[must_use]
    pub fn pagination(self) -> Pagination {
        Pagination::new(self.skip, self.limit)
    }
}

/// Listing metadata shared by paginated responses.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageMeta {
    /// Records matching the query across all pages
    pub total: u64,
    /// One-based page number
    pub page: u32,
    /// Page size actually applied
    pub size: u32,
}

impl PageMeta {
    fn of<T>(page: &Page<T>, pagination: Pagination) -> Self {
        Self {
            total: page.total,
            page: pagination.page(),
            size: pagination.limit,
        }
    }
}

/// Parse a timestamp from a query string, in the same forms request bodies
/// accept (see [`venue_booking_core::timestamp`]).
///
/// # Errors
///
/// Returns [`DomainError::InvalidInterval`] naming `field`.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, DomainError> {
    timestamp::parse(raw).ok_or_else(|| {
        DomainError::InvalidInterval(format!("invalid {field} format: '{}'", raw.trim()))
    })
}

/// Parse an optional timestamp query parameter; blank counts as absent.
///
/// # Errors
///
/// Same as [`parse_timestamp`].
pub fn parse_optional_timestamp(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, DomainError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse_timestamp(field, s))
        .transpose()
}
