//! Axum integration for the venue booking service.
//!
//! This crate is the HTTP edge shared by the application binary: it turns
//! domain errors into responses, tags every request with a correlation id,
//! and provides the liveness and readiness handlers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         HTTP edge (this crate)          │  ← JSON, headers, status codes
//! │  - AppError / DomainError mapping       │  ← Correlation ids, metrics
//! │  - Extractors                           │
//! ├─────────────────────────────────────────┤
//! │         Services (venue-booking)        │
//! ├─────────────────────────────────────────┤
//! │         Rules (venue-booking-core)      │  ← Pure, no I/O
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use venue_booking_web::{ApiJson, ApiPath, AppError};
//!
//! async fn get_venue(
//!     State(services): State<Services>,
//!     ApiPath(id): ApiPath<VenueId>,
//! ) -> Result<ApiJson<Venue>, AppError> {
//!     Ok(ApiJson(services.venues.get(id).await?))
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ApiJson, ApiPath, ApiQuery, ClientIp, CorrelationId, UserAgent};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
