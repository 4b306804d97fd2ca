//! Business metrics for the venue booking service.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `bookings_created_total` - Bookings accepted
//! - `bookings_conflicts_total{operation}` - Creates and reschedules rejected for overlap
//! - `bookings_cancelled_total` - Bookings moved to `cancelled`
//! - `bookings_confirmed_total` - Bookings moved to `confirmed`
//! - `users_registered_total` - Accounts created
//! - `logins_total{outcome}` - Login attempts by outcome
//!
//! ## Histograms
//! - `booking_billed_hours` - Billed hours per accepted booking
//!
//! HTTP request metrics (`http_requests_total`, `http_request_duration_seconds`)
//! are recorded by the correlation middleware in `venue-booking-web`.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!("bookings_created_total", "Total number of bookings created");
    describe_counter!(
        "bookings_conflicts_total",
        "Booking creates or reschedules rejected because the slot overlaps an active booking"
    );
    describe_counter!(
        "bookings_cancelled_total",
        "Total number of bookings cancelled"
    );
    describe_counter!(
        "bookings_confirmed_total",
        "Total number of bookings confirmed by an administrator"
    );
    describe_histogram!(
        "booking_billed_hours",
        "Whole hours billed per booking (duration rounded up)"
    );
    describe_counter!("users_registered_total", "Total number of registered users");
    describe_counter!("logins_total", "Login attempts by outcome (success, failure)");

    tracing::info!("Business metrics registered");
}

/// Install the Prometheus recorder with an HTTP listener on `addr`.
///
/// # Errors
///
/// Returns [`BuildError`] if a recorder is already installed or the
/// listener cannot be started.
pub fn install_prometheus_exporter(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record an accepted booking.
pub fn record_booking_created(billed_hours: i64) {
    metrics::counter!("bookings_created_total").increment(1);
    #[allow(clippy::cast_precision_loss)]
    metrics::histogram!("booking_billed_hours").record(billed_hours as f64);
}

/// Record a create or reschedule rejected for overlap.
pub fn record_booking_conflict(operation: &'static str) {
    metrics::counter!("bookings_conflicts_total", "operation" => operation).increment(1);
}

/// Record a booking cancellation.
pub fn record_booking_cancelled() {
    metrics::counter!("bookings_cancelled_total").increment(1);
}

/// Record a booking confirmation.
pub fn record_booking_confirmed() {
    metrics::counter!("bookings_confirmed_total").increment(1);
}

/// Record a registration.
pub fn record_user_registered() {
    metrics::counter!("users_registered_total").increment(1);
}

/// Record a login attempt.
pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("logins_total", "outcome" => outcome).increment(1);
}
