//! Error taxonomy for booking, venue and user operations.

use crate::ids::{BookingId, VenueId};
use crate::model::BookingStatus;
use std::fmt;
use thiserror::Error;

/// Result type alias for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Every way a domain operation can be rejected.
///
/// The first five variants are the business outcomes callers must be able to
/// tell apart: a missing resource, an ownership or role violation, an
/// overlapping booking, a malformed interval, and a confirm outside `pending`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    // ═══════════════════════════════════════════════════════════
    // Business outcomes
    // ═══════════════════════════════════════════════════════════

    /// Venue, booking or user does not exist.
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// Kind of resource ("Venue", "Booking", "User")
        resource: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Caller is authenticated but may not touch this resource.
    #[error("Not enough permissions: {0}")]
    Forbidden(String),

    /// The requested slot overlaps an active booking on the venue.
    #[error("Venue {venue_id} is not available for the selected time slot")]
    Unavailable {
        /// Venue that is already booked
        venue_id: VenueId,
    },

    /// End is not after start, or a timestamp could not be parsed.
    #[error("Invalid time interval: {0}")]
    InvalidInterval(String),

    /// Confirmation attempted on a booking that is not pending.
    #[error("Cannot confirm booking {booking_id} with status {status}")]
    CannotConfirm {
        /// Booking that was targeted
        booking_id: BookingId,
        /// Its status at the time of the attempt
        status: BookingStatus,
    },

    // ═══════════════════════════════════════════════════════════
    // Lifecycle and input
    // ═══════════════════════════════════════════════════════════

    /// A status change that the booking state machine does not allow.
    #[error("Booking {booking_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Booking that was targeted
        booking_id: BookingId,
        /// Current status
        from: BookingStatus,
        /// Requested status
        to: BookingStatus,
    },

    /// Cancelled bookings are terminal and read-only.
    #[error("Booking {0} is cancelled and can no longer be modified")]
    BookingCancelled(BookingId),

    /// Inactive (soft-deleted) venues accept no new time slots.
    #[error("Venue {0} is inactive and does not accept bookings")]
    VenueInactive(VenueId),

    /// Request payload failed a field-level check.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Registration with an email that already has an account.
    #[error("Email {0} is already registered")]
    EmailTaken(String),

    // ═══════════════════════════════════════════════════════════
    // Authentication
    // ═══════════════════════════════════════════════════════════

    /// Unknown email, wrong password, or deactivated account.
    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// Missing, expired or revoked bearer token.
    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    // ═══════════════════════════════════════════════════════════
    // System
    // ═══════════════════════════════════════════════════════════

    /// Backing store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invariant broken inside the service (should not be exposed to users).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Build a [`DomainError::NotFound`] for the given resource kind and id.
    pub fn not_found(resource: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Build a [`DomainError::Storage`] from any displayable backend error.
    pub fn storage(context: &str, err: impl fmt::Display) -> Self {
        Self::Storage(format!("{context}: {err}"))
    }

    /// Returns `true` if the caller can fix the request and resubmit.
    ///
    /// # Examples
    ///
    /// ```
    /// # use venue_booking_core::DomainError;
    /// assert!(DomainError::InvalidInterval("end before start".into()).is_client_error());
    /// assert!(!DomainError::Storage("pool closed".into()).is_client_error());
    /// ```
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let id = VenueId::new();
        let err = DomainError::not_found("Venue", id);
        assert_eq!(err.to_string(), format!("Venue with id {id} not found"));
    }

    #[test]
    fn test_cannot_confirm_names_status() {
        let err = DomainError::CannotConfirm {
            booking_id: BookingId::new(),
            status: BookingStatus::Cancelled,
        };
        assert!(err.to_string().ends_with("with status cancelled"));
    }

    #[test]
    fn test_system_errors_are_not_client_errors() {
        assert!(!DomainError::Internal("boom".into()).is_client_error());
        assert!(DomainError::Unavailable { venue_id: VenueId::new() }.is_client_error());
    }
}
