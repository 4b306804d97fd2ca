//! Storage traits.
//!
//! Implemented by `venue-booking-postgres` for production and by
//! `venue-booking-testing` in memory. Services hold them as
//! `Arc<dyn ...Repository>`.

use crate::error::Result;
use crate::ids::{BookingId, UserId, VenueId};
use crate::model::{Booking, BookingStatus, Session, User, Venue, VenueFilter};
use crate::pagination::{Page, Pagination};
use crate::slot::TimeSlot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Venue persistence.
#[async_trait]
pub trait VenueRepository: Send + Sync {
    /// Fetch a venue, active or not.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    async fn get(&self, id: VenueId) -> Result<Option<Venue>>;

    /// Active venues matching `filter`, plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    async fn list(&self, filter: &VenueFilter, pagination: Pagination) -> Result<Page<Venue>>;

    /// All active venues whose city contains `city`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    async fn list_by_city(&self, city: &str) -> Result<Vec<Venue>>;

    /// Persist a new venue.
    ///
    /// # Errors
    ///
    /// Returns error if the store write fails.
    async fn insert(&self, venue: &Venue) -> Result<Venue>;

    /// Overwrite a stored venue.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The store write fails
    /// - The venue does not exist → `DomainError::NotFound`
    async fn update(&self, venue: &Venue) -> Result<Venue>;
}

/// Booking persistence.
///
/// Writes that place a booking on a slot (`insert`, and `update` with
/// `reschedule = true`) must check availability and write atomically with
/// respect to every other such write on the same venue.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Fetch a booking.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    async fn get(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Bookings owned by `owner`, or every booking when `owner` is `None`.
    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    async fn list(&self, owner: Option<UserId>, pagination: Pagination) -> Result<Page<Booking>>;

    /// Bookings on `venue_id` (any status) starting at or after `from` and
    /// ending at or before `to`, ordered by start.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    async fn list_for_venue(
        &self,
        venue_id: VenueId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pagination: Pagination,
    ) -> Result<Page<Booking>>;

    /// Whether no active booking on `venue_id` overlaps `slot`.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    async fn is_available(
        &self,
        venue_id: VenueId,
        slot: &TimeSlot,
        exclude: Option<BookingId>,
    ) -> Result<bool>;

    /// Persist a new booking after checking its slot is free.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The slot overlaps an active booking → `DomainError::Unavailable`
    /// - The store write fails
    async fn insert(&self, booking: &Booking) -> Result<Booking>;

    /// Overwrite a stored booking, fields and status together, only if it is
    /// still in `expected`. With `reschedule`, the new slot is checked against
    /// other active bookings first.
    ///
    /// Returns `None` when the booking is gone or another writer changed its
    /// status first. Nothing is written in that case or on error.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The new slot overlaps another active booking → `DomainError::Unavailable`
    /// - The store write fails
    async fn update(
        &self,
        booking: &Booking,
        expected: BookingStatus,
        reschedule: bool,
    ) -> Result<Option<Booking>>;

    /// Move a booking from `expected` to `next`, only if it is still in
    /// `expected`. Returns `None` when another writer got there first.
    ///
    /// # Errors
    ///
    /// Returns error if the store write fails.
    async fn transition_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>>;
}

/// User account persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    async fn get(&self, id: UserId) -> Result<Option<User>>;

    /// Fetch a user by email (exact, case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Every user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    async fn list(&self, pagination: Pagination) -> Result<Page<User>>;

    /// Persist a new user.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The email is already registered → `DomainError::EmailTaken`
    /// - The store write fails
    async fn insert(&self, user: &User) -> Result<User>;

    /// Overwrite a stored user.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The user does not exist → `DomainError::NotFound`
    /// - The store write fails
    async fn update(&self, user: &User) -> Result<User>;
}

/// Bearer-token session persistence.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session.
    ///
    /// # Errors
    ///
    /// Returns error if the store write fails.
    async fn insert(&self, session: &Session) -> Result<()>;

    /// Look a session up by token hash. Expired sessions are still returned;
    /// the caller decides.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    async fn find(&self, token_hash: &str) -> Result<Option<Session>>;

    /// Revoke one session. Deleting an unknown hash is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the store write fails.
    async fn delete(&self, token_hash: &str) -> Result<()>;

    /// Revoke every session of a user.
    ///
    /// # Errors
    ///
    /// Returns error if the store write fails.
    async fn delete_for_user(&self, user_id: UserId) -> Result<u64>;

    /// Purge sessions that expired before `now`.
    ///
    /// # Errors
    ///
    /// Returns error if the store write fails.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Backend health check used by the readiness endpoint.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// # Errors
    ///
    /// Returns error if the backend cannot serve queries.
    async fn ping(&self) -> Result<()>;
}
