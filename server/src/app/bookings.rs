//! Booking service.
//!
//! Orchestrates the create/update/cancel/confirm flows: interval validation,
//! venue lookup, pricing, the ownership gate, and the lifecycle rules. The
//! overlap check itself runs inside the repository write so it is atomic
//! with the insert or reschedule.

use crate::metrics;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use venue_booking_core::lifecycle::{self, BookingCommand, Transition};
use venue_booking_core::repository::{BookingRepository, VenueRepository};
use venue_booking_core::{
    Booking, BookingId, BookingPatch, BookingStatus, Caller, Clock, DomainError, Page, Pagination,
    Result, TimeSlot, Venue, VenueId, pricing,
};

/// Rounds of a status-conditioned write before giving up on a busy booking.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// Fields of a new booking supplied by the caller.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    /// Venue to reserve
    pub venue_id: VenueId,
    /// Requested interval
    pub slot: TimeSlot,
    /// What the venue is booked for
    pub purpose: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Booking operations.
#[derive(Clone)]
pub struct BookingService {
    venues: Arc<dyn VenueRepository>,
    bookings: Arc<dyn BookingRepository>,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    /// Create a booking service.
    #[must_use]
    pub fn new(
        venues: Arc<dyn VenueRepository>,
        bookings: Arc<dyn BookingRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            venues,
            bookings,
            clock,
        }
    }

    /// Admins see every booking, everyone else only their own.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list(&self, caller: &Caller, pagination: Pagination) -> Result<Page<Booking>> {
        let owner = (!caller.is_admin).then_some(caller.user_id);
        self.bookings.list(owner, pagination.normalized()).await
    }

    /// A booking the caller owns (or any booking, for admins).
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] or [`DomainError::Forbidden`].
    pub async fn get(&self, caller: &Caller, id: BookingId) -> Result<Booking> {
        let booking = self.load(id).await?;
        caller.ensure_owner_or_admin(booking.user_id)?;
        Ok(booking)
    }

    /// Reserve a slot for the caller. The booking starts `pending`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The venue does not exist → [`DomainError::NotFound`]
    /// - The venue is inactive → [`DomainError::VenueInactive`]
    /// - The slot overlaps an active booking → [`DomainError::Unavailable`]
    /// - The cost does not fit the money column → [`DomainError::Validation`]
    pub async fn create(&self, caller: &Caller, request: BookingRequest) -> Result<Booking> {
        let venue = self.bookable_venue(request.venue_id).await?;
        let cost = pricing::booking_cost(venue.hourly_rate, &request.slot)?;

        let booking = Booking::pending(
            venue.id,
            caller.user_id,
            request.slot,
            cost,
            request.purpose,
            request.notes,
            self.clock.now(),
        );

        let booking = match self.bookings.insert(&booking).await {
            Ok(stored) => stored,
            Err(err @ DomainError::Unavailable { .. }) => {
                metrics::record_booking_conflict("create");
                tracing::warn!(
                    venue_id = %venue.id,
                    start = %request.slot.start(),
                    end = %request.slot.end(),
                    "Booking rejected: slot unavailable"
                );
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        metrics::record_booking_created(pricing::billed_hours(&request.slot));
        tracing::info!(
            booking_id = %booking.id,
            venue_id = %booking.venue_id,
            user_id = %booking.user_id,
            total_cost = %booking.total_cost,
            "Booking created"
        );
        Ok(booking)
    }

    /// Apply a partial update.
    ///
    /// Moving either end re-checks availability (excluding the booking
    /// itself) and reprices at the venue's current rate. A `status` in the
    /// patch goes through the lifecycle rules and is written together with
    /// the field changes, conditioned on the status that was read; if another
    /// writer changed the status first, the patch is re-applied to the fresh
    /// booking.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The booking does not exist → [`DomainError::NotFound`]
    /// - The caller is neither owner nor admin, or asks a confirm without
    ///   being admin → [`DomainError::Forbidden`]
    /// - The booking is cancelled → [`DomainError::BookingCancelled`]
    /// - The merged interval is invalid → [`DomainError::InvalidInterval`]
    /// - The new slot is taken → [`DomainError::Unavailable`]
    /// - The status change is not allowed → [`DomainError::CannotConfirm`]
    ///   or [`DomainError::InvalidTransition`]
    pub async fn update(
        &self,
        caller: &Caller,
        id: BookingId,
        patch: BookingPatch,
    ) -> Result<Booking> {
        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            if let Some(updated) = self.try_update(caller, id, &patch).await? {
                return Ok(updated);
            }
            tracing::debug!(booking_id = %id, "Status changed concurrently, retrying update");
        }

        Err(DomainError::Internal(format!(
            "booking {id} kept changing status during update"
        )))
    }

    /// One read-patch-write round. `None` means the status moved under us
    /// and nothing was written.
    async fn try_update(
        &self,
        caller: &Caller,
        id: BookingId,
        patch: &BookingPatch,
    ) -> Result<Option<Booking>> {
        let mut booking = self.get(caller, id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Err(DomainError::BookingCancelled(id));
        }
        let expected = booking.status;

        let next = match patch.status {
            Some(requested) => match lifecycle::command_for_status(id, expected, requested)? {
                Some(command) => {
                    if command == BookingCommand::Confirm {
                        caller.ensure_admin()?;
                    }
                    match lifecycle::apply(id, expected, command)? {
                        Transition::To(next) => Some(next),
                        Transition::Unchanged => None,
                    }
                }
                None => None,
            },
            None => None,
        };

        let reschedule = patch.changes_slot();
        let touches_fields = reschedule || patch.purpose.is_some() || patch.notes.is_some();
        if !touches_fields && next.is_none() {
            return Ok(Some(booking));
        }

        if reschedule {
            let slot = TimeSlot::new(
                patch.start_datetime.unwrap_or(booking.start_datetime),
                patch.end_datetime.unwrap_or(booking.end_datetime),
            )?;
            let venue = self.bookable_venue(booking.venue_id).await?;
            let cost = pricing::booking_cost(venue.hourly_rate, &slot)?;
            booking.reschedule(slot, cost);
        }
        if let Some(purpose) = &patch.purpose {
            booking.purpose = Some(purpose.clone());
        }
        if let Some(notes) = &patch.notes {
            booking.notes = Some(notes.clone());
        }
        if let Some(next) = next {
            booking.status = next;
        }
        booking.updated_at = Some(self.clock.now());

        let stored = match self.bookings.update(&booking, expected, reschedule).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return Ok(None),
            Err(err @ DomainError::Unavailable { .. }) => {
                metrics::record_booking_conflict("reschedule");
                tracing::warn!(booking_id = %id, "Reschedule rejected: slot unavailable");
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        if let Some(next) = next {
            record_status_change(next);
            tracing::info!(booking_id = %id, from = %expected, to = %next, "Booking status changed");
        }
        tracing::info!(booking_id = %id, rescheduled = reschedule, "Booking updated");
        Ok(Some(stored))
    }

    /// Cancel a booking (owner or admin). Cancelling a cancelled booking
    /// returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] or [`DomainError::Forbidden`].
    pub async fn cancel(&self, caller: &Caller, id: BookingId) -> Result<Booking> {
        self.get(caller, id).await?;
        self.run_command(id, BookingCommand::Cancel).await
    }

    /// Confirm a pending booking (admin only).
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Forbidden`], [`DomainError::NotFound`], or
    /// [`DomainError::CannotConfirm`] when the booking is not pending.
    pub async fn confirm(&self, caller: &Caller, id: BookingId) -> Result<Booking> {
        caller.ensure_admin()?;
        self.run_command(id, BookingCommand::Confirm).await
    }

    /// Bookings on a venue within an optional window (admin only).
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Forbidden`], [`DomainError::NotFound`] for an
    /// unknown venue, or [`DomainError::InvalidInterval`] when `from` is
    /// after `to`.
    pub async fn list_for_venue(
        &self,
        caller: &Caller,
        venue_id: VenueId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pagination: Pagination,
    ) -> Result<Page<Booking>> {
        caller.ensure_admin()?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(DomainError::InvalidInterval(
                    "start_date must not be after end_date".to_string(),
                ));
            }
        }
        self.venues
            .get(venue_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Venue", venue_id))?;
        self.bookings
            .list_for_venue(venue_id, from, to, pagination.normalized())
            .await
    }

    async fn load(&self, id: BookingId) -> Result<Booking> {
        self.bookings
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", id))
    }

    async fn bookable_venue(&self, id: VenueId) -> Result<Venue> {
        let venue = self
            .venues
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Venue", id))?;
        if !venue.is_active {
            return Err(DomainError::VenueInactive(id));
        }
        Ok(venue)
    }

    /// Apply a lifecycle command with compare-and-set, re-reading the
    /// booking whenever a concurrent writer changed its status first.
    async fn run_command(&self, id: BookingId, command: BookingCommand) -> Result<Booking> {
        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let current = self.load(id).await?;
            let next = match lifecycle::apply(id, current.status, command) {
                Ok(Transition::To(next)) => next,
                Ok(Transition::Unchanged) => return Ok(current),
                Err(err) => {
                    tracing::warn!(booking_id = %id, status = %current.status, ?command, "Status change rejected");
                    return Err(err);
                }
            };

            if let Some(updated) = self
                .bookings
                .transition_status(id, current.status, next, self.clock.now())
                .await?
            {
                record_status_change(next);
                tracing::info!(booking_id = %id, from = %current.status, to = %next, "Booking status changed");
                return Ok(updated);
            }
            tracing::debug!(booking_id = %id, "Status changed concurrently, retrying");
        }

        Err(DomainError::Internal(format!(
            "booking {id} kept changing status during {command:?}"
        )))
    }
}

fn record_status_change(next: BookingStatus) {
    match next {
        BookingStatus::Confirmed => metrics::record_booking_confirmed(),
        BookingStatus::Cancelled => metrics::record_booking_cancelled(),
        BookingStatus::Pending => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use venue_booking_core::UserId;
    use venue_booking_testing::{
        InMemoryBookingRepository, InMemoryVenueRepository, fixtures, test_clock,
    };

    struct Harness {
        service: BookingService,
        bookings: InMemoryBookingRepository,
        venue: Venue,
    }

    /// Applies a status change of its own just before the first `update`
    /// reaches the store, as a concurrent cancel or confirm would.
    struct InterleavedStatus {
        inner: InMemoryBookingRepository,
        pending_change: Mutex<Option<BookingStatus>>,
    }

    #[async_trait]
    impl BookingRepository for InterleavedStatus {
        async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
            self.inner.get(id).await
        }

        async fn list(
            &self,
            owner: Option<UserId>,
            pagination: Pagination,
        ) -> Result<Page<Booking>> {
            self.inner.list(owner, pagination).await
        }

        async fn list_for_venue(
            &self,
            venue_id: VenueId,
            from: Option<DateTime<Utc>>,
            to: Option<DateTime<Utc>>,
            pagination: Pagination,
        ) -> Result<Page<Booking>> {
            self.inner.list_for_venue(venue_id, from, to, pagination).await
        }

        async fn is_available(
            &self,
            venue_id: VenueId,
            slot: &TimeSlot,
            exclude: Option<BookingId>,
        ) -> Result<bool> {
            self.inner.is_available(venue_id, slot, exclude).await
        }

        async fn insert(&self, booking: &Booking) -> Result<Booking> {
            self.inner.insert(booking).await
        }

        async fn update(
            &self,
            booking: &Booking,
            expected: BookingStatus,
            reschedule: bool,
        ) -> Result<Option<Booking>> {
            let change = self.pending_change.lock().unwrap().take();
            if let Some(next) = change {
                let moved = self
                    .inner
                    .transition_status(booking.id, expected, next, fixtures::at(9, 0))
                    .await?;
                assert!(moved.is_some(), "interleaved change should apply");
            }
            self.inner.update(booking, expected, reschedule).await
        }

        async fn transition_status(
            &self,
            id: BookingId,
            expected: BookingStatus,
            next: BookingStatus,
            at: DateTime<Utc>,
        ) -> Result<Option<Booking>> {
            self.inner.transition_status(id, expected, next, at).await
        }
    }

    /// A service whose first booking update races a status change to
    /// `interleaved`.
    fn interleaved_harness(interleaved: BookingStatus) -> Harness {
        let venue = fixtures::venue("Hall", "Paris", "1500.00");
        let bookings = InMemoryBookingRepository::new();
        let service = BookingService::new(
            Arc::new(InMemoryVenueRepository::with_venues([venue.clone()])),
            Arc::new(InterleavedStatus {
                inner: bookings.clone(),
                pending_change: Mutex::new(Some(interleaved)),
            }),
            Arc::new(test_clock()),
        );
        Harness {
            service,
            bookings,
            venue,
        }
    }

    fn harness() -> Harness {
        let venue = fixtures::venue("Hall", "Paris", "1500.00");
        let bookings = InMemoryBookingRepository::new();
        let service = BookingService::new(
            Arc::new(InMemoryVenueRepository::with_venues([venue.clone()])),
            Arc::new(bookings.clone()),
            Arc::new(test_clock()),
        );
        Harness {
            service,
            bookings,
            venue,
        }
    }

    fn request(venue: &Venue, from: (u32, u32), to: (u32, u32)) -> BookingRequest {
        BookingRequest {
            venue_id: venue.id,
            slot: fixtures::slot(from, to),
            purpose: Some("Offsite".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_prices_and_starts_pending() {
        let h = harness();
        let caller = Caller::user(UserId::new());

        let booking = h
            .service
            .create(&caller, request(&h.venue, (10, 0), (11, 1)))
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.user_id, caller.user_id);
        assert_eq!(booking.total_cost, fixtures::money("3000.00"));
    }

    #[tokio::test]
    async fn test_create_unknown_venue() {
        let h = harness();
        let mut req = request(&h.venue, (10, 0), (11, 0));
        req.venue_id = VenueId::new();
        let err = h
            .service
            .create(&Caller::user(UserId::new()), req)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { resource: "Venue", .. }));
    }

    #[tokio::test]
    async fn test_update_status_routes_through_lifecycle() {
        let h = harness();
        let owner = Caller::user(UserId::new());
        let booking = h
            .service
            .create(&owner, request(&h.venue, (10, 0), (11, 0)))
            .await
            .unwrap();

        let confirm = BookingPatch {
            status: Some(BookingStatus::Confirmed),
            ..BookingPatch::default()
        };
        let err = h
            .service
            .update(&owner, booking.id, confirm.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let admin = Caller::admin(UserId::new());
        let confirmed = h.service.update(&admin, booking.id, confirm).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        let back = BookingPatch {
            status: Some(BookingStatus::Pending),
            ..BookingPatch::default()
        };
        let err = h.service.update(&admin, booking.id, back).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_bookings_are_read_only() {
        let h = harness();
        let owner = Caller::user(UserId::new());
        let booking = h
            .service
            .create(&owner, request(&h.venue, (10, 0), (11, 0)))
            .await
            .unwrap();
        h.service.cancel(&owner, booking.id).await.unwrap();

        let patch = BookingPatch {
            notes: Some("late change".to_string()),
            ..BookingPatch::default()
        };
        let err = h.service.update(&owner, booking.id, patch).await.unwrap_err();
        assert_eq!(err, DomainError::BookingCancelled(booking.id));
    }

    #[tokio::test]
    async fn test_edit_racing_a_cancel_does_not_revive_booking() {
        let h = interleaved_harness(BookingStatus::Cancelled);
        let owner = Caller::user(UserId::new());
        let booking = h
            .service
            .create(&owner, request(&h.venue, (10, 0), (11, 0)))
            .await
            .unwrap();

        let patch = BookingPatch {
            notes: Some("edit".to_string()),
            ..BookingPatch::default()
        };
        let err = h.service.update(&owner, booking.id, patch).await.unwrap_err();
        assert_eq!(err, DomainError::BookingCancelled(booking.id));

        let stored = h.bookings.get(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert_eq!(stored.notes, None);
    }

    #[tokio::test]
    async fn test_edit_racing_a_confirm_keeps_confirmation() {
        let h = interleaved_harness(BookingStatus::Confirmed);
        let owner = Caller::user(UserId::new());
        let booking = h
            .service
            .create(&owner, request(&h.venue, (10, 0), (11, 0)))
            .await
            .unwrap();

        let patch = BookingPatch {
            notes: Some("edit".to_string()),
            ..BookingPatch::default()
        };
        let updated = h.service.update(&owner, booking.id, patch).await.unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);
        assert_eq!(updated.notes.as_deref(), Some("edit"));
        assert_eq!(h.bookings.snapshot(), vec![updated]);
    }

    #[tokio::test]
    async fn test_failed_status_change_writes_nothing() {
        let h = interleaved_harness(BookingStatus::Cancelled);
        let owner = Caller::user(UserId::new());
        let admin = Caller::admin(UserId::new());
        let booking = h
            .service
            .create(&owner, request(&h.venue, (10, 0), (11, 0)))
            .await
            .unwrap();

        let patch = BookingPatch {
            purpose: Some("Board meeting".to_string()),
            end_datetime: Some(fixtures::at(12, 0)),
            status: Some(BookingStatus::Confirmed),
            ..BookingPatch::default()
        };
        let err = h.service.update(&admin, booking.id, patch).await.unwrap_err();
        assert_eq!(err, DomainError::BookingCancelled(booking.id));

        let stored = h.bookings.get(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert_eq!(stored.purpose.as_deref(), Some("Offsite"));
        assert_eq!(stored.end_datetime, booking.end_datetime);
        assert_eq!(stored.total_cost, booking.total_cost);
    }

    #[tokio::test]
    async fn test_fields_and_status_change_in_one_write() {
        let h = harness();
        let owner = Caller::user(UserId::new());
        let booking = h
            .service
            .create(&owner, request(&h.venue, (10, 0), (11, 0)))
            .await
            .unwrap();

        let patch = BookingPatch {
            notes: Some("cancelled with a note".to_string()),
            status: Some(BookingStatus::Cancelled),
            ..BookingPatch::default()
        };
        let updated = h.service.update(&owner, booking.id, patch).await.unwrap();
        assert_eq!(updated.status, BookingStatus::Cancelled);
        assert_eq!(updated.notes.as_deref(), Some("cancelled with a note"));
        assert_eq!(h.bookings.get(booking.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_venue_listing_requires_admin_and_ordered_window() {
        let h = harness();
        let owner = Caller::user(UserId::new());
        h.service
            .create(&owner, request(&h.venue, (10, 0), (11, 0)))
            .await
            .unwrap();

        let err = h
            .service
            .list_for_venue(&owner, h.venue.id, None, None, Pagination::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let admin = Caller::admin(UserId::new());
        let err = h
            .service
            .list_for_venue(
                &admin,
                h.venue.id,
                Some(fixtures::at(12, 0)),
                Some(fixtures::at(9, 0)),
                Pagination::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInterval(_)));

        let page = h
            .service
            .list_for_venue(&admin, h.venue.id, None, None, Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(h.bookings.snapshot().len(), 1);
    }
}
