//! Booking scenarios across the venue and booking services.
//!
//! Runs the services on the in-memory repositories with a fixed clock.

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(clippy::too_many_lines)]

use proptest::prelude::*;
use std::sync::Arc;
use venue_booking::app::{BookingRequest, BookingService, VenueService};
use venue_booking_core::{
    BookingPatch, BookingStatus, Caller, DomainError, Pagination, TimeSlot, UserId, Venue,
    VenuePatch,
};
use venue_booking_testing::{
    InMemoryBookingRepository, InMemoryVenueRepository, fixtures, test_clock,
};

struct World {
    venues: VenueService,
    bookings: BookingService,
    booking_store: InMemoryBookingRepository,
    admin: Caller,
}

fn world() -> World {
    let venue_store = InMemoryVenueRepository::new();
    let booking_store = InMemoryBookingRepository::new();
    let clock = Arc::new(test_clock());
    World {
        venues: VenueService::new(
            Arc::new(venue_store.clone()),
            Arc::new(booking_store.clone()),
            clock.clone(),
        ),
        bookings: BookingService::new(
            Arc::new(venue_store),
            Arc::new(booking_store.clone()),
            clock,
        ),
        booking_store,
        admin: Caller::admin(UserId::new()),
    }
}

impl World {
    async fn venue(&self, rate: &str) -> Venue {
        self.venues
            .create(&self.admin, fixtures::new_venue("Grand Hall", "Prague", rate))
            .await
            .expect("venue should be created")
    }
}

fn request(venue: &Venue, from: (u32, u32), to: (u32, u32)) -> BookingRequest {
    BookingRequest {
        venue_id: venue.id,
        slot: fixtures::slot(from, to),
        purpose: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_overlap_with_confirmed_booking_is_unavailable() {
    let w = world();
    let venue = w.venue("1500.00").await;
    let alice = Caller::user(UserId::new());
    let bob = Caller::user(UserId::new());

    let first = w
        .bookings
        .create(&alice, request(&venue, (11, 0), (13, 0)))
        .await
        .unwrap();
    w.bookings.confirm(&w.admin, first.id).await.unwrap();

    let err = w
        .bookings
        .create(&bob, request(&venue, (10, 0), (12, 0)))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Unavailable { venue_id: venue.id });

    // Touching at the boundary is fine
    let after = w
        .bookings
        .create(&bob, request(&venue, (13, 0), (14, 0)))
        .await
        .unwrap();
    assert_eq!(after.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_back_to_back_bookings_are_allowed() {
    let w = world();
    let venue = w.venue("1500.00").await;
    let caller = Caller::user(UserId::new());

    w.bookings
        .create(&caller, request(&venue, (10, 0), (12, 0)))
        .await
        .unwrap();
    w.bookings
        .create(&caller, request(&venue, (12, 0), (13, 0)))
        .await
        .unwrap();
    assert_eq!(w.booking_store.snapshot().len(), 2);
}

#[tokio::test]
async fn test_cancelled_booking_frees_the_slot() {
    let w = world();
    let venue = w.venue("1500.00").await;
    let caller = Caller::user(UserId::new());
    let slot = fixtures::slot((10, 0), (12, 0));

    let booking = w
        .bookings
        .create(&caller, request(&venue, (10, 0), (12, 0)))
        .await
        .unwrap();
    assert!(!w.venues.check_availability(venue.id, &slot).await.unwrap());

    let cancelled = w.bookings.cancel(&caller, booking.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(w.venues.check_availability(venue.id, &slot).await.unwrap());

    // Cancelling again returns the booking unchanged
    let again = w.bookings.cancel(&caller, booking.id).await.unwrap();
    assert_eq!(again, cancelled);

    w.bookings
        .create(&caller, request(&venue, (10, 0), (12, 0)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_confirm_only_from_pending() {
    let w = world();
    let venue = w.venue("1500.00").await;
    let caller = Caller::user(UserId::new());

    let confirmed = w
        .bookings
        .create(&caller, request(&venue, (10, 0), (11, 0)))
        .await
        .unwrap();
    w.bookings.confirm(&w.admin, confirmed.id).await.unwrap();
    let err = w.bookings.confirm(&w.admin, confirmed.id).await.unwrap_err();
    assert!(matches!(err, DomainError::CannotConfirm { .. }));

    let cancelled = w
        .bookings
        .create(&caller, request(&venue, (12, 0), (13, 0)))
        .await
        .unwrap();
    w.bookings.cancel(&caller, cancelled.id).await.unwrap();
    let err = w.bookings.confirm(&w.admin, cancelled.id).await.unwrap_err();
    assert!(matches!(err, DomainError::CannotConfirm { .. }));

    let err = w.bookings.confirm(&caller, cancelled.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[tokio::test]
async fn test_conflicting_reschedule_leaves_booking_untouched() {
    let w = world();
    let venue = w.venue("1500.00").await;
    let caller = Caller::user(UserId::new());

    w.bookings
        .create(&caller, request(&venue, (14, 0), (16, 0)))
        .await
        .unwrap();
    let booking = w
        .bookings
        .create(&caller, request(&venue, (10, 0), (11, 0)))
        .await
        .unwrap();

    let patch = BookingPatch {
        start_datetime: Some(fixtures::at(15, 0)),
        end_datetime: Some(fixtures::at(17, 0)),
        ..BookingPatch::default()
    };
    let err = w
        .bookings
        .update(&caller, booking.id, patch)
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Unavailable { venue_id: venue.id });

    let stored = w.bookings.get(&caller, booking.id).await.unwrap();
    assert_eq!(stored, booking);
}

#[tokio::test]
async fn test_reschedule_reprices_and_ignores_own_slot() {
    let w = world();
    let venue = w.venue("2000.00").await;
    let caller = Caller::user(UserId::new());

    let booking = w
        .bookings
        .create(&caller, request(&venue, (10, 0), (11, 0)))
        .await
        .unwrap();
    assert_eq!(booking.total_cost, fixtures::money("2000.00"));

    // Overlaps only itself
    let patch = BookingPatch {
        end_datetime: Some(fixtures::at(12, 30)),
        ..BookingPatch::default()
    };
    let updated = w.bookings.update(&caller, booking.id, patch).await.unwrap();
    assert_eq!(updated.start_datetime, fixtures::at(10, 0));
    assert_eq!(updated.end_datetime, fixtures::at(12, 30));
    assert_eq!(updated.total_cost, fixtures::money("6000.00"));
    assert!(updated.updated_at.is_some());

    let inverted = BookingPatch {
        start_datetime: Some(fixtures::at(13, 0)),
        ..BookingPatch::default()
    };
    let err = w
        .bookings
        .update(&caller, booking.id, inverted)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidInterval(_)));
}

#[tokio::test]
async fn test_strangers_cannot_touch_bookings() {
    let w = world();
    let venue = w.venue("1500.00").await;
    let owner = Caller::user(UserId::new());
    let stranger = Caller::user(UserId::new());

    let booking = w
        .bookings
        .create(&owner, request(&venue, (10, 0), (11, 0)))
        .await
        .unwrap();

    let err = w.bookings.get(&stranger, booking.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
    let err = w
        .bookings
        .update(&stranger, booking.id, BookingPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
    let err = w.bookings.cancel(&stranger, booking.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    // Admins see everything, users only their own
    assert_eq!(
        w.bookings
            .list(&w.admin, Pagination::default())
            .await
            .unwrap()
            .total,
        1
    );
    assert_eq!(
        w.bookings
            .list(&stranger, Pagination::default())
            .await
            .unwrap()
            .total,
        0
    );
    w.bookings.get(&w.admin, booking.id).await.unwrap();
}

#[tokio::test]
async fn test_deactivated_venue_refuses_new_bookings() {
    let w = world();
    let venue = w.venue("1500.00").await;
    let caller = Caller::user(UserId::new());

    let existing = w
        .bookings
        .create(&caller, request(&venue, (9, 0), (10, 0)))
        .await
        .unwrap();
    w.venues.deactivate(&w.admin, venue.id).await.unwrap();

    let err = w
        .bookings
        .create(&caller, request(&venue, (10, 0), (11, 0)))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::VenueInactive(venue.id));

    // Existing bookings stay readable and cancellable
    w.bookings.get(&caller, existing.id).await.unwrap();
    w.bookings.cancel(&caller, existing.id).await.unwrap();

    // Reactivating through a patch restores booking
    let reactivate = VenuePatch {
        is_active: Some(true),
        ..VenuePatch::default()
    };
    w.venues
        .update(&w.admin, venue.id, reactivate)
        .await
        .unwrap();
    w.bookings
        .create(&caller, request(&venue, (10, 0), (11, 0)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rate_change_applies_to_new_bookings_only() {
    let w = world();
    let venue = w.venue("1500.00").await;
    let caller = Caller::user(UserId::new());

    let before = w
        .bookings
        .create(&caller, request(&venue, (10, 0), (11, 0)))
        .await
        .unwrap();

    let patch = VenuePatch {
        hourly_rate: Some(fixtures::money("1800.00")),
        ..VenuePatch::default()
    };
    w.venues.update(&w.admin, venue.id, patch).await.unwrap();

    let after = w
        .bookings
        .create(&caller, request(&venue, (12, 0), (13, 0)))
        .await
        .unwrap();
    assert_eq!(after.total_cost, fixtures::money("1800.00"));
    assert_eq!(
        w.bookings.get(&caller, before.id).await.unwrap().total_cost,
        fixtures::money("1500.00")
    );
}

fn slot_strategy() -> impl Strategy<Value = TimeSlot> {
    (0u32..20, 1u32..6).prop_map(|(start, len)| {
        let end = (start + len).min(23);
        fixtures::slot((start, 0), (end, 30))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_accepted_bookings_never_overlap(slots in prop::collection::vec(slot_strategy(), 1..12)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        runtime.block_on(async {
            let w = world();
            let venue = w.venue("100.00").await;
            let caller = Caller::user(UserId::new());

            for slot in slots {
                let result = w
                    .bookings
                    .create(
                        &caller,
                        BookingRequest {
                            venue_id: venue.id,
                            slot,
                            purpose: None,
                            notes: None,
                        },
                    )
                    .await;
                if let Err(err) = result {
                    assert_eq!(err, DomainError::Unavailable { venue_id: venue.id });
                }
            }

            let accepted = w.booking_store.snapshot();
            for (i, a) in accepted.iter().enumerate() {
                for b in &accepted[i + 1..] {
                    assert!(!a.slot().unwrap().overlaps(&b.slot().unwrap()));
                }
            }
        });
    }
}
