//! Venue availability check.
//!
//! Storage backends answer availability with their own query (see the
//! repository traits); this module is the reference rule they must agree
//! with, and what the in-memory backend runs directly.

use crate::ids::{BookingId, VenueId};
use crate::model::Booking;
use crate::slot::TimeSlot;

/// First active booking on `venue_id` that overlaps `candidate`.
///
/// `exclude` names a booking that never conflicts with itself, used when
/// rescheduling. Cancelled bookings and bookings on other venues are
/// ignored, as are records whose stored interval is malformed.
pub fn find_conflict<'a, I>(
    venue_id: VenueId,
    candidate: &TimeSlot,
    exclude: Option<BookingId>,
    bookings: I,
) -> Option<&'a Booking>
where
    I: IntoIterator<Item = &'a Booking>,
{
    bookings.into_iter().find(|existing| {
        existing.venue_id == venue_id
            && existing.is_active()
            && Some(existing.id) != exclude
            && existing
                .slot()
                .is_ok_and(|slot| slot.overlaps(candidate))
    })
}

/// Whether `candidate` is free on `venue_id`.
pub fn is_available<'a, I>(
    venue_id: VenueId,
    candidate: &TimeSlot,
    exclude: Option<BookingId>,
    bookings: I,
) -> bool
where
    I: IntoIterator<Item = &'a Booking>,
{
    find_conflict(venue_id, candidate, exclude, bookings).is_none()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ids::UserId;
    use crate::model::BookingStatus;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, 0, 0).unwrap()
    }

    fn slot(from: u32, to: u32) -> TimeSlot {
        TimeSlot::new(at(from), at(to)).unwrap()
    }

    fn booking(venue_id: VenueId, from: u32, to: u32, status: BookingStatus) -> Booking {
        let mut b = Booking::pending(
            venue_id,
            UserId::new(),
            slot(from, to),
            Decimal::ZERO,
            None,
            None,
            at(0),
        );
        b.status = status;
        b
    }

    #[test]
    fn test_confirmed_overlap_conflicts() {
        let venue = VenueId::new();
        let existing = vec![booking(venue, 11, 13, BookingStatus::Confirmed)];
        let hit = find_conflict(venue, &slot(10, 12), None, &existing);
        assert_eq!(hit.map(|b| b.id), Some(existing[0].id));
    }

    #[test]
    fn test_back_to_back_is_available() {
        let venue = VenueId::new();
        let existing = vec![booking(venue, 10, 12, BookingStatus::Pending)];
        assert!(is_available(venue, &slot(12, 13), None, &existing));
        assert!(is_available(venue, &slot(8, 10), None, &existing));
    }

    #[test]
    fn test_cancelled_bookings_release_slot() {
        let venue = VenueId::new();
        let existing = vec![booking(venue, 10, 12, BookingStatus::Cancelled)];
        assert!(is_available(venue, &slot(10, 12), None, &existing));
    }

    #[test]
    fn test_other_venues_are_ignored() {
        let existing = vec![booking(VenueId::new(), 10, 12, BookingStatus::Pending)];
        assert!(is_available(VenueId::new(), &slot(10, 12), None, &existing));
    }

    #[test]
    fn test_excluded_booking_does_not_conflict_with_itself() {
        let venue = VenueId::new();
        let existing = vec![booking(venue, 10, 12, BookingStatus::Pending)];
        let own = existing[0].id;
        assert!(is_available(venue, &slot(11, 13), Some(own), &existing));
        assert!(!is_available(venue, &slot(11, 13), None, &existing));
    }

    proptest! {
        #[test]
        fn prop_active_set_stays_disjoint(
            requests in prop::collection::vec((0u32..20, 1u32..4), 1..30)
        ) {
            // Admit each request only if available; the admitted set must be pairwise disjoint.
            let venue = VenueId::new();
            let mut admitted: Vec<Booking> = Vec::new();
            for (start, len) in requests {
                let candidate = TimeSlot::new(
                    at(0) + Duration::hours(i64::from(start)),
                    at(0) + Duration::hours(i64::from(start + len)),
                ).unwrap();
                if is_available(venue, &candidate, None, &admitted) {
                    let mut b = booking(venue, 0, 1, BookingStatus::Pending);
                    b.reschedule(candidate, Decimal::ZERO);
                    admitted.push(b);
                }
            }
            for (i, a) in admitted.iter().enumerate() {
                for b in &admitted[i + 1..] {
                    prop_assert!(!a.slot().unwrap().overlaps(&b.slot().unwrap()));
                }
            }
        }
    }
}
