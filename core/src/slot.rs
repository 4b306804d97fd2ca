//! Half-open booking intervals.

use crate::error::{DomainError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A `[start, end)` time slot on a venue.
///
/// Construction guarantees `start < end`, so every `TimeSlot` in the system
/// has a strictly positive duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSlot")]
pub struct TimeSlot {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawSlot {
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    start: DateTime<Utc>,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    end: DateTime<Utc>,
}

impl TryFrom<RawSlot> for TimeSlot {
    type Error = DomainError;

    fn try_from(raw: RawSlot) -> Result<Self> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeSlot {
    /// Create a slot, rejecting empty and inverted intervals.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidInterval`] if `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(DomainError::InvalidInterval(format!(
                "end ({end}) must be after start ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Inclusive start of the slot.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end of the slot.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Elapsed time between start and end.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether two slots share any instant.
    ///
    /// Slots that merely touch (`a.end == b.start`) do not overlap, so
    /// back-to-back bookings are allowed. This is the reduced form of the
    /// three boundary cases (start inside, end inside, full containment).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap()
    }

    fn slot(from: (u32, u32), to: (u32, u32)) -> TimeSlot {
        TimeSlot::new(at(from.0, from.1), at(to.0, to.1)).unwrap()
    }

    /// The boundary cases spelled out one by one.
    fn three_clause(existing: &TimeSlot, candidate: &TimeSlot) -> bool {
        (existing.start <= candidate.start && existing.end > candidate.start)
            || (existing.start < candidate.end && existing.end >= candidate.end)
            || (existing.start >= candidate.start && existing.end <= candidate.end)
    }

    #[test]
    fn test_rejects_inverted_and_empty() {
        assert!(matches!(
            TimeSlot::new(at(12, 0), at(10, 0)),
            Err(DomainError::InvalidInterval(_))
        ));
        assert!(matches!(
            TimeSlot::new(at(10, 0), at(10, 0)),
            Err(DomainError::InvalidInterval(_))
        ));
    }

    #[test]
    fn test_back_to_back_is_not_overlap() {
        let morning = slot((10, 0), (12, 0));
        let noon = slot((12, 0), (13, 0));
        assert!(!morning.overlaps(&noon));
        assert!(!noon.overlaps(&morning));
    }

    #[test]
    fn test_partial_overlap() {
        let existing = slot((11, 0), (13, 0));
        let candidate = slot((10, 0), (12, 0));
        assert!(existing.overlaps(&candidate));
    }

    #[test]
    fn test_containment_both_ways() {
        let outer = slot((9, 0), (17, 0));
        let inner = slot((11, 0), (12, 0));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_identical_slots_overlap() {
        let a = slot((10, 0), (11, 0));
        assert!(a.overlaps(&a));
    }

    #[test]
    fn test_deserialize_validates() {
        let bad = r#"{"start":"2025-06-02T12:00:00Z","end":"2025-06-02T10:00:00Z"}"#;
        assert!(serde_json::from_str::<TimeSlot>(bad).is_err());

        let good = r#"{"start":"2025-06-02T10:00:00Z","end":"2025-06-02T12:00:00Z"}"#;
        let parsed: TimeSlot = serde_json::from_str(good).unwrap();
        assert_eq!(parsed, slot((10, 0), (12, 0)));
    }

    fn arb_slot() -> impl Strategy<Value = TimeSlot> {
        // Minutes within one day, duration 1..=600 minutes
        (0i64..1440, 1i64..=600).prop_map(|(offset, len)| {
            let start = at(0, 0) + Duration::minutes(offset);
            TimeSlot::new(start, start + Duration::minutes(len)).unwrap()
        })
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric(a in arb_slot(), b in arb_slot()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn prop_matches_three_clause_form(existing in arb_slot(), candidate in arb_slot()) {
            prop_assert_eq!(candidate.overlaps(&existing), three_clause(&existing, &candidate));
        }

        #[test]
        fn prop_touching_slots_never_overlap(a in arb_slot(), len in 1i64..=600) {
            let next = TimeSlot::new(a.end(), a.end() + Duration::minutes(len)).unwrap();
            prop_assert!(!a.overlaps(&next));
        }
    }
}
