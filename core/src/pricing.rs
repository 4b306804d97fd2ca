//! Booking cost calculation.
//!
//! A booking is billed per *started* hour: 61 minutes cost two hours. The
//! arithmetic stays in [`Decimal`] end to end.

use crate::error::{DomainError, Result};
use crate::slot::TimeSlot;
use rust_decimal::Decimal;

const SECONDS_PER_HOUR: i64 = 3600;

/// Largest amount a `NUMERIC(10,2)` column can hold.
// 9_999_999_999 = 0x2_540B_E3FF split into 32-bit parts.
pub const MAX_COST: Decimal = Decimal::from_parts(0x540B_E3FF, 0x2, 0, false, 2);

/// Whole hours billed for `slot`, rounding any remainder up.
///
/// Sub-second remainders count too, so a slot one nanosecond past the hour
/// bills the next hour.
#[must_use]
pub fn billed_hours(slot: &TimeSlot) -> i64 {
    let duration = slot.duration();
    let seconds = duration.num_seconds();
    let has_fraction = duration.subsec_nanos() != 0 || seconds % SECONDS_PER_HOUR != 0;
    seconds / SECONDS_PER_HOUR + i64::from(has_fraction)
}

/// Cost of booking `slot` at `hourly_rate`.
///
/// # Errors
///
/// Returns [`DomainError::Validation`] if the result does not fit the
/// stored money column.
pub fn booking_cost(hourly_rate: Decimal, slot: &TimeSlot) -> Result<Decimal> {
    let hours = billed_hours(slot);
    hourly_rate
        .checked_mul(Decimal::from(hours))
        .filter(|cost| *cost <= MAX_COST)
        .ok_or_else(|| {
            DomainError::Validation(format!(
                "booking cost for {hours} hours at {hourly_rate} exceeds the maximum of {MAX_COST}"
            ))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
    }

    fn slot_of(duration: Duration) -> TimeSlot {
        TimeSlot::new(start(), start() + duration).unwrap()
    }

    fn rate(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_max_cost_constant() {
        assert_eq!(MAX_COST.to_string(), "99999999.99");
    }

    #[test]
    fn test_exact_hour() {
        let cost = booking_cost(rate(150_000), &slot_of(Duration::minutes(60))).unwrap();
        assert_eq!(cost, rate(150_000));
    }

    #[test]
    fn test_one_minute_over_bills_next_hour() {
        let cost = booking_cost(rate(150_000), &slot_of(Duration::minutes(61))).unwrap();
        assert_eq!(cost.to_string(), "3000.00");
    }

    #[test]
    fn test_two_and_a_half_hours() {
        let cost = booking_cost(rate(200_000), &slot_of(Duration::minutes(150))).unwrap();
        assert_eq!(cost.to_string(), "6000.00");
    }

    #[test]
    fn test_sub_second_remainder_rounds_up() {
        let slot = slot_of(Duration::hours(1) + Duration::nanoseconds(1));
        assert_eq!(billed_hours(&slot), 2);

        let tiny = slot_of(Duration::milliseconds(1));
        assert_eq!(billed_hours(&tiny), 1);
    }

    #[test]
    fn test_overflowing_cost_is_rejected() {
        let slot = slot_of(Duration::hours(24 * 365));
        let err = booking_cost(rate(9_999_999_999), &slot).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    proptest! {
        #[test]
        fn prop_billed_hours_is_ceiling(minutes in 1i64..10_000) {
            let hours = billed_hours(&slot_of(Duration::minutes(minutes)));
            prop_assert_eq!(hours, (minutes + 59) / 60);
        }

        #[test]
        fn prop_cost_never_undercharges(minutes in 1i64..10_000, cents in 1i64..1_000_000) {
            let cost = booking_cost(rate(cents), &slot_of(Duration::minutes(minutes))).unwrap();
            let exact = rate(cents) * Decimal::from(minutes) / Decimal::from(60);
            prop_assert!(cost >= exact);
            prop_assert!(cost - exact < rate(cents));
        }
    }
}
