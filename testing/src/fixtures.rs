//! Ready-made domain records.
//!
//! Fixtures panic on malformed literals; they are only meant for tests.

#![allow(clippy::expect_used)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use venue_booking_core::{Booking, NewVenue, TimeSlot, User, UserId, Venue, VenueId, pricing};

/// Parse a money literal such as `"150.00"`.
///
/// # Panics
///
/// Panics if `amount` is not a decimal number.
#[must_use]
pub fn money(amount: &str) -> Decimal {
    Decimal::from_str(amount).expect("fixture money literal should parse")
}

/// `2025-06-02` at the given hour and minute, UTC.
///
/// # Panics
///
/// Panics on an out-of-range hour or minute.
#[must_use]
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0)
        .single()
        .expect("fixture time should be valid")
}

/// Slot between two fixture times (`(hour, minute)` pairs).
///
/// # Panics
///
/// Panics if `to` is not after `from`.
#[must_use]
pub fn slot(from: (u32, u32), to: (u32, u32)) -> TimeSlot {
    TimeSlot::new(at(from.0, from.1), at(to.0, to.1)).expect("fixture slot should be valid")
}

/// Creation payload for an active venue.
#[must_use]
pub fn new_venue(name: &str, city: &str, hourly_rate: &str) -> NewVenue {
    NewVenue {
        name: name.to_string(),
        description: Some(format!("{name} in {city}")),
        address: "1 Main Street".to_string(),
        city: city.to_string(),
        postal_code: None,
        capacity: 100,
        hourly_rate: money(hourly_rate),
        amenities: Some("Projector, WiFi".to_string()),
        image_url: None,
        contact_email: None,
        contact_phone: None,
    }
}

/// An active venue.
#[must_use]
pub fn venue(name: &str, city: &str, hourly_rate: &str) -> Venue {
    new_venue(name, city, hourly_rate).into_venue(VenueId::new(), at(0, 0))
}

/// An active, non-admin user. The password hash is a placeholder that no
/// password verifies against.
#[must_use]
pub fn user(email: &str) -> User {
    User {
        id: UserId::new(),
        email: email.to_string(),
        password_hash: String::from("!"),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        phone: None,
        company: None,
        is_active: true,
        is_admin: false,
        created_at: at(0, 0),
        updated_at: None,
    }
}

/// An active administrator.
#[must_use]
pub fn admin(email: &str) -> User {
    User {
        is_admin: true,
        ..user(email)
    }
}

/// A pending booking priced from `venue`'s rate.
///
/// # Panics
///
/// Panics if the cost overflows.
#[must_use]
pub fn booking(venue: &Venue, owner: UserId, slot: TimeSlot) -> Booking {
    let cost = pricing::booking_cost(venue.hourly_rate, &slot).expect("fixture cost should fit");
    Booking::pending(venue.id, owner, slot, cost, None, None, at(0, 0))
}
