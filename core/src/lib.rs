//! # Venue Booking Core
//!
//! Domain types and business rules for the venue booking service.
//!
//! This crate holds everything that decides *whether* a booking may exist and
//! *what it costs*, with no I/O of its own:
//!
//! - **Types**: venues, bookings, users, sessions and their identifiers
//! - **Time slots**: half-open `[start, end)` intervals and the overlap rule
//! - **Pricing**: billed hours (rounded up) times the venue's hourly rate
//! - **Lifecycle**: the `pending → confirmed → cancelled` state machine
//! - **Access**: the owner-or-admin capability gate
//! - **Repositories**: storage traits implemented by the Postgres and
//!   in-memory backends
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │   HTTP handlers / services (imperative)  │  ← venue-booking
//! ├──────────────────────────────────────────┤
//! │   Rules (pure)                           │  ← this crate
//! │   - TimeSlot::overlaps                   │
//! │   - pricing::booking_cost                │
//! │   - lifecycle::apply                     │
//! │   - Caller::ensure_owner_or_admin        │
//! ├──────────────────────────────────────────┤
//! │   Repositories (traits)                  │  ← postgres / testing
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use rust_decimal::Decimal;
//! use venue_booking_core::{pricing, TimeSlot};
//!
//! let slot = TimeSlot::new(
//!     Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2025, 3, 1, 11, 1, 0).unwrap(),
//! ).unwrap();
//!
//! // 61 minutes bill as two hours
//! let cost = pricing::booking_cost(Decimal::new(150_000, 2), &slot).unwrap();
//! assert_eq!(cost.to_string(), "3000.00");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod access;
pub mod environment;
pub mod error;
pub mod ids;
pub mod lifecycle;
pub mod model;
pub mod overlap;
pub mod pagination;
pub mod pricing;
pub mod repository;
pub mod slot;
pub mod timestamp;

// Re-export commonly used types
pub use access::Caller;
pub use environment::{Clock, SystemClock};
pub use error::{DomainError, Result};
pub use ids::{BookingId, UserId, VenueId};
pub use lifecycle::{BookingCommand, Transition};
pub use model::{
    Booking, BookingPatch, BookingStatus, NewVenue, Session, User, UserPatch, Venue, VenueFilter,
    VenuePatch,
};
pub use pagination::{Page, Pagination};
pub use slot::TimeSlot;
