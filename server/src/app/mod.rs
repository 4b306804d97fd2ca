//! Application services.
//!
//! Each service holds its repositories as trait objects plus a [`Clock`],
//! so the same code runs on `PostgreSQL` in production and on the
//! in-memory repositories in tests.
//!
//! [`Clock`]: venue_booking_core::Clock

pub mod bookings;
pub mod users;
pub mod venues;

pub use bookings::{BookingRequest, BookingService};
pub use users::{Registration, UserService};
pub use venues::VenueService;
