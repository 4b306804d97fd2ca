//! # Venue Booking Testing
//!
//! Test doubles for the venue booking service.
//!
//! This crate provides:
//! - In-memory implementations of every repository trait
//! - A controllable clock
//! - Fixture builders for venues, users and bookings
//!
//! ## Example
//!
//! ```
//! use venue_booking_testing::{fixtures, InMemoryVenueRepository};
//!
//! let venue = fixtures::venue("Grand Hall", "Paris", "150.00");
//! let venues = InMemoryVenueRepository::with_venues([venue.clone()]);
//! assert_eq!(venues.len(), 1);
//! ```

use chrono::{DateTime, Duration, Utc};
use venue_booking_core::environment::Clock;

pub mod fixtures;
pub mod memory;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Duration, Utc};
    use std::sync::{Arc, RwLock};

    /// Clock that only moves when told to.
    ///
    /// Clones share the same time, so a test can keep a handle and advance
    /// the clock a service was built with.
    ///
    /// # Example
    ///
    /// ```
    /// use venue_booking_testing::mocks::FixedClock;
    /// use venue_booking_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let before = clock.now();
    /// assert_eq!(before, clock.now());
    ///
    /// clock.advance(Duration::minutes(5));
    /// assert_eq!(clock.now() - before, Duration::minutes(5));
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a clock pinned at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock forward (or backward, with a negative duration)
        pub fn advance(&self, by: Duration) {
            if let Ok(mut time) = self.time.write() {
                *time += by;
            }
        }

        /// Pin the clock at `time`
        pub fn set(&self, time: DateTime<Utc>) {
            if let Ok(mut current) = self.time.write() {
                *current = time;
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
                .read()
                .map_or_else(|poisoned| *poisoned.into_inner(), |time| *time)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Install a compact `tracing` subscriber for test output.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use memory::{
    AlwaysReady, InMemoryBookingRepository, InMemorySessionRepository, InMemoryUserRepository,
    InMemoryVenueRepository,
};
pub use mocks::{FixedClock, test_clock};
