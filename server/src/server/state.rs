//! Application state for the venue booking HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers:
//! - The venue, booking and user services
//! - The readiness probe behind `/ready`

use crate::app::{BookingService, UserService, VenueService};
use crate::auth::{PasswordHasher, TokenIssuer};
use axum::extract::FromRef;
use std::sync::Arc;
use venue_booking_core::Clock;
use venue_booking_core::repository::{
    BookingRepository, ReadinessProbe, SessionRepository, UserRepository, VenueRepository,
};

/// The storage backends the services are built on.
#[derive(Clone)]
pub struct Repositories {
    /// Venue storage
    pub venues: Arc<dyn VenueRepository>,
    /// Booking storage
    pub bookings: Arc<dyn BookingRepository>,
    /// Account storage
    pub users: Arc<dyn UserRepository>,
    /// Session storage
    pub sessions: Arc<dyn SessionRepository>,
    /// Backend health check
    pub readiness: Arc<dyn ReadinessProbe>,
}

/// Application state shared across all HTTP handlers.
///
/// It's cloned (cheaply via Arc) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Venue catalogue
    pub venues: Arc<VenueService>,
    /// Booking flows
    pub bookings: Arc<BookingService>,
    /// Accounts and sessions
    pub users: Arc<UserService>,
    /// Readiness probe for `/ready`
    pub readiness: Arc<dyn ReadinessProbe>,
}

impl AppState {
    /// Wire the services onto `repos`.
    #[must_use]
    pub fn new(
        repos: Repositories,
        clock: Arc<dyn Clock>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            venues: Arc::new(VenueService::new(
                Arc::clone(&repos.venues),
                Arc::clone(&repos.bookings),
                Arc::clone(&clock),
            )),
            bookings: Arc::new(BookingService::new(
                repos.venues,
                repos.bookings,
                Arc::clone(&clock),
            )),
            users: Arc::new(UserService::new(
                repos.users,
                repos.sessions,
                hasher,
                tokens,
                clock,
            )),
            readiness: repos.readiness,
        }
    }
}

// Lets the web crate's readiness handler run on this state
impl FromRef<AppState> for Arc<dyn ReadinessProbe> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.readiness)
    }
}
