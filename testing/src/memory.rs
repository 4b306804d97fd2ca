//! In-memory repositories.
//!
//! Each repository keeps its records behind one `Arc<Mutex<..>>`, so clones
//! share state. The booking repository performs its availability check and
//! write under that single lock, which gives the same all-or-nothing
//! guarantee the database gets from its row lock and exclusion constraint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use venue_booking_core::overlap;
use venue_booking_core::repository::{
    BookingRepository, ReadinessProbe, SessionRepository, UserRepository, VenueRepository,
};
use venue_booking_core::{
    Booking, BookingId, BookingStatus, DomainError, Page, Pagination, Result, Session, TimeSlot,
    User, UserId, Venue, VenueFilter, VenueId,
};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| DomainError::Internal("in-memory store lock poisoned".to_string()))
}

// ============================================================================
// Venues
// ============================================================================

/// In-memory [`VenueRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryVenueRepository {
    venues: Arc<Mutex<HashMap<VenueId, Venue>>>,
}

impl InMemoryVenueRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with `venues`.
    #[must_use]
    pub fn with_venues(venues: impl IntoIterator<Item = Venue>) -> Self {
        let map = venues.into_iter().map(|v| (v.id, v)).collect();
        Self {
            venues: Arc::new(Mutex::new(map)),
        }
    }

    /// Number of stored venues, active or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.venues.lock().map_or(0, |v| v.len())
    }

    /// Whether the repository holds no venues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sorted_matching(&self, keep: impl Fn(&Venue) -> bool) -> Result<Vec<Venue>> {
        let mut venues: Vec<Venue> = lock(&self.venues)?
            .values()
            .filter(|v| keep(v))
            .cloned()
            .collect();
        venues.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(venues)
    }
}

#[async_trait]
impl VenueRepository for InMemoryVenueRepository {
    async fn get(&self, id: VenueId) -> Result<Option<Venue>> {
        Ok(lock(&self.venues)?.get(&id).cloned())
    }

    async fn list(&self, filter: &VenueFilter, pagination: Pagination) -> Result<Page<Venue>> {
        let matching = self.sorted_matching(|v| filter.matches(v))?;
        Ok(Page::from_all(matching, pagination))
    }

    async fn list_by_city(&self, city: &str) -> Result<Vec<Venue>> {
        let filter = VenueFilter {
            city: Some(city.to_string()),
            ..VenueFilter::default()
        };
        self.sorted_matching(|v| filter.matches(v))
    }

    async fn insert(&self, venue: &Venue) -> Result<Venue> {
        lock(&self.venues)?.insert(venue.id, venue.clone());
        Ok(venue.clone())
    }

    async fn update(&self, venue: &Venue) -> Result<Venue> {
        let mut venues = lock(&self.venues)?;
        let stored = venues
            .get_mut(&venue.id)
            .ok_or_else(|| DomainError::not_found("Venue", venue.id))?;
        *stored = venue.clone();
        Ok(venue.clone())
    }
}

// ============================================================================
// Bookings
// ============================================================================

/// In-memory [`BookingRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingRepository {
    bookings: Arc<Mutex<HashMap<BookingId, Booking>>>,
}

impl InMemoryBookingRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored booking, unordered. Useful for asserting invariants.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Booking> {
        self.bookings
            .lock()
            .map(|b| b.values().cloned().collect())
            .unwrap_or_default()
    }

    fn ensure_free(
        bookings: &HashMap<BookingId, Booking>,
        booking: &Booking,
        slot: &TimeSlot,
    ) -> Result<()> {
        match overlap::find_conflict(booking.venue_id, slot, Some(booking.id), bookings.values()) {
            Some(_) => Err(DomainError::Unavailable {
                venue_id: booking.venue_id,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(lock(&self.bookings)?.get(&id).cloned())
    }

    async fn list(&self, owner: Option<UserId>, pagination: Pagination) -> Result<Page<Booking>> {
        let mut bookings: Vec<Booking> = lock(&self.bookings)?
            .values()
            .filter(|b| owner.is_none_or(|o| b.user_id == o))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(Page::from_all(bookings, pagination))
    }

    async fn list_for_venue(
        &self,
        venue_id: VenueId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pagination: Pagination,
    ) -> Result<Page<Booking>> {
        let mut bookings: Vec<Booking> = lock(&self.bookings)?
            .values()
            .filter(|b| b.venue_id == venue_id)
            .filter(|b| from.is_none_or(|f| b.start_datetime >= f))
            .filter(|b| to.is_none_or(|t| b.end_datetime <= t))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| a.start_datetime.cmp(&b.start_datetime).then(a.id.cmp(&b.id)));
        Ok(Page::from_all(bookings, pagination))
    }

    async fn is_available(
        &self,
        venue_id: VenueId,
        slot: &TimeSlot,
        exclude: Option<BookingId>,
    ) -> Result<bool> {
        let bookings = lock(&self.bookings)?;
        Ok(overlap::is_available(venue_id, slot, exclude, bookings.values()))
    }

    async fn insert(&self, booking: &Booking) -> Result<Booking> {
        let slot = booking.slot()?;
        let mut bookings = lock(&self.bookings)?;
        if booking.is_active() {
            Self::ensure_free(&bookings, booking, &slot)?;
        }
        bookings.insert(booking.id, booking.clone());
        Ok(booking.clone())
    }

    async fn update(
        &self,
        booking: &Booking,
        expected: BookingStatus,
        reschedule: bool,
    ) -> Result<Option<Booking>> {
        let slot = booking.slot()?;
        let mut bookings = lock(&self.bookings)?;
        if bookings.get(&booking.id).is_none_or(|stored| stored.status != expected) {
            return Ok(None);
        }
        if reschedule && booking.is_active() {
            Self::ensure_free(&bookings, booking, &slot)?;
        }
        bookings.insert(booking.id, booking.clone());
        Ok(Some(booking.clone()))
    }

    async fn transition_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>> {
        let mut bookings = lock(&self.bookings)?;
        match bookings.get_mut(&id) {
            Some(stored) if stored.status == expected => {
                stored.status = next;
                stored.updated_at = Some(at);
                Ok(Some(stored.clone()))
            }
            _ => Ok(None),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// In-memory [`UserRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with `users`.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let map = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            users: Arc::new(Mutex::new(map)),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: UserId) -> Result<Option<User>> {
        Ok(lock(&self.users)?.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(lock(&self.users)?
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self, pagination: Pagination) -> Result<Page<User>> {
        let mut users: Vec<User> = lock(&self.users)?.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(Page::from_all(users, pagination))
    }

    async fn insert(&self, user: &User) -> Result<User> {
        let mut users = lock(&self.users)?;
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(DomainError::EmailTaken(user.email.clone()));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User> {
        let mut users = lock(&self.users)?;
        let stored = users
            .get_mut(&user.id)
            .ok_or_else(|| DomainError::not_found("User", user.id))?;
        *stored = user.clone();
        Ok(user.clone())
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// In-memory [`SessionRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl InMemorySessionRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().map_or(0, |s| s.len())
    }

    /// Whether no sessions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn insert(&self, session: &Session) -> Result<()> {
        lock(&self.sessions)?.insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn find(&self, token_hash: &str) -> Result<Option<Session>> {
        Ok(lock(&self.sessions)?.get(token_hash).cloned())
    }

    async fn delete(&self, token_hash: &str) -> Result<()> {
        lock(&self.sessions)?.remove(token_hash);
        Ok(())
    }

    async fn delete_for_user(&self, user_id: UserId) -> Result<u64> {
        let mut sessions = lock(&self.sessions)?;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut sessions = lock(&self.sessions)?;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}

/// Readiness probe that always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

#[async_trait]
impl ReadinessProbe for AlwaysReady {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
