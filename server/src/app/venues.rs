//! Venue catalogue: search, admin maintenance and the availability probe.

use std::sync::Arc;
use venue_booking_core::repository::{BookingRepository, VenueRepository};
use venue_booking_core::{
    Caller, Clock, DomainError, NewVenue, Page, Pagination, Result, TimeSlot, Venue, VenueFilter,
    VenueId, VenuePatch,
};

/// Venue operations.
#[derive(Clone)]
pub struct VenueService {
    venues: Arc<dyn VenueRepository>,
    bookings: Arc<dyn BookingRepository>,
    clock: Arc<dyn Clock>,
}

impl VenueService {
    /// Create a venue service.
    #[must_use]
    pub fn new(
        venues: Arc<dyn VenueRepository>,
        bookings: Arc<dyn BookingRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            venues,
            bookings,
            clock,
        }
    }

    /// Active venues matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for inverted capacity or rate
    /// bounds, or a storage error.
    pub async fn list(&self, filter: &VenueFilter, pagination: Pagination) -> Result<Page<Venue>> {
        if let (Some(min), Some(max)) = (filter.min_capacity, filter.max_capacity) {
            if min > max {
                return Err(DomainError::Validation(
                    "min_capacity must not exceed max_capacity".to_string(),
                ));
            }
        }
        if let (Some(min), Some(max)) = (filter.min_rate, filter.max_rate) {
            if min > max {
                return Err(DomainError::Validation(
                    "min_rate must not exceed max_rate".to_string(),
                ));
            }
        }
        self.venues.list(filter, pagination.normalized()).await
    }

    /// Any venue, active or not.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] for an unknown id.
    pub async fn get(&self, id: VenueId) -> Result<Venue> {
        self.venues
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Venue", id))
    }

    /// Active venues whose city contains `city`.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_by_city(&self, city: &str) -> Result<Vec<Venue>> {
        self.venues.list_by_city(city.trim()).await
    }

    /// Add a venue (admin only).
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Forbidden`] for non-admins or
    /// [`DomainError::Validation`] for bad fields.
    pub async fn create(&self, caller: &Caller, new_venue: NewVenue) -> Result<Venue> {
        caller.ensure_admin()?;
        new_venue.validate()?;

        let venue = new_venue.into_venue(VenueId::new(), self.clock.now());
        let venue = self.venues.insert(&venue).await?;
        tracing::info!(venue_id = %venue.id, name = %venue.name, "Venue created");
        Ok(venue)
    }

    /// Patch a venue (admin only). Existing bookings keep their cost.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Forbidden`], [`DomainError::NotFound`] or
    /// [`DomainError::Validation`].
    pub async fn update(&self, caller: &Caller, id: VenueId, patch: VenuePatch) -> Result<Venue> {
        caller.ensure_admin()?;
        patch.validate()?;

        let mut venue = self.get(id).await?;
        patch.apply_to(&mut venue, self.clock.now());
        let venue = self.venues.update(&venue).await?;
        tracing::info!(venue_id = %id, "Venue updated");
        Ok(venue)
    }

    /// Soft delete: mark the venue inactive (admin only). Its bookings stay.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Forbidden`] or [`DomainError::NotFound`].
    pub async fn deactivate(&self, caller: &Caller, id: VenueId) -> Result<Venue> {
        caller.ensure_admin()?;

        let mut venue = self.get(id).await?;
        venue.is_active = false;
        venue.updated_at = Some(self.clock.now());
        let venue = self.venues.update(&venue).await?;
        tracing::info!(venue_id = %id, "Venue deactivated");
        Ok(venue)
    }

    /// Whether `slot` is free at the venue.
    ///
    /// This is the overlap rule only; inactive venues still answer.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] for an unknown venue.
    pub async fn check_availability(&self, id: VenueId, slot: &TimeSlot) -> Result<bool> {
        let venue = self.get(id).await?;
        self.bookings.is_available(venue.id, slot, None).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use venue_booking_core::UserId;
    use venue_booking_testing::{
        InMemoryBookingRepository, InMemoryVenueRepository, fixtures, test_clock,
    };

    fn service(venues: InMemoryVenueRepository, bookings: InMemoryBookingRepository) -> VenueService {
        VenueService::new(Arc::new(venues), Arc::new(bookings), Arc::new(test_clock()))
    }

    #[tokio::test]
    async fn test_only_admins_create() {
        let svc = service(InMemoryVenueRepository::new(), InMemoryBookingRepository::new());
        let new_venue = fixtures::new_venue("Hall", "Paris", "100.00");

        let err = svc
            .create(&Caller::user(UserId::new()), new_venue.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let venue = svc.create(&Caller::admin(UserId::new()), new_venue).await.unwrap();
        assert!(venue.is_active);
        assert_eq!(svc.get(venue.id).await.unwrap(), venue);
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let svc = service(InMemoryVenueRepository::new(), InMemoryBookingRepository::new());
        let mut new_venue = fixtures::new_venue("Hall", "Paris", "100.00");
        new_venue.capacity = 0;
        let err = svc
            .create(&Caller::admin(UserId::new()), new_venue)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_deactivated_venue_is_hidden_but_readable() {
        let venue = fixtures::venue("Hall", "Paris", "100.00");
        let svc = service(
            InMemoryVenueRepository::with_venues([venue.clone()]),
            InMemoryBookingRepository::new(),
        );
        let admin = Caller::admin(UserId::new());

        let closed = svc.deactivate(&admin, venue.id).await.unwrap();
        assert!(!closed.is_active);

        let page = svc
            .list(&VenueFilter::default(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(!svc.get(venue.id).await.unwrap().is_active);
        assert!(svc.list_by_city("paris").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inverted_bounds_are_rejected() {
        let svc = service(InMemoryVenueRepository::new(), InMemoryBookingRepository::new());
        let filter = VenueFilter {
            min_capacity: Some(100),
            max_capacity: Some(10),
            ..VenueFilter::default()
        };
        assert!(matches!(
            svc.list(&filter, Pagination::default()).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_availability_probe() {
        let venue = fixtures::venue("Hall", "Paris", "100.00");
        let bookings = InMemoryBookingRepository::new();
        let owner = UserId::new();
        bookings
            .insert(&fixtures::booking(&venue, owner, fixtures::slot((10, 0), (12, 0))))
            .await
            .unwrap();
        let svc = service(InMemoryVenueRepository::with_venues([venue.clone()]), bookings);

        let clash = fixtures::slot((11, 0), (13, 0));
        let adjacent = fixtures::slot((12, 0), (13, 0));
        assert!(!svc.check_availability(venue.id, &clash).await.unwrap());
        assert!(svc.check_availability(venue.id, &adjacent).await.unwrap());

        let err = svc
            .check_availability(VenueId::new(), &adjacent)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
