//! Venue API endpoints.
//!
//! - GET /venues - Filtered listing of active venues
//! - GET /venues/city/:city - Active venues in a city
//! - GET /venues/:id - Venue details (active or not)
//! - GET /venues/:id/availability - Is a time slot free?
//! - POST /venues - Create a venue (admin)
//! - PUT /venues/:id - Update a venue (admin)
//! - DELETE /venues/:id - Deactivate a venue (admin)

use super::{PageMeta, PageQuery, default_limit, parse_timestamp};
use crate::auth::RequireAdmin;
use crate::server::state::AppState;
use axum::extract::State;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use venue_booking_core::{
    DomainError, NewVenue, Pagination, TimeSlot, Venue, VenueFilter, VenueId, VenuePatch,
};
use venue_booking_web::{ApiJson, ApiPath, ApiQuery, WebResult};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing venues.
#[derive(Debug, Deserialize)]
pub struct ListVenuesQuery {
    /// Records to skip
    #[serde(default)]
    pub skip: u32,
    /// Records to return
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Case-insensitive city substring
    pub city: Option<String>,
    /// Minimum capacity
    pub min_capacity: Option<i32>,
    /// Maximum capacity
    pub max_capacity: Option<i32>,
    /// Minimum hourly rate, as a decimal string
    pub min_rate: Option<String>,
    /// Maximum hourly rate, as a decimal string
    pub max_rate: Option<String>,
}

impl ListVenuesQuery {
    fn pagination(&self) -> Pagination {
        PageQuery {
            skip: self.skip,
            limit: self.limit,
        }
        .pagination()
    }

    fn filter(&self) -> Result<VenueFilter, DomainError> {
        Ok(VenueFilter {
            city: self.city.clone().filter(|c| !c.trim().is_empty()),
            min_capacity: self.min_capacity,
            max_capacity: self.max_capacity,
            min_rate: parse_rate("min_rate", self.min_rate.as_deref())?,
            max_rate: parse_rate("max_rate", self.max_rate.as_deref())?,
        })
    }
}

fn parse_rate(field: &str, raw: Option<&str>) -> Result<Option<Decimal>, DomainError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            Decimal::from_str(s.trim())
                .map_err(|_| DomainError::Validation(format!("{field} must be a decimal number")))
        })
        .transpose()
}

/// Response for listing venues.
#[derive(Debug, Serialize)]
pub struct VenueList {
    /// Venues in this page
    pub venues: Vec<Venue>,
    /// Total, page and size
    #[serde(flatten)]
    pub meta: PageMeta,
}

/// Query parameters for the availability probe.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Slot start
    pub start_datetime: String,
    /// Slot end (exclusive)
    pub end_datetime: String,
}

/// Availability probe result.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    /// Venue probed
    pub venue_id: VenueId,
    /// Whether no active booking overlaps the slot
    pub available: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// List active venues matching the filters.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:8000/api/v1/venues?city=brno&min_capacity=50&max_rate=2000.00"
/// ```
///
/// # Errors
///
/// 422 for malformed rates or inverted bounds.
pub async fn list_venues(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListVenuesQuery>,
) -> WebResult<ApiJson<VenueList>> {
    let filter = query.filter()?;
    let pagination = query.pagination();
    let page = state.venues.list(&filter, pagination).await?;

    Ok(ApiJson(VenueList {
        meta: PageMeta::of(&page, pagination),
        venues: page.items,
    }))
}

/// Active venues in a city (unpaginated).
///
/// # Errors
///
/// 500 on storage failure.
pub async fn list_venues_by_city(
    State(state): State<AppState>,
    ApiPath(city): ApiPath<String>,
) -> WebResult<ApiJson<Vec<Venue>>> {
    Ok(ApiJson(state.venues.list_by_city(&city).await?))
}

/// Venue details.
///
/// # Errors
///
/// 404 for an unknown venue.
pub async fn get_venue(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<VenueId>,
) -> WebResult<ApiJson<Venue>> {
    Ok(ApiJson(state.venues.get(id).await?))
}

/// Whether a slot is free at the venue.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:8000/api/v1/venues/<id>/availability?start_datetime=2025-06-02T10:00:00Z&end_datetime=2025-06-02T12:00:00Z"
/// ```
///
/// # Errors
///
/// 400 for an unparseable or empty interval, 404 for an unknown venue.
pub async fn check_availability(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<VenueId>,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> WebResult<ApiJson<AvailabilityResponse>> {
    let slot = TimeSlot::new(
        parse_timestamp("start_datetime", &query.start_datetime)?,
        parse_timestamp("end_datetime", &query.end_datetime)?,
    )?;
    let available = state.venues.check_availability(id, &slot).await?;

    Ok(ApiJson(AvailabilityResponse {
        venue_id: id,
        available,
    }))
}

/// Create a venue.
///
/// # Errors
///
/// 403 for non-admins, 422 for invalid fields.
pub async fn create_venue(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiJson(new_venue): ApiJson<NewVenue>,
) -> WebResult<ApiJson<Venue>> {
    Ok(ApiJson(state.venues.create(&admin.caller, new_venue).await?))
}

/// Patch a venue.
///
/// # Errors
///
/// 403 for non-admins, 404 for an unknown venue, 422 for invalid fields.
pub async fn update_venue(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiPath(id): ApiPath<VenueId>,
    ApiJson(patch): ApiJson<VenuePatch>,
) -> WebResult<ApiJson<Venue>> {
    Ok(ApiJson(state.venues.update(&admin.caller, id, patch).await?))
}

/// Deactivate a venue.
///
/// # Errors
///
/// 403 for non-admins, 404 for an unknown venue.
pub async fn delete_venue(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiPath(id): ApiPath<VenueId>,
) -> WebResult<ApiJson<Venue>> {
    Ok(ApiJson(state.venues.deactivate(&admin.caller, id).await?))
}
