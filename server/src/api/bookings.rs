//! Booking API endpoints.
//!
//! - GET /bookings - Caller's bookings (all bookings for admins)
//! - GET /bookings/:id - Booking details (owner or admin)
//! - POST /bookings - Reserve a slot
//! - PUT /bookings/:id - Reschedule or edit (owner or admin)
//! - DELETE /bookings/:id - Cancel (owner or admin)
//! - POST /bookings/:id/confirm - Confirm a pending booking (admin)
//! - GET /bookings/venue/:venue_id - Bookings on a venue (admin)

use super::{PageMeta, PageQuery, default_limit, parse_optional_timestamp};
use crate::app::BookingRequest;
use crate::auth::{RequireAdmin, SessionUser};
use crate::server::state::AppState;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use venue_booking_core::{Booking, BookingId, BookingPatch, TimeSlot, VenueId, timestamp};
use venue_booking_web::{ApiJson, ApiPath, ApiQuery, WebResult};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a booking. Cost and status are set by the server.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    /// Venue to reserve
    pub venue_id: VenueId,
    /// Slot start
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_datetime: DateTime<Utc>,
    /// Slot end (exclusive)
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end_datetime: DateTime<Utc>,
    /// What the venue is booked for
    #[serde(default)]
    pub purpose: Option<String>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Response for listing bookings.
#[derive(Debug, Serialize)]
pub struct BookingList {
    /// Bookings in this page
    pub bookings: Vec<Booking>,
    /// Total, page and size
    #[serde(flatten)]
    pub meta: PageMeta,
}

/// Query parameters for a venue's bookings.
#[derive(Debug, Deserialize)]
pub struct VenueBookingsQuery {
    /// Only bookings starting at or after this instant
    pub start_date: Option<String>,
    /// Only bookings ending at or before this instant
    pub end_date: Option<String>,
    /// Records to skip
    #[serde(default)]
    pub skip: u32,
    /// Records to return
    #[serde(default = "default_limit")]
    pub limit: u32,
}

// ============================================================================
// Handlers
// ============================================================================

/// List bookings visible to the caller, newest first.
///
/// # Errors
///
/// 401 without a valid token.
pub async fn list_bookings(
    State(state): State<AppState>,
    session: SessionUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> WebResult<ApiJson<BookingList>> {
    let pagination = query.pagination();
    let page = state.bookings.list(&session.caller, pagination).await?;

    Ok(ApiJson(BookingList {
        meta: PageMeta::of(&page, pagination),
        bookings: page.items,
    }))
}

/// Booking details.
///
/// # Errors
///
/// 403 for other users' bookings, 404 for an unknown booking.
pub async fn get_booking(
    State(state): State<AppState>,
    session: SessionUser,
    ApiPath(id): ApiPath<BookingId>,
) -> WebResult<ApiJson<Booking>> {
    Ok(ApiJson(state.bookings.get(&session.caller, id).await?))
}

/// Reserve a venue for a time slot.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8000/api/v1/bookings \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "venue_id": "<venue uuid>",
///     "start_datetime": "2025-06-02T10:00:00Z",
///     "end_datetime": "2025-06-02T12:00:00Z",
///     "purpose": "Team offsite"
///   }'
/// ```
///
/// # Errors
///
/// 400 for an empty or inverted interval, 404 for an unknown venue,
/// 409 when the slot is taken or the venue is inactive.
pub async fn create_booking(
    State(state): State<AppState>,
    session: SessionUser,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> WebResult<ApiJson<Booking>> {
    let request = BookingRequest {
        venue_id: request.venue_id,
        slot: TimeSlot::new(request.start_datetime, request.end_datetime)?,
        purpose: request.purpose,
        notes: request.notes,
    };
    Ok(ApiJson(state.bookings.create(&session.caller, request).await?))
}

/// Partially update a booking.
///
/// # Errors
///
/// 400 for an invalid interval or status change, 403 for other users'
/// bookings, 404 for an unknown booking, 409 when the new slot is taken or
/// the booking is cancelled.
pub async fn update_booking(
    State(state): State<AppState>,
    session: SessionUser,
    ApiPath(id): ApiPath<BookingId>,
    ApiJson(patch): ApiJson<BookingPatch>,
) -> WebResult<ApiJson<Booking>> {
    Ok(ApiJson(state.bookings.update(&session.caller, id, patch).await?))
}

/// Cancel a booking. Already cancelled bookings are returned unchanged.
///
/// # Errors
///
/// 403 for other users' bookings, 404 for an unknown booking.
pub async fn cancel_booking(
    State(state): State<AppState>,
    session: SessionUser,
    ApiPath(id): ApiPath<BookingId>,
) -> WebResult<ApiJson<Booking>> {
    Ok(ApiJson(state.bookings.cancel(&session.caller, id).await?))
}

/// Confirm a pending booking.
///
/// # Errors
///
/// 400 when the booking is not pending, 403 for non-admins, 404 for an
/// unknown booking.
pub async fn confirm_booking(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiPath(id): ApiPath<BookingId>,
) -> WebResult<ApiJson<Booking>> {
    Ok(ApiJson(state.bookings.confirm(&admin.caller, id).await?))
}

/// Bookings on a venue, optionally within `[start_date, end_date]`.
///
/// # Errors
///
/// 400 for unparseable or inverted dates, 403 for non-admins, 404 for an
/// unknown venue.
pub async fn list_venue_bookings(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiPath(venue_id): ApiPath<VenueId>,
    ApiQuery(query): ApiQuery<VenueBookingsQuery>,
) -> WebResult<ApiJson<Vec<Booking>>> {
    let from = parse_optional_timestamp("start_date", query.start_date.as_deref())?;
    let to = parse_optional_timestamp("end_date", query.end_date.as_deref())?;
    let pagination = PageQuery {
        skip: query.skip,
        limit: query.limit,
    }
    .pagination();

    let page = state
        .bookings
        .list_for_venue(&admin.caller, venue_id, from, to, pagination)
        .await?;
    Ok(ApiJson(page.items))
}
