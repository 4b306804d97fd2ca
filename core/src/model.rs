//! Domain records: venues, bookings, users and sessions.
//!
//! Money is carried as [`Decimal`] and crosses every serialization boundary
//! as an exact string (`"1500.00"`), never as a float.

use crate::error::{DomainError, Result};
use crate::ids::{BookingId, UserId, VenueId};
use crate::slot::TimeSlot;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Booking status
// ============================================================================

/// Where a booking is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Created, awaiting admin confirmation
    Pending,
    /// Confirmed by an administrator
    Confirmed,
    /// Cancelled by the owner or an administrator (terminal)
    Cancelled,
}

impl BookingStatus {
    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Active bookings hold their time slot; cancelled ones release it.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::Validation(format!(
                "unknown booking status '{other}'"
            ))),
        }
    }
}

// ============================================================================
// Venue
// ============================================================================

/// A bookable venue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    /// Venue identifier
    pub id: VenueId,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Street address
    pub address: String,
    /// City, used for search
    pub city: String,
    /// Postal code
    pub postal_code: Option<String>,
    /// Maximum number of attendees
    pub capacity: i32,
    /// Price per started hour
    #[serde(with = "rust_decimal::serde::str")]
    pub hourly_rate: Decimal,
    /// Free-form amenities list
    pub amenities: Option<String>,
    /// Picture of the venue
    pub image_url: Option<String>,
    /// Contact email
    pub contact_email: Option<String>,
    /// Contact phone number
    pub contact_phone: Option<String>,
    /// Soft-delete flag; inactive venues are hidden from listings
    pub is_active: bool,
    /// When the venue was created
    pub created_at: DateTime<Utc>,
    /// When the venue was last modified
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating a venue.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewVenue {
    /// Display name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// Postal code
    #[serde(default)]
    pub postal_code: Option<String>,
    /// Maximum number of attendees
    pub capacity: i32,
    /// Price per started hour
    #[serde(with = "rust_decimal::serde::str")]
    pub hourly_rate: Decimal,
    /// Free-form amenities list
    #[serde(default)]
    pub amenities: Option<String>,
    /// Picture of the venue
    #[serde(default)]
    pub image_url: Option<String>,
    /// Contact email
    #[serde(default)]
    pub contact_email: Option<String>,
    /// Contact phone number
    #[serde(default)]
    pub contact_phone: Option<String>,
}

impl NewVenue {
    /// Check field-level constraints.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("address", &self.address)?;
        require_text("city", &self.city)?;
        validate_capacity(self.capacity)?;
        validate_rate(self.hourly_rate)
    }

    /// Materialize the venue as a new active record.
    #[must_use]
    pub fn into_venue(self, id: VenueId, now: DateTime<Utc>) -> Venue {
        Venue {
            id,
            name: self.name,
            description: self.description,
            address: self.address,
            city: self.city,
            postal_code: self.postal_code,
            capacity: self.capacity,
            hourly_rate: self.hourly_rate,
            amenities: self.amenities,
            image_url: self.image_url,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            is_active: true,
            created_at: now,
            updated_at: None,
        }
    }
}

/// Partial venue update; absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VenuePatch {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New address
    pub address: Option<String>,
    /// New city
    pub city: Option<String>,
    /// New postal code
    pub postal_code: Option<String>,
    /// New capacity
    pub capacity: Option<i32>,
    /// New hourly rate (existing bookings keep their cost)
    #[serde(with = "rust_decimal::serde::str_option")]
    pub hourly_rate: Option<Decimal>,
    /// New amenities
    pub amenities: Option<String>,
    /// New image URL
    pub image_url: Option<String>,
    /// New contact email
    pub contact_email: Option<String>,
    /// New contact phone
    pub contact_phone: Option<String>,
    /// Re-activate or deactivate
    pub is_active: Option<bool>,
}

impl VenuePatch {
    /// Check the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(address) = &self.address {
            require_text("address", address)?;
        }
        if let Some(city) = &self.city {
            require_text("city", city)?;
        }
        if let Some(capacity) = self.capacity {
            validate_capacity(capacity)?;
        }
        if let Some(rate) = self.hourly_rate {
            validate_rate(rate)?;
        }
        Ok(())
    }

    /// Copy every present field onto `venue` and stamp `updated_at`.
    pub fn apply_to(self, venue: &mut Venue, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            venue.name = name;
        }
        if let Some(address) = self.address {
            venue.address = address;
        }
        if let Some(city) = self.city {
            venue.city = city;
        }
        if let Some(capacity) = self.capacity {
            venue.capacity = capacity;
        }
        if let Some(rate) = self.hourly_rate {
            venue.hourly_rate = rate;
        }
        if let Some(is_active) = self.is_active {
            venue.is_active = is_active;
        }
        venue.description = self.description.or(venue.description.take());
        venue.postal_code = self.postal_code.or(venue.postal_code.take());
        venue.amenities = self.amenities.or(venue.amenities.take());
        venue.image_url = self.image_url.or(venue.image_url.take());
        venue.contact_email = self.contact_email.or(venue.contact_email.take());
        venue.contact_phone = self.contact_phone.or(venue.contact_phone.take());
        venue.updated_at = Some(now);
    }
}

/// Search criteria for venue listings. All present criteria must match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VenueFilter {
    /// Case-insensitive substring of the city
    pub city: Option<String>,
    /// Minimum capacity (inclusive)
    pub min_capacity: Option<i32>,
    /// Maximum capacity (inclusive)
    pub max_capacity: Option<i32>,
    /// Minimum hourly rate (inclusive)
    pub min_rate: Option<Decimal>,
    /// Maximum hourly rate (inclusive)
    pub max_rate: Option<Decimal>,
}

impl VenueFilter {
    /// Whether `venue` is listed under this filter. Inactive venues never are.
    #[must_use]
    pub fn matches(&self, venue: &Venue) -> bool {
        if !venue.is_active {
            return false;
        }
        if let Some(city) = &self.city {
            if !venue.city.to_lowercase().contains(&city.to_lowercase()) {
                return false;
            }
        }
        self.min_capacity.is_none_or(|min| venue.capacity >= min)
            && self.max_capacity.is_none_or(|max| venue.capacity <= max)
            && self.min_rate.is_none_or(|min| venue.hourly_rate >= min)
            && self.max_rate.is_none_or(|max| venue.hourly_rate <= max)
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn validate_capacity(capacity: i32) -> Result<()> {
    if capacity <= 0 {
        return Err(DomainError::Validation(
            "capacity must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

fn validate_rate(rate: Decimal) -> Result<()> {
    if rate <= Decimal::ZERO {
        return Err(DomainError::Validation(
            "hourly_rate must be positive".to_string(),
        ));
    }
    if rate.normalize().scale() > 2 {
        return Err(DomainError::Validation(
            "hourly_rate must have at most two decimal places".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// Booking
// ============================================================================

/// A reservation of a venue for a time slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier
    pub id: BookingId,
    /// Reserved venue
    pub venue_id: VenueId,
    /// Owner of the booking
    pub user_id: UserId,
    /// Inclusive start
    pub start_datetime: DateTime<Utc>,
    /// Exclusive end
    pub end_datetime: DateTime<Utc>,
    /// Cost computed when the slot was last set
    #[serde(with = "rust_decimal::serde::str")]
    pub total_cost: Decimal,
    /// Lifecycle status
    pub status: BookingStatus,
    /// What the venue is booked for
    pub purpose: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the booking was created
    pub created_at: DateTime<Utc>,
    /// When the booking was last modified
    pub updated_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// A freshly created booking, always `pending`.
    #[must_use]
    pub fn pending(
        venue_id: VenueId,
        user_id: UserId,
        slot: TimeSlot,
        total_cost: Decimal,
        purpose: Option<String>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BookingId::new(),
            venue_id,
            user_id,
            start_datetime: slot.start(),
            end_datetime: slot.end(),
            total_cost,
            status: BookingStatus::Pending,
            purpose,
            notes,
            created_at: now,
            updated_at: None,
        }
    }

    /// The booked interval.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidInterval`] if the stored record was
    /// corrupted so that end no longer follows start.
    pub fn slot(&self) -> Result<TimeSlot> {
        TimeSlot::new(self.start_datetime, self.end_datetime)
    }

    /// Move the booking to a new slot with its recomputed cost.
    pub fn reschedule(&mut self, slot: TimeSlot, total_cost: Decimal) {
        self.start_datetime = slot.start();
        self.end_datetime = slot.end();
        self.total_cost = total_cost;
    }

    /// Whether the booking is pending or confirmed.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Partial booking update.
///
/// Changing either end of the interval re-runs the availability check and
/// recomputes the cost; `status` is routed through the lifecycle rules.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BookingPatch {
    /// New start
    #[serde(deserialize_with = "crate::timestamp::deserialize_option")]
    pub start_datetime: Option<DateTime<Utc>>,
    /// New end
    #[serde(deserialize_with = "crate::timestamp::deserialize_option")]
    pub end_datetime: Option<DateTime<Utc>>,
    /// New purpose
    pub purpose: Option<String>,
    /// New notes
    pub notes: Option<String>,
    /// Requested status
    pub status: Option<BookingStatus>,
}

impl BookingPatch {
    /// Whether the patch touches the interval.
    #[must_use]
    pub const fn changes_slot(&self) -> bool {
        self.start_datetime.is_some() || self.end_datetime.is_some()
    }
}

// ============================================================================
// Users and sessions
// ============================================================================

/// A registered account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: UserId,
    /// Login email, unique
    pub email: String,
    /// Argon2id PHC string; never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Phone number
    pub phone: Option<String>,
    /// Company name
    pub company: Option<String>,
    /// Deactivated accounts cannot log in
    pub is_active: bool,
    /// Administrators bypass ownership checks
    pub is_admin: bool,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// When the profile was last modified
    pub updated_at: Option<DateTime<Utc>>,
}

/// Profile fields a user may change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    /// New given name
    pub first_name: Option<String>,
    /// New family name
    pub last_name: Option<String>,
    /// New phone number
    pub phone: Option<String>,
    /// New company
    pub company: Option<String>,
}

impl UserPatch {
    /// Copy every present field onto `user`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] if a name is set to blank.
    pub fn apply_to(self, user: &mut User, now: DateTime<Utc>) -> Result<()> {
        if let Some(first) = self.first_name {
            require_text("first_name", &first)?;
            user.first_name = first;
        }
        if let Some(last) = self.last_name {
            require_text("last_name", &last)?;
            user.last_name = last;
        }
        user.phone = self.phone.or(user.phone.take());
        user.company = self.company.or(user.company.take());
        user.updated_at = Some(now);
        Ok(())
    }
}

/// A login session, addressed by the hash of its bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Hex-encoded keyed SHA-256 of the bearer token
    pub token_hash: String,
    /// Account the session belongs to
    pub user_id: UserId,
    /// When the session was issued
    pub created_at: DateTime<Utc>,
    /// When the session stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is past its expiry at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
