//! Venue repository.

use crate::contains_pattern;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use venue_booking_core::repository::VenueRepository;
use venue_booking_core::{DomainError, Page, Pagination, Result, Venue, VenueFilter, VenueId};

const VENUE_COLUMNS: &str = "id, name, description, address, city, postal_code, capacity, \
     hourly_rate, amenities, image_url, contact_email, contact_phone, is_active, created_at, \
     updated_at";

/// Shared predicate for listing and counting: active venues, then every
/// filter that is bound to a non-null value.
const FILTER_CLAUSE: &str = "is_active \
     AND ($1::text IS NULL OR city ILIKE $1) \
     AND ($2::int IS NULL OR capacity >= $2) \
     AND ($3::int IS NULL OR capacity <= $3) \
     AND ($4::numeric IS NULL OR hourly_rate >= $4) \
     AND ($5::numeric IS NULL OR hourly_rate <= $5)";

#[derive(FromRow)]
struct VenueRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    address: String,
    city: String,
    postal_code: Option<String>,
    capacity: i32,
    hourly_rate: Decimal,
    amenities: Option<String>,
    image_url: Option<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<VenueRow> for Venue {
    fn from(row: VenueRow) -> Self {
        Self {
            id: VenueId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            address: row.address,
            city: row.city,
            postal_code: row.postal_code,
            capacity: row.capacity,
            hourly_rate: row.hourly_rate,
            amenities: row.amenities,
            image_url: row.image_url,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `PostgreSQL` venue repository.
#[derive(Clone)]
pub struct PostgresVenueRepository {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresVenueRepository {
    /// Create a new `PostgreSQL` venue repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VenueRepository for PostgresVenueRepository {
    async fn get(&self, id: VenueId) -> Result<Option<Venue>> {
        let row: Option<VenueRow> =
            sqlx::query_as(&format!("SELECT {VENUE_COLUMNS} FROM venues WHERE id = $1"))
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::storage("Failed to get venue", e))?;
        Ok(row.map(Venue::from))
    }

    async fn list(&self, filter: &VenueFilter, pagination: Pagination) -> Result<Page<Venue>> {
        let city = filter.city.as_deref().map(contains_pattern);

        let rows: Vec<VenueRow> = sqlx::query_as(&format!(
            "SELECT {VENUE_COLUMNS} FROM venues WHERE {FILTER_CLAUSE} \
             ORDER BY created_at, id LIMIT $6 OFFSET $7"
        ))
        .bind(city.as_deref())
        .bind(filter.min_capacity)
        .bind(filter.max_capacity)
        .bind(filter.min_rate)
        .bind(filter.max_rate)
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage("Failed to list venues", e))?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM venues WHERE {FILTER_CLAUSE}"))
                .bind(city.as_deref())
                .bind(filter.min_capacity)
                .bind(filter.max_capacity)
                .bind(filter.min_rate)
                .bind(filter.max_rate)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DomainError::storage("Failed to count venues", e))?;

        Ok(Page {
            items: rows.into_iter().map(Venue::from).collect(),
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn list_by_city(&self, city: &str) -> Result<Vec<Venue>> {
        let rows: Vec<VenueRow> = sqlx::query_as(&format!(
            "SELECT {VENUE_COLUMNS} FROM venues \
             WHERE is_active AND city ILIKE $1 ORDER BY created_at, id"
        ))
        .bind(contains_pattern(city))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage("Failed to list venues by city", e))?;
        Ok(rows.into_iter().map(Venue::from).collect())
    }

    async fn insert(&self, venue: &Venue) -> Result<Venue> {
        sqlx::query(
            r"
            INSERT INTO venues (
                id, name, description, address, city, postal_code, capacity, hourly_rate,
                amenities, image_url, contact_email, contact_phone, is_active, created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ",
        )
        .bind(*venue.id.as_uuid())
        .bind(&venue.name)
        .bind(&venue.description)
        .bind(&venue.address)
        .bind(&venue.city)
        .bind(&venue.postal_code)
        .bind(venue.capacity)
        .bind(venue.hourly_rate)
        .bind(&venue.amenities)
        .bind(&venue.image_url)
        .bind(&venue.contact_email)
        .bind(&venue.contact_phone)
        .bind(venue.is_active)
        .bind(venue.created_at)
        .bind(venue.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage("Failed to create venue", e))?;

        tracing::debug!(venue_id = %venue.id, "Venue row inserted");
        Ok(venue.clone())
    }

    async fn update(&self, venue: &Venue) -> Result<Venue> {
        let result = sqlx::query(
            r"
            UPDATE venues
            SET name = $2,
                description = $3,
                address = $4,
                city = $5,
                postal_code = $6,
                capacity = $7,
                hourly_rate = $8,
                amenities = $9,
                image_url = $10,
                contact_email = $11,
                contact_phone = $12,
                is_active = $13,
                updated_at = $14
            WHERE id = $1
            ",
        )
        .bind(*venue.id.as_uuid())
        .bind(&venue.name)
        .bind(&venue.description)
        .bind(&venue.address)
        .bind(&venue.city)
        .bind(&venue.postal_code)
        .bind(venue.capacity)
        .bind(venue.hourly_rate)
        .bind(&venue.amenities)
        .bind(&venue.image_url)
        .bind(&venue.contact_email)
        .bind(&venue.contact_phone)
        .bind(venue.is_active)
        .bind(venue.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage("Failed to update venue", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Venue", venue.id));
        }
        Ok(venue.clone())
    }
}
