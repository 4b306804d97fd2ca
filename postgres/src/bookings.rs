//! Booking repository.
//!
//! Every write that places a booking on a slot runs in one transaction:
//!
//! 1. `SELECT ... FROM venues WHERE id = $1 FOR UPDATE` serializes writers
//!    on the same venue (writers on other venues proceed in parallel)
//! 2. The overlap query runs against the committed bookings
//! 3. The insert or update is written
//!
//! The `bookings_no_overlap` exclusion constraint rejects anything that
//! slips past (rows written outside this repository, for instance), and its
//! SQLSTATE is reported as `Unavailable` too.

use crate::{is_exclusion_violation, is_foreign_key_violation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use venue_booking_core::repository::BookingRepository;
use venue_booking_core::{
    Booking, BookingId, BookingStatus, DomainError, Page, Pagination, Result, TimeSlot, UserId,
    VenueId,
};

const BOOKING_COLUMNS: &str = "id, venue_id, user_id, start_datetime, end_datetime, total_cost, \
     status, purpose, notes, created_at, updated_at";

const CONFLICT_QUERY: &str = r"
    SELECT EXISTS (
        SELECT 1 FROM bookings
        WHERE venue_id = $1
          AND status IN ('pending', 'confirmed')
          AND start_datetime < $3
          AND end_datetime > $2
          AND ($4::uuid IS NULL OR id <> $4)
    )
";

#[derive(FromRow)]
struct BookingRow {
    id: Uuid,
    venue_id: Uuid,
    user_id: Uuid,
    start_datetime: DateTime<Utc>,
    end_datetime: DateTime<Utc>,
    total_cost: Decimal,
    status: String,
    purpose: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = DomainError;

    fn try_from(row: BookingRow) -> Result<Self> {
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            venue_id: VenueId::from_uuid(row.venue_id),
            user_id: UserId::from_uuid(row.user_id),
            start_datetime: row.start_datetime,
            end_datetime: row.end_datetime,
            total_cost: row.total_cost,
            status: row
                .status
                .parse()
                .map_err(|e| DomainError::storage("Corrupt booking status", e))?,
            purpose: row.purpose,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_page(rows: Vec<BookingRow>, total: i64) -> Result<Page<Booking>> {
    Ok(Page {
        items: rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>>>()?,
        total: u64::try_from(total).unwrap_or_default(),
    })
}

/// Map a write failure, recognizing the overlap constraint.
fn write_error(context: &str, venue_id: VenueId, err: &sqlx::Error) -> DomainError {
    if is_exclusion_violation(err) {
        metrics::counter!("booking_store_exclusion_violations_total").increment(1);
        tracing::warn!(%venue_id, "Overlap rejected by exclusion constraint");
        return DomainError::Unavailable { venue_id };
    }
    if is_foreign_key_violation(err) {
        return DomainError::Validation(format!("{context}: referenced venue or user missing"));
    }
    DomainError::storage(context, err)
}

/// `PostgreSQL` booking repository.
#[derive(Clone)]
pub struct PostgresBookingRepository {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresBookingRepository {
    /// Create a new `PostgreSQL` booking repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Take the venue row lock for the rest of the transaction.
    async fn lock_venue(conn: &mut PgConnection, venue_id: VenueId) -> Result<()> {
        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM venues WHERE id = $1 FOR UPDATE")
                .bind(*venue_id.as_uuid())
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| DomainError::storage("Failed to lock venue", e))?;
        locked
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("Venue", venue_id))
    }

    async fn has_conflict(
        conn: &mut PgConnection,
        venue_id: VenueId,
        slot: &TimeSlot,
        exclude: Option<BookingId>,
    ) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(CONFLICT_QUERY)
            .bind(*venue_id.as_uuid())
            .bind(slot.start())
            .bind(slot.end())
            .bind(exclude.map(|id| *id.as_uuid()))
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| DomainError::storage("Failed to check availability", e))?;
        Ok(exists)
    }

    /// Lock the venue and fail with `Unavailable` if `booking`'s slot is taken.
    async fn claim_slot(conn: &mut PgConnection, booking: &Booking) -> Result<()> {
        let slot = booking.slot()?;
        Self::lock_venue(conn, booking.venue_id).await?;
        if Self::has_conflict(conn, booking.venue_id, &slot, Some(booking.id)).await? {
            return Err(DomainError::Unavailable {
                venue_id: booking.venue_id,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::storage("Failed to get booking", e))?;
        row.map(Booking::try_from).transpose()
    }

    async fn list(&self, owner: Option<UserId>, pagination: Pagination) -> Result<Page<Booking>> {
        let owner = owner.map(|id| *id.as_uuid());

        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE ($1::uuid IS NULL OR user_id = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(owner)
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage("Failed to list bookings", e))?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE ($1::uuid IS NULL OR user_id = $1)")
                .bind(owner)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DomainError::storage("Failed to count bookings", e))?;

        into_page(rows, total)
    }

    async fn list_for_venue(
        &self,
        venue_id: VenueId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pagination: Pagination,
    ) -> Result<Page<Booking>> {
        const RANGE: &str = "venue_id = $1 \
             AND ($2::timestamptz IS NULL OR start_datetime >= $2) \
             AND ($3::timestamptz IS NULL OR end_datetime <= $3)";

        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE {RANGE} \
             ORDER BY start_datetime, id LIMIT $4 OFFSET $5"
        ))
        .bind(*venue_id.as_uuid())
        .bind(from)
        .bind(to)
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage("Failed to list venue bookings", e))?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM bookings WHERE {RANGE}"))
                .bind(*venue_id.as_uuid())
                .bind(from)
                .bind(to)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DomainError::storage("Failed to count venue bookings", e))?;

        into_page(rows, total)
    }

    async fn is_available(
        &self,
        venue_id: VenueId,
        slot: &TimeSlot,
        exclude: Option<BookingId>,
    ) -> Result<bool> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| DomainError::storage("Failed to acquire connection", e))?;
        let conflict = Self::has_conflict(&mut *conn, venue_id, slot, exclude).await?;
        Ok(!conflict)
    }

    async fn insert(&self, booking: &Booking) -> Result<Booking> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage("Failed to begin transaction", e))?;

        if booking.is_active() {
            Self::claim_slot(&mut *tx, booking).await?;
        }

        sqlx::query(
            r"
            INSERT INTO bookings (
                id, venue_id, user_id, start_datetime, end_datetime, total_cost, status,
                purpose, notes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(*booking.id.as_uuid())
        .bind(*booking.venue_id.as_uuid())
        .bind(*booking.user_id.as_uuid())
        .bind(booking.start_datetime)
        .bind(booking.end_datetime)
        .bind(booking.total_cost)
        .bind(booking.status.as_str())
        .bind(&booking.purpose)
        .bind(&booking.notes)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error("Failed to create booking", booking.venue_id, &e))?;

        tx.commit()
            .await
            .map_err(|e| write_error("Failed to commit booking", booking.venue_id, &e))?;

        tracing::debug!(booking_id = %booking.id, venue_id = %booking.venue_id, "Booking row inserted");
        Ok(booking.clone())
    }

    async fn update(
        &self,
        booking: &Booking,
        expected: BookingStatus,
        reschedule: bool,
    ) -> Result<Option<Booking>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage("Failed to begin transaction", e))?;

        if reschedule && booking.is_active() {
            Self::claim_slot(&mut *tx, booking).await?;
        }

        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "UPDATE bookings \
             SET start_datetime = $2, end_datetime = $3, total_cost = $4, status = $5, \
                 purpose = $6, notes = $7, updated_at = $8 \
             WHERE id = $1 AND status = $9 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(*booking.id.as_uuid())
        .bind(booking.start_datetime)
        .bind(booking.end_datetime)
        .bind(booking.total_cost)
        .bind(booking.status.as_str())
        .bind(&booking.purpose)
        .bind(&booking.notes)
        .bind(booking.updated_at)
        .bind(expected.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| write_error("Failed to update booking", booking.venue_id, &e))?;

        // Status moved (or the row is gone): drop the transaction unwritten
        let Some(row) = row else {
            return Ok(None);
        };

        tx.commit()
            .await
            .map_err(|e| write_error("Failed to commit booking update", booking.venue_id, &e))?;
        Booking::try_from(row).map(Some)
    }

    async fn transition_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "UPDATE bookings SET status = $3, updated_at = $4 \
             WHERE id = $1 AND status = $2 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage("Failed to change booking status", e))?;
        row.map(Booking::try_from).transpose()
    }
}
