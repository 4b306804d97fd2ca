//! `PostgreSQL` storage for the venue booking service.
//!
//! This crate implements the repository traits from `venue-booking-core` on
//! top of a sqlx connection pool:
//!
//! - Venue, booking, user and session repositories
//! - Embedded migrations (`migrations/`)
//! - Double protection against overlapping bookings: a per-venue row lock
//!   around check-then-write, and a GiST exclusion constraint as backstop
//!
//! Queries are checked at runtime (`sqlx::query_as` with `FromRow` rows), so
//! building the crate needs no live database.
//!
//! # Example
//!
//! ```no_run
//! use venue_booking_postgres::{PoolSettings, PostgresVenueRepository, connect, migrate};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = connect(&PoolSettings::new("postgres://localhost/venues")).await?;
//! migrate(&pool).await?;
//! let venues = PostgresVenueRepository::new(pool);
//! # let _ = venues;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use venue_booking_core::DomainError;
use venue_booking_core::repository::ReadinessProbe;

mod bookings;
mod sessions;
mod users;
mod venues;

pub use bookings::PostgresBookingRepository;
pub use sessions::PostgresSessionRepository;
pub use users::PostgresUserRepository;
pub use venues::PostgresVenueRepository;

/// SQLSTATE raised by an exclusion constraint violation.
const EXCLUSION_VIOLATION: &str = "23P01";

/// Failure while setting up the database.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Could not open the connection pool
    #[error("failed to connect to database: {0}")]
    Connect(#[from] sqlx::Error),

    /// A migration failed to apply
    #[error("failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Connection pool parameters.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Connection string
    pub url: String,
    /// Upper bound on open connections
    pub max_connections: u32,
    /// Connections kept open when idle
    pub min_connections: u32,
    /// How long to wait for a connection
    pub connect_timeout: Duration,
    /// How long an idle connection is kept
    pub idle_timeout: Duration,
}

impl PoolSettings {
    /// Defaults for everything but the URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// Open a connection pool.
///
/// # Errors
///
/// Returns [`SetupError::Connect`] if the database is unreachable.
pub async fn connect(settings: &PoolSettings) -> Result<PgPool, SetupError> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.connect_timeout)
        .idle_timeout(Some(settings.idle_timeout))
        .connect(&settings.url)
        .await?;

    tracing::info!(
        max_connections = settings.max_connections,
        "Database connection pool established"
    );
    Ok(pool)
}

/// Apply the embedded migrations.
///
/// # Errors
///
/// Returns [`SetupError::Migrate`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), SetupError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// `/ready` probe backed by `SELECT 1`.
#[derive(Clone)]
pub struct PostgresReadiness {
    pool: PgPool,
}

impl PostgresReadiness {
    /// Create a probe on `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadinessProbe for PostgresReadiness {
    async fn ping(&self) -> venue_booking_core::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage("Readiness check failed", e))?;
        Ok(())
    }
}

/// Whether `err` came from the overlap exclusion constraint.
fn is_exclusion_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(EXCLUSION_VIOLATION))
}

/// Whether `err` is a unique-index violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Whether `err` is a foreign-key violation.
fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards in the needle
/// taken literally.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("paris"), "%paris%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_pool_defaults() {
        let settings = PoolSettings::new("postgres://localhost/db");
        assert_eq!(settings.max_connections, 10);
        assert_eq!(settings.idle_timeout, Duration::from_secs(600));
    }
}
