//! Startup wiring: database, services, admin seed and background tasks.

use crate::auth::{PasswordHasher, TokenIssuer};
use crate::config::Config;
use crate::server::{AppState, Repositories};
use std::sync::Arc;
use std::time::Duration;
use venue_booking_core::{DomainError, SystemClock};
use venue_booking_postgres::{
    PostgresBookingRepository, PostgresReadiness, PostgresSessionRepository,
    PostgresUserRepository, PostgresVenueRepository, SetupError,
};

/// Failure while bringing the service up.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Database connection or migration failed
    #[error(transparent)]
    Database(#[from] SetupError),

    /// The administrator account could not be seeded
    #[error("failed to seed administrator: {0}")]
    AdminSeed(#[from] DomainError),
}

/// Connect to `PostgreSQL`, apply migrations and build the application
/// state. Seeds the configured administrator.
///
/// # Errors
///
/// Returns [`BootstrapError`] if the database is unreachable, a migration
/// fails or the administrator cannot be created.
pub async fn bootstrap(config: &Config) -> Result<AppState, BootstrapError> {
    let pool = venue_booking_postgres::connect(&config.database.pool_settings()).await?;
    if config.database.run_migrations {
        venue_booking_postgres::migrate(&pool).await?;
    }

    let repos = Repositories {
        venues: Arc::new(PostgresVenueRepository::new(pool.clone())),
        bookings: Arc::new(PostgresBookingRepository::new(pool.clone())),
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        sessions: Arc::new(PostgresSessionRepository::new(pool.clone())),
        readiness: Arc::new(PostgresReadiness::new(pool)),
    };
    let state = AppState::new(
        repos,
        Arc::new(SystemClock),
        PasswordHasher::default(),
        TokenIssuer::new(config.auth.token_secret.clone(), config.auth.token_ttl()),
    );

    if let (Some(email), Some(password)) = (&config.auth.admin_email, &config.auth.admin_password)
    {
        let created = state.users.ensure_admin(email, password).await?;
        tracing::info!(%email, created, "Administrator account checked");
    }

    Ok(state)
}

/// Periodically delete expired sessions. Runs until the runtime shuts down.
pub fn spawn_session_purge(state: &AppState, every: Duration) -> tokio::task::JoinHandle<()> {
    let users = Arc::clone(&state.users);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match users.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "Expired sessions purged"),
                Err(error) => tracing::warn!(%error, "Session purge failed"),
            }
        }
    })
}
