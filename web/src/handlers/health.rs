//! Liveness and readiness endpoints.
//!
//! `/health` answers as long as the process serves requests; `/ready` also
//! round-trips to the backing store so load balancers stop routing traffic
//! to an instance that lost its database.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;
use venue_booking_core::repository::ReadinessProbe;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
}

/// Liveness check. Does not touch dependencies.
///
/// ```text
/// GET /health
/// {"status":"healthy","version":"0.1.0"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness
    pub ready: bool,
    /// Database connectivity
    pub database: bool,
}

/// Readiness check: 200 when the store answers, 503 otherwise.
pub async fn readiness_check(
    State(probe): State<Arc<dyn ReadinessProbe>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    match probe.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                database: true,
            }),
        ),
        Err(error) => {
            tracing::warn!(%error, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    ready: false,
                    database: false,
                }),
            )
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use venue_booking_core::DomainError;
    use venue_booking_testing::AlwaysReady;

    struct Down;

    #[async_trait]
    impl ReadinessProbe for Down {
        async fn ping(&self) -> venue_booking_core::Result<()> {
            Err(DomainError::Storage("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_health_reports_version() {
        let Json(body) = health_check().await;
        assert_eq!(body.status, "healthy");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_ready_when_probe_succeeds() {
        let probe: Arc<dyn ReadinessProbe> = Arc::new(AlwaysReady);
        let (status, Json(body)) = readiness_check(State(probe)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.ready);
    }

    #[tokio::test]
    async fn test_unavailable_when_probe_fails() {
        let probe: Arc<dyn ReadinessProbe> = Arc::new(Down);
        let (status, Json(body)) = readiness_check(State(probe)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body.database);
    }
}
