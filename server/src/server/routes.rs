//! Router configuration for the venue booking service.
//!
//! Builds the complete Axum router with all endpoints.

use super::state::AppState;
use crate::api::{self, auth, bookings, users, venues};
use crate::config::Config;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use venue_booking_web::correlation_id_layer;
use venue_booking_web::handlers::{health_check, readiness_check};

/// Build the complete Axum router.
///
/// Configures:
/// - Health checks at the root (`/health`, `/ready`)
/// - Authentication, user, venue and booking endpoints under the API prefix
/// - Correlation ids, HTTP tracing and CORS
pub fn build_router(state: AppState, config: &Config) -> Router {
    let api_routes = Router::new()
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/token", post(auth::token))
        .route("/auth/logout", post(auth::logout))
        // Users
        .route("/users/me", get(users::read_current_user))
        .route("/users", get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // Venues
        .route("/venues", get(venues::list_venues).post(venues::create_venue))
        .route("/venues/city/:city", get(venues::list_venues_by_city))
        .route(
            "/venues/:id",
            get(venues::get_venue)
                .put(venues::update_venue)
                .delete(venues::delete_venue),
        )
        .route("/venues/:id/availability", get(venues::check_availability))
        // Bookings
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/bookings/venue/:venue_id",
            get(bookings::list_venue_bookings),
        )
        .route(
            "/bookings/:id",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::cancel_booking),
        )
        .route("/bookings/:id/confirm", post(bookings::confirm_booking));

    let prefix = config.server.api_prefix.trim_end_matches('/').to_string();
    let banner_prefix = prefix.clone();

    let router = Router::new()
        .route("/", get(move || api::root(banner_prefix.clone())))
        // Health checks (no authentication)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check));
    let router = if prefix.is_empty() {
        router.merge(api_routes)
    } else {
        router.nest(&prefix, api_routes)
    };

    router
        .with_state(state)
        .layer(correlation_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if config.cors.origins.is_empty() {
        if config.is_production() {
            tracing::warn!("No CORS origins configured; cross-origin requests will be refused");
            return layer;
        }
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors
        .origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring unusable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}
