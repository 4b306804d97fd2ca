//! Authentication extractors.
//!
//! Provides Axum extractors for:
//! - Bearer token extraction from the `Authorization` header
//! - Session validation (resolves the token to an active user)
//! - Role-based access control (admin checks)
//!
//! # Usage
//!
//! ```rust,ignore
//! use venue_booking::auth::{RequireAdmin, SessionUser};
//!
//! // Require authentication
//! async fn list_bookings(session: SessionUser, ...) -> Result<ApiJson<BookingList>, AppError> {
//!     // session.caller identifies an active user
//! }
//!
//! // Require admin role
//! async fn create_venue(admin: RequireAdmin, ...) -> Result<ApiJson<Venue>, AppError> {
//!     // admin.caller.is_admin is true
//! }
//! ```

use crate::server::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use venue_booking_core::{Caller, User};
use venue_booking_web::AppError;

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let (scheme, token) = auth_header.split_once(' ').ok_or_else(|| {
            AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
        })?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AppError::unauthorized(
                "Invalid authorization format. Expected 'Bearer <token>'",
            ));
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token.to_string()))
    }
}

/// Authenticated session user.
///
/// Resolves the bearer token to an active account. Use this as a handler
/// parameter to require authentication.
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// The authenticated account
    pub user: User,
    /// Identity and role for service calls
    pub caller: Caller,
    /// The presented token (needed to log out)
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let user = state.users.resolve_token(&token).await?;
        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        Ok(Self {
            caller: Caller::from(&user),
            user,
            token,
        })
    }
}

/// Require admin role.
///
/// Validates that the authenticated user has admin privileges.
/// Returns 403 Forbidden if the user is not an admin.
#[derive(Debug, Clone)]
pub struct RequireAdmin {
    /// The authenticated administrator
    pub user: User,
    /// Identity and role for service calls
    pub caller: Caller,
}

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = SessionUser::from_request_parts(parts, state).await?;
        if !session.caller.is_admin {
            tracing::warn!(user_id = %session.user.id, "Admin route refused");
            return Err(AppError::forbidden("The user doesn't have enough privileges"));
        }

        Ok(Self {
            user: session.user,
            caller: session.caller,
        })
    }
}
