//! User API endpoints.
//!
//! - GET /users/me - Current user
//! - GET /users - All users (admin)
//! - GET /users/:id - User details (self or admin)
//! - PUT /users/:id - Update profile (self or admin)
//! - DELETE /users/:id - Deactivate (admin)

use super::PageQuery;
use crate::auth::{RequireAdmin, SessionUser};
use crate::server::state::AppState;
use axum::extract::State;
use venue_booking_core::{User, UserId, UserPatch};
use venue_booking_web::{ApiJson, ApiPath, ApiQuery, WebResult};

/// The authenticated user.
#[allow(clippy::unused_async)]
pub async fn read_current_user(session: SessionUser) -> ApiJson<User> {
    ApiJson(session.user)
}

/// List accounts, oldest first.
///
/// # Errors
///
/// 403 for non-admins.
pub async fn list_users(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> WebResult<ApiJson<Vec<User>>> {
    let page = state.users.list(&admin.caller, query.pagination()).await?;
    Ok(ApiJson(page.items))
}

/// Account details.
///
/// # Errors
///
/// 403 for other users' accounts, 404 for an unknown user.
pub async fn get_user(
    State(state): State<AppState>,
    session: SessionUser,
    ApiPath(id): ApiPath<UserId>,
) -> WebResult<ApiJson<User>> {
    Ok(ApiJson(state.users.get(&session.caller, id).await?))
}

/// Update profile fields.
///
/// # Errors
///
/// 403 for other users' accounts, 404 for an unknown user, 422 for blank
/// names.
pub async fn update_user(
    State(state): State<AppState>,
    session: SessionUser,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> WebResult<ApiJson<User>> {
    Ok(ApiJson(state.users.update(&session.caller, id, patch).await?))
}

/// Deactivate an account and revoke its sessions.
///
/// # Errors
///
/// 403 for non-admins, 404 for an unknown user.
pub async fn delete_user(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
) -> WebResult<ApiJson<User>> {
    Ok(ApiJson(state.users.deactivate(&admin.caller, id).await?))
}
