//! Authentication endpoints.
//!
//! - POST /auth/register - Create an account
//! - POST /auth/login - JSON credentials, returns a bearer token
//! - POST /auth/token - Form credentials (OAuth2 password flow), same response
//! - POST /auth/logout - Revoke the presented token

use crate::app::Registration;
use crate::auth::SessionUser;
use crate::auth::tokens::IssuedToken;
use crate::server::state::AppState;
use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::{Form, http::StatusCode};
use serde::{Deserialize, Serialize};
use venue_booking_core::User;
use venue_booking_web::{ApiJson, AppError, ClientIp, UserAgent, WebResult};

/// JSON login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Form login payload (`application/x-www-form-urlencoded`).
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    /// Account email
    pub username: String,
    /// Plain-text password
    pub password: String,
}

/// Issued access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Opaque bearer token
    pub access_token: String,
    /// Always `"bearer"`
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

impl TokenResponse {
    fn from_issued(issued: IssuedToken, state: &AppState) -> Self {
        Self {
            access_token: issued.token,
            token_type: "bearer".to_string(),
            expires_in: state.users.tokens().ttl().num_seconds(),
        }
    }
}

/// Create a regular account.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8000/api/v1/auth/register \
///   -H "Content-Type: application/json" \
///   -d '{"email":"ana@example.com","password":"s3cret-pass","first_name":"Ana","last_name":"Novak"}'
/// ```
///
/// # Errors
///
/// 409 for a taken email, 422 for invalid fields.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<Registration>,
) -> WebResult<ApiJson<User>> {
    Ok(ApiJson(state.users.register(registration).await?))
}

/// Exchange JSON credentials for a bearer token.
///
/// # Errors
///
/// 401 for bad credentials or a deactivated account.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    UserAgent(user_agent): UserAgent,
    ApiJson(request): ApiJson<LoginRequest>,
) -> WebResult<ApiJson<TokenResponse>> {
    tracing::debug!(%ip, %user_agent, "Login attempt");
    let issued = state.users.login(&request.email, &request.password).await?;
    Ok(ApiJson(TokenResponse::from_issued(issued, &state)))
}

/// Exchange form credentials for a bearer token.
///
/// # Errors
///
/// 401 for bad credentials, 422 for a malformed form.
pub async fn token(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    form: Result<Form<TokenForm>, FormRejection>,
) -> WebResult<ApiJson<TokenResponse>> {
    let Form(form) = form.map_err(|rejection| AppError::validation(rejection.body_text()))?;
    tracing::debug!(%ip, "Token request");
    let issued = state.users.login(&form.username, &form.password).await?;
    Ok(ApiJson(TokenResponse::from_issued(issued, &state)))
}

/// Revoke the presented token.
///
/// # Errors
///
/// 401 without a valid token.
pub async fn logout(
    State(state): State<AppState>,
    session: SessionUser,
) -> WebResult<StatusCode> {
    state.users.logout(&session.token).await?;
    Ok(StatusCode::NO_CONTENT)
}
