//! Accounts and sessions: registration, login, token resolution and
//! profile management.

use crate::auth::password::{PasswordHasher, validate_password};
use crate::auth::tokens::{IssuedToken, TokenIssuer};
use crate::metrics;
use serde::Deserialize;
use std::sync::Arc;
use venue_booking_core::repository::{SessionRepository, UserRepository};
use venue_booking_core::{
    Caller, Clock, DomainError, Page, Pagination, Result, User, UserId, UserPatch,
};

/// Sign-up payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    /// Login email
    pub email: String,
    /// Plain-text password, hashed before storage
    pub password: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Company name
    #[serde(default)]
    pub company: Option<String>,
}

/// Account and session operations.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    clock: Arc<dyn Clock>,
}

impl UserService {
    /// Create a user service.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            tokens,
            clock,
        }
    }

    /// Token issuer in use (exposes the TTL to handlers).
    #[must_use]
    pub const fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Create a regular, active account.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for a malformed email, blank
    /// names or a short password, and [`DomainError::EmailTaken`] for a
    /// duplicate email.
    pub async fn register(&self, registration: Registration) -> Result<User> {
        let user = self.build_user(registration, false)?;
        let user = self.users.insert(&user).await?;
        metrics::record_user_registered();
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Create the configured administrator unless the email already exists.
    /// Returns `true` when an account was created.
    ///
    /// # Errors
    ///
    /// Same as [`UserService::register`], except a duplicate is not an error.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<bool> {
        if self.users.get_by_email(email.trim()).await?.is_some() {
            return Ok(false);
        }
        let user = self.build_user(
            Registration {
                email: email.to_string(),
                password: password.to_string(),
                first_name: "Admin".to_string(),
                last_name: "User".to_string(),
                phone: None,
                company: None,
            },
            true,
        )?;
        match self.users.insert(&user).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Administrator account seeded");
                Ok(true)
            }
            Err(DomainError::EmailTaken(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Check credentials. Unknown email, wrong password and deactivated
    /// accounts are indistinguishable to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidCredentials`].
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let user = self.users.get_by_email(email.trim()).await?;
        match user {
            Some(user) if user.is_active && self.hasher.verify(password, &user.password_hash) => {
                Ok(user)
            }
            _ => Err(DomainError::InvalidCredentials),
        }
    }

    /// Authenticate and open a session.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidCredentials`] or a storage error.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken> {
        let user = match self.authenticate(email, password).await {
            Ok(user) => user,
            Err(err) => {
                metrics::record_login(false);
                tracing::warn!("Login failed");
                return Err(err);
            }
        };

        let issued = self.tokens.issue(user.id, self.clock.now());
        self.sessions.insert(&issued.session).await?;
        metrics::record_login(true);
        tracing::info!(user_id = %user.id, expires_at = %issued.session.expires_at, "Session opened");
        Ok(issued)
    }

    /// Resolve a bearer token to its active user.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Unauthenticated`] for unknown or expired
    /// tokens and for deactivated or deleted accounts.
    pub async fn resolve_token(&self, token: &str) -> Result<User> {
        let hash = self.tokens.hash(token);
        let session = self
            .sessions
            .find(&hash)
            .await?
            .ok_or_else(|| DomainError::Unauthenticated("invalid token".to_string()))?;

        if session.is_expired(self.clock.now()) {
            self.sessions.delete(&hash).await?;
            return Err(DomainError::Unauthenticated("token expired".to_string()));
        }

        match self.users.get(session.user_id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(DomainError::Unauthenticated("inactive user".to_string())),
        }
    }

    /// Revoke the session behind `token`.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.sessions.delete(&self.tokens.hash(token)).await?;
        tracing::info!("Session closed");
        Ok(())
    }

    /// Every account (admin only).
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Forbidden`] for non-admins.
    pub async fn list(&self, caller: &Caller, pagination: Pagination) -> Result<Page<User>> {
        caller.ensure_admin()?;
        self.users.list(pagination.normalized()).await
    }

    /// An account the caller owns, or any account for admins.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] or [`DomainError::Forbidden`].
    pub async fn get(&self, caller: &Caller, id: UserId) -> Result<User> {
        let user = self.load(id).await?;
        caller.ensure_owner_or_admin(user.id)?;
        Ok(user)
    }

    /// Update profile fields.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`], [`DomainError::Forbidden`] or
    /// [`DomainError::Validation`].
    pub async fn update(&self, caller: &Caller, id: UserId, patch: UserPatch) -> Result<User> {
        let mut user = self.get(caller, id).await?;
        patch.apply_to(&mut user, self.clock.now())?;
        let user = self.users.update(&user).await?;
        tracing::info!(user_id = %id, "User profile updated");
        Ok(user)
    }

    /// Deactivate an account and revoke its sessions (admin only).
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Forbidden`] or [`DomainError::NotFound`].
    pub async fn deactivate(&self, caller: &Caller, id: UserId) -> Result<User> {
        caller.ensure_admin()?;
        let mut user = self.load(id).await?;
        user.is_active = false;
        user.updated_at = Some(self.clock.now());
        let user = self.users.update(&user).await?;
        let revoked = self.sessions.delete_for_user(id).await?;
        tracing::info!(user_id = %id, revoked, "User deactivated");
        Ok(user)
    }

    /// Drop sessions that have expired.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        self.sessions.delete_expired(self.clock.now()).await
    }

    async fn load(&self, id: UserId) -> Result<User> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    fn build_user(&self, registration: Registration, is_admin: bool) -> Result<User> {
        let email = registration.email.trim().to_string();
        if !is_valid_email(&email) {
            return Err(DomainError::Validation(format!(
                "'{email}' is not a valid email address"
            )));
        }
        for (field, value) in [
            ("first_name", &registration.first_name),
            ("last_name", &registration.last_name),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::Validation(format!("{field} must not be empty")));
            }
        }
        validate_password(&registration.password)?;

        Ok(User {
            id: UserId::new(),
            email,
            password_hash: self.hasher.hash(&registration.password)?,
            first_name: registration.first_name,
            last_name: registration.last_name,
            phone: registration.phone,
            company: registration.company,
            is_active: true,
            is_admin,
            created_at: self.clock.now(),
            updated_at: None,
        })
    }
}

/// Basic address shape: one `@`, non-empty local part, dotted domain with
/// no empty labels.
fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return false;
    }

    let valid_local = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    local.chars().all(valid_local)
        && domain.chars().all(valid_domain)
        && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use argon2::Params;
    use chrono::Duration;
    use venue_booking_testing::{
        FixedClock, InMemorySessionRepository, InMemoryUserRepository, fixtures, test_clock,
    };

    struct Harness {
        service: UserService,
        sessions: InMemorySessionRepository,
        clock: FixedClock,
    }

    fn harness(users: InMemoryUserRepository) -> Harness {
        let sessions = InMemorySessionRepository::new();
        let clock = test_clock();
        let service = UserService::new(
            Arc::new(users),
            Arc::new(sessions.clone()),
            PasswordHasher::with_params(Params::new(8, 1, 1, None).unwrap()),
            TokenIssuer::new("test-secret", Duration::minutes(30)),
            Arc::new(clock.clone()),
        );
        Harness {
            service,
            sessions,
            clock,
        }
    }

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.to_string(),
            password: "s3cure-pass".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            company: None,
        }
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user+tag@sub.example.com"));
        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("user@example..com"));
    }

    #[tokio::test]
    async fn test_register_validates_and_rejects_duplicates() {
        let h = harness(InMemoryUserRepository::new());

        let mut short = registration("ada@example.com");
        short.password = "short".to_string();
        assert!(matches!(
            h.service.register(short).await,
            Err(DomainError::Validation(_))
        ));

        let user = h.service.register(registration("ada@example.com")).await.unwrap();
        assert!(!user.is_admin);
        assert!(user.password_hash.starts_with("$argon2id$"));

        let err = h
            .service
            .register(registration("ADA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EmailTaken(_)));
    }

    #[tokio::test]
    async fn test_login_resolve_logout() {
        let h = harness(InMemoryUserRepository::new());
        let user = h.service.register(registration("ada@example.com")).await.unwrap();

        assert_eq!(
            h.service.login("ada@example.com", "wrong-pass").await.unwrap_err(),
            DomainError::InvalidCredentials
        );

        let issued = h.service.login("ada@example.com", "s3cure-pass").await.unwrap();
        assert_eq!(h.service.resolve_token(&issued.token).await.unwrap().id, user.id);

        h.service.logout(&issued.token).await.unwrap();
        assert!(matches!(
            h.service.resolve_token(&issued.token).await,
            Err(DomainError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected_and_removed() {
        let h = harness(InMemoryUserRepository::new());
        h.service.register(registration("ada@example.com")).await.unwrap();
        let issued = h.service.login("ada@example.com", "s3cure-pass").await.unwrap();

        h.clock.advance(Duration::minutes(30));
        assert!(matches!(
            h.service.resolve_token(&issued.token).await,
            Err(DomainError::Unauthenticated(_))
        ));
        assert!(h.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_deactivation_revokes_sessions_and_blocks_login() {
        let admin = fixtures::admin("root@example.com");
        let h = harness(InMemoryUserRepository::with_users([admin.clone()]));
        let user = h.service.register(registration("ada@example.com")).await.unwrap();
        let issued = h.service.login("ada@example.com", "s3cure-pass").await.unwrap();

        let err = h
            .service
            .deactivate(&Caller::from(&user), user.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        h.service.deactivate(&Caller::from(&admin), user.id).await.unwrap();
        assert!(h.sessions.is_empty());
        assert!(h.service.resolve_token(&issued.token).await.is_err());
        assert_eq!(
            h.service.login("ada@example.com", "s3cure-pass").await.unwrap_err(),
            DomainError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_profile_access_is_owner_or_admin() {
        let h = harness(InMemoryUserRepository::new());
        let ada = h.service.register(registration("ada@example.com")).await.unwrap();
        let bob = h.service.register(registration("bob@example.com")).await.unwrap();

        let err = h.service.get(&Caller::from(&bob), ada.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let patch = UserPatch {
            company: Some("Analytical Engines".to_string()),
            ..UserPatch::default()
        };
        let updated = h.service.update(&Caller::from(&ada), ada.id, patch).await.unwrap();
        assert_eq!(updated.company.as_deref(), Some("Analytical Engines"));
    }

    #[tokio::test]
    async fn test_admin_seed_is_idempotent() {
        let h = harness(InMemoryUserRepository::new());
        assert!(h.service.ensure_admin("root@example.com", "rootpass1").await.unwrap());
        assert!(!h.service.ensure_admin("root@example.com", "rootpass1").await.unwrap());

        let issued = h.service.login("root@example.com", "rootpass1").await.unwrap();
        let admin = h.service.resolve_token(&issued.token).await.unwrap();
        assert!(admin.is_admin);
    }
}
