//! Opaque bearer tokens.
//!
//! A token is 256 random bits, base64url encoded (43 characters). Only a
//! keyed SHA-256 of it is stored, so a leaked sessions table cannot be
//! replayed without the server secret.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use venue_booking_core::{Session, UserId};

/// A freshly issued token and the session stored for it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Token handed to the client; never persisted
    pub token: String,
    /// Session record keyed by the token hash
    pub session: Session,
}

/// Issues tokens and derives their storage hashes.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenIssuer {
    /// Create an issuer keyed with `secret` whose tokens live for `ttl`.
    #[must_use]
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Token lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id`, valid from `now` for the configured TTL.
    #[must_use]
    pub fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> IssuedToken {
        let token = generate_token();
        let session = Session {
            token_hash: self.hash(&token),
            user_id,
            created_at: now,
            expires_at: now + self.ttl,
        };
        IssuedToken { token, session }
    }

    /// Lowercase hex of `SHA-256(secret || token)`.
    #[must_use]
    pub fn hash(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(token.as_bytes());
        hasher
            .finalize()
            .iter()
            .fold(String::with_capacity(64), |mut out, byte| {
                let _ = write!(out, "{byte:02x}");
                out
            })
    }
}

fn generate_token() -> String {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
}
