//! Authentication for the venue booking service.
//!
//! - [`password`]: Argon2id hashing of account passwords
//! - [`tokens`]: opaque bearer tokens and their keyed storage hashes
//! - [`middleware`]: the [`SessionUser`] and [`RequireAdmin`] extractors

pub mod middleware;
pub mod password;
pub mod tokens;

pub use middleware::{BearerToken, RequireAdmin, SessionUser};
pub use password::PasswordHasher;
pub use tokens::{IssuedToken, TokenIssuer};
