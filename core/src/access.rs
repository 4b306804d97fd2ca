//! Owner-or-admin capability gate.

use crate::error::{DomainError, Result};
use crate::ids::UserId;
use crate::model::User;

/// The authenticated identity behind a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller {
    /// Authenticated user
    pub user_id: UserId,
    /// Whether the user holds the admin role
    pub is_admin: bool,
}

impl Caller {
    /// A regular user.
    #[must_use]
    pub const fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    /// An administrator.
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    /// Whether this caller may read or write a resource owned by `owner`.
    #[must_use]
    pub fn can_access(&self, owner: UserId) -> bool {
        self.is_admin || self.user_id == owner
    }

    /// # Errors
    ///
    /// Returns [`DomainError::Forbidden`] unless the caller owns the resource
    /// or is an admin.
    pub fn ensure_owner_or_admin(&self, owner: UserId) -> Result<()> {
        if self.can_access(owner) {
            Ok(())
        } else {
            Err(DomainError::Forbidden(
                "resource belongs to another user".to_string(),
            ))
        }
    }

    /// # Errors
    ///
    /// Returns [`DomainError::Forbidden`] for non-admin callers.
    pub fn ensure_admin(&self) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(DomainError::Forbidden("admin role required".to_string()))
        }
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            is_admin: user.is_admin,
        }
    }
}
