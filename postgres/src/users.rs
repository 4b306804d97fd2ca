//! User repository.

use crate::is_unique_violation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use venue_booking_core::repository::UserRepository;
use venue_booking_core::{DomainError, Page, Pagination, Result, User, UserId};

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, phone, company, \
     is_active, is_admin, created_at, updated_at";

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    company: Option<String>,
    is_active: bool,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            company: row.company,
            is_active: row.is_active,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `PostgreSQL` user repository.
#[derive(Clone)]
pub struct PostgresUserRepository {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new `PostgreSQL` user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::storage("Failed to get user", e))?;
        Ok(row.map(User::from))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage("Failed to get user by email", e))?;
        Ok(row.map(User::from))
    }

    async fn list(&self, pagination: Pagination) -> Result<Page<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id LIMIT $1 OFFSET $2"
        ))
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage("Failed to list users", e))?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage("Failed to count users", e))?;

        Ok(Page {
            items: rows.into_iter().map(User::from).collect(),
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn insert(&self, user: &User) -> Result<User> {
        sqlx::query(
            r"
            INSERT INTO users (
                id, email, password_hash, first_name, last_name, phone, company,
                is_active, is_admin, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(*user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.company)
        .bind(user.is_active)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return DomainError::EmailTaken(user.email.clone());
            }
            DomainError::storage("Failed to create user", e)
        })?;

        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET password_hash = $2,
                first_name = $3,
                last_name = $4,
                phone = $5,
                company = $6,
                is_active = $7,
                is_admin = $8,
                updated_at = $9
            WHERE id = $1
            ",
        )
        .bind(*user.id.as_uuid())
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.company)
        .bind(user.is_active)
        .bind(user.is_admin)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage("Failed to update user", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("User", user.id));
        }
        Ok(user.clone())
    }
}
