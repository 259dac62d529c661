//! User and refresh token repository.
//!
//! Refresh tokens are opaque single-use rows: a refresh deletes the spent
//! row and inserts its replacement, so a token can never be redeemed twice.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use lu_estilo_core::{Email, RefreshTokenId, UserId, UserRole};

use super::RepositoryError;
use crate::models::user::{RefreshToken, User};

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    email: String,
    password_hash: String,
    role: UserRole,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            username: row.username,
            email,
            password_hash: row.password_hash,
            role: row.role,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at";

/// Repository for user and refresh token database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value fails validation.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a user with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email is
    /// already registered.
    pub async fn create(
        &self,
        username: &str,
        email: &Email,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "username or email already registered"))?;

        row.try_into()
    }

    /// Store a refresh token for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_refresh_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken, RepositoryError> {
        let row: (RefreshTokenId, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO refresh_tokens (user_id, token, expires_at)
             VALUES ($1, $2, $3)
             RETURNING id, created_at",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(RefreshToken {
            id: row.0,
            user_id,
            token: token.to_owned(),
            expires_at,
            created_at: row.1,
        })
    }

    /// Look up a refresh token by its opaque value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshToken>, RepositoryError> {
        let row: Option<(RefreshTokenId, UserId, String, DateTime<Utc>, DateTime<Utc>)> =
            sqlx::query_as(
                "SELECT id, user_id, token, expires_at, created_at
                 FROM refresh_tokens WHERE token = $1",
            )
            .bind(token)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|(id, user_id, token, expires_at, created_at)| RefreshToken {
            id,
            user_id,
            token,
            expires_at,
            created_at,
        }))
    }

    /// Delete a refresh token (spent on rotation, or expired).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_refresh_token(&self, id: RefreshTokenId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
