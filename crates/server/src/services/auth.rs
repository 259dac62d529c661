//! Authentication service.
//!
//! Passwords are hashed with Argon2id. Sessions are a short-lived JWT
//! access token plus an opaque refresh token stored server-side; refresh
//! rotates the stored token so a captured refresh value is single use.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use lu_estilo_core::{Email, UserId, UserRole};

use crate::config::AuthConfig;
use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{LoginInput, RegisterInput, TokenPair, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] lu_estilo_core::EmailError),

    /// Invalid credentials (wrong password or unknown user).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username or email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Access token missing, malformed, expired, or of the wrong kind.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Refresh token unknown, expired, or already spent.
    #[error("invalid or expired refresh token")]
    InvalidRefreshToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

/// JWT claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id, stringified.
    pub sub: String,
    pub username: String,
    pub role: UserRole,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
    /// Token kind discriminator; always `access` for tokens issued here.
    pub token_type: String,
}

impl AccessClaims {
    /// The user id this token was issued to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if `sub` is not a numeric id.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub
            .parse::<i32>()
            .map(UserId::new)
            .map_err(|_| AuthError::InvalidToken)
    }
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    config: &'a AuthConfig,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, config: &'a AuthConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            config,
        }
    }

    /// Register a new user with the default `user` role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::WeakPassword` on
    /// validation failures, `AuthError::UserAlreadyExists` on a collision.
    pub async fn register(&self, input: &RegisterInput) -> Result<User, AuthError> {
        let email = Email::parse(&input.email)?;
        validate_password(&input.password)?;
        let password_hash = hash_password(&input.password)?;

        let user = self
            .users
            .create(&input.username, &email, &password_hash, UserRole::User)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with username and password, issuing a fresh token pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` when the username does not
    /// resolve or the password does not match.
    pub async fn login(&self, input: &LoginInput) -> Result<TokenPair, AuthError> {
        let user = self
            .users
            .get_by_username(&input.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&input.password, &user.password_hash)?;

        self.issue_pair(&user).await
    }

    /// Exchange a refresh token for a fresh token pair, rotating the stored
    /// refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRefreshToken` when the token is unknown,
    /// expired, or already spent.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let stored = self
            .users
            .get_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        // Spend the token whether or not it is still valid.
        self.users.delete_refresh_token(stored.id).await?;

        if stored.expires_at <= Utc::now() {
            return Err(AuthError::InvalidRefreshToken);
        }

        let user = self
            .users
            .get_by_id(stored.user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        self.issue_pair(&user).await
    }

    /// Decode and validate an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the signature, expiry, or token
    /// kind check fails.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let key = DecodingKey::from_secret(self.config.jwt_secret_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let claims = jsonwebtoken::decode::<AccessClaims>(token, &key, &validation)
            .map_err(|_| AuthError::InvalidToken)?
            .claims;

        if claims.token_type != "access" {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// Issue an access/refresh token pair for a user.
    async fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access_expires = now + self.config.access_token_ttl;
        let refresh_expires = now + self.config.refresh_token_ttl;

        let claims = AccessClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            exp: access_expires.timestamp(),
            token_type: "access".to_owned(),
        };

        let key = EncodingKey::from_secret(self.config.jwt_secret_bytes());
        let access_token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|_| AuthError::InvalidToken)?;

        let refresh_token = Uuid::new_v4().to_string();
        self.users
            .insert_refresh_token(user.id, &refresh_token, refresh_expires)
            .await?;

        Ok(TokenPair {
            access_token,
            token_type: "bearer",
            expires_in: access_expires,
            refresh_token,
            refresh_expires_in: refresh_expires,
        })
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_too_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_claims_user_id() {
        let claims = AccessClaims {
            sub: "12".to_owned(),
            username: "maria".to_owned(),
            role: UserRole::User,
            exp: 0,
            token_type: "access".to_owned(),
        };
        assert_eq!(claims.user_id().unwrap(), UserId::new(12));

        let bad = AccessClaims {
            sub: "not-a-number".to_owned(),
            ..claims
        };
        assert!(bad.user_id().is_err());
    }
}
