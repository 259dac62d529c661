//! Database operations for the Lu Estilo `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `users` / `refresh_tokens` - API authentication
//! - `customers` - Customer directory
//! - `products` / `product_images` - Catalog and stock ledger
//! - `orders` / `order_items` - Orders and their line items
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run on startup.
//!
//! Queries use the runtime sqlx API (`query`, `query_as`, `QueryBuilder`)
//! rather than the compile-time macros, so the crate builds without a live
//! database.

pub mod customers;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use customers::CustomerRepository;
pub use orders::OrderRepository;
pub use products::{ProductRepository, StockDirection, StockError};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email or a foreign key).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a sqlx error to `Conflict` when it is a uniqueness or referential
    /// violation, keeping the in-flight transaction's rollback semantics at
    /// the call site.
    #[must_use]
    pub fn from_sqlx(e: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
        {
            return Self::Conflict(conflict_message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
