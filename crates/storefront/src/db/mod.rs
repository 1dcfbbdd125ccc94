//! Database operations for the shop's `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `app_user` - Accounts, password hashes and API tokens
//! - `category` - Product categories
//! - `product` - Catalog products
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p shopfront-cli -- migrate
//! ```

pub mod categories;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use products::ProductRepository;
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

    /// Constraint violation (unique name, missing category, ...).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// The kind of constraint a write ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    /// A unique index (name, username, email, token).
    Unique,
    /// A foreign key (a product's category).
    ForeignKey,
}

/// Map an insert/update/delete error, turning constraint violations into
/// `RepositoryError::Conflict` with the message `conflict` builds for that
/// kind of violation.
pub(crate) fn map_write_error(
    err: sqlx::Error,
    conflict: impl FnOnce(Violation) -> String,
) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict(Violation::Unique));
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::Conflict(conflict(Violation::ForeignKey));
        }
    }
    RepositoryError::Database(err)
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
