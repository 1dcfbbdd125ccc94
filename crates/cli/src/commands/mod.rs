//! Command implementations.

pub mod catalog;
pub mod migrate;
pub mod users;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use shopfront::db::RepositoryError;
use shopfront::services::auth::AuthError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A repository operation failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Account validation or creation failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Bad command-line input.
    #[error("{0}")]
    InvalidInput(String),

    /// No such user.
    #[error("No user named {0}")]
    UnknownUser(String),

    /// No such category.
    #[error("No category named {0}")]
    UnknownCategory(String),

    /// Refused to remove the last administrator.
    #[error("{0} is the only administrator; promote someone else first")]
    LastAdmin(String),
}

/// Connect to the shop database named by `SHOPFRONT_DATABASE_URL`
/// (falling back to `DATABASE_URL`).
async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SHOPFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("SHOPFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to shop database...");
    Ok(shopfront::db::create_pool(&database_url).await?)
}
