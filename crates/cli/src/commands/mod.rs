//! Command implementations.
//!
//! Every command talks to `PostgreSQL` directly. Data commands go through the
//! platform services over a [`PgDocumentStore`], so seeded documents get the
//! same validation as ones created over HTTP.

pub mod migrate;
pub mod seed;
pub mod user;

use bazaar_platform::db::{self, StorageError};
use bazaar_platform::services::{AuthError, ServiceError};
use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Document store error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Account could not be created.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// A platform service refused the operation.
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, merchant, customer")]
    InvalidRole(String),

    /// Catalog file could not be read.
    #[error("Could not read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file is not valid YAML for a catalog.
    #[error("Invalid catalog file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Catalog parsed but failed validation.
    #[error("{0} catalog validation errors found")]
    InvalidCatalog(usize),

    /// Referenced store does not exist.
    #[error("Store not found: {0}")]
    StoreNotFound(String),
}

/// Database URL from `BAZAAR_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, CliError> {
    dotenvy::dotenv().ok();

    std::env::var("BAZAAR_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("BAZAAR_DATABASE_URL"))
}

/// Connect to the platform database.
async fn connect() -> Result<PgPool, CliError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}
