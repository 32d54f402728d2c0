//! Document persistence.
//!
//! Every entity is a JSON document in a named collection, keyed by its
//! string id. Three backends implement [`DocumentStore`]:
//!
//! - [`PgDocumentStore`] - a single `documents` table in `PostgreSQL`
//! - [`MemoryDocumentStore`] - in-process maps, used for tests and DB-less runs
//! - [`FallbackDocumentStore`] - a primary backend mirrored into a local
//!   memory store that answers whenever the primary fails
//!
//! # Migrations
//!
//! Migrations are stored in `crates/platform/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod collections;
mod document;
mod fallback;
mod memory;
mod postgres;
mod repository;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use document::{Document, DocumentStore, Filter};
pub use fallback::FallbackDocumentStore;
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use repository::Repository;

/// Errors from the document store layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Backend could not be reached or refused the operation.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A document could not be converted to or from JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored document is not shaped like its entity.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Insert of an id that already exists.
    #[error("document already exists: {0}")]
    Conflict(String),
}

impl StorageError {
    /// Whether the failure belongs to the backend itself, as opposed to an
    /// answer about the data. Only backend failures are worth retrying
    /// against another store.
    #[must_use]
    pub const fn is_backend_failure(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Unavailable(_))
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

/// Create a pool that connects on first use.
///
/// Used when the database may be down at startup and the fallback store
/// should take over until it comes back.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection string cannot be parsed.
pub fn create_lazy_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(3))
        .connect_lazy(database_url.expose_secret())
}
