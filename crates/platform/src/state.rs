//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{PlatformConfig, StorageMode};
use crate::db::{
    self, DocumentStore, FallbackDocumentStore, MemoryDocumentStore, PgDocumentStore,
};
use crate::services::storefront::StoreCache;
use crate::services::{
    ApplicationService, AuthService, CatalogService, OrderService, StoreService,
    StorefrontService, SyncEvent, SyncHub,
};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid base_url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("storage mode {0} needs a database URL")]
    MissingDatabaseUrl(StorageMode),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and hands out short-lived
/// services borrowing the document store and the sync hub.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PlatformConfig,
    base_url: Url,
    documents: Arc<dyn DocumentStore>,
    pool: Option<PgPool>,
    sync: SyncHub,
    store_cache: StoreCache,
}

impl AppState {
    /// Create a new application state over an existing document store.
    ///
    /// # Arguments
    ///
    /// * `config` - Platform configuration
    /// * `documents` - Document store backend
    /// * `pool` - `PostgreSQL` pool, when sessions should be kept in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(
        config: PlatformConfig,
        documents: Arc<dyn DocumentStore>,
        pool: Option<PgPool>,
    ) -> Result<Self, StateError> {
        let base_url = Url::parse(&config.base_url)?;
        let store_cache = StoreCache::new(config.store_cache_ttl);
        let sync = SyncHub::new().with_listener(invalidate_on_store_change(store_cache.clone()));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                base_url,
                documents,
                pool,
                sync,
                store_cache,
            }),
        })
    }

    /// Open the storage backend selected by `config.storage` and build the
    /// state around it.
    ///
    /// In `fallback` mode an unreachable database is not fatal: documents are
    /// served from the local mirror until it comes back, and sessions are
    /// kept in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the database URL is missing or, in `postgres`
    /// mode, if the database cannot be reached.
    pub async fn connect(config: PlatformConfig) -> Result<Self, StateError> {
        let mode = config.storage;
        let (documents, pool): (Arc<dyn DocumentStore>, Option<PgPool>) = match mode {
            StorageMode::Memory => (Arc::new(MemoryDocumentStore::new()), None),
            StorageMode::Postgres => {
                let url = config
                    .database_url
                    .as_ref()
                    .ok_or(StateError::MissingDatabaseUrl(mode))?;
                let pool = db::create_pool(url).await?;
                (Arc::new(PgDocumentStore::new(pool.clone())), Some(pool))
            }
            StorageMode::Fallback => {
                let url = config
                    .database_url
                    .as_ref()
                    .ok_or(StateError::MissingDatabaseUrl(mode))?;
                match db::create_pool(url).await {
                    Ok(pool) => {
                        let primary = Box::new(PgDocumentStore::new(pool.clone()));
                        (Arc::new(FallbackDocumentStore::new(primary)), Some(pool))
                    }
                    Err(e) => {
                        warn!(error = %e, "Database unreachable, starting on the local fallback");
                        let primary = Box::new(PgDocumentStore::new(db::create_lazy_pool(url)?));
                        (Arc::new(FallbackDocumentStore::new(primary)), None)
                    }
                }
            }
        };

        info!(storage = %mode, backend = documents.backend(), "Document store ready");
        Self::new(config, documents, pool)
    }

    /// Get a reference to the platform configuration.
    #[must_use]
    pub fn config(&self) -> &PlatformConfig {
        &self.inner.config
    }

    /// Parsed public base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn documents(&self) -> &dyn DocumentStore {
        &*self.inner.documents
    }

    /// Get the database pool, if sessions live in `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get a reference to the change notification hub.
    #[must_use]
    pub fn sync(&self) -> &SyncHub {
        &self.inner.sync
    }

    /// Get a reference to the resolved-store cache.
    #[must_use]
    pub fn store_cache(&self) -> &StoreCache {
        &self.inner.store_cache
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.documents())
    }

    #[must_use]
    pub fn stores(&self) -> StoreService<'_> {
        StoreService::new(self.documents(), self.sync())
    }

    #[must_use]
    pub fn applications(&self) -> ApplicationService<'_> {
        ApplicationService::new(self.documents(), self.sync())
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.documents(), self.sync())
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(self.documents(), self.sync())
    }

    #[must_use]
    pub fn storefront(&self) -> StorefrontService<'_> {
        StorefrontService::new(self.documents(), self.sync(), self.store_cache())
            .with_wait(self.config().store_wait)
    }
}

/// Drop cached stores as part of the write that changed a store document,
/// so the next storefront request already sees the change.
fn invalidate_on_store_change(cache: StoreCache) -> impl Fn(&SyncEvent) + Send + Sync {
    move |event| {
        if event.changes_store() {
            cache.invalidate_all();
            debug!(store_id = ?event.store_id(), "Storefront cache invalidated");
        }
    }
}
