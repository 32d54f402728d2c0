//! Customer-facing storefront.
//!
//! Resolves the store behind a storefront key (see [`super::resolution`]),
//! caches exact resolutions in `moka` and filters the store's catalog for
//! display. A key that matches nothing may belong to a store that is being
//! created right now, so resolution waits briefly for its `StoreCreated`
//! event before giving up.

use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use bazaar_core::UserId;

use super::resolution::{self, MatchKind, PreviewParams, apply_preview};
use super::sync::wait_for;
use super::{CatalogService, ServiceResult, StoreService, SyncEvent, SyncHub};
use crate::db::DocumentStore;
use crate::models::{Category, Product, Store};

/// How long a missing store is waited for.
pub const STORE_WAIT: Duration = Duration::from_secs(5);

/// Featured products shown on the home page.
const FEATURED_LIMIT: usize = 8;

/// Resolved stores keyed by storefront key.
///
/// Every invalidation bumps a generation counter. An entry resolved under an
/// older generation is dropped instead of cached, so a resolution racing a
/// store update cannot bring the old store back.
#[derive(Clone)]
pub struct StoreCache {
    entries: Cache<String, (Store, MatchKind)>,
    generation: Arc<AtomicU64>,
}

impl StoreCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().max_capacity(1000).time_to_live(ttl).build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Read before loading stores; pass to [`StoreCache::insert`].
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(AtomicOrdering::Acquire)
    }

    pub async fn get(&self, key: &str) -> Option<(Store, MatchKind)> {
        self.entries.get(key).await
    }

    /// Cache a resolution computed while the cache was at `generation`.
    pub async fn insert(&self, key: String, entry: (Store, MatchKind), generation: u64) {
        if self.generation() != generation {
            return;
        }
        self.entries.insert(key.clone(), entry).await;
        if self.generation() != generation {
            self.entries.invalidate(&key).await;
        }
    }

    /// Drop every entry. Takes effect before this returns.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, AtomicOrdering::AcqRel);
        self.entries.invalidate_all();
    }
}

/// A store found for a storefront key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStore {
    pub store: Store,
    pub matched: MatchKind,
    pub preview: bool,
}

/// Product listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
}

/// Storefront catalog filters, straight from the query string.
///
/// Numeric filters are kept as text so an empty form field is simply
/// ignored rather than rejected.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort: Option<SortOrder>,
    #[serde(default)]
    pub min_price: Option<String>,
    #[serde(default)]
    pub max_price: Option<String>,
    #[serde(default)]
    pub min_rating: Option<String>,
}

impl CatalogQuery {
    fn search(&self) -> Option<String> {
        non_blank(self.q.as_deref()).map(str::to_lowercase)
    }

    fn category(&self) -> Option<&str> {
        non_blank(self.category.as_deref()).filter(|c| *c != "all")
    }

    fn price_range(&self) -> (Option<Decimal>, Option<Decimal>) {
        let parse = |v: Option<&str>| non_blank(v).and_then(|v| v.parse::<Decimal>().ok());
        (
            parse(self.min_price.as_deref()),
            parse(self.max_price.as_deref()),
        )
    }

    fn min_rating(&self) -> Option<f64> {
        non_blank(self.min_rating.as_deref()).and_then(|v| v.parse().ok())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Active products matching `query`, in the requested order.
#[must_use]
pub fn filter_products(products: Vec<Product>, query: &CatalogQuery) -> Vec<Product> {
    let search = query.search();
    let category = query.category();
    let (min_price, max_price) = query.price_range();
    let min_rating = query.min_rating();

    let mut matching: Vec<Product> = products
        .into_iter()
        .filter(Product::is_active)
        .filter(|p| {
            search
                .as_deref()
                .is_none_or(|needle| {
                    p.name.to_lowercase().contains(needle)
                        || p.description.to_lowercase().contains(needle)
                })
        })
        .filter(|p| category.is_none_or(|c| p.category.eq_ignore_ascii_case(c)))
        .filter(|p| min_price.is_none_or(|min| p.price >= min))
        .filter(|p| max_price.is_none_or(|max| p.price <= max))
        .filter(|p| min_rating.is_none_or(|min| p.rating >= min))
        .collect();

    match query.sort.unwrap_or_default() {
        SortOrder::Newest => matching.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::PriceAsc => matching.sort_by(|a, b| a.price.cmp(&b.price)),
        SortOrder::PriceDesc => matching.sort_by(|a, b| b.price.cmp(&a.price)),
        SortOrder::Rating => matching.sort_by(|a, b| {
            b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)
        }),
    }
    matching
}

/// Everything a storefront page shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontPage {
    pub store: Store,
    pub matched: MatchKind,
    pub preview: bool,
    pub products: Vec<Product>,
    pub featured: Vec<Product>,
    pub categories: Vec<Category>,
    pub query: CatalogQuery,
}

/// Storefront service.
pub struct StorefrontService<'a> {
    stores: StoreService<'a>,
    catalog: CatalogService<'a>,
    sync: &'a SyncHub,
    cache: &'a StoreCache,
    wait: Duration,
}

impl<'a> StorefrontService<'a> {
    #[must_use]
    pub fn new(docs: &'a dyn DocumentStore, sync: &'a SyncHub, cache: &'a StoreCache) -> Self {
        Self {
            stores: StoreService::new(docs, sync),
            catalog: CatalogService::new(docs, sync),
            sync,
            cache,
            wait: STORE_WAIT,
        }
    }

    /// Override how long a missing store is waited for.
    #[must_use]
    pub const fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Find the store for a storefront key.
    ///
    /// Exact, non-preview answers are served from and stored in the cache.
    /// When nothing matches, waits for a `StoreCreated` event naming the key
    /// as subdomain or id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the stores cannot be loaded.
    #[instrument(skip(self, preview, viewer))]
    pub async fn resolve_store(
        &self,
        key: &str,
        preview: Option<&PreviewParams>,
        viewer: Option<&UserId>,
    ) -> ServiceResult<Option<ResolvedStore>> {
        if preview.is_none()
            && let Some((store, matched)) = self.cache.get(key).await
        {
            debug!("Storefront cache hit");
            return Ok(Some(ResolvedStore {
                store,
                matched,
                preview: false,
            }));
        }

        // Subscribe before reading so a store created in between is not missed.
        let mut rx = self.sync.subscribe();
        let generation = self.cache.generation();

        let stores = self.stores.list_stores().await?;
        if let Some((store, matched)) = resolution::resolve(&stores, key, preview, viewer) {
            debug!(store_id = %store.id, ?matched, "Resolved storefront");
            return Ok(Some(
                self.finish(key, store.clone(), matched, preview, generation)
                    .await,
            ));
        }

        debug!(wait_ms = self.wait.as_millis(), "Store not found, waiting for creation");
        let created = wait_for(&mut rx, self.wait, |event| match event {
            SyncEvent::StoreCreated {
                store_id, subdomain, ..
            } => subdomain == key || store_id.as_str() == key,
            _ => false,
        })
        .await;
        let Some(store_id) = created.as_ref().and_then(SyncEvent::store_id) else {
            return Ok(None);
        };
        let generation = self.cache.generation();
        let Some(store) = self.stores.get_store(store_id).await? else {
            return Ok(None);
        };
        let matched = if store.subdomain.as_str() == key {
            MatchKind::ExactSubdomain
        } else {
            MatchKind::ExactId
        };
        Ok(Some(
            self.finish(key, store, matched, preview, generation).await,
        ))
    }

    async fn finish(
        &self,
        key: &str,
        store: Store,
        matched: MatchKind,
        preview: Option<&PreviewParams>,
        generation: u64,
    ) -> ResolvedStore {
        match preview {
            Some(params) => ResolvedStore {
                store: apply_preview(store, params),
                matched,
                preview: true,
            },
            None => {
                if matched.is_exact() {
                    self.cache
                        .insert(key.to_owned(), (store.clone(), matched), generation)
                        .await;
                }
                ResolvedStore {
                    store,
                    matched,
                    preview: false,
                }
            }
        }
    }

    /// Build the page for a resolved store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the catalog cannot be loaded.
    pub async fn page(
        &self,
        resolved: ResolvedStore,
        query: CatalogQuery,
    ) -> ServiceResult<StorefrontPage> {
        let store_id = &resolved.store.id;
        let all = self.catalog.list_products(Some(store_id)).await?;
        let featured = all
            .iter()
            .filter(|p| p.featured && p.is_active())
            .take(FEATURED_LIMIT)
            .cloned()
            .collect();
        let products = filter_products(all, &query);
        let categories = self
            .catalog
            .list_categories(Some(store_id))
            .await?
            .into_iter()
            .filter(|c| c.is_active)
            .collect();

        Ok(StorefrontPage {
            store: resolved.store,
            matched: resolved.matched,
            preview: resolved.preview,
            products,
            featured,
            categories,
            query,
        })
    }
}
