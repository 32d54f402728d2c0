//! Store management.

use chrono::Utc;
use tracing::{debug, info};

use bazaar_core::{StoreCustomization, StoreId, StoreSettings, StoreStatus, Subdomain, UserId};

use super::{ServiceError, ServiceResult, SyncEvent, SyncHub, require};
use crate::db::{DocumentStore, Repository, StorageError};
use crate::models::store::merge_into;
use crate::models::{CurrentUser, Store, StoreDraft, StorePatch};

/// Inserts tried before giving up on a subdomain race.
const SUBDOMAIN_ATTEMPTS: u32 = 5;

/// Store service.
pub struct StoreService<'a> {
    stores: Repository<'a, Store>,
    sync: &'a SyncHub,
}

impl<'a> StoreService<'a> {
    #[must_use]
    pub fn new(docs: &'a dyn DocumentStore, sync: &'a SyncHub) -> Self {
        Self {
            stores: Repository::new(docs),
            sync,
        }
    }

    /// Create an active store.
    ///
    /// The draft's subdomain is made unique by appending `-2`, `-3`, ...
    /// The insert itself refuses a taken subdomain, so concurrent creations
    /// never share one.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Invalid` for a blank name,
    /// `ServiceError::Conflict` if no free subdomain could be claimed and
    /// `ServiceError::Storage` if the store cannot be saved.
    pub async fn create_store(&self, draft: StoreDraft) -> ServiceResult<Store> {
        require("store name", &draft.name)?;
        let subdomain = self.unique_subdomain(&draft.subdomain).await?;
        let now = Utc::now();

        let mut store = Store {
            id: StoreId::generate(),
            name: draft.name.trim().to_owned(),
            description: draft.description,
            logo: None,
            cover: None,
            subdomain,
            owner_id: draft.owner_id,
            template: draft.template,
            customization: draft.customization,
            settings: draft.settings,
            status: StoreStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let mut attempt = 1;
        loop {
            match self.stores.insert_unique(&store, "subdomain").await {
                Ok(()) => break,
                Err(StorageError::Conflict(_)) if attempt < SUBDOMAIN_ATTEMPTS => {
                    debug!(subdomain = %store.subdomain, attempt, "Subdomain taken meanwhile, retrying");
                    attempt += 1;
                    store.subdomain = self.unique_subdomain(&draft.subdomain).await?;
                }
                Err(StorageError::Conflict(_)) => {
                    return Err(ServiceError::Conflict(format!(
                        "subdomain {} is taken",
                        store.subdomain
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(store_id = %store.id, subdomain = %store.subdomain, "Store created");
        self.sync.publish(SyncEvent::StoreCreated {
            store_id: store.id.clone(),
            subdomain: store.subdomain.to_string(),
            owner_id: store.owner_id.clone(),
        });
        Ok(store)
    }

    /// All stores in creation order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the stores cannot be loaded.
    pub async fn list_stores(&self) -> ServiceResult<Vec<Store>> {
        Ok(self.stores.list().await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the lookup fails.
    pub async fn get_store(&self, id: &StoreId) -> ServiceResult<Option<Store>> {
        Ok(self.stores.get(id.as_str()).await?)
    }

    /// The store owned by a merchant (their first, if several).
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the lookup fails.
    pub async fn get_store_by_owner(&self, owner_id: &UserId) -> ServiceResult<Option<Store>> {
        Ok(self
            .stores
            .find_by("ownerId", owner_id)
            .await?
            .into_iter()
            .next())
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the lookup fails.
    pub async fn get_store_by_subdomain(&self, subdomain: &str) -> ServiceResult<Option<Store>> {
        Ok(self
            .stores
            .find_by("subdomain", subdomain)
            .await?
            .into_iter()
            .next())
    }

    /// Apply a partial update. Returns `None` if the store does not exist.
    ///
    /// Merchants may only update their own store; admins may update any.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` for another merchant's store and
    /// `ServiceError::Invalid` if the merged customization or settings are
    /// malformed.
    pub async fn update_store(
        &self,
        id: &StoreId,
        patch: StorePatch,
        actor: &CurrentUser,
    ) -> ServiceResult<Option<Store>> {
        let Some(mut store) = self.stores.get(id.as_str()).await? else {
            return Ok(None);
        };
        if !actor.is_admin() && store.owner_id != actor.id {
            return Err(ServiceError::Forbidden(
                "only the owner can update this store".to_owned(),
            ));
        }

        let customization_changed = patch.touches_customization();
        apply_patch(&mut store, patch)?;
        store.updated_at = Utc::now();

        if !self.stores.update(&store).await? {
            return Ok(None);
        }

        let store_id = store.id.clone();
        let subdomain = store.subdomain.to_string();
        self.sync.publish(if customization_changed {
            SyncEvent::StoreCustomizationUpdated {
                store_id,
                subdomain,
            }
        } else {
            SyncEvent::StoreUpdated {
                store_id,
                subdomain,
            }
        });
        Ok(Some(store))
    }

    /// First free variant of `base`: `base`, `base-2`, `base-3`, ...
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if existing stores cannot be read.
    pub async fn unique_subdomain(&self, base: &Subdomain) -> ServiceResult<Subdomain> {
        let taken: Vec<Subdomain> = self
            .stores
            .list()
            .await?
            .into_iter()
            .map(|s| s.subdomain)
            .collect();
        Ok(first_free_subdomain(base, &taken))
    }
}

fn first_free_subdomain(base: &Subdomain, taken: &[Subdomain]) -> Subdomain {
    if !taken.contains(base) {
        return base.clone();
    }
    (2..)
        .map(|n| base.with_suffix(n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.clone())
}

fn apply_patch(store: &mut Store, patch: StorePatch) -> ServiceResult<()> {
    if let Some(name) = patch.name {
        require("store name", &name)?;
        store.name = name.trim().to_owned();
    }
    if let Some(description) = patch.description {
        store.description = description;
    }
    if patch.logo.is_some() {
        store.logo = patch.logo;
    }
    if patch.cover.is_some() {
        store.cover = patch.cover;
    }
    if let Some(template) = patch.template {
        store.template = template;
    }
    if let Some(status) = patch.status {
        store.status = status;
    }
    if let Some(overlay) = patch.customization {
        let merged: StoreCustomization = merge_into(&store.customization, &overlay)
            .map_err(|e| ServiceError::Invalid(format!("customization: {e}")))?;
        merged
            .validate()
            .map_err(|e| ServiceError::Invalid(e.to_string()))?;
        store.customization = merged;
    }
    if let Some(overlay) = patch.settings {
        let merged: StoreSettings = merge_into(&store.settings, &overlay)
            .map_err(|e| ServiceError::Invalid(format!("settings: {e}")))?;
        merged
            .validate()
            .map_err(|e| ServiceError::Invalid(e.to_string()))?;
        store.settings = merged;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use bazaar_core::{Email, UserRole};

    use super::*;
    use crate::db::MemoryDocumentStore;
    use crate::models::store::DEFAULT_TEMPLATE;

    fn draft(name: &str, subdomain: &str, owner: &str) -> StoreDraft {
        StoreDraft {
            name: name.to_owned(),
            description: String::new(),
            subdomain: Subdomain::parse(subdomain).unwrap(),
            owner_id: UserId::new(owner),
            template: DEFAULT_TEMPLATE.to_owned(),
            customization: StoreCustomization::default(),
            settings: StoreSettings::default(),
        }
    }

    fn actor(id: &str, role: UserRole) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            email: Email::parse("someone@example.com").unwrap(),
            display_name: "Someone".to_owned(),
            role,
        }
    }

    #[test]
    fn test_first_free_subdomain() {
        let base = Subdomain::parse("coffee").unwrap();
        let taken = [
            Subdomain::parse("coffee").unwrap(),
            Subdomain::parse("coffee-2").unwrap(),
        ];
        assert_eq!(first_free_subdomain(&base, &taken).as_str(), "coffee-3");
        assert_eq!(first_free_subdomain(&base, &[]).as_str(), "coffee");
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let docs = MemoryDocumentStore::new();
        let sync = SyncHub::new();
        let mut rx = sync.subscribe();
        let stores = StoreService::new(&docs, &sync);

        let first = stores.create_store(draft("Coffee", "coffee", "u1")).await.unwrap();
        let second = stores.create_store(draft("Coffee Two", "coffee", "u2")).await.unwrap();
        assert_eq!(second.subdomain.as_str(), "coffee-2");

        assert!(matches!(rx.recv().await.unwrap().event, SyncEvent::StoreCreated { .. }));
        assert_eq!(
            stores.get_store_by_owner(&UserId::new("u1")).await.unwrap().unwrap().id,
            first.id
        );
        assert_eq!(
            stores.get_store_by_subdomain("coffee-2").await.unwrap().unwrap().id,
            second.id
        );
        assert_eq!(stores.list_stores().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_subdomains() {
        let docs = MemoryDocumentStore::new();
        let sync = SyncHub::new();
        let stores = StoreService::new(&docs, &sync);

        let (a, b, c) = tokio::join!(
            stores.create_store(draft("Twin", "twin", "u1")),
            stores.create_store(draft("Twin", "twin", "u2")),
            stores.create_store(draft("Twin", "twin", "u3")),
        );
        let mut subdomains: Vec<String> = [a, b, c]
            .into_iter()
            .map(|s| s.unwrap().subdomain.to_string())
            .collect();
        subdomains.sort();
        assert_eq!(subdomains, ["twin", "twin-2", "twin-3"]);
    }

    #[tokio::test]
    async fn test_update_merges_customization_and_checks_owner() {
        let docs = MemoryDocumentStore::new();
        let sync = SyncHub::new();
        let stores = StoreService::new(&docs, &sync);
        let store = stores.create_store(draft("Coffee", "coffee", "u1")).await.unwrap();

        let mut rx = sync.subscribe();
        let patch = StorePatch {
            customization: Some(json!({"colors": {"primary": "#112233"}})),
            ..StorePatch::default()
        };
        let updated = stores
            .update_store(&store.id, patch, &actor("u1", UserRole::Merchant))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.customization.colors.primary, "#112233");
        assert_eq!(updated.customization.fonts.heading, "Cairo");
        assert!(matches!(
            rx.recv().await.unwrap().event,
            SyncEvent::StoreCustomizationUpdated { .. }
        ));

        let err = stores
            .update_store(
                &store.id,
                StorePatch::default(),
                &actor("u2", UserRole::Merchant),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let by_admin = stores
            .update_store(
                &store.id,
                StorePatch {
                    status: Some(StoreStatus::Inactive),
                    ..StorePatch::default()
                },
                &actor("admin", UserRole::Admin),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_admin.status, StoreStatus::Inactive);
        assert!(matches!(rx.recv().await.unwrap().event, SyncEvent::StoreUpdated { .. }));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_customization() {
        let docs = MemoryDocumentStore::new();
        let sync = SyncHub::new();
        let stores = StoreService::new(&docs, &sync);
        let store = stores.create_store(draft("Coffee", "coffee", "u1")).await.unwrap();

        let patch = StorePatch {
            customization: Some(json!({"layout": {"productGridColumns": 12}})),
            ..StorePatch::default()
        };
        let err = stores
            .update_store(&store.id, patch, &actor("u1", UserRole::Merchant))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));

        for settings in [
            json!({"taxes": {"enabled": true, "rate": "79228162514264337593543950335"}}),
            json!({"shipping": {"defaultCost": "-500"}}),
            json!({"shipping": {"freeShippingThreshold": "-1"}}),
        ] {
            let patch = StorePatch {
                settings: Some(settings),
                ..StorePatch::default()
            };
            let err = stores
                .update_store(&store.id, patch, &actor("u1", UserRole::Merchant))
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Invalid(_)));
        }
        let stored = stores.get_store(&store.id).await.unwrap().unwrap();
        assert_eq!(stored.settings, StoreSettings::default());

        assert!(
            stores
                .update_store(
                    &StoreId::new("missing"),
                    StorePatch::default(),
                    &actor("u1", UserRole::Merchant)
                )
                .await
                .unwrap()
                .is_none()
        );
    }
}
