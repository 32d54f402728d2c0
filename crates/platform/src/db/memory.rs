//! In-process document store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::document::field_text;
use super::{DocumentStore, Filter, StorageError};

/// Documents of one collection, kept in insertion order.
#[derive(Debug, Default)]
struct Collection {
    docs: Vec<(String, Value)>,
}

impl Collection {
    fn position(&self, id: &str) -> Option<usize> {
        self.docs.iter().position(|(doc_id, _)| doc_id == id)
    }
}

/// Document store backed by process memory.
///
/// Plays the role of the browser-local store in the fallback pair and is
/// the only backend when no database is configured. Contents are lost on
/// restart.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a document, keeping its original position when
    /// it already exists.
    pub async fn put(&self, collection: &str, id: &str, doc: Value) {
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_owned()).or_default();
        match coll.position(id) {
            Some(idx) => {
                if let Some(slot) = coll.docs.get_mut(idx) {
                    slot.1 = doc;
                }
            }
            None => coll.docs.push((id.to_owned(), doc)),
        }
    }

    /// Remove a document if present.
    pub async fn remove(&self, collection: &str, id: &str) -> bool {
        let mut collections = self.collections.write().await;
        collections.get_mut(collection).is_some_and(|coll| {
            coll.position(id)
                .map(|idx| coll.docs.remove(idx))
                .is_some()
        })
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, collection: &str, id: &str, doc: Value) -> Result<(), StorageError> {
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_owned()).or_default();
        if coll.position(id).is_some() {
            return Err(StorageError::Conflict(format!("{collection}/{id}")));
        }
        coll.docs.push((id.to_owned(), doc));
        Ok(())
    }

    async fn insert_unique(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        doc: Value,
    ) -> Result<(), StorageError> {
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_owned()).or_default();
        if coll.position(id).is_some() {
            return Err(StorageError::Conflict(format!("{collection}/{id}")));
        }
        if let Some(value) = doc.get(field).and_then(field_text) {
            let same = Filter::all().eq(field, &value);
            if coll.docs.iter().any(|(_, existing)| same.matches(existing)) {
                return Err(StorageError::Conflict(format!("{collection}.{field} = {value}")));
            }
        }
        coll.docs.push((id.to_owned(), doc));
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StorageError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|coll| {
            coll.docs
                .iter()
                .find(|(doc_id, _)| doc_id == id)
                .map(|(_, doc)| doc.clone())
        }))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StorageError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|coll| {
                coll.docs
                    .iter()
                    .filter(|(_, doc)| filter.matches(doc))
                    .map(|(_, doc)| doc.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
    ) -> Result<bool, StorageError> {
        let mut collections = self.collections.write().await;
        let slot = collections
            .get_mut(collection)
            .and_then(|coll| coll.docs.iter_mut().find(|(doc_id, _)| doc_id == id));
        let Some(slot) = slot else {
            return Ok(false);
        };
        slot.1 = doc;
        Ok(true)
    }

    async fn replace_if(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        expected: &str,
        doc: Value,
    ) -> Result<bool, StorageError> {
        let guard = Filter::all().eq(field, expected);
        let mut collections = self.collections.write().await;
        let slot = collections
            .get_mut(collection)
            .and_then(|coll| coll.docs.iter_mut().find(|(doc_id, _)| doc_id == id));
        match slot {
            Some(slot) if guard.matches(&slot.1) => {
                slot.1 = doc;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
        Ok(self.remove(collection, id).await)
    }

    async fn count(&self, collection: &str) -> Result<u64, StorageError> {
        let collections = self.collections.read().await;
        let len = collections.get(collection).map_or(0, |coll| coll.docs.len());
        Ok(u64::try_from(len).unwrap_or(u64::MAX))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_crud_round_trip() {
        let store = MemoryDocumentStore::new();
        store
            .insert("stores", "s1", json!({"id": "s1", "name": "One"}))
            .await
            .unwrap();

        let doc = store.get("stores", "s1").await.unwrap().unwrap();
        assert_eq!(doc["name"], "One");

        assert!(
            store
                .replace("stores", "s1", json!({"id": "s1", "name": "Uno"}))
                .await
                .unwrap()
        );
        assert_eq!(store.get("stores", "s1").await.unwrap().unwrap()["name"], "Uno");

        assert!(!store.replace("stores", "nope", json!({})).await.unwrap());
        assert!(store.delete("stores", "s1").await.unwrap());
        assert!(!store.delete("stores", "s1").await.unwrap());
        assert!(store.get("stores", "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_is_conflict() {
        let store = MemoryDocumentStore::new();
        store.insert("users", "u1", json!({})).await.unwrap();
        let err = store.insert("users", "u1", json!({})).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_insert_unique_field() {
        let store = MemoryDocumentStore::new();
        store
            .insert_unique("stores", "s1", "subdomain", json!({"id": "s1", "subdomain": "tea"}))
            .await
            .unwrap();
        let err = store
            .insert_unique("stores", "s2", "subdomain", json!({"id": "s2", "subdomain": "tea"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        store
            .insert_unique("stores", "s2", "subdomain", json!({"id": "s2", "subdomain": "tea-2"}))
            .await
            .unwrap();
        assert_eq!(store.count("stores").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_replace_if_checks_current_value() {
        let store = MemoryDocumentStore::new();
        store
            .insert("apps", "a1", json!({"id": "a1", "status": "pending"}))
            .await
            .unwrap();

        let approved = json!({"id": "a1", "status": "approved"});
        assert!(
            store
                .replace_if("apps", "a1", "status", "pending", approved.clone())
                .await
                .unwrap()
        );
        // The second writer sees the status has moved on.
        assert!(
            !store
                .replace_if("apps", "a1", "status", "pending", approved)
                .await
                .unwrap()
        );
        assert!(
            !store
                .replace_if("apps", "nope", "status", "pending", json!({}))
                .await
                .unwrap()
        );
        assert_eq!(store.get("apps", "a1").await.unwrap().unwrap()["status"], "approved");
    }

    #[tokio::test]
    async fn test_find_keeps_insertion_order() {
        let store = MemoryDocumentStore::new();
        for (id, store_id) in [("p3", "a"), ("p1", "b"), ("p2", "a")] {
            store
                .insert("products", id, json!({"id": id, "storeId": store_id}))
                .await
                .unwrap();
        }
        // Overwriting keeps the original position.
        store
            .put("products", "p3", json!({"id": "p3", "storeId": "a", "x": 1}))
            .await;

        let found = store
            .find("products", &Filter::all().eq("storeId", "a"))
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["p3", "p2"]);
        assert_eq!(store.count("products").await.unwrap(), 3);
        assert_eq!(store.count("missing").await.unwrap(), 0);
    }
}
