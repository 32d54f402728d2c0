//! Primary store with a local mirror.
//!
//! Every operation goes to the primary first. Successful writes (and
//! documents returned by reads) are copied into the local memory store, so
//! when the primary later fails the local copy can keep serving. A failing
//! primary is never retried; the operation runs once against the local
//! store and a warning is logged.
//!
//! Only backend failures (see [`StorageError::is_backend_failure`]) switch
//! to the local store. A conflict, a missing document or a decoding error
//! from the primary is the answer.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::{DocumentStore, Filter, MemoryDocumentStore, StorageError};

/// A [`DocumentStore`] that falls back to a local mirror.
pub struct FallbackDocumentStore {
    primary: Box<dyn DocumentStore>,
    local: MemoryDocumentStore,
}

impl FallbackDocumentStore {
    #[must_use]
    pub fn new(primary: Box<dyn DocumentStore>) -> Self {
        Self {
            primary,
            local: MemoryDocumentStore::new(),
        }
    }

    /// The local mirror.
    #[must_use]
    pub const fn local(&self) -> &MemoryDocumentStore {
        &self.local
    }

    fn degrade(&self, op: &str, collection: &str, err: &StorageError) {
        warn!(
            primary = self.primary.backend(),
            op,
            collection,
            error = %err,
            "Primary store failed, using local fallback"
        );
    }

    async fn mirror(&self, collection: &str, docs: &[Value]) {
        for doc in docs {
            if let Some(id) = doc.get("id").and_then(Value::as_str) {
                self.local.put(collection, id, doc.clone()).await;
            }
        }
    }
}

#[async_trait]
impl DocumentStore for FallbackDocumentStore {
    fn backend(&self) -> &'static str {
        "fallback"
    }

    async fn insert(&self, collection: &str, id: &str, doc: Value) -> Result<(), StorageError> {
        match self.primary.insert(collection, id, doc.clone()).await {
            Ok(()) => {
                self.local.put(collection, id, doc).await;
                Ok(())
            }
            Err(err) if err.is_backend_failure() => {
                self.degrade("insert", collection, &err);
                self.local.insert(collection, id, doc).await
            }
            Err(err) => Err(err),
        }
    }

    async fn insert_unique(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        doc: Value,
    ) -> Result<(), StorageError> {
        match self
            .primary
            .insert_unique(collection, id, field, doc.clone())
            .await
        {
            Ok(()) => {
                self.local.put(collection, id, doc).await;
                Ok(())
            }
            Err(err) if err.is_backend_failure() => {
                self.degrade("insert_unique", collection, &err);
                self.local.insert_unique(collection, id, field, doc).await
            }
            Err(err) => Err(err),
        }
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StorageError> {
        match self.primary.get(collection, id).await {
            Ok(Some(doc)) => {
                self.local.put(collection, id, doc.clone()).await;
                Ok(Some(doc))
            }
            Ok(None) => Ok(None),
            Err(err) if err.is_backend_failure() => {
                self.degrade("get", collection, &err);
                self.local.get(collection, id).await
            }
            Err(err) => Err(err),
        }
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StorageError> {
        match self.primary.find(collection, filter).await {
            Ok(docs) => {
                self.mirror(collection, &docs).await;
                Ok(docs)
            }
            Err(err) if err.is_backend_failure() => {
                self.degrade("find", collection, &err);
                self.local.find(collection, filter).await
            }
            Err(err) => Err(err),
        }
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
    ) -> Result<bool, StorageError> {
        match self.primary.replace(collection, id, doc.clone()).await {
            Ok(true) => {
                self.local.put(collection, id, doc).await;
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(err) if err.is_backend_failure() => {
                self.degrade("replace", collection, &err);
                self.local.replace(collection, id, doc).await
            }
            Err(err) => Err(err),
        }
    }

    async fn replace_if(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        expected: &str,
        doc: Value,
    ) -> Result<bool, StorageError> {
        match self
            .primary
            .replace_if(collection, id, field, expected, doc.clone())
            .await
        {
            Ok(true) => {
                self.local.put(collection, id, doc).await;
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(err) if err.is_backend_failure() => {
                self.degrade("replace_if", collection, &err);
                self.local.replace_if(collection, id, field, expected, doc).await
            }
            Err(err) => Err(err),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
        match self.primary.delete(collection, id).await {
            Ok(deleted) => {
                self.local.remove(collection, id).await;
                Ok(deleted)
            }
            Err(err) if err.is_backend_failure() => {
                self.degrade("delete", collection, &err);
                self.local.delete(collection, id).await
            }
            Err(err) => Err(err),
        }
    }

    async fn count(&self, collection: &str) -> Result<u64, StorageError> {
        match self.primary.count(collection).await {
            Ok(count) => Ok(count),
            Err(err) if err.is_backend_failure() => {
                self.degrade("count", collection, &err);
                self.local.count(collection).await
            }
            Err(err) => Err(err),
        }
    }

    /// Reports the primary's health; the local mirror is always reachable.
    async fn ping(&self) -> Result<(), StorageError> {
        let result = self.primary.ping().await;
        if let Err(err) = &result {
            debug!(error = %err, "Primary store ping failed");
        }
        result
    }
}
