//! Typed access to one collection.

use std::marker::PhantomData;

use serde_json::Value;

use super::{Document, DocumentStore, Filter, StorageError};

/// Repository for documents of type `T`.
///
/// Serializes with serde on the way in and rejects documents that no
/// longer match `T` as [`StorageError::DataCorruption`] on the way out.
pub struct Repository<'a, T> {
    docs: &'a dyn DocumentStore,
    _entity: PhantomData<fn() -> T>,
}

impl<'a, T: Document> Repository<'a, T> {
    /// Create a new repository over `docs`.
    #[must_use]
    pub fn new(docs: &'a dyn DocumentStore) -> Self {
        Self {
            docs,
            _entity: PhantomData,
        }
    }

    /// Get a document by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or the stored document
    /// cannot be decoded.
    pub async fn get(&self, id: &str) -> Result<Option<T>, StorageError> {
        self.docs
            .get(T::COLLECTION, id)
            .await?
            .map(decode)
            .transpose()
    }

    /// All documents matching `filter`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or a document cannot be
    /// decoded.
    pub async fn find(&self, filter: &Filter) -> Result<Vec<T>, StorageError> {
        self.docs
            .find(T::COLLECTION, filter)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Documents whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// See [`Repository::find`].
    pub async fn find_by(&self, field: &str, value: impl ToString) -> Result<Vec<T>, StorageError> {
        self.find(&Filter::all().eq(field, value)).await
    }

    /// Every document of the collection.
    ///
    /// # Errors
    ///
    /// See [`Repository::find`].
    pub async fn list(&self) -> Result<Vec<T>, StorageError> {
        self.find(&Filter::all()).await
    }

    /// Store a new document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id is taken.
    pub async fn insert(&self, entity: &T) -> Result<(), StorageError> {
        let doc = serde_json::to_value(entity)?;
        self.docs.insert(T::COLLECTION, entity.id(), doc).await
    }

    /// Store a new document whose `field` no other document shares.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id or the field value is taken.
    pub async fn insert_unique(&self, entity: &T, field: &str) -> Result<(), StorageError> {
        let doc = serde_json::to_value(entity)?;
        self.docs
            .insert_unique(T::COLLECTION, entity.id(), field, doc)
            .await
    }

    /// Overwrite a document only if its stored `field` still equals
    /// `expected`. Returns `false` if it does not exist or has changed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn update_if(
        &self,
        entity: &T,
        field: &str,
        expected: impl ToString,
    ) -> Result<bool, StorageError> {
        let doc = serde_json::to_value(entity)?;
        self.docs
            .replace_if(T::COLLECTION, entity.id(), field, &expected.to_string(), doc)
            .await
    }

    /// Overwrite an existing document. Returns `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn update(&self, entity: &T) -> Result<bool, StorageError> {
        let doc = serde_json::to_value(entity)?;
        self.docs.replace(T::COLLECTION, entity.id(), doc).await
    }

    /// Delete a document by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        self.docs.delete(T::COLLECTION, id).await
    }

    /// Number of documents in the collection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn count(&self) -> Result<u64, StorageError> {
        self.docs.count(T::COLLECTION).await
    }
}

fn decode<T: Document>(doc: Value) -> Result<T, StorageError> {
    serde_json::from_value(doc)
        .map_err(|e| StorageError::DataCorruption(format!("invalid {} document: {e}", T::COLLECTION)))
}
