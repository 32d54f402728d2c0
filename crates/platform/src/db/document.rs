//! The document store abstraction.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::StorageError;

/// A typed entity persisted as one JSON document.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Collection the entity lives in.
    const COLLECTION: &'static str;

    /// The document key.
    fn id(&self) -> &str;
}

/// Conjunction of equality conditions on top-level document fields.
///
/// Values are compared in their text form, the same way `PostgreSQL`'s
/// `data->>'field'` renders them: strings verbatim, booleans as
/// `true`/`false`, numbers in decimal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<(String, String)>,
}

impl Filter {
    /// A filter matching every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a `field == value` condition.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.conditions.push((field.into(), value.to_string()));
        self
    }

    /// The `(field, text)` pairs of this filter.
    #[must_use]
    pub fn conditions(&self) -> &[(String, String)] {
        &self.conditions
    }

    /// Whether the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate the filter against a document held in memory.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            doc.get(field)
                .and_then(field_text)
                .is_some_and(|actual| actual == *expected)
        })
    }
}

/// Text form of a JSON field, `None` for `null`.
pub(super) fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Backend-agnostic storage of JSON documents grouped in collections.
///
/// Writes replace whole documents; concurrent writers resolve by last
/// write wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for status reporting.
    fn backend(&self) -> &'static str;

    /// Store a new document.
    ///
    /// Fails with [`StorageError::Conflict`] if `id` already exists.
    async fn insert(&self, collection: &str, id: &str, doc: Value) -> Result<(), StorageError>;

    /// Store a new document unless another document of the collection
    /// already holds the same text in `field`.
    ///
    /// Fails with [`StorageError::Conflict`] on a taken id or field value.
    async fn insert_unique(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        doc: Value,
    ) -> Result<(), StorageError>;

    /// Fetch a document by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StorageError>;

    /// Documents matching `filter`, in insertion order.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StorageError>;

    /// Overwrite an existing document. Returns `false` when `id` is unknown.
    async fn replace(&self, collection: &str, id: &str, doc: Value)
    -> Result<bool, StorageError>;

    /// Overwrite a document only while its stored `field` still reads
    /// `expected`. Returns `false` when `id` is unknown or the field has
    /// moved on.
    async fn replace_if(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        expected: &str,
        doc: Value,
    ) -> Result<bool, StorageError>;

    /// Remove a document. Returns `false` when `id` is unknown.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StorageError>;

    /// Number of documents in a collection.
    async fn count(&self, collection: &str) -> Result<u64, StorageError>;

    /// Check the backend is reachable.
    async fn ping(&self) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_filter_matches_text_forms() {
        let doc = json!({"storeId": "store_1", "featured": true, "stock": 3, "note": null});

        assert!(Filter::all().matches(&doc));
        assert!(Filter::all().eq("storeId", "store_1").matches(&doc));
        assert!(Filter::all().eq("featured", true).matches(&doc));
        assert!(Filter::all().eq("stock", 3).matches(&doc));
        assert!(
            Filter::all()
                .eq("storeId", "store_1")
                .eq("featured", true)
                .matches(&doc)
        );

        assert!(!Filter::all().eq("storeId", "store_2").matches(&doc));
        assert!(!Filter::all().eq("featured", false).matches(&doc));
        assert!(!Filter::all().eq("note", "null").matches(&doc));
        assert!(!Filter::all().eq("missing", "x").matches(&doc));
    }
}
