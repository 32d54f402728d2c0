//! `PostgreSQL` document store.
//!
//! All collections share the `documents` table; the JSON body lives in a
//! `jsonb` column and filters compare `data->>field` text. Queries are
//! built at runtime since the statements are generic over collections.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{DocumentStore, Filter, StorageError};

/// Document store over a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, collection: &str, id: &str, doc: Value) -> Result<(), StorageError> {
        let result = sqlx::query(
            r"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(doc))
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, format!("{collection}/{id}")))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict(format!("{collection}/{id}")));
        }
        Ok(())
    }

    async fn insert_unique(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        doc: Value,
    ) -> Result<(), StorageError> {
        // Unique indexes (stores.subdomain) close the gap between the
        // NOT EXISTS check and the insert.
        let result = sqlx::query(
            r"
            INSERT INTO documents (collection, id, data)
            SELECT $1, $2, $3
            WHERE NOT EXISTS (
                SELECT 1 FROM documents
                WHERE collection = $1 AND data->>$4 = $3::jsonb->>$4
            )
            ON CONFLICT (collection, id) DO NOTHING
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(doc))
        .bind(field)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, format!("{collection}.{field}")))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict(format!("{collection}/{id} ({field})")));
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StorageError> {
        let row: Option<Json<Value>> = sqlx::query_scalar(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StorageError> {
        let mut query =
            QueryBuilder::<Postgres>::new("SELECT data FROM documents WHERE collection = ");
        query.push_bind(collection.to_owned());
        for (field, value) in filter.conditions() {
            query
                .push(" AND data->>")
                .push_bind(field.clone())
                .push(" = ")
                .push_bind(value.clone());
        }
        query.push(" ORDER BY seq");

        let rows: Vec<Json<Value>> = query
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r"
            UPDATE documents
            SET data = $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(doc))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace_if(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        expected: &str,
        doc: Value,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r"
            UPDATE documents
            SET data = $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2 AND data->>$4 = $5
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(doc))
        .bind(field)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, collection: &str) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = $1")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count)
            .map_err(|_| StorageError::DataCorruption(format!("negative count {count}")))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// A unique index rejecting a write is an answer, not a backend failure.
fn unique_violation(err: sqlx::Error, what: String) -> StorageError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict(what),
        _ => StorageError::Database(err),
    }
}
