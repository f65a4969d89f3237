//! ResourceStore implementation for SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};
use serde_json::Value;
use tracing::debug;

use crate::core::ResourceStore;
use crate::core::store::document_id;
use crate::error::{BackendError, DocumentError, StoreError, StoreResult};
use crate::types::{
    Collection, DocumentFilter, FieldUpdate, FindResult, Pagination, StoredDocument, apply_updates,
};

use super::SqliteStore;

/// Raw row as loaded from the `documents` table.
struct DocumentRow {
    id: String,
    data: String,
    created_at: String,
    last_modified: String,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            data: row.get(1)?,
            created_at: row.get(2)?,
            last_modified: row.get(3)?,
        })
    }

    fn into_document(self, collection: Collection) -> StoreResult<StoredDocument> {
        let content: Value = serde_json::from_str(&self.data)?;
        Ok(StoredDocument::from_storage(
            collection,
            self.id,
            content,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.last_modified)?,
        ))
    }
}

fn parse_timestamp(value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            StoreError::Backend(BackendError::SerializationError {
                message: format!("invalid timestamp '{}': {}", value, e),
            })
        })
}

impl SqliteStore {
    /// Loads the candidate documents for a filter, in insertion order.
    ///
    /// Id lookups are answered by the unique index; every other filter is
    /// evaluated in process over the collection.
    fn load_candidates(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> StoreResult<Vec<StoredDocument>> {
        let conn = self.get_connection()?;

        let rows: Vec<DocumentRow> = match filter {
            DocumentFilter::Eq { path, value } if path == "id" => {
                let Some(id) = value.as_str() else {
                    return Ok(Vec::new());
                };
                let mut stmt = conn.prepare(
                    "SELECT id, data, created_at, last_modified FROM documents
                     WHERE collection = ?1 AND id = ?2",
                )?;
                let rows = stmt
                    .query_map(params![collection.as_str(), id], DocumentRow::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            _ => {
                let mut stmt = conn.prepare(
                    "SELECT id, data, created_at, last_modified FROM documents
                     WHERE collection = ?1 ORDER BY seq",
                )?;
                let rows = stmt
                    .query_map(params![collection.as_str()], DocumentRow::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let document = row.into_document(collection)?;
            if filter.matches(document.content()) {
                documents.push(document);
            }
        }
        Ok(documents)
    }
}

#[async_trait]
impl ResourceStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn create(
        &self,
        collection: Collection,
        document: Value,
    ) -> StoreResult<StoredDocument> {
        if !document.is_object() {
            return Err(DocumentError::NotAnObject { collection }.into());
        }
        let id = document_id(&document);
        let conn = self.get_connection()?;

        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if exists {
            return Err(StoreError::AlreadyExists { collection, id });
        }

        let stored = StoredDocument::new(collection, id.clone(), document);
        let data = serde_json::to_string(stored.content())?;
        conn.execute(
            "INSERT INTO documents (collection, id, data, created_at, last_modified)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                collection.as_str(),
                id,
                data,
                stored.created_at().to_rfc3339(),
                stored.last_modified().to_rfc3339(),
            ],
        )?;

        debug!(collection = %collection, id = %id, "Created document");
        Ok(stored)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        pagination: Pagination,
    ) -> StoreResult<FindResult> {
        let matches = self.load_candidates(collection, filter)?;
        let total = matches.len() as u64;
        let (items, more_available) = pagination.apply(matches);
        Ok(FindResult {
            items,
            total,
            more_available,
        })
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: &str,
        updates: &[FieldUpdate],
    ) -> StoreResult<StoredDocument> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        let row = tx
            .query_row(
                "SELECT id, data, created_at, last_modified FROM documents
                 WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id],
                DocumentRow::from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;

        let mut stored = row.into_document(collection)?;
        let mut content = stored.content().clone();
        apply_updates(&mut content, updates)?;
        let now = Utc::now();
        stored.replace_content(content, now);

        tx.execute(
            "UPDATE documents SET data = ?1, last_modified = ?2
             WHERE collection = ?3 AND id = ?4",
            params![
                serde_json::to_string(stored.content())?,
                now.to_rfc3339(),
                collection.as_str(),
                id,
            ],
        )?;
        tx.commit()?;

        Ok(stored)
    }

    async fn count(
        &self,
        collection: Collection,
        filter: Option<&DocumentFilter>,
    ) -> StoreResult<u64> {
        match filter {
            None | Some(DocumentFilter::All) => {
                let conn = self.get_connection()?;
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                    params![collection.as_str()],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            }
            Some(filter) => Ok(self.load_candidates(collection, filter)?.len() as u64),
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        let conn = self.get_connection()?;
        let affected = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection.as_str(), id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store.init_schema().unwrap();
        store
    }

    #[tokio::test]
    async fn test_create_and_find_by_id() {
        let store = store();
        store
            .create(Collection::Databases, json!({"id": "db1", "base_url": "http://a"}))
            .await
            .unwrap();
        let found = store
            .get_one(Collection::Databases, &DocumentFilter::by_id("db1"))
            .await
            .unwrap();
        assert_eq!(found.content()["base_url"], "http://a");
    }

    #[tokio::test]
    async fn test_same_id_in_different_collections() {
        let store = store();
        store
            .create(Collection::Databases, json!({"id": "x"}))
            .await
            .unwrap();
        store
            .create(Collection::Gateways, json!({"id": "x"}))
            .await
            .unwrap();
        assert_eq!(store.count(Collection::Databases, None).await.unwrap(), 1);
        assert_eq!(store.count(Collection::Gateways, None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_fields_persists() {
        let store = store();
        store
            .create(Collection::Queries, json!({"id": "q", "state": "created"}))
            .await
            .unwrap();
        store
            .update_fields(
                Collection::Queries,
                "q",
                &[
                    FieldUpdate::set("state", "started"),
                    FieldUpdate::increment("response.meta.data_returned", 4),
                ],
            )
            .await
            .unwrap();
        let reloaded = store
            .get_one(Collection::Queries, &DocumentFilter::by_id("q"))
            .await
            .unwrap();
        assert_eq!(reloaded.content()["state"], "started");
        assert_eq!(reloaded.content()["response"]["meta"]["data_returned"], 4);
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = store();
        let result = store
            .update_fields(Collection::Queries, "nope", &[FieldUpdate::set("a", 1)])
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
