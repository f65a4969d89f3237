//! Core resource store trait.
//!
//! This module defines the [`ResourceStore`] trait, the generic document
//! store contract the gateway needs for its three collections. Any engine
//! able to create, find, partially update and count JSON documents can back
//! the gateway.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::types::{Collection, DocumentFilter, FieldUpdate, FindResult, Pagination, StoredDocument};

/// Core storage trait for gateway resources.
///
/// # Atomicity
///
/// Each `update_fields` call applies its whole batch of [`FieldUpdate`]s
/// atomically and stamps `last_modified`. There is no coupling between
/// separate calls: callers that hold an in-memory copy of a document must
/// refresh it themselves.
///
/// # Ordering
///
/// `find` returns documents in insertion order.
///
/// # Example
///
/// ```ignore
/// use optigate_persistence::core::ResourceStore;
/// use optigate_persistence::types::{Collection, DocumentFilter, FieldUpdate};
///
/// async fn example<S: ResourceStore>(store: &S) -> StoreResult<()> {
///     let doc = store
///         .create(Collection::Queries, serde_json::json!({"state": "created"}))
///         .await?;
///
///     store
///         .update_fields(
///             Collection::Queries,
///             doc.id(),
///             &[FieldUpdate::set("state", "started")],
///         )
///         .await?;
///
///     let reloaded = store
///         .get_one(Collection::Queries, &DocumentFilter::by_id(doc.id()))
///         .await?;
///     assert_eq!(reloaded.content()["state"], "started");
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Creates a new document.
    ///
    /// The document's `id` field is used when present, otherwise a UUID is
    /// assigned.
    ///
    /// # Errors
    ///
    /// * `StoreError::AlreadyExists` - If a document with the same id exists
    /// * `StoreError::Document` - If the document is not a JSON object
    async fn create(&self, collection: Collection, document: Value)
    -> StoreResult<StoredDocument>;

    /// Finds the documents matching `filter`, paginated.
    async fn find(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        pagination: Pagination,
    ) -> StoreResult<FindResult>;

    /// Applies a batch of field updates to one document, atomically.
    ///
    /// Returns the document as it is after the update.
    ///
    /// # Errors
    ///
    /// * `StoreError::NotFound` - If no document has the given id
    /// * `StoreError::Document` - If an update cannot be applied
    async fn update_fields(
        &self,
        collection: Collection,
        id: &str,
        updates: &[FieldUpdate],
    ) -> StoreResult<StoredDocument>;

    /// Counts the documents matching `filter` (all documents when `None`).
    async fn count(&self, collection: Collection, filter: Option<&DocumentFilter>)
    -> StoreResult<u64>;

    /// Deletes one document.
    ///
    /// The gateway never deletes resources on its own; this exists for
    /// operators and test harnesses.
    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()>;

    /// Returns the first document matching `filter`.
    ///
    /// # Errors
    ///
    /// * `StoreError::NotFound` - If the filter is an id lookup that matched nothing
    /// * `StoreError::NoMatch` - If any other filter matched nothing
    async fn get_one(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> StoreResult<StoredDocument> {
        let found = self
            .find(collection, filter, Pagination::new(1, 0))
            .await?;
        found
            .items
            .into_iter()
            .next()
            .ok_or_else(|| not_found_for(collection, filter))
    }

    /// Checks whether a document with the given id exists.
    async fn exists(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let count = self
            .count(collection, Some(&DocumentFilter::by_id(id)))
            .await?;
        Ok(count > 0)
    }
}

/// Builds the not-found error for a filter that matched nothing.
pub(crate) fn not_found_for(collection: Collection, filter: &DocumentFilter) -> StoreError {
    match filter {
        DocumentFilter::Eq { path, value } if path == "id" => StoreError::NotFound {
            collection,
            id: value
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| value.to_string()),
        },
        _ => StoreError::NoMatch {
            collection,
            filter: filter.to_string(),
        },
    }
}

/// Extracts the id of a new document, assigning a UUID when absent.
pub(crate) fn document_id(document: &Value) -> String {
    document
        .get("id")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
