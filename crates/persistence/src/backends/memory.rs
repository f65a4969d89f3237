//! In-memory resource store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::core::ResourceStore;
use crate::core::store::document_id;
use crate::error::{DocumentError, StoreError, StoreResult};
use crate::types::{
    Collection, DocumentFilter, FieldUpdate, FindResult, Pagination, StoredDocument, apply_updates,
};

#[derive(Debug, Default)]
struct CollectionData {
    documents: Vec<StoredDocument>,
    index: HashMap<String, usize>,
}

impl CollectionData {
    fn reindex(&mut self) {
        self.index = self
            .documents
            .iter()
            .enumerate()
            .map(|(pos, doc)| (doc.id().to_string(), pos))
            .collect();
    }
}

/// A process-local resource store.
///
/// Documents live in insertion order behind a single read-write lock, so every
/// `update_fields` call is serialized against all other writers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, CollectionData>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
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

        let mut collections = self.collections.write();
        let data = collections.entry(collection).or_default();
        if data.index.contains_key(&id) {
            return Err(StoreError::AlreadyExists { collection, id });
        }

        let stored = StoredDocument::new(collection, id.clone(), document);
        data.index.insert(id.clone(), data.documents.len());
        data.documents.push(stored.clone());
        debug!(collection = %collection, id = %id, "Created document");
        Ok(stored)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        pagination: Pagination,
    ) -> StoreResult<FindResult> {
        let collections = self.collections.read();
        let matches: Vec<StoredDocument> = collections
            .get(&collection)
            .map(|data| {
                data.documents
                    .iter()
                    .filter(|doc| filter.matches(doc.content()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

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
        let mut collections = self.collections.write();
        let not_found = || StoreError::NotFound {
            collection,
            id: id.to_string(),
        };
        let data = collections.get_mut(&collection).ok_or_else(not_found)?;
        let pos = *data.index.get(id).ok_or_else(not_found)?;
        let stored = &mut data.documents[pos];

        let mut content = stored.content().clone();
        apply_updates(&mut content, updates)?;
        stored.replace_content(content, Utc::now());
        Ok(stored.clone())
    }

    async fn count(
        &self,
        collection: Collection,
        filter: Option<&DocumentFilter>,
    ) -> StoreResult<u64> {
        let collections = self.collections.read();
        let count = collections
            .get(&collection)
            .map(|data| match filter {
                Some(filter) => data
                    .documents
                    .iter()
                    .filter(|doc| filter.matches(doc.content()))
                    .count(),
                None => data.documents.len(),
            })
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        let mut collections = self.collections.write();
        let removed = collections.get_mut(&collection).and_then(|data| {
            let pos = data.index.get(id).copied()?;
            data.documents.remove(pos);
            data.reindex();
            Some(())
        });
        removed.ok_or_else(|| StoreError::NotFound {
            collection,
            id: id.to_string(),
        })
    }
}
