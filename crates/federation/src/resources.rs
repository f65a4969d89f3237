//! Typed access to the three gateway collections.
//!
//! Resources are stored flat (`id`, `type`, `last_modified` and attributes
//! side by side). [`Resources`] converts between those documents and the
//! models, so the rest of the engine never handles raw store documents.

use std::sync::Arc;

use optigate_persistence::types::{
    Collection, DocumentFilter, FieldUpdate, Pagination, StoredDocument,
};
use optigate_persistence::ResourceStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{FederationError, FederationResult};
use crate::models::{Database, Gateway, QueryResource};

/// A page of typed resources.
#[derive(Debug, Clone)]
pub struct ResourcePage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub more_available: bool,
}

/// Typed collections over a shared [`ResourceStore`].
#[derive(Clone)]
pub struct Resources {
    store: Arc<dyn ResourceStore>,
}

impl Resources {
    /// Wraps a store.
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    /// Entry `type` of the resources held in a collection.
    pub fn entry_type(collection: Collection) -> &'static str {
        match collection {
            Collection::Databases => "links",
            Collection::Gateways => "gateways",
            Collection::Queries => "queries",
        }
    }

    async fn insert<T: Serialize + DeserializeOwned>(
        &self,
        collection: Collection,
        resource: &T,
    ) -> FederationResult<T> {
        let mut document = serde_json::to_value(resource)?;
        if let Some(obj) = document.as_object_mut() {
            obj.insert(
                "type".to_string(),
                Value::String(Self::entry_type(collection).to_string()),
            );
        }
        let stored = self.store.create(collection, document).await?;
        decode(stored)
    }

    async fn get<T: DeserializeOwned>(&self, collection: Collection, id: &str) -> FederationResult<T> {
        let stored = self
            .store
            .get_one(collection, &DocumentFilter::by_id(id))
            .await?;
        decode(stored)
    }

    async fn find<T: DeserializeOwned>(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        pagination: Pagination,
    ) -> FederationResult<ResourcePage<T>> {
        let found = self.store.find(collection, filter, pagination).await?;
        let items = found
            .items
            .into_iter()
            .map(decode)
            .collect::<FederationResult<Vec<T>>>()?;
        Ok(ResourcePage {
            items,
            total: found.total,
            more_available: found.more_available,
        })
    }

    /// Registers a database.
    pub async fn insert_database(&self, database: &Database) -> FederationResult<Database> {
        self.insert(Collection::Databases, database).await
    }

    /// Loads a database by id.
    pub async fn get_database(&self, id: &str) -> FederationResult<Database> {
        self.get(Collection::Databases, id).await
    }

    /// Lists databases.
    pub async fn find_databases(
        &self,
        filter: &DocumentFilter,
        pagination: Pagination,
    ) -> FederationResult<ResourcePage<Database>> {
        self.find(Collection::Databases, filter, pagination).await
    }

    /// Whether a database with this base URL is registered, in either link form.
    pub async fn database_base_url_registered(&self, base_url: &str) -> FederationResult<bool> {
        for path in ["base_url", "base_url.href"] {
            let count = self
                .store
                .count(
                    Collection::Databases,
                    Some(&DocumentFilter::eq(path, base_url)),
                )
                .await?;
            if count > 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Persists a new gateway.
    pub async fn insert_gateway(&self, gateway: &Gateway) -> FederationResult<Gateway> {
        self.insert(Collection::Gateways, gateway).await
    }

    /// Loads a gateway by id.
    pub async fn get_gateway(&self, id: &str) -> FederationResult<Gateway> {
        self.get(Collection::Gateways, id).await
    }

    /// Lists gateways.
    pub async fn find_gateways(
        &self,
        filter: &DocumentFilter,
        pagination: Pagination,
    ) -> FederationResult<ResourcePage<Gateway>> {
        self.find(Collection::Gateways, filter, pagination).await
    }

    /// Persists a new query.
    pub async fn insert_query(&self, query: &QueryResource) -> FederationResult<QueryResource> {
        self.insert(Collection::Queries, query).await
    }

    /// Loads a query by id.
    pub async fn get_query(&self, id: &str) -> FederationResult<QueryResource> {
        self.get(Collection::Queries, id).await
    }

    /// Lists queries.
    pub async fn find_queries(
        &self,
        filter: &DocumentFilter,
        pagination: Pagination,
    ) -> FederationResult<ResourcePage<QueryResource>> {
        self.find(Collection::Queries, filter, pagination).await
    }

    /// Applies field updates to a query, atomically.
    pub async fn update_query(
        &self,
        id: &str,
        updates: &[FieldUpdate],
    ) -> FederationResult<QueryResource> {
        let stored = self
            .store
            .update_fields(Collection::Queries, id, updates)
            .await?;
        decode(stored)
    }

    /// Loads a raw document by id, for rendering.
    pub async fn get_document(
        &self,
        collection: Collection,
        id: &str,
    ) -> FederationResult<StoredDocument> {
        Ok(self
            .store
            .get_one(collection, &DocumentFilter::by_id(id))
            .await?)
    }
}

fn decode<T: DeserializeOwned>(stored: StoredDocument) -> FederationResult<T> {
    let id = stored.id().to_string();
    serde_json::from_value(stored.into_content()).map_err(|e| {
        FederationError::Internal(format!("stored resource '{}' is malformed: {}", id, e))
    })
}
