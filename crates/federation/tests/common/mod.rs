//! Test infrastructure for the federation engine.
//!
//! A scripted [`MockBackendClient`], a store wrapper that records query state
//! transitions, and response builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};

use optigate_federation::client::{BackendFailure, FailureKind, request_url};
use optigate_federation::models::{Database, EntryListResponse, ErrorResponse, OptimadeError};
use optigate_federation::{
    BackendClient, BackendResponse, EntryEndpoint, GatewaySettings, QueryService, RequestTarget,
    ResponseSchema, Resources,
};
use optigate_persistence::backends::memory::MemoryStore;
use optigate_persistence::types::{
    Collection, DocumentFilter, FieldUpdate, FindResult, Pagination, StoredDocument,
};
use optigate_persistence::{ResourceStore, StoreResult};

/// One scripted answer.
#[derive(Clone)]
struct Scripted {
    delay: Option<Duration>,
    response: BackendResponse,
}

/// A backend client answering from a script.
///
/// Answers are looked up by exact request URL first, then by database id.
/// Unscripted requests fail with a transport error.
#[derive(Default)]
pub struct MockBackendClient {
    by_database: Mutex<HashMap<String, Scripted>>,
    by_url: Mutex<HashMap<String, Scripted>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl MockBackendClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every request to `database_id` with `response`.
    pub fn respond(&self, database_id: &str, response: BackendResponse) -> &Self {
        self.by_database.lock().insert(
            database_id.to_string(),
            Scripted {
                delay: None,
                response,
            },
        );
        self
    }

    /// Like [`respond`](Self::respond), after sleeping `delay`.
    pub fn respond_after(&self, database_id: &str, delay: Duration, response: BackendResponse) -> &Self {
        self.by_database.lock().insert(
            database_id.to_string(),
            Scripted {
                delay: Some(delay),
                response,
            },
        );
        self
    }

    /// Answers requests to exactly `url` with `response`.
    pub fn respond_to_url(&self, url: &str, response: BackendResponse) -> &Self {
        self.by_url.lock().insert(
            url.to_string(),
            Scripted {
                delay: None,
                response,
            },
        );
        self
    }

    /// Requests made so far, as `(database_id, url)`.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().clone()
    }

    /// The URL requested from `database_id`, if exactly one was made.
    pub fn request_to(&self, database_id: &str) -> Option<String> {
        let requests: Vec<String> = self
            .requests()
            .into_iter()
            .filter(|(db, _)| db == database_id)
            .map(|(_, url)| url)
            .collect();
        match requests.as_slice() {
            [url] => Some(url.clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl BackendClient for MockBackendClient {
    async fn get(
        &self,
        database: &Database,
        endpoint: EntryEndpoint,
        _schema: ResponseSchema,
        target: &RequestTarget,
    ) -> BackendResponse {
        let url = request_url(database, endpoint, target);
        self.requests
            .lock()
            .push((database.id.clone(), url.clone()));

        let scripted = self
            .by_url
            .lock()
            .get(&url)
            .cloned()
            .or_else(|| self.by_database.lock().get(&database.id).cloned());
        let Some(scripted) = scripted else {
            return BackendResponse::Failure(BackendFailure {
                kind: FailureKind::Transport,
                url,
                detail: "connection refused".to_string(),
            });
        };
        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        scripted.response
    }
}

/// A successful listing of `ids` with the given entry type.
pub fn listing(entry_type: &str, ids: &[&str], more: bool, next: Option<&str>) -> BackendResponse {
    let data: Vec<Value> = ids
        .iter()
        .map(|id| json!({"id": id, "type": entry_type, "attributes": {"nelements": 2}}))
        .collect();
    let mut meta = Map::new();
    meta.insert("more_data_available".to_string(), json!(more));
    meta.insert("data_returned".to_string(), json!(ids.len()));
    meta.insert(
        "data_available".to_string(),
        json!(if more { ids.len() * 10 } else { ids.len() }),
    );
    BackendResponse::Success(EntryListResponse {
        data,
        meta,
        links: Some(json!({"next": next})),
    })
}

/// A successful `structures` listing.
pub fn structures(ids: &[&str], more: bool) -> BackendResponse {
    listing("structures", ids, more, None)
}

/// An upstream OPTIMADE error document.
pub fn upstream_error(status: &str, detail: &str) -> BackendResponse {
    BackendResponse::Error(ErrorResponse {
        errors: vec![OptimadeError {
            status: Some(status.to_string()),
            title: Some("Upstream Error".to_string()),
            detail: Some(detail.to_string()),
            ..OptimadeError::default()
        }],
        meta: json!({"more_data_available": false}),
    })
}

/// A body that was not JSON.
pub fn json_failure(url: &str) -> BackendResponse {
    BackendResponse::Failure(BackendFailure {
        kind: FailureKind::JsonDecode,
        url: url.to_string(),
        detail: "expected value at line 1 column 1".to_string(),
    })
}

/// A store that records every `state` written to a query.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    states: Mutex<HashMap<String, Vec<String>>>,
}

impl RecordingStore {
    /// States written to `query_id`, in order.
    pub fn states_of(&self, query_id: &str) -> Vec<String> {
        self.states
            .lock()
            .get(query_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResourceStore for RecordingStore {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn create(&self, collection: Collection, document: Value) -> StoreResult<StoredDocument> {
        let stored = self.inner.create(collection, document).await?;
        if collection == Collection::Queries {
            if let Some(state) = stored.content().get("state").and_then(Value::as_str) {
                self.states
                    .lock()
                    .entry(stored.id().to_string())
                    .or_default()
                    .push(state.to_string());
            }
        }
        Ok(stored)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        pagination: Pagination,
    ) -> StoreResult<FindResult> {
        self.inner.find(collection, filter, pagination).await
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: &str,
        updates: &[FieldUpdate],
    ) -> StoreResult<StoredDocument> {
        let stored = self.inner.update_fields(collection, id, updates).await?;
        for update in updates {
            if let FieldUpdate::Set { path, value } = update {
                if path == "state" {
                    self.states
                        .lock()
                        .entry(id.to_string())
                        .or_default()
                        .push(value.as_str().unwrap_or_default().to_string());
                }
            }
        }
        Ok(stored)
    }

    async fn count(&self, collection: Collection, filter: Option<&DocumentFilter>) -> StoreResult<u64> {
        self.inner.count(collection, filter).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        self.inner.delete(collection, id).await
    }
}

/// A memory store whose lookups answer only after `lag`.
pub struct LaggingStore {
    inner: MemoryStore,
    lag: Duration,
}

impl LaggingStore {
    pub fn new(lag: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            lag,
        }
    }
}

#[async_trait]
impl ResourceStore for LaggingStore {
    fn backend_name(&self) -> &'static str {
        "lagging"
    }

    async fn create(&self, collection: Collection, document: Value) -> StoreResult<StoredDocument> {
        self.inner.create(collection, document).await
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
        pagination: Pagination,
    ) -> StoreResult<FindResult> {
        let found = self.inner.find(collection, filter, pagination).await;
        tokio::time::sleep(self.lag).await;
        found
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: &str,
        updates: &[FieldUpdate],
    ) -> StoreResult<StoredDocument> {
        self.inner.update_fields(collection, id, updates).await
    }

    async fn count(&self, collection: Collection, filter: Option<&DocumentFilter>) -> StoreResult<u64> {
        self.inner.count(collection, filter).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        self.inner.delete(collection, id).await
    }
}

/// A query service over a fresh recording store and the given client.
pub fn service(client: Arc<MockBackendClient>) -> (QueryService, Arc<RecordingStore>) {
    let store = Arc::new(RecordingStore::default());
    let service = QueryService::new(
        Resources::new(store.clone()),
        client,
        GatewaySettings::for_testing(),
    );
    (service, store)
}

/// Registers child databases named `ids` at `https://<id>.example.org`.
pub async fn register_databases(resources: &Resources, ids: &[&str]) -> Vec<Database> {
    let mut databases = Vec::new();
    for id in ids {
        let database = Database::new(*id, format!("https://{}.example.org", id));
        databases.push(resources.insert_database(&database).await.unwrap());
    }
    databases
}

/// Polls until the query is finished, failing after two seconds.
pub async fn wait_until_finished(service: &QueryService, query_id: &str) {
    for _ in 0..200 {
        let query = service.resources().get_query(query_id).await.unwrap();
        if query.state == optigate_federation::models::QueryState::Finished {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("query {} did not finish", query_id);
}
