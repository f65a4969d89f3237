//! Test harness for the gateway HTTP surface.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};

use optigate_federation::client::{BackendFailure, FailureKind, request_url};
use optigate_federation::models::{Database, EntryListResponse, ErrorResponse, OptimadeError};
use optigate_federation::{
    BackendClient, BackendResponse, EntryEndpoint, RequestTarget, ResponseSchema, Resources,
};
use optigate_persistence::ResourceStore;
use optigate_persistence::backends::memory::MemoryStore;
use optigate_rest::{ServerConfig, create_app_with_client};

/// A backend client answering per database id from a script.
#[derive(Default)]
pub struct ScriptedBackends {
    answers: Mutex<HashMap<String, (Duration, BackendResponse)>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedBackends {
    pub fn answer(&self, database_id: &str, response: BackendResponse) {
        self.answer_after(database_id, Duration::ZERO, response);
    }

    pub fn answer_after(&self, database_id: &str, delay: Duration, response: BackendResponse) {
        self.answers
            .lock()
            .insert(database_id.to_string(), (delay, response));
    }

    /// URLs requested so far.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

#[async_trait]
impl BackendClient for ScriptedBackends {
    async fn get(
        &self,
        database: &Database,
        endpoint: EntryEndpoint,
        _schema: ResponseSchema,
        target: &RequestTarget,
    ) -> BackendResponse {
        let url = request_url(database, endpoint, target);
        self.urls.lock().push(url.clone());
        let answer = self.answers.lock().get(&database.id).cloned();
        match answer {
            Some((delay, response)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            None => BackendResponse::Failure(BackendFailure {
                kind: FailureKind::Transport,
                url,
                detail: "connection refused".to_string(),
            }),
        }
    }
}

/// A `structures` listing of `ids`.
pub fn structures(ids: &[&str], more: bool) -> BackendResponse {
    let data = ids
        .iter()
        .map(|id| json!({"id": id, "type": "structures", "attributes": {"nelements": 2}}))
        .collect();
    let mut meta = Map::new();
    meta.insert("more_data_available".to_string(), json!(more));
    meta.insert("data_returned".to_string(), json!(ids.len()));
    BackendResponse::Success(EntryListResponse {
        data,
        meta,
        links: None,
    })
}

/// An upstream OPTIMADE error document.
pub fn upstream_error(status: &str) -> BackendResponse {
    BackendResponse::Error(ErrorResponse {
        errors: vec![OptimadeError {
            status: Some(status.to_string()),
            title: Some("Upstream Error".to_string()),
            detail: Some("rejected by backend".to_string()),
            ..OptimadeError::default()
        }],
        meta: json!({}),
    })
}

/// A test server over a fresh store and scripted backends.
pub struct RestTestHarness {
    pub server: TestServer,
    pub store: Arc<dyn ResourceStore>,
    pub backends: Arc<ScriptedBackends>,
    pub config: ServerConfig,
}

impl RestTestHarness {
    /// A harness over an in-memory store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// A harness over the given store.
    pub fn with_store(store: Arc<dyn ResourceStore>) -> Self {
        let config = ServerConfig::for_testing();
        let backends = Arc::new(ScriptedBackends::default());
        let app = create_app_with_client(store.clone(), backends.clone(), config.clone());
        let server = TestServer::new(app).expect("Failed to create test server");
        Self {
            server,
            store,
            backends,
            config,
        }
    }

    /// Registers child databases named `ids` at `https://<id>.example.org`.
    pub async fn register(&self, ids: &[&str]) {
        let resources = Resources::new(self.store.clone());
        for id in ids {
            let db = Database::new(*id, format!("https://{}.example.org", id));
            resources.insert_database(&db).await.unwrap();
        }
    }

    /// Polls `GET /queries/{id}` until the query is finished.
    pub async fn wait_until_finished(&self, query_id: &str) -> Value {
        for _ in 0..200 {
            let body: Value = self
                .server
                .get(&format!("/queries/{}", query_id))
                .await
                .json();
            if body["data"]["attributes"]["state"] == "finished" {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("query {} did not finish", query_id);
    }
}
