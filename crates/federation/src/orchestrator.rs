//! Query orchestrator: concurrent fan-out and response merging.
//!
//! One task per constituent database runs on a [`JoinSet`], bounded by a
//! semaphore. Outcomes are folded on the calling task in completion order,
//! so the accumulators below need no locking. Progress is persisted on the
//! query as it happens: `response.data.<database_id>` is set per backend and
//! the counters are incremented in the same atomic update.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use optigate_persistence::types::FieldUpdate;
use serde_json::{Map, Value, json};
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{debug, info, warn};
use url::Url;

use crate::client::{BackendClient, BackendResponse, GATEWAY_ERROR_PREFIX, RequestTarget};
use crate::endpoint::ResponseSchema;
use crate::error::FederationResult;
use crate::filter;
use crate::models::{
    Gateway, GatewayQueryResponse, MergedResponse, OptimadeError, OptimadeWarning, QueryResource,
    QueryState, ResponseMeta,
};
use crate::resources::Resources;
use crate::settings::GatewaySettings;

/// Runs queries against every database of their gateway.
#[derive(Clone)]
pub struct QueryOrchestrator {
    resources: Resources,
    client: Arc<dyn BackendClient>,
    settings: GatewaySettings,
}

/// Merge state of one run, owned by the coordinating task.
#[derive(Default)]
struct Accumulator {
    data: Map<String, Value>,
    errors: Vec<OptimadeError>,
    warnings: Vec<OptimadeWarning>,
    data_returned: u64,
    data_available: u64,
    more_data_available: bool,
}

impl QueryOrchestrator {
    /// Creates an orchestrator.
    pub fn new(
        resources: Resources,
        client: Arc<dyn BackendClient>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            resources,
            client,
            settings,
        }
    }

    /// Runs `query` against every database of `gateway`.
    ///
    /// `links_base` is the URL the merged response is served at; its
    /// `page_offset` is advanced to build the `next` link. The query moves
    /// through `started`, `in progress` and `finished`, and the merged
    /// response is persisted on it before it is returned.
    pub async fn run(
        &self,
        gateway: &Gateway,
        query: &QueryResource,
        links_base: &str,
    ) -> FederationResult<MergedResponse> {
        let schema = ResponseSchema::for_endpoint(query.endpoint);
        let database_ids = gateway.database_ids();
        let rewrite = filter::rewrite(&database_ids, query.query_parameters.filter.as_deref());

        let mut meta = ResponseMeta::for_request(representation(links_base));
        meta.data_available = Some(0);
        meta.warnings = rewrite.warnings.clone();
        let initial = GatewayQueryResponse {
            meta: meta.clone(),
            ..GatewayQueryResponse::default()
        };
        self.resources
            .update_query(
                &query.id,
                &[
                    FieldUpdate::set("state", QueryState::Started.as_str()),
                    FieldUpdate::set("response", serde_json::to_value(&initial)?),
                ],
            )
            .await?;
        debug!(query = %query.id, databases = database_ids.len(), "Query started");

        let permits = Arc::new(Semaphore::new(self.settings.worker_count(database_ids.len())));
        let mut tasks: JoinSet<(String, BackendResponse)> = JoinSet::new();
        let mut task_databases: HashMap<Id, String> = HashMap::new();
        for database in &gateway.databases {
            let client = Arc::clone(&self.client);
            let permits = Arc::clone(&permits);
            let database = database.clone();
            let endpoint = query.endpoint;
            let target = RequestTarget::Query(
                query
                    .query_parameters
                    .to_backend_query_string(rewrite.filter_for(&database.id)),
            );
            let database_id = database.id.clone();
            let handle = tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let response = client.get(&database, endpoint, schema, &target).await;
                (database.id, response)
            });
            task_databases.insert(handle.id(), database_id);
        }

        let mut acc = Accumulator {
            warnings: rewrite.warnings,
            ..Accumulator::default()
        };
        let mut in_progress = false;
        while let Some(joined) = tasks.join_next().await {
            if !in_progress {
                self.resources
                    .update_query(
                        &query.id,
                        &[FieldUpdate::set("state", QueryState::InProgress.as_str())],
                    )
                    .await?;
                in_progress = true;
            }

            let (database_id, response) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    let database_id = task_databases.remove(&e.id()).unwrap_or_default();
                    warn!(
                        query = %query.id,
                        database = %database_id,
                        error = %e,
                        "Task join error during federated query"
                    );
                    acc.warnings.push(OptimadeWarning::new(
                        "Backend Task Failed",
                        format!("{} (database: {})", e, database_id),
                    ));
                    continue;
                }
            };
            self.fold(gateway, query, &database_id, response, &mut acc)
                .await?;
        }

        let response = self.finish(query, links_base, meta, acc);
        let mut updates = vec![
            FieldUpdate::set("response.errors", serde_json::to_value(&response.errors)?),
            FieldUpdate::set("response.meta", serde_json::to_value(&response.meta)?),
            FieldUpdate::set("response.links", serde_json::to_value(&response.links)?),
        ];
        if !response.errors.is_empty() {
            updates.push(FieldUpdate::set("response.data", Value::Object(Map::new())));
        }
        self.resources.update_query(&query.id, &updates).await?;
        self.resources
            .update_query(
                &query.id,
                &[FieldUpdate::set("state", QueryState::Finished.as_str())],
            )
            .await?;

        info!(
            query = %query.id,
            gateway = %gateway.id,
            data_returned = response.meta.data_returned,
            errors = response.errors.len(),
            "Federated query finished"
        );
        Ok(response.to_merged())
    }

    /// Folds one backend outcome into the accumulator, persisting successes.
    async fn fold(
        &self,
        gateway: &Gateway,
        query: &QueryResource,
        database_id: &str,
        response: BackendResponse,
        acc: &mut Accumulator,
    ) -> FederationResult<()> {
        let response = match response {
            BackendResponse::Success(response) => response,
            other => {
                let errors = other
                    .into_error_response()
                    .map(|r| r.errors)
                    .unwrap_or_default();
                for error in errors {
                    self.fold_error(gateway, database_id, error, acc);
                }
                return Ok(());
            }
        };

        let data_returned = response.data_returned();
        let data_available = response.data_available().unwrap_or(0);
        let more = response.more_data_available();
        let entries: Vec<Value> = response
            .data
            .into_iter()
            .map(|entry| namespace_entry(database_id, entry))
            .collect();
        debug!(
            query = %query.id,
            database = %database_id,
            entries = entries.len(),
            more_data_available = more,
            "Backend answered"
        );

        let mut updates = vec![
            FieldUpdate::set(format!("response.data.{}", database_id), entries.clone()),
            FieldUpdate::increment("response.meta.data_available", data_available as i64),
            FieldUpdate::increment("response.meta.data_returned", data_returned as i64),
        ];
        if more {
            updates.push(FieldUpdate::set("response.meta.more_data_available", true));
        }
        self.resources.update_query(&query.id, &updates).await?;

        acc.data
            .insert(database_id.to_string(), Value::Array(entries));
        acc.data_returned += data_returned;
        acc.data_available += data_available;
        acc.more_data_available |= more;
        Ok(())
    }

    fn fold_error(
        &self,
        gateway: &Gateway,
        database_id: &str,
        mut error: OptimadeError,
        acc: &mut Accumulator,
    ) {
        let internal = error
            .id
            .as_deref()
            .is_some_and(|id| id.starts_with(GATEWAY_ERROR_PREFIX));
        if internal {
            let detail = error.detail.clone().unwrap_or_default();
            warn!(
                gateway = %gateway.id,
                database = %database_id,
                error_id = error.id.as_deref().unwrap_or_default(),
                detail = %detail,
                "Backend request failed"
            );
            let title = error
                .title
                .clone()
                .or_else(|| error.id.clone())
                .unwrap_or_default();
            acc.warnings.push(OptimadeWarning::new(
                title,
                format!("{} (database: {})", detail, database_id),
            ));
            return;
        }

        error.meta.get_or_insert_with(Map::new).insert(
            "optimade_gateway".to_string(),
            json!({
                "gateway": {"id": gateway.id, "type": "gateways"},
                "source_database_id": database_id,
            }),
        );
        acc.errors.push(error);
    }

    /// Builds the final response from the accumulated outcomes.
    fn finish(
        &self,
        query: &QueryResource,
        links_base: &str,
        mut meta: ResponseMeta,
        acc: Accumulator,
    ) -> GatewayQueryResponse {
        meta.data_returned = acc.data_returned;
        meta.data_available = Some(acc.data_available);
        meta.more_data_available = acc.more_data_available;
        meta.warnings = acc.warnings;
        meta.time_stamp = Some(Utc::now());

        if !acc.errors.is_empty() {
            return GatewayQueryResponse {
                data: Map::new(),
                errors: acc.errors,
                meta,
                links: None,
            };
        }

        let next = if acc.more_data_available {
            let entries: usize = acc
                .data
                .values()
                .filter_map(Value::as_array)
                .map(Vec::len)
                .sum();
            let page_limit = query
                .query_parameters
                .page_limit
                .unwrap_or(self.settings.default_page_limit);
            let offset = query.query_parameters.page_offset.unwrap_or(0) + entries.min(page_limit);
            next_link(links_base, offset)
        } else {
            None
        };

        GatewayQueryResponse {
            data: acc.data,
            errors: Vec::new(),
            meta,
            links: Some(json!({ "next": next })),
        }
    }
}

/// Rewrites an entry's id to `<database_id>/<id>`.
pub fn namespace_entry(database_id: &str, mut entry: Value) -> Value {
    if let Some(obj) = entry.as_object_mut() {
        let local = obj
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        obj.insert(
            "id".to_string(),
            Value::String(format!("{}/{}", database_id, local)),
        );
    }
    entry
}

/// `links_base` with its `page_offset` set to `offset`.
pub fn next_link(links_base: &str, offset: usize) -> Option<String> {
    let mut url = match Url::parse(links_base) {
        Ok(url) => url,
        Err(e) => {
            warn!(links_base = %links_base, error = %e, "Cannot build next link");
            return None;
        }
    };
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != "page_offset")
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("page_offset", &offset.to_string());
    Some(url.to_string())
}

fn representation(links_base: &str) -> String {
    match Url::parse(links_base) {
        Ok(url) => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        },
        Err(_) => links_base.to_string(),
    }
}
