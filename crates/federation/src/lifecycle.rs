//! Query lifecycle: submit federated queries and wait for their results.

use std::sync::Arc;
use std::time::Duration;

use optigate_persistence::types::{DocumentFilter, Pagination};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::client::BackendClient;
use crate::endpoint::{EntryEndpoint, ResponseSchema};
use crate::error::{FederationError, FederationResult};
use crate::models::{
    Database, Gateway, MergedResponse, QueryCreate, QueryParameters, QueryResource, QueryState,
    Search,
};
use crate::orchestrator::QueryOrchestrator;
use crate::registry::GatewayRegistry;
use crate::resources::Resources;
use crate::settings::GatewaySettings;

/// A query obtained from [`QueryService::submit`] or
/// [`QueryService::create_query`].
#[derive(Debug, Clone)]
pub struct SubmittedQuery {
    pub query: QueryResource,
    pub gateway: Gateway,
    /// Whether the query was created (and started) by this call.
    pub created: bool,
}

/// Result of waiting on a query.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// The query finished in time.
    Finished {
        response: MergedResponse,
        status: u16,
    },
    /// The query is still running; fetch it later from `location`.
    Redirect {
        location: String,
        query: QueryResource,
    },
}

/// Creates, runs and awaits federated queries.
#[derive(Clone)]
pub struct QueryService {
    resources: Resources,
    registry: GatewayRegistry,
    orchestrator: QueryOrchestrator,
    settings: GatewaySettings,
    /// Serializes query lookup and creation.
    query_lock: Arc<Mutex<()>>,
}

impl QueryService {
    /// Wires the service over a store and a backend client.
    pub fn new(
        resources: Resources,
        client: Arc<dyn BackendClient>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            registry: GatewayRegistry::new(resources.clone()),
            orchestrator: QueryOrchestrator::new(resources.clone(), client, settings.clone()),
            resources,
            settings,
            query_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The typed resource collections.
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// The gateway registry.
    pub fn registry(&self) -> &GatewayRegistry {
        &self.registry
    }

    /// The runtime settings.
    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Submits a search: resolves its databases, finds or creates the gateway
    /// and finds or creates the query.
    ///
    /// A new query is started on a detached task; a reused one is not re-run.
    ///
    /// # Errors
    ///
    /// * `FederationError::BadRequest` - If the search names no database or an
    ///   invalid URL
    /// * `FederationError::NotFound` - If a database id is not registered
    pub async fn submit(&self, search: Search, links_base: &str) -> FederationResult<SubmittedQuery> {
        search.validate()?;

        let mut databases =
            Vec::with_capacity(search.database_ids.len() + search.optimade_urls.len());
        for id in &search.database_ids {
            databases.push(self.resources.get_database(id).await?);
        }
        for url in &search.optimade_urls {
            databases.push(Database::from_optimade_url(url)?);
        }

        let (gateway, _) = self.registry.find_or_create(databases).await?;
        self.find_or_create_query(gateway, search.endpoint, search.query_parameters, links_base)
            .await
    }

    /// Creates (or reuses) a query against an existing gateway.
    pub async fn create_query(
        &self,
        request: QueryCreate,
        links_base: &str,
    ) -> FederationResult<SubmittedQuery> {
        let gateway = self.resources.get_gateway(&request.gateway_id).await?;
        self.find_or_create_query(gateway, request.endpoint, request.query_parameters, links_base)
            .await
    }

    async fn find_or_create_query(
        &self,
        gateway: Gateway,
        endpoint: EntryEndpoint,
        query_parameters: QueryParameters,
        links_base: &str,
    ) -> FederationResult<SubmittedQuery> {
        let filter = DocumentFilter::eq("endpoint", endpoint.as_str())
            .and(DocumentFilter::eq("gateway_id", gateway.id.as_str()))
            .and(DocumentFilter::eq(
                "query_parameters",
                serde_json::to_value(&query_parameters)?,
            ));
        let guard = self.query_lock.lock().await;
        let mut existing = self
            .resources
            .find_queries(&filter, Pagination::new(1, 0))
            .await?;
        if let Some(query) = existing.items.pop() {
            info!(query = %query.id, gateway = %gateway.id, "A query was found and reused");
            return Ok(SubmittedQuery {
                query,
                gateway,
                created: false,
            });
        }

        let query = QueryResource {
            id: uuid::Uuid::new_v4().to_string(),
            gateway_id: gateway.id.clone(),
            endpoint,
            endpoint_model: ResponseSchema::for_endpoint(endpoint).name().to_string(),
            query_parameters,
            state: QueryState::Created,
            response: None,
            last_modified: None,
        };
        let query = self.resources.insert_query(&query).await?;
        drop(guard);
        info!(query = %query.id, gateway = %gateway.id, endpoint = %endpoint, "Created new query");

        let orchestrator = self.orchestrator.clone();
        let run_gateway = gateway.clone();
        let run_query = query.clone();
        let links_base = links_base.to_string();
        tokio::spawn(async move {
            if let Err(e) = orchestrator.run(&run_gateway, &run_query, &links_base).await {
                error!(query = %run_query.id, error = %e, "Federated query failed");
            }
        });

        Ok(SubmittedQuery {
            query,
            gateway,
            created: true,
        })
    }

    /// Waits up to `timeout` for a query to finish.
    ///
    /// Polls the stored query every poll interval. A finished query yields
    /// its merged response; otherwise the caller is redirected to the query
    /// resource. The query keeps running either way.
    pub async fn await_or_redirect(
        &self,
        query_id: &str,
        timeout: Duration,
    ) -> FederationResult<SearchOutcome> {
        let deadline = Instant::now() + timeout;
        let mut query = self.resources.get_query(query_id).await?;

        loop {
            if query.state == QueryState::Finished {
                let response = query
                    .response
                    .as_ref()
                    .map(|r| r.to_merged())
                    .ok_or_else(|| {
                        FederationError::Internal(format!(
                            "query '{}' is finished but has no response",
                            query.id
                        ))
                    })?;
                let status = response.status_code();
                debug!(query = %query.id, status, "Query finished in time");
                return Ok(SearchOutcome::Finished { response, status });
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(self.settings.poll_interval.min(remaining)).await;
            query = self.resources.get_query(query_id).await?;
        }

        let location = format!("{}/queries/{}", self.settings.base_url(), query.id);
        debug!(query = %query.id, location = %location, "Query still running, redirecting");
        Ok(SearchOutcome::Redirect { location, query })
    }
}
