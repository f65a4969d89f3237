//! Application state for the gateway HTTP surface.
//!
//! The state is shared by all request handlers: the query service (which owns
//! the resource store and backend client) and the server configuration.

use std::sync::Arc;

use optigate_federation::{QueryService, Resources};

use crate::config::ServerConfig;

/// Shared application state.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use optigate_federation::{GatewaySettings, HttpBackendClient, QueryService, Resources};
/// use optigate_persistence::backends::memory::MemoryStore;
/// use optigate_rest::{AppState, ServerConfig};
///
/// let resources = Resources::new(Arc::new(MemoryStore::new()));
/// let client = Arc::new(HttpBackendClient::new(Duration::from_secs(60))?);
/// let service = QueryService::new(resources, client, GatewaySettings::default());
/// let state = AppState::new(service, ServerConfig::default());
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Federated query service.
    service: QueryService,

    /// Server configuration.
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Creates a new AppState.
    pub fn new(service: QueryService, config: ServerConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }

    /// Returns the query service.
    pub fn service(&self) -> &QueryService {
        &self.service
    }

    /// Returns the typed resource collections.
    pub fn resources(&self) -> &Resources {
        self.service.resources()
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the base URL for the server, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    /// Returns the name of the store backend.
    pub fn backend_name(&self) -> &'static str {
        self.resources().store().backend_name()
    }
}
