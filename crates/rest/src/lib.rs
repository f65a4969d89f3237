//! # optigate-rest - OPTIMADE gateway HTTP surface
//!
//! This crate exposes the Optigate federation engine over HTTP: registered
//! databases, gateways over sets of databases, query resources, and the
//! federated `search` endpoint that fans a single OPTIMADE query out to
//! many backends and merges their answers.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use optigate_persistence::backends::memory::MemoryStore;
//! use optigate_rest::{ServerConfig, create_app_with_config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default();
//!     let app = create_app_with_config(Arc::new(MemoryStore::new()), config)?;
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! All endpoints are served at the root and under `/v1`.
//!
//! | Interaction | HTTP Method | URL Pattern |
//! |------------|-------------|-------------|
//! | health | GET | `/health` |
//! | list / register databases | GET / POST | `/databases` |
//! | read database | GET | `/databases/{id}` |
//! | list / find-or-create gateways | GET / POST | `/gateways` |
//! | read gateway | GET | `/gateways/{id}` |
//! | federated listing | GET | `/gateways/{id}/{structures,references,links}` |
//! | list / create queries | GET / POST | `/queries` |
//! | read query | GET | `/queries/{id}` |
//! | search (wait or redirect) | GET | `/search` |
//! | search (detached) | POST | `/search` |
//!
//! ## Error Handling
//!
//! All errors are returned as OPTIMADE error documents
//! (`{"errors": [{"status", "title", "detail"}], "meta": {...}}`) with the
//! matching HTTP status code. See [`error`].
//!
//! ## Configuration
//!
//! The server is configured via command line flags or `OPTIGATE_*`
//! environment variables. See [`config`].
//!
//! ## Architecture
//!
//! - [`error`] - Error types and OPTIMADE error documents
//! - [`config`] - Server configuration
//! - [`state`] - Application state (query service, configuration)
//! - [`handlers`] - HTTP request handlers
//! - [`extractors`] - OPTIMADE query-parameter parsing
//! - [`responses`] - Entry rendering and response documents
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod responses;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use config::{ServerConfig, StorageBackendMode};
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use optigate_federation::{BackendClient, HttpBackendClient, QueryService, Resources};
use optigate_persistence::ResourceStore;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application, querying backends over HTTP.
///
/// # Errors
///
/// Fails if the HTTP client for the backends cannot be created.
pub fn create_app_with_config(
    store: Arc<dyn ResourceStore>,
    config: ServerConfig,
) -> RestResult<Router> {
    let client = HttpBackendClient::new(Duration::from_secs(config.backend_timeout))?;
    Ok(create_app_with_client(store, Arc::new(client), config))
}

/// Creates the Axum application with an explicit backend client.
///
/// This function sets up the complete gateway API with all handlers and
/// middleware. Tests use it to substitute a scripted client.
pub fn create_app_with_client(
    store: Arc<dyn ResourceStore>,
    client: Arc<dyn BackendClient>,
    config: ServerConfig,
) -> Router {
    info!(
        "Creating gateway API server with backend: {}",
        store.backend_name()
    );

    let service = QueryService::new(Resources::new(store), client, config.gateway_settings());
    let state = AppState::new(service, config.clone());

    let router = routing::create_routes(state);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout),
        ));

    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    let router = if config.enable_request_id {
        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG` takes
/// precedence over `level`.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "optigate={level},optigate_rest={level},optigate_federation={level},\
             optigate_persistence={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
