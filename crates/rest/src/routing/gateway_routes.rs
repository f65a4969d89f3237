//! Gateway route configuration.
//!
//! Defines all routes of the gateway API.

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

/// Creates all gateway API routes.
///
/// Every route is served both at the root and under the `/v1` prefix.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `GET|POST /databases`, `GET /databases/{id}` - Registered databases
/// - `GET|POST /gateways`, `GET /gateways/{id}` - Gateways
/// - `GET /gateways/{id}/{endpoint}` - Federated entry listing
/// - `GET|POST /queries`, `GET /queries/{id}` - Queries
/// - `GET|POST /search` - Federated search
pub fn create_routes(state: AppState) -> Router {
    let api = api_routes();
    Router::new()
        .merge(api.clone())
        .nest("/v1", api)
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/databases",
            get(handlers::list_databases_handler).post(handlers::create_database_handler),
        )
        .route("/databases/{database_id}", get(handlers::read_database_handler))
        .route(
            "/gateways",
            get(handlers::list_gateways_handler).post(handlers::create_gateway_handler),
        )
        .route("/gateways/{gateway_id}", get(handlers::read_gateway_handler))
        .route(
            "/gateways/{gateway_id}/{endpoint}",
            get(handlers::gateway_entries_handler),
        )
        .route(
            "/queries",
            get(handlers::list_queries_handler).post(handlers::create_query_handler),
        )
        .route("/queries/{query_id}", get(handlers::read_query_handler))
        .route("/search", get(handlers::search_get_handler))
        .route("/search", post(handlers::search_post_handler))
}
