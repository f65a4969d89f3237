//! HTTP request handlers.
//!
//! - [`health`] - Health check endpoint
//! - [`databases`] - Registered databases
//! - [`gateways`] - Gateways and federated entry listings
//! - [`queries`] - Query resources
//! - [`search`] - Federated searches

pub mod databases;
pub mod gateways;
pub mod health;
pub mod queries;
pub mod search;

// Re-export handlers for convenience
pub use databases::{create_database_handler, list_databases_handler, read_database_handler};
pub use gateways::{
    create_gateway_handler, gateway_entries_handler, list_gateways_handler, read_gateway_handler,
};
pub use health::health_handler;
pub use queries::{create_query_handler, list_queries_handler, read_query_handler};
pub use search::{search_get_handler, search_post_handler};
