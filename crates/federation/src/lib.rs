//! Optigate Federation Engine
//!
//! This crate fans one OPTIMADE entry-listing query out to a set of
//! independent OPTIMADE databases and merges their answers into a single
//! paginated response with namespaced ids (`<database_id>/<local_id>`),
//! aggregated counts and combined error reporting.
//!
//! # Architecture
//!
//! - [`filter`] - Rewrites a filter into one filter per database
//! - [`client`] - One GET against one backend, failures reported as data
//! - [`walker`] - Follows `next` links to collect a whole endpoint
//! - [`registry`] - Find-or-create gateways by database set
//! - [`orchestrator`] - Concurrent fan-out, merge and query state transitions
//! - [`lifecycle`] - Submit queries and wait for them, or redirect
//! - [`providers`] - Discover databases from the providers directory
//!
//! Storage goes through [`optigate_persistence::ResourceStore`]; the backend
//! client and settings are injected, so every component can be exercised
//! with an in-memory store and a mock client.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use optigate_federation::client::HttpBackendClient;
//! use optigate_federation::lifecycle::{QueryService, SearchOutcome};
//! use optigate_federation::models::{QueryParameters, Search};
//! use optigate_federation::resources::Resources;
//! use optigate_federation::settings::GatewaySettings;
//! use optigate_persistence::backends::memory::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = GatewaySettings::default();
//! let client = Arc::new(HttpBackendClient::new(settings.backend_timeout)?);
//! let service = QueryService::new(
//!     Resources::new(Arc::new(MemoryStore::new())),
//!     client,
//!     settings,
//! );
//!
//! let search = Search {
//!     query_parameters: QueryParameters::with_filter("elements HAS \"Si\""),
//!     optimade_urls: vec!["https://optimade.odbx.science".to_string()],
//!     ..Search::default()
//! };
//! let submitted = service
//!     .submit(search, "http://localhost:5000/search")
//!     .await?;
//!
//! match service
//!     .await_or_redirect(&submitted.query.id, Duration::from_secs(15))
//!     .await?
//! {
//!     SearchOutcome::Finished { response, .. } => println!("{:?}", response.data()),
//!     SearchOutcome::Redirect { location, .. } => println!("see {}", location),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod endpoint;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod registry;
pub mod resources;
pub mod settings;
pub mod walker;

pub use client::{BackendClient, BackendResponse, HttpBackendClient, RequestTarget};
pub use endpoint::{EntryEndpoint, ResponseSchema};
pub use error::{FederationError, FederationResult};
pub use lifecycle::{QueryService, SearchOutcome, SubmittedQuery};
pub use resources::Resources;
pub use settings::GatewaySettings;
