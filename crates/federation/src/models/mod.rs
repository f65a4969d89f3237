//! Gateway resource models and OPTIMADE documents.
//!
//! - [`Database`] - a registered OPTIMADE backend
//! - [`Gateway`] - a deduplicated set of databases
//! - [`QueryResource`] - one federated query, its state and response
//! - [`Search`] - a query against an implicit gateway
//! - [`QueryParameters`] - OPTIMADE entry-listing parameters
//! - response documents: [`EntryListResponse`], [`ErrorResponse`],
//!   [`GatewayQueryResponse`], [`MergedResponse`]

mod database;
mod gateway;
mod query;
mod query_params;
mod response;
mod search;

pub use database::{Database, Link, LinkType};
pub use gateway::{Gateway, GatewayCreate};
pub use query::{QueryCreate, QueryResource, QueryState};
pub use query_params::QueryParameters;
pub use response::{
    API_VERSION, EntryListResponse, ErrorResponse, GatewayQueryResponse, MergedResponse,
    OptimadeError, OptimadeWarning, QueryMeta, ResponseMeta, merge_entries,
};
pub use search::Search;
