//! Axum extractors for OPTIMADE requests.
//!
//! - [`OptimadeQuery`] - Parse OPTIMADE and gateway query parameters
//! - [`Pagination`] - Pagination of resource listings

mod optimade_query;
mod pagination;

pub use optimade_query::OptimadeQuery;
pub use pagination::Pagination;
