//! Optigate Persistence Layer
//!
//! This crate provides the resource store behind the Optigate OPTIMADE
//! gateway. Registered databases, gateways and queries are kept as flat JSON
//! documents in three collections, and the gateway only ever talks to them
//! through the [`ResourceStore`] trait.
//!
//! # Backend Features
//!
//! - in-memory (always available) - process-local, for tests and ephemeral deployments
//! - `sqlite` (default) - SQLite with in-memory and file modes
//!
//! # Architecture
//!
//! - [`types`] - Documents, filters, field updates and pagination
//! - [`error`] - Error types for all operations
//! - [`core`] - The [`ResourceStore`] trait
//! - [`backends`] - Backend implementations
//!
//! # Quick Start
//!
//! ```
//! use optigate_persistence::backends::memory::MemoryStore;
//! use optigate_persistence::types::{Collection, DocumentFilter, FieldUpdate};
//! use optigate_persistence::ResourceStore;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//!
//! let query = store
//!     .create(Collection::Queries, json!({"type": "queries", "state": "created"}))
//!     .await
//!     .unwrap();
//!
//! store
//!     .update_fields(
//!         Collection::Queries,
//!         query.id(),
//!         &[
//!             FieldUpdate::set("state", "in progress"),
//!             FieldUpdate::increment("response.meta.data_returned", 12),
//!         ],
//!     )
//!     .await
//!     .unwrap();
//!
//! let reloaded = store
//!     .get_one(Collection::Queries, &DocumentFilter::by_id(query.id()))
//!     .await
//!     .unwrap();
//! assert_eq!(reloaded.content()["response"]["meta"]["data_returned"], 12);
//! # });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{BackendError, DocumentError, StoreError, StoreResult};
pub use types::{
    Collection, DocumentFilter, FieldUpdate, FindResult, Pagination, StoredDocument,
};

// Re-export core traits
pub use core::ResourceStore;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
