//! Core types for the persistence layer.
//!
//! - [`Collection`] - The resource collections
//! - [`StoredDocument`] - A document with persistence metadata
//! - [`DocumentFilter`] - Filters for `find`, `get_one` and `count`
//! - [`FieldUpdate`] - Field-path updates for `update_fields`
//! - [`Pagination`], [`FindResult`] - Listing types
//!
//! # Example
//!
//! ```
//! use optigate_persistence::types::{DocumentFilter, FieldUpdate};
//! use serde_json::json;
//!
//! let filter = DocumentFilter::set_equals("databases", "id", ["a", "b"]);
//! assert!(filter.matches(&json!({"databases": [{"id": "b"}, {"id": "a"}]})));
//!
//! let update = FieldUpdate::increment("response.meta.data_returned", 3);
//! assert_eq!(update.path(), "response.meta.data_returned");
//! ```

mod collection;
mod document;
mod filter;
mod pagination;
mod update;

pub use collection::Collection;
pub use document::{LAST_MODIFIED_FIELD, StoredDocument};
pub use filter::{DocumentFilter, resolve_path};
pub use pagination::{FindResult, Pagination};
pub use update::{FieldUpdate, apply_updates};
