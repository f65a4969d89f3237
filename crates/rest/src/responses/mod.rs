//! Response formatting for the gateway.
//!
//! - [`entry`] - Rendering of stored resources as OPTIMADE entries
//! - [`document`] - Single-entry and listing response documents

pub mod document;
pub mod entry;

pub use entry::{DATABASES_TYPE, GATEWAYS_TYPE, QUERIES_TYPE, to_entries, to_entry};
