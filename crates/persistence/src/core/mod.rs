//! Core storage traits and abstractions.
//!
//! - [`ResourceStore`] - The generic document store contract
//!
//! Backends live in [`crate::backends`].

pub mod store;

pub use store::ResourceStore;
