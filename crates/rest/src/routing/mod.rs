//! Route configuration for the gateway API.
//!
//! This module contains the routing configuration that maps HTTP paths
//! to handlers.

pub mod gateway_routes;

pub use gateway_routes::create_routes;
