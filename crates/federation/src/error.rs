//! Error types for the federation engine.
//!
//! Per-backend failures never show up here: the backend client reports them
//! as data (see [`crate::client::BackendResponse`]) and the orchestrator folds
//! them into the merged response. A [`FederationError`] is only raised for
//! conditions that stop a whole request.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use optigate_persistence::StoreError;
use thiserror::Error;

/// The primary error type for federation operations.
#[derive(Error, Debug)]
pub enum FederationError {
    /// A referenced database, gateway or query does not exist.
    #[error("{resource} entry not found: {id}")]
    NotFound { resource: String, id: String },

    /// The request itself is malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A resource failed model validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A stored invariant does not hold (e.g. two gateways for one database set).
    #[error("consistency violation: {0}")]
    Consistency(String),

    /// A resource with the same id is already registered.
    #[error("{resource} entry already exists: {id}")]
    AlreadyExists { resource: String, id: String },

    /// The resource store failed.
    #[error("store error: {0}")]
    Store(StoreError),

    /// Any other internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for federation operations.
pub type FederationResult<T> = Result<T, FederationError>;

impl FederationError {
    /// Creates a not-found error.
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        FederationError::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }
}

impl From<StoreError> for FederationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => FederationError::NotFound {
                resource: collection.to_string(),
                id,
            },
            StoreError::AlreadyExists { collection, id } => FederationError::AlreadyExists {
                resource: collection.to_string(),
                id,
            },
            other => FederationError::Store(other),
        }
    }
}

impl From<serde_json::Error> for FederationError {
    fn from(err: serde_json::Error) -> Self {
        FederationError::Internal(format!("malformed stored resource: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optigate_persistence::Collection;

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        let err: FederationError = StoreError::NotFound {
            collection: Collection::Queries,
            id: "q1".to_string(),
        }
        .into();
        assert!(matches!(err, FederationError::NotFound { .. }));
        assert_eq!(err.to_string(), "queries entry not found: q1");
    }

    #[test]
    fn test_store_duplicate_maps_to_already_exists() {
        let err: FederationError = StoreError::AlreadyExists {
            collection: Collection::Databases,
            id: "db".to_string(),
        }
        .into();
        assert!(matches!(err, FederationError::AlreadyExists { .. }));
    }
}
