//! Error types for the resource store.
//!
//! This module defines all error types used throughout the persistence layer,
//! separating document-level errors (missing or duplicate documents, malformed
//! content) from errors raised by the underlying storage engine.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::types::Collection;

/// The primary error type for all store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No document with the given id exists in the collection.
    #[error("{collection} entry not found: {id}")]
    NotFound { collection: Collection, id: String },

    /// No document matched a `get_one` filter.
    #[error("no {collection} entry matched {filter}")]
    NoMatch { collection: Collection, filter: String },

    /// A document with the given id already exists.
    #[error("{collection} entry already exists: {id}")]
    AlreadyExists { collection: Collection, id: String },

    /// The document could not be stored or updated as requested.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to the shape of stored documents.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document is not a JSON object.
    #[error("document in {collection} must be a JSON object")]
    NotAnObject { collection: Collection },

    /// A field path could not be applied to the document.
    #[error("cannot apply field path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// An increment targeted a non-numeric value.
    #[error("cannot increment non-numeric field '{path}'")]
    NotNumeric { path: String },
}

/// Errors originating from the storage engine.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Returns true if this error means the requested document does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. } | StoreError::NoMatch { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::Backend(BackendError::ConnectionFailed {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StoreError::NotFound {
            collection: Collection::Gateways,
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "gateways entry not found: abc");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_document_error_display() {
        let err = DocumentError::NotNumeric {
            path: "response.meta.data_returned".to_string(),
        };
        assert!(err.to_string().contains("response.meta.data_returned"));
    }

    #[test]
    fn test_backend_error_is_not_not_found() {
        let err: StoreError = BackendError::MigrationError {
            message: "boom".to_string(),
        }
        .into();
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("schema migration failed"));
    }
}
