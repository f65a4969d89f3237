//! Error types for the gateway HTTP surface.
//!
//! Every error is rendered as an OPTIMADE error document with the matching
//! HTTP status code.
//!
//! # Error Mapping
//!
//! | Federation Error | HTTP Status |
//! |------------------|-------------|
//! | NotFound | 404 |
//! | BadRequest / Validation | 400 |
//! | AlreadyExists | 409 |
//! | Consistency / Store / Internal | 500 |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use optigate_federation::FederationError;
use optigate_federation::models::{API_VERSION, OptimadeError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// The primary error type for HTTP handlers.
#[derive(Debug, Error)]
pub enum RestError {
    /// Resource not found (HTTP 404).
    #[error("{resource} not found: {id}")]
    NotFound {
        /// The collection, e.g. `gateways`.
        resource: String,
        /// The requested id.
        id: String,
    },

    /// Bad request, including invalid query parameters (HTTP 400).
    #[error("bad request: {message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// A resource with the same id exists (HTTP 409).
    #[error("conflict: {message}")]
    Conflict {
        /// Error message.
        message: String,
    },

    /// Not implemented (HTTP 501).
    #[error("not implemented: {feature}")]
    NotImplemented {
        /// Description of what's not implemented.
        feature: String,
    },

    /// Internal server error (HTTP 500).
    #[error("internal error: {message}")]
    InternalError {
        /// Error message.
        message: String,
    },
}

/// Result type alias for HTTP handlers.
pub type RestResult<T> = Result<T, RestError>;

impl RestError {
    /// Creates a bad-request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        RestError::BadRequest {
            message: message.into(),
        }
    }

    /// The HTTP status of this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::Conflict { .. } => StatusCode::CONFLICT,
            RestError::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the error as an OPTIMADE error object.
    pub fn to_optimade_error(&self) -> OptimadeError {
        let status = self.status_code();
        let detail = match self {
            RestError::NotFound { resource, id } => {
                format!("No {} entry with id '{}'", resource, id)
            }
            RestError::BadRequest { message }
            | RestError::Conflict { message }
            | RestError::InternalError { message } => message.clone(),
            RestError::NotImplemented { feature } => {
                format!("'{}' is not implemented by this gateway", feature)
            }
        };
        OptimadeError {
            status: Some(status.as_u16().to_string()),
            title: status.canonical_reason().map(String::from),
            detail: Some(detail),
            ..OptimadeError::default()
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = json!({
            "errors": [self.to_optimade_error()],
            "meta": {
                "api_version": API_VERSION,
                "more_data_available": false,
                "data_returned": 0,
                "time_stamp": chrono::Utc::now(),
            }
        });
        (status, Json(body)).into_response()
    }
}

impl From<FederationError> for RestError {
    fn from(err: FederationError) -> Self {
        match err {
            FederationError::NotFound { resource, id } => RestError::NotFound { resource, id },
            FederationError::BadRequest(message) | FederationError::Validation(message) => {
                RestError::BadRequest { message }
            }
            FederationError::AlreadyExists { resource, id } => RestError::Conflict {
                message: format!("{} entry '{}' already exists", resource, id),
            },
            FederationError::Consistency(_)
            | FederationError::Store(_)
            | FederationError::Internal(_) => RestError::InternalError {
                message: err.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        RestError::InternalError {
            message: format!("serialization failed: {}", err),
        }
    }
}
