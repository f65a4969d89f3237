//! HTTP client for OPTIMADE backends.
//!
//! A backend request never fails from the caller's point of view: transport
//! errors, undecodable bodies and documents matching neither the success nor
//! the error schema all come back as a [`BackendResponse::Failure`], so one
//! misbehaving backend cannot abort a fan-out.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::endpoint::{EntryEndpoint, ResponseSchema};
use crate::error::{FederationError, FederationResult};
use crate::models::{
    API_VERSION, Database, EntryListResponse, ErrorResponse, OptimadeError,
};

/// Versioned URL prefix of OPTIMADE backends.
pub const VERSIONED_PREFIX: &str = "/v1";

/// Prefix of the error ids the gateway generates itself.
pub const GATEWAY_ERROR_PREFIX: &str = "OPTIMADE_GATEWAY";

/// What to request from a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    /// An encoded query string for the endpoint.
    Query(String),
    /// A complete URL, e.g. a `links.next` continuation.
    Url(String),
}

impl RequestTarget {
    /// A request without query parameters.
    pub fn empty() -> Self {
        RequestTarget::Query(String::new())
    }
}

/// Why a backend request produced no OPTIMADE document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The body is not JSON.
    JsonDecode,
    /// The body matches neither the success nor the error schema.
    Validation,
    /// The request did not complete (connection, timeout, ...).
    Transport,
}

impl FailureKind {
    /// The synthetic error id reported for this failure.
    pub fn error_id(&self) -> &'static str {
        match self {
            FailureKind::JsonDecode => "OPTIMADE_GATEWAY_DB_GET_RESPONSE_JSONDECODEERROR",
            FailureKind::Validation => "OPTIMADE_GATEWAY_DB_GET_RESPONSE_VALIDATIONERROR",
            FailureKind::Transport => "OPTIMADE_GATEWAY_DB_GET_RESPONSE_REQUESTERROR",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            FailureKind::JsonDecode => "JSONDecodeError",
            FailureKind::Validation => "ValidationError",
            FailureKind::Transport => "RequestError",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A backend request that produced no OPTIMADE document.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendFailure {
    pub kind: FailureKind,
    pub url: String,
    pub detail: String,
}

impl BackendFailure {
    /// Renders the failure as a synthetic OPTIMADE error document.
    pub fn to_error_response(&self) -> ErrorResponse {
        let error = OptimadeError {
            id: Some(self.kind.error_id().to_string()),
            title: Some(self.kind.title().to_string()),
            detail: Some(format!("Could not retrieve a valid response from {}: {}", self.url, self.detail)),
            meta: json!({"url": self.url}).as_object().cloned(),
            ..OptimadeError::default()
        };
        ErrorResponse {
            errors: vec![error],
            meta: json!({
                "query": {"representation": self.url},
                "api_version": API_VERSION,
                "more_data_available": false,
                "data_returned": 0,
            }),
        }
    }
}

/// Outcome of one backend request.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendResponse {
    /// A valid entry listing.
    Success(EntryListResponse),
    /// A valid OPTIMADE error document from the backend.
    Error(ErrorResponse),
    /// No usable document.
    Failure(BackendFailure),
}

impl BackendResponse {
    /// Classifies a response body: success schema, then error schema.
    pub fn from_body(schema: ResponseSchema, url: &str, body: &[u8]) -> Self {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                return BackendResponse::Failure(BackendFailure {
                    kind: FailureKind::JsonDecode,
                    url: url.to_string(),
                    detail: e.to_string(),
                });
            }
        };

        let success_error = match schema.parse_success(&value) {
            Ok(response) => return BackendResponse::Success(response),
            Err(e) => e,
        };
        match schema.parse_error(&value) {
            Ok(response) => BackendResponse::Error(response),
            Err(error_error) => BackendResponse::Failure(BackendFailure {
                kind: FailureKind::Validation,
                url: url.to_string(),
                detail: format!(
                    "not a valid {} ({}) nor a valid error response ({})",
                    schema.name(),
                    success_error,
                    error_error
                ),
            }),
        }
    }

    /// The outcome as an error document, if it is not a success.
    pub fn into_error_response(self) -> Option<ErrorResponse> {
        match self {
            BackendResponse::Success(_) => None,
            BackendResponse::Error(response) => Some(response),
            BackendResponse::Failure(failure) => Some(failure.to_error_response()),
        }
    }
}

/// A client able to query one OPTIMADE backend.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Performs one GET against `database` for `endpoint`.
    async fn get(
        &self,
        database: &Database,
        endpoint: EntryEndpoint,
        schema: ResponseSchema,
        target: &RequestTarget,
    ) -> BackendResponse;
}

/// Builds the request URL for a target.
pub fn request_url(database: &Database, endpoint: EntryEndpoint, target: &RequestTarget) -> String {
    match target {
        RequestTarget::Url(url) => url.clone(),
        RequestTarget::Query(query) => {
            let mut url = format!("{}{}/{}", database.base_url(), VERSIONED_PREFIX, endpoint);
            if !query.is_empty() {
                url.push('?');
                url.push_str(query);
            }
            url
        }
    }
}

/// [`BackendClient`] over HTTP, sharing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpBackendClient {
    client: reqwest::Client,
}

impl HttpBackendClient {
    /// Creates a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> FederationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("optigate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FederationError::Internal(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn get(
        &self,
        database: &Database,
        endpoint: EntryEndpoint,
        schema: ResponseSchema,
        target: &RequestTarget,
    ) -> BackendResponse {
        let url = request_url(database, endpoint, target);
        debug!(database = %database.id, url = %url, "Querying backend");

        let transport = |e: reqwest::Error| {
            BackendResponse::Failure(BackendFailure {
                kind: FailureKind::Transport,
                url: url.clone(),
                detail: e.to_string(),
            })
        };

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return transport(e),
        };
        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return transport(e),
        };

        debug!(database = %database.id, status = %status, bytes = body.len(), "Backend responded");
        BackendResponse::from_body(schema, &url, &body)
    }
}
