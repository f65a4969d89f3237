//! Query resources: one federated search and its merged result.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{GatewayQueryResponse, QueryParameters};
use crate::endpoint::EntryEndpoint;

/// Lifecycle state of a query.
///
/// States only move forward: `created → started → in progress → finished`.
/// Errors are carried in the finished response, there is no failed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QueryState {
    #[serde(rename = "created")]
    Created,
    #[serde(rename = "started")]
    Started,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "finished")]
    Finished,
}

impl QueryState {
    /// The stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryState::Created => "created",
            QueryState::Started => "started",
            QueryState::InProgress => "in progress",
            QueryState::Finished => "finished",
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted federated query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResource {
    pub id: String,
    pub gateway_id: String,
    pub endpoint: EntryEndpoint,
    /// Name of the response schema backends are validated against.
    pub endpoint_model: String,
    #[serde(default)]
    pub query_parameters: QueryParameters,
    pub state: QueryState,
    #[serde(default)]
    pub response: Option<GatewayQueryResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// Body of a query creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCreate {
    pub gateway_id: String,
    #[serde(default)]
    pub query_parameters: QueryParameters,
    #[serde(default)]
    pub endpoint: EntryEndpoint,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_serialization() {
        assert_eq!(
            serde_json::to_value(QueryState::InProgress).unwrap(),
            json!("in progress")
        );
        let state: QueryState = serde_json::from_value(json!("finished")).unwrap();
        assert_eq!(state, QueryState::Finished);
        assert!(QueryState::Started < QueryState::InProgress);
    }
}
