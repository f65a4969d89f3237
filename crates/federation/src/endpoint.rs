//! Entry endpoints and their response schemas.
//!
//! The set of federated endpoints is closed, and so is the set of response
//! schemas: each [`EntryEndpoint`] selects exactly one [`ResponseSchema`],
//! which knows how to recognise a success or an error document.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{EntryListResponse, ErrorResponse};

/// An OPTIMADE entry-listing endpoint the gateway can federate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryEndpoint {
    #[default]
    Structures,
    References,
    Links,
}

impl EntryEndpoint {
    /// All federated endpoints.
    pub const ALL: [EntryEndpoint; 3] = [
        EntryEndpoint::Structures,
        EntryEndpoint::References,
        EntryEndpoint::Links,
    ];

    /// The URL path segment (and entry `type`) of this endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryEndpoint::Structures => "structures",
            EntryEndpoint::References => "references",
            EntryEndpoint::Links => "links",
        }
    }

    /// The `type` every entry returned by this endpoint must carry.
    pub fn entry_type(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for EntryEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryEndpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryEndpoint::ALL
            .into_iter()
            .find(|endpoint| endpoint.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unsupported endpoint '{}', expected one of: structures, references, links",
                    s
                )
            })
    }
}

/// The response schema a backend answer is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseSchema {
    StructureResponseMany,
    ReferenceResponseMany,
    LinksResponse,
}

impl ResponseSchema {
    /// Selects the schema for an endpoint.
    pub fn for_endpoint(endpoint: EntryEndpoint) -> Self {
        match endpoint {
            EntryEndpoint::Structures => ResponseSchema::StructureResponseMany,
            EntryEndpoint::References => ResponseSchema::ReferenceResponseMany,
            EntryEndpoint::Links => ResponseSchema::LinksResponse,
        }
    }

    /// The schema name, as stored in a query's `endpoint_model`.
    pub fn name(&self) -> &'static str {
        match self {
            ResponseSchema::StructureResponseMany => "StructureResponseMany",
            ResponseSchema::ReferenceResponseMany => "ReferenceResponseMany",
            ResponseSchema::LinksResponse => "LinksResponse",
        }
    }

    fn entry_type(&self) -> &'static str {
        match self {
            ResponseSchema::StructureResponseMany => "structures",
            ResponseSchema::ReferenceResponseMany => "references",
            ResponseSchema::LinksResponse => "links",
        }
    }

    /// Validates `body` as a successful entry listing.
    pub fn parse_success(&self, body: &Value) -> Result<EntryListResponse, String> {
        let obj = body
            .as_object()
            .ok_or_else(|| "response is not a JSON object".to_string())?;

        let data = obj
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| "missing 'data' array".to_string())?;
        let entry_type = self.entry_type();
        for (index, entry) in data.iter().enumerate() {
            let id = entry.get("id").and_then(Value::as_str);
            let kind = entry.get("type").and_then(Value::as_str);
            match (id, kind) {
                (Some(_), Some(kind)) if kind == entry_type => {}
                (None, _) => return Err(format!("data[{}] has no string 'id'", index)),
                (_, kind) => {
                    return Err(format!(
                        "data[{}] has type {:?}, expected '{}'",
                        index, kind, entry_type
                    ));
                }
            }
        }

        let meta = obj
            .get("meta")
            .and_then(Value::as_object)
            .ok_or_else(|| "missing 'meta' object".to_string())?;
        if !meta
            .get("more_data_available")
            .is_some_and(Value::is_boolean)
        {
            return Err("'meta.more_data_available' must be a boolean".to_string());
        }

        Ok(EntryListResponse {
            data: data.clone(),
            meta: meta.clone(),
            links: obj.get("links").cloned(),
        })
    }

    /// Validates `body` as an error document.
    pub fn parse_error(&self, body: &Value) -> Result<ErrorResponse, String> {
        let errors = body
            .get("errors")
            .and_then(Value::as_array)
            .ok_or_else(|| "missing 'errors' array".to_string())?;
        if errors.is_empty() {
            return Err("'errors' must not be empty".to_string());
        }
        if !errors.iter().all(Value::is_object) {
            return Err("every error must be an object".to_string());
        }
        if !body.get("meta").is_some_and(Value::is_object) {
            return Err("missing 'meta' object".to_string());
        }
        serde_json::from_value(body.clone()).map_err(|e| e.to_string())
    }
}
