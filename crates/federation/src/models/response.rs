//! OPTIMADE response documents.
//!
//! Upstream documents are kept close to the wire (`data` entries and `meta`
//! stay raw JSON) since every backend decorates them differently. The
//! gateway's own responses use the typed [`ResponseMeta`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// OPTIMADE API version reported in gateway responses.
pub const API_VERSION: &str = "1.1.0";

/// A successful entry-listing response from one backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryListResponse {
    /// Entry resources as returned by the backend.
    pub data: Vec<Value>,
    /// The backend's `meta` object.
    pub meta: Map<String, Value>,
    /// The backend's `links` object, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
}

impl EntryListResponse {
    /// Whether the backend has more pages.
    pub fn more_data_available(&self) -> bool {
        self.meta
            .get("more_data_available")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// `meta.data_returned`, falling back to the page size.
    pub fn data_returned(&self) -> u64 {
        self.meta
            .get("data_returned")
            .and_then(Value::as_u64)
            .unwrap_or(self.data.len() as u64)
    }

    /// `meta.data_available`, when reported.
    pub fn data_available(&self) -> Option<u64> {
        self.meta.get("data_available").and_then(Value::as_u64)
    }

    /// The `links.next` URL; both the string and the `{href}` form are accepted.
    pub fn next_link(&self) -> Option<String> {
        let next = self.links.as_ref()?.get("next")?;
        match next {
            Value::String(url) => Some(url.clone()),
            Value::Object(obj) => obj.get("href").and_then(Value::as_str).map(String::from),
            _ => None,
        }
    }
}

/// An OPTIMADE error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The reported errors, never empty.
    pub errors: Vec<OptimadeError>,
    /// The response `meta` object.
    #[serde(default)]
    pub meta: Value,
}

/// A single OPTIMADE error object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimadeError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// HTTP status, as a string; numbers from lax backends are accepted too.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl OptimadeError {
    /// The first integer token of `status`, if it is a valid HTTP status.
    pub fn status_code(&self) -> Option<u16> {
        self.status
            .as_deref()?
            .split(|c: char| !c.is_ascii_digit())
            .filter(|token| !token.is_empty())
            .find_map(|token| token.parse::<u16>().ok())
            .filter(|code| (100..=599).contains(code))
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// A non-fatal warning carried in `meta.warnings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "warning")]
pub struct OptimadeWarning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub detail: String,
}

impl OptimadeWarning {
    /// Creates a warning.
    pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            detail: detail.into(),
        }
    }
}

/// `meta.query` of a gateway response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryMeta {
    /// Path and query string of the request that produced the response.
    #[serde(default)]
    pub representation: String,
}

/// `meta` of a gateway response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    #[serde(default)]
    pub query: QueryMeta,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub more_data_available: bool,
    #[serde(default)]
    pub data_returned: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_available: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<OptimadeWarning>,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            query: QueryMeta::default(),
            api_version: default_api_version(),
            more_data_available: false,
            data_returned: 0,
            data_available: None,
            time_stamp: None,
            warnings: Vec::new(),
        }
    }
}

impl ResponseMeta {
    /// Creates meta for a response to `representation`, stamped now.
    pub fn for_request(representation: impl Into<String>) -> Self {
        Self {
            query: QueryMeta {
                representation: representation.into(),
            },
            time_stamp: Some(Utc::now()),
            ..Self::default()
        }
    }
}

/// The response persisted on a Query resource.
///
/// `data` is keyed by database id and filled in as backends answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayQueryResponse {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub errors: Vec<OptimadeError>,
    #[serde(default)]
    pub meta: ResponseMeta,
    #[serde(default)]
    pub links: Option<Value>,
}

impl GatewayQueryResponse {
    /// Turns the stored per-database response into one merged listing.
    ///
    /// Entries are flattened and sorted by local id, then by namespaced id.
    pub fn to_merged(&self) -> MergedResponse {
        if !self.errors.is_empty() {
            return MergedResponse::Errors {
                errors: self.errors.clone(),
                meta: self.meta.clone(),
            };
        }

        let data = merge_entries(&self.data);

        MergedResponse::Entries {
            data,
            meta: self.meta.clone(),
            links: self.links.clone(),
        }
    }
}

/// Flattens per-database entries into one listing sorted by (local id,
/// namespaced id).
///
/// `data` is keyed by database id. The local id is the namespaced id with
/// exactly its owning database's `<database_id>/` prefix removed, since
/// database ids may themselves contain `/`.
pub fn merge_entries(data: &Map<String, Value>) -> Vec<Value> {
    let mut keyed: Vec<(String, String, Value)> = Vec::new();
    for (database_id, entries) in data {
        let Some(entries) = entries.as_array() else {
            continue;
        };
        let prefix = format!("{}/", database_id);
        for entry in entries {
            let id = entry.get("id").and_then(Value::as_str).unwrap_or_default();
            let local = id.strip_prefix(&prefix).unwrap_or(id);
            keyed.push((local.to_string(), id.to_string(), entry.clone()));
        }
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    keyed.into_iter().map(|(_, _, entry)| entry).collect()
}

/// The gateway's merged answer to a federated query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MergedResponse {
    /// No backend reported an error.
    Entries {
        data: Vec<Value>,
        meta: ResponseMeta,
        #[serde(skip_serializing_if = "Option::is_none")]
        links: Option<Value>,
    },
    /// At least one backend reported an error; partial data is discarded.
    Errors {
        errors: Vec<OptimadeError>,
        meta: ResponseMeta,
    },
}

impl MergedResponse {
    /// HTTP status for this response: 200 for entries, otherwise the first
    /// error status that carries an integer, else 500.
    pub fn status_code(&self) -> u16 {
        match self {
            MergedResponse::Entries { .. } => 200,
            MergedResponse::Errors { errors, .. } => errors
                .iter()
                .find_map(OptimadeError::status_code)
                .unwrap_or(500),
        }
    }

    /// The response meta.
    pub fn meta(&self) -> &ResponseMeta {
        match self {
            MergedResponse::Entries { meta, .. } | MergedResponse::Errors { meta, .. } => meta,
        }
    }

    /// Entries of a successful response.
    pub fn data(&self) -> Option<&[Value]> {
        match self {
            MergedResponse::Entries { data, .. } => Some(data),
            MergedResponse::Errors { .. } => None,
        }
    }

    /// Errors of a failed response.
    pub fn errors(&self) -> &[OptimadeError] {
        match self {
            MergedResponse::Entries { .. } => &[],
            MergedResponse::Errors { errors, .. } => errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(entries: &[Value]) -> Vec<&str> {
        entries.iter().map(|e| e["id"].as_str().unwrap()).collect()
    }

    #[test]
    fn test_sort_by_local_then_namespaced_id() {
        let data: Map<String, Value> = serde_json::from_value(json!({
            "A": [{"id": "A/2"}, {"id": "A/1"}],
            "B": [{"id": "B/1"}]
        }))
        .unwrap();
        assert_eq!(ids(&merge_entries(&data)), vec!["A/1", "B/1", "A/2"]);
    }

    #[test]
    fn test_sort_strips_database_ids_containing_slash() {
        let data: Map<String, Value> = serde_json::from_value(json!({
            "a__org": [{"id": "a__org/2"}],
            "z__org/optimade": [{"id": "z__org/optimade/1"}]
        }))
        .unwrap();
        assert_eq!(
            ids(&merge_entries(&data)),
            vec!["z__org/optimade/1", "a__org/2"]
        );
    }

    #[test]
    fn test_status_code_selection() {
        let error = |status: Option<&str>| OptimadeError {
            status: status.map(String::from),
            ..OptimadeError::default()
        };

        let merged = MergedResponse::Errors {
            errors: vec![error(None), error(Some("Not Found 404")), error(Some("400"))],
            meta: ResponseMeta::default(),
        };
        assert_eq!(merged.status_code(), 404);

        let merged = MergedResponse::Errors {
            errors: vec![error(Some("bad"))],
            meta: ResponseMeta::default(),
        };
        assert_eq!(merged.status_code(), 500);

        let merged = MergedResponse::Entries {
            data: vec![],
            meta: ResponseMeta::default(),
            links: None,
        };
        assert_eq!(merged.status_code(), 200);
    }

    #[test]
    fn test_numeric_status_is_accepted() {
        let error: OptimadeError =
            serde_json::from_value(json!({"status": 403, "detail": "nope"})).unwrap();
        assert_eq!(error.status.as_deref(), Some("403"));
        assert_eq!(error.status_code(), Some(403));
    }

    #[test]
    fn test_next_link_forms() {
        let mut response = EntryListResponse {
            data: vec![],
            meta: Map::new(),
            links: Some(json!({"next": "https://db/v1/structures?page_offset=10"})),
        };
        assert_eq!(
            response.next_link().as_deref(),
            Some("https://db/v1/structures?page_offset=10")
        );
        response.links = Some(json!({"next": {"href": "https://db/next", "meta": null}}));
        assert_eq!(response.next_link().as_deref(), Some("https://db/next"));
        response.links = Some(json!({"next": null}));
        assert_eq!(response.next_link(), None);
    }

    #[test]
    fn test_errors_take_priority_over_data() {
        let stored = GatewayQueryResponse {
            data: serde_json::from_value(json!({"a": [{"id": "a/1"}]})).unwrap(),
            errors: vec![OptimadeError {
                status: Some("502".to_string()),
                ..OptimadeError::default()
            }],
            ..GatewayQueryResponse::default()
        };
        let merged = stored.to_merged();
        assert!(merged.data().is_none());
        assert_eq!(merged.status_code(), 502);
    }

    #[test]
    fn test_warning_serializes_with_type() {
        let warning = OptimadeWarning::new("Non-Unique Entry ID", "ambiguous");
        let value = serde_json::to_value(&warning).unwrap();
        assert_eq!(value["type"], "warning");
        assert_eq!(value["detail"], "ambiguous");
    }
}
