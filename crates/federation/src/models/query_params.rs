//! OPTIMADE entry-listing query parameters.

use serde::{Deserialize, Serialize};

/// The query parameters of an entry-listing request.
///
/// Only parameters the client actually set are serialized, so the stored form
/// doubles as the query identity for deduplication. `sort` is accepted but
/// not applied: it is never sent to backends and has no effect on the merged
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_fields: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_cursor: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_above: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_below: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
}

impl QueryParameters {
    /// Parameters with only a filter set.
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            ..Self::default()
        }
    }

    /// Encodes the parameters sent to a backend, substituting `filter`.
    ///
    /// `sort` is left out.
    pub fn to_backend_query_string(&self, filter: Option<&str>) -> String {
        Self {
            sort: None,
            ..self.clone()
        }
        .to_query_string(filter)
    }

    /// Encodes the parameters as a URL query string, substituting `filter`.
    ///
    /// A `None` filter omits the parameter entirely.
    pub fn to_query_string(&self, filter: Option<&str>) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(filter) = filter {
            serializer.append_pair("filter", filter);
        }
        let strings = [
            ("response_format", &self.response_format),
            ("email_address", &self.email_address),
            ("response_fields", &self.response_fields),
            ("sort", &self.sort),
        ];
        for (name, value) in strings {
            if let Some(value) = value {
                serializer.append_pair(name, value);
            }
        }
        let numbers = [
            ("page_limit", self.page_limit),
            ("page_offset", self.page_offset),
            ("page_number", self.page_number),
            ("page_cursor", self.page_cursor),
        ];
        for (name, value) in numbers {
            if let Some(value) = value {
                serializer.append_pair(name, &value.to_string());
            }
        }
        let trailing = [
            ("page_above", &self.page_above),
            ("page_below", &self.page_below),
            ("include", &self.include),
        ];
        for (name, value) in trailing {
            if let Some(value) = value {
                serializer.append_pair(name, value);
            }
        }
        serializer.finish()
    }
}
