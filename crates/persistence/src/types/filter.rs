//! Document filters.
//!
//! A [`DocumentFilter`] selects documents within a collection. Field paths are
//! dot-separated and follow document-store semantics: traversing an array
//! fans out over its elements, so `databases.id` addresses the `id` of every
//! element of the `databases` array.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A filter over stored documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocumentFilter {
    /// Matches every document.
    All,
    /// Any value at `path` equals `value` exactly.
    Eq {
        /// Dotted field path.
        path: String,
        /// The value to compare with.
        value: Value,
    },
    /// The array at `path` has exactly `size` elements.
    Size {
        /// Dotted field path.
        path: String,
        /// Required array length.
        size: usize,
    },
    /// Every one of `values` is present among the values at `path`.
    ContainsAll {
        /// Dotted field path.
        path: String,
        /// Values that must all be present.
        values: Vec<Value>,
    },
    /// All sub-filters match.
    And(Vec<DocumentFilter>),
}

impl DocumentFilter {
    /// Matches documents whose `path` equals `value`.
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        DocumentFilter::Eq {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Matches the document with the given id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::eq("id", Value::String(id.into()))
    }

    /// Matches documents whose array at `array_path` holds exactly the given
    /// set of `key` values, irrespective of order.
    ///
    /// This is the size-plus-containment pair a document store evaluates for
    /// set equality; callers must pass deduplicated values.
    pub fn set_equals<I, S>(array_path: &str, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Value> = values
            .into_iter()
            .map(|v| Value::String(v.into()))
            .collect();
        DocumentFilter::And(vec![
            DocumentFilter::Size {
                path: array_path.to_string(),
                size: values.len(),
            },
            DocumentFilter::ContainsAll {
                path: format!("{}.{}", array_path, key),
                values,
            },
        ])
    }

    /// Combines this filter with another one.
    pub fn and(self, other: DocumentFilter) -> Self {
        match self {
            DocumentFilter::All => other,
            DocumentFilter::And(mut filters) => {
                filters.push(other);
                DocumentFilter::And(filters)
            }
            filter => DocumentFilter::And(vec![filter, other]),
        }
    }

    /// Evaluates the filter against a document.
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            DocumentFilter::All => true,
            DocumentFilter::Eq { path, value } => {
                resolve_path(document, path).into_iter().any(|v| v == value)
            }
            DocumentFilter::Size { path, size } => resolve_path(document, path)
                .into_iter()
                .any(|v| v.as_array().is_some_and(|items| items.len() == *size)),
            DocumentFilter::ContainsAll { path, values } => {
                let present = flatten(resolve_path(document, path));
                values.iter().all(|wanted| present.contains(&wanted))
            }
            DocumentFilter::And(filters) => filters.iter().all(|f| f.matches(document)),
        }
    }
}

impl fmt::Display for DocumentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFilter::All => write!(f, "*"),
            DocumentFilter::Eq { path, value } => write!(f, "{} = {}", path, value),
            DocumentFilter::Size { path, size } => write!(f, "size({}) = {}", path, size),
            DocumentFilter::ContainsAll { path, values } => {
                write!(f, "{} contains all {}", path, Value::Array(values.clone()))
            }
            DocumentFilter::And(filters) => {
                let parts: Vec<String> = filters.iter().map(|x| x.to_string()).collect();
                write!(f, "({})", parts.join(" AND "))
            }
        }
    }
}

/// Resolves a dotted path, fanning out over arrays.
pub fn resolve_path<'a>(document: &'a Value, path: &str) -> Vec<&'a Value> {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    let mut out = Vec::new();
    resolve_segments(document, &segments, &mut out);
    out
}

fn resolve_segments<'a>(value: &'a Value, segments: &[&str], out: &mut Vec<&'a Value>) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(value);
        return;
    };
    match value {
        Value::Object(map) => {
            if let Some(next) = map.get(*head) {
                resolve_segments(next, rest, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                resolve_segments(item, segments, out);
            }
        }
        _ => {}
    }
}

fn flatten(values: Vec<&Value>) -> Vec<&Value> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Array(items) => out.extend(items.iter()),
            other => out.push(other),
        }
    }
    out
}
