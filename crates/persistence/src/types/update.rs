//! Partial document updates.
//!
//! Updates are addressed by dotted field path, so a caller can change one
//! nested field (e.g. `response.data.db1`) without rewriting the document.
//! A batch of updates passed to a single store call is applied atomically.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DocumentError;

/// A single field-level change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldUpdate {
    /// Sets the field at `path`, creating intermediate objects as needed.
    Set {
        /// Dotted field path.
        path: String,
        /// The new value.
        value: Value,
    },
    /// Adds `by` to the numeric field at `path` (missing or null counts as 0).
    Increment {
        /// Dotted field path.
        path: String,
        /// The amount to add.
        by: i64,
    },
}

impl FieldUpdate {
    /// Creates a set update.
    pub fn set(path: impl Into<String>, value: impl Into<Value>) -> Self {
        FieldUpdate::Set {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Creates an increment update.
    pub fn increment(path: impl Into<String>, by: i64) -> Self {
        FieldUpdate::Increment {
            path: path.into(),
            by,
        }
    }

    /// Returns the field path this update targets.
    pub fn path(&self) -> &str {
        match self {
            FieldUpdate::Set { path, .. } | FieldUpdate::Increment { path, .. } => path,
        }
    }
}

/// Applies a batch of updates to a document, all or nothing.
///
/// The document is only modified when every update applies cleanly.
pub fn apply_updates(document: &mut Value, updates: &[FieldUpdate]) -> Result<(), DocumentError> {
    let mut working = document.clone();
    for update in updates {
        apply_update(&mut working, update)?;
    }
    *document = working;
    Ok(())
}

fn apply_update(document: &mut Value, update: &FieldUpdate) -> Result<(), DocumentError> {
    let path = update.path();
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(DocumentError::InvalidPath {
            path: path.to_string(),
            message: "empty path segment".to_string(),
        });
    }

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| DocumentError::InvalidPath {
            path: path.to_string(),
            message: "empty path".to_string(),
        })?;

    let mut current = document;
    for segment in parents {
        current = child_object(current, path)?
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    let parent = child_object(current, path)?;

    match update {
        FieldUpdate::Set { value, .. } => {
            parent.insert(last.to_string(), value.clone());
        }
        FieldUpdate::Increment { by, .. } => {
            let slot = parent.entry(last.to_string()).or_insert(Value::Null);
            *slot = increment_value(slot, *by, path)?;
        }
    }
    Ok(())
}

/// Views `value` as an object, turning `null` into an empty object.
fn child_object<'a>(
    value: &'a mut Value,
    path: &str,
) -> Result<&'a mut Map<String, Value>, DocumentError> {
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
    value
        .as_object_mut()
        .ok_or_else(|| DocumentError::InvalidPath {
            path: path.to_string(),
            message: "intermediate value is not an object".to_string(),
        })
}

fn increment_value(current: &Value, by: i64, path: &str) -> Result<Value, DocumentError> {
    match current {
        Value::Null => Ok(Value::from(by)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i.saturating_add(by)))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::from(f + by as f64))
            } else {
                Err(DocumentError::NotNumeric {
                    path: path.to_string(),
                })
            }
        }
        _ => Err(DocumentError::NotNumeric {
            path: path.to_string(),
        }),
    }
}
