//! Stored document types.
//!
//! This module defines the [`StoredDocument`] type, which wraps a gateway
//! resource (stored as a flat JSON object) with persistence metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Collection;

/// Field holding the last modification timestamp inside every document.
pub const LAST_MODIFIED_FIELD: &str = "last_modified";

/// A gateway resource with persistence metadata.
///
/// The content is the flat document as stored: `id`, `type`,
/// `last_modified` and the resource attributes side by side. The store keeps
/// `content["last_modified"]` in sync with [`StoredDocument::last_modified`].
///
/// # Examples
///
/// ```
/// use optigate_persistence::types::{Collection, StoredDocument};
/// use serde_json::json;
///
/// let doc = StoredDocument::new(
///     Collection::Gateways,
///     "gw-1",
///     json!({"id": "gw-1", "type": "gateways", "databases": []}),
/// );
///
/// assert_eq!(doc.id(), "gw-1");
/// assert!(doc.content()["last_modified"].is_string());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    collection: Collection,
    id: String,
    content: Value,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl StoredDocument {
    /// Creates a new stored document, stamping `id` and `last_modified` into
    /// the content.
    pub fn new(collection: Collection, id: impl Into<String>, content: Value) -> Self {
        let now = Utc::now();
        Self::from_storage(collection, id, content, now, now)
    }

    /// Creates a stored document from existing data (e.g., loaded from a database).
    pub fn from_storage(
        collection: Collection,
        id: impl Into<String>,
        mut content: Value,
        created_at: DateTime<Utc>,
        last_modified: DateTime<Utc>,
    ) -> Self {
        let id = id.into();
        if let Some(obj) = content.as_object_mut() {
            obj.insert("id".to_string(), Value::String(id.clone()));
            obj.insert(
                LAST_MODIFIED_FIELD.to_string(),
                Value::String(last_modified.to_rfc3339()),
            );
        }
        Self {
            collection,
            id,
            content,
            created_at,
            last_modified,
        }
    }

    /// Returns the collection this document belongs to.
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Returns the document id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the document content.
    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Consumes self and returns the content.
    pub fn into_content(self) -> Value {
        self.content
    }

    /// Returns when the document was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the document was last modified.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Replaces the content after an update and refreshes the timestamp.
    pub(crate) fn replace_content(&mut self, content: Value, at: DateTime<Utc>) {
        self.content = content;
        self.last_modified = at;
        if let Some(obj) = self.content.as_object_mut() {
            obj.insert("id".to_string(), Value::String(self.id.clone()));
            obj.insert(
                LAST_MODIFIED_FIELD.to_string(),
                Value::String(at.to_rfc3339()),
            );
        }
    }
}
