//! Database resources: registered external OPTIMADE endpoints.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{FederationError, FederationResult};

/// Matches a trailing version segment such as `/v1` or `/v1.0.2`.
static VERSION_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/v[0-9]+(\.[0-9]+){0,2}$").expect("version suffix regex is valid")
});

/// OPTIMADE link types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Child,
    Root,
    External,
    Providers,
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkType::Child => "child",
            LinkType::Root => "root",
            LinkType::External => "external",
            LinkType::Providers => "providers",
        };
        f.write_str(s)
    }
}

/// A JSON:API link: a bare URL or a `{href, meta}` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Link {
    Url(String),
    Object {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<Value>,
    },
}

impl Link {
    /// The URL this link points at.
    pub fn href(&self) -> &str {
        match self {
            Link::Url(url) => url,
            Link::Object { href, .. } => href,
        }
    }
}

impl From<&str> for Link {
    fn from(url: &str) -> Self {
        Link::Url(url.to_string())
    }
}

/// A registered OPTIMADE database.
///
/// Stored flat in the `databases` collection and embedded verbatim in every
/// gateway that federates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_url: Link,
    #[serde(default)]
    pub homepage: Option<Link>,
    pub link_type: LinkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl Database {
    /// Creates a `child` database.
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            base_url: Link::Url(base_url.into()),
            homepage: None,
            link_type: LinkType::Child,
            aggregate: None,
            last_modified: None,
        }
    }

    /// Builds an unregistered database for a raw OPTIMADE base URL.
    ///
    /// The id is `host[:port][/path]` with `.` replaced by `__`, so it can be
    /// used as a field name in stored responses. A trailing version segment
    /// (`/v1`, `/v1.1`, ...) is dropped from the base URL.
    pub fn from_optimade_url(raw: &str) -> FederationResult<Self> {
        let trimmed = raw.trim().trim_end_matches('/');
        let base = VERSION_SUFFIX.replace(trimmed, "").into_owned();
        let url = Url::parse(&base)
            .map_err(|e| FederationError::BadRequest(format!("invalid OPTIMADE URL '{}': {}", raw, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| FederationError::BadRequest(format!("OPTIMADE URL '{}' has no host", raw)))?;

        let mut id = host.to_string();
        if let Some(port) = url.port() {
            id.push_str(&format!(":{}", port));
        }
        let path = url.path().trim_end_matches('/');
        id.push_str(path);
        let id = id.replace('.', "__");

        let mut database = Database::new(id, base);
        database.description = format!("Ad-hoc database for {}", raw);
        Ok(database)
    }

    /// The base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.href().trim_end_matches('/')
    }

    /// Checks the database may be registered and federated.
    pub fn validate(&self) -> FederationResult<()> {
        if self.id.is_empty() {
            return Err(FederationError::Validation(
                "database id must not be empty".to_string(),
            ));
        }
        if self.id.contains('.') {
            return Err(FederationError::Validation(format!(
                "database id '{}' must not contain '.'",
                self.id
            )));
        }
        if matches!(self.link_type, LinkType::Root | LinkType::Providers) {
            return Err(FederationError::Validation(format!(
                "database '{}' has link_type '{}'; only 'child' and 'external' databases can be federated",
                self.id, self.link_type
            )));
        }
        Url::parse(self.base_url.href()).map_err(|e| {
            FederationError::Validation(format!(
                "database '{}' has an invalid base_url: {}",
                self.id, e
            ))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_optimade_url_strips_version_and_dots() {
        let db = Database::from_optimade_url("https://example.org:8443/optimade/v1.1/").unwrap();
        assert_eq!(db.id, "example__org:8443/optimade");
        assert_eq!(db.base_url(), "https://example.org:8443/optimade");
        assert_eq!(db.link_type, LinkType::Child);

        let db = Database::from_optimade_url("http://localhost:5001").unwrap();
        assert_eq!(db.id, "localhost:5001");
    }

    #[test]
    fn test_from_optimade_url_rejects_garbage() {
        assert!(Database::from_optimade_url("not a url").is_err());
    }

    #[test]
    fn test_validate_rejects_root_and_providers() {
        let mut db = Database::new("mcloud", "https://aiida.materialscloud.org");
        assert!(db.validate().is_ok());
        db.link_type = LinkType::External;
        assert!(db.validate().is_ok());
        db.link_type = LinkType::Root;
        assert!(matches!(db.validate(), Err(FederationError::Validation(_))));
        db.link_type = LinkType::Providers;
        assert!(db.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dotted_id() {
        let db = Database::new("a.b", "https://a.b");
        assert!(db.validate().is_err());
    }

    #[test]
    fn test_link_object_base_url() {
        let db: Database = serde_json::from_value(json!({
            "id": "odbx",
            "name": "odbx",
            "description": "open database of xtals",
            "base_url": {"href": "https://optimade.odbx.science/", "meta": {"_odbx_note": 1}},
            "homepage": null,
            "link_type": "child"
        }))
        .unwrap();
        assert_eq!(db.base_url(), "https://optimade.odbx.science");
    }
}
