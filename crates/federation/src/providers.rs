//! Database discovery from the OPTIMADE providers directory.
//!
//! The directory lists providers; each provider's index meta-database lists
//! its `child` databases. Every child with a base URL not already registered
//! becomes a registered database.

use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::client::RequestTarget;
use crate::endpoint::{EntryEndpoint, ResponseSchema};
use crate::error::{FederationError, FederationResult};
use crate::models::{Database, Link, LinkType};
use crate::resources::Resources;
use crate::walker::PaginationWalker;

/// The public OPTIMADE providers directory.
pub const PROVIDERS_URL: &str = "https://providers.optimade.org/v1/links";

/// Placeholder providers listed in the directory.
const SKIPPED_PROVIDERS: [&str; 2] = ["exmpl", "optimade"];

/// Registers databases discovered through a providers directory.
pub struct ProvidersLoader {
    resources: Resources,
    walker: PaginationWalker,
}

impl ProvidersLoader {
    /// Creates a loader.
    pub fn new(resources: Resources, walker: PaginationWalker) -> Self {
        Self { resources, walker }
    }

    /// Walks `providers_url` and registers every new child database.
    ///
    /// Returns the databases that were registered. Providers that fail to
    /// answer are skipped.
    pub async fn load(&self, providers_url: &str) -> FederationResult<Vec<Database>> {
        let schema = ResponseSchema::for_endpoint(EntryEndpoint::Links);
        let mut directory = Database::new("providers", providers_url);
        directory.link_type = LinkType::Providers;

        let (providers, _) = self
            .walker
            .collect_from(
                &directory,
                EntryEndpoint::Links,
                schema,
                RequestTarget::Url(providers_url.to_string()),
            )
            .await;
        info!(count = providers.len(), url = %providers_url, "Fetched OPTIMADE providers");

        let mut tasks: JoinSet<(Vec<Value>, Database)> = JoinSet::new();
        for provider in &providers {
            let Some(id) = provider.get("id").and_then(Value::as_str) else {
                continue;
            };
            if SKIPPED_PROVIDERS.contains(&id) {
                continue;
            }
            let Some(base_url) = attribute_href(provider, "base_url") else {
                debug!(provider = %id, "Provider has no base_url, skipping");
                continue;
            };
            let index = Database::new(id, base_url);
            let walker = self.walker.clone();
            tasks.spawn(async move {
                walker
                    .collect_all(&index, EntryEndpoint::Links, schema)
                    .await
            });
        }

        let mut registered = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (links, provider) = match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!(error = %e, "Task join error while loading providers");
                    continue;
                }
            };
            registered.extend(self.register_children(&provider, &links).await?);
        }

        info!(count = registered.len(), "Registered databases from providers");
        Ok(registered)
    }

    async fn register_children(
        &self,
        provider: &Database,
        links: &[Value],
    ) -> FederationResult<Vec<Database>> {
        let children: Vec<(&Value, String)> = links
            .iter()
            .filter(|link| attribute(link, "link_type").and_then(Value::as_str) == Some("child"))
            .filter_map(|link| attribute_href(link, "base_url").map(|url| (link, url)))
            .collect();

        let mut registered = Vec::new();
        for (link, base_url) in &children {
            let link_id = link.get("id").and_then(Value::as_str).unwrap_or_default();
            let id = if children.len() == 1 {
                provider.id.clone()
            } else {
                format!("{}/{}", provider.id, link_id)
            };
            let id = id.replace('.', "__");

            if self.resources.database_base_url_registered(base_url).await? {
                debug!(database = %id, base_url = %base_url, "Database already registered");
                continue;
            }

            let database = Database {
                name: attribute(link, "name")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or_else(|| id.clone()),
                description: attribute(link, "description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                base_url: Link::Url(base_url.clone()),
                homepage: attribute_href(link, "homepage").map(Link::Url),
                link_type: LinkType::Child,
                aggregate: attribute(link, "aggregate")
                    .and_then(Value::as_str)
                    .map(String::from),
                last_modified: None,
                id,
            };
            if let Err(e) = database.validate() {
                warn!(database = %database.id, error = %e, "Skipping invalid provider database");
                continue;
            }

            match self.resources.insert_database(&database).await {
                Ok(stored) => {
                    debug!(database = %stored.id, "Registered provider database");
                    registered.push(stored);
                }
                Err(FederationError::AlreadyExists { id, .. }) => {
                    debug!(database = %id, "Database id already registered");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(registered)
    }
}

/// An attribute of an entry resource (`attributes.<name>`).
fn attribute<'a>(entry: &'a Value, name: &str) -> Option<&'a Value> {
    entry.get("attributes")?.get(name)
}

/// A link attribute, in string or `{href}` form.
fn attribute_href(entry: &Value, name: &str) -> Option<String> {
    match attribute(entry, name)? {
        Value::String(url) => Some(url.clone()),
        Value::Object(obj) => obj.get("href").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_href_forms() {
        let entry = json!({
            "id": "mcloud",
            "type": "links",
            "attributes": {
                "base_url": {"href": "https://aiida.materialscloud.org/optimade-index", "meta": {}},
                "homepage": "https://www.materialscloud.org",
                "name": null
            }
        });
        assert_eq!(
            attribute_href(&entry, "base_url").as_deref(),
            Some("https://aiida.materialscloud.org/optimade-index")
        );
        assert_eq!(
            attribute_href(&entry, "homepage").as_deref(),
            Some("https://www.materialscloud.org")
        );
        assert_eq!(attribute_href(&entry, "name"), None);
        assert_eq!(attribute_href(&entry, "missing"), None);
    }
}
