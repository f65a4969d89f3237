//! Gateway registry: find-or-create gateways by database set.

use std::collections::HashSet;
use std::sync::Arc;

use optigate_persistence::types::{DocumentFilter, Pagination};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{FederationError, FederationResult};
use crate::models::{Database, Gateway, GatewayCreate};
use crate::resources::Resources;

/// Finds or creates the gateway for a set of databases.
///
/// Gateway identity is the set of database ids: a second request for the same
/// databases, in any order, returns the gateway created by the first.
/// Lookups and creations are serialized, so concurrent requests for one
/// database set never create two gateways.
#[derive(Clone)]
pub struct GatewayRegistry {
    resources: Resources,
    create_lock: Arc<Mutex<()>>,
}

impl GatewayRegistry {
    /// Creates a registry over the given resources.
    pub fn new(resources: Resources) -> Self {
        Self {
            resources,
            create_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the gateway for `databases` and whether it was just created.
    ///
    /// Databases are deduplicated by id, first occurrence wins.
    ///
    /// # Errors
    ///
    /// * `FederationError::BadRequest` - If no database is given
    /// * `FederationError::Consistency` - If more than one gateway already
    ///   federates this database set
    pub async fn find_or_create(
        &self,
        databases: Vec<Database>,
    ) -> FederationResult<(Gateway, bool)> {
        let databases = dedup_databases(databases);
        if databases.is_empty() {
            return Err(FederationError::BadRequest(
                "a gateway needs at least one database".to_string(),
            ));
        }

        let ids: Vec<String> = databases.iter().map(|db| db.id.clone()).collect();
        let _guard = self.create_lock.lock().await;
        let filter = DocumentFilter::set_equals("databases", "id", ids.iter().cloned());
        let mut found = self
            .resources
            .find_gateways(&filter, Pagination::all())
            .await?;

        match found.items.len() {
            0 => {}
            1 => {
                let gateway = found.items.remove(0);
                info!(gateway = %gateway.id, "A gateway was found and reused");
                return Ok((gateway, false));
            }
            n => {
                let gateway_ids: Vec<&str> = found.items.iter().map(|g| g.id.as_str()).collect();
                return Err(FederationError::Consistency(format!(
                    "{} gateways {:?} federate the same databases {:?}",
                    n, gateway_ids, ids
                )));
            }
        }

        let gateway = Gateway {
            id: uuid::Uuid::new_v4().to_string(),
            databases,
            last_modified: None,
        };
        let gateway = self.resources.insert_gateway(&gateway).await?;
        info!(gateway = %gateway.id, databases = ?ids, "Created new gateway");
        Ok((gateway, true))
    }

    /// Resolves a gateway creation request and finds or creates its gateway.
    ///
    /// `database_ids` must name registered databases; `databases` are taken
    /// as given after validation.
    pub async fn register(&self, request: GatewayCreate) -> FederationResult<(Gateway, bool)> {
        let mut databases = Vec::with_capacity(request.database_ids.len() + request.databases.len());
        for id in &request.database_ids {
            databases.push(self.resources.get_database(id).await?);
        }
        for database in request.databases {
            database.validate()?;
            databases.push(database);
        }
        debug!(count = databases.len(), "Resolved gateway databases");
        self.find_or_create(databases).await
    }
}

fn dedup_databases(databases: Vec<Database>) -> Vec<Database> {
    let mut seen = HashSet::new();
    databases
        .into_iter()
        .filter(|db| seen.insert(db.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut second = Database::new("a", "https://second.example.org");
        second.name = "second".to_string();
        let deduped = dedup_databases(vec![
            Database::new("a", "https://first.example.org"),
            Database::new("b", "https://b.example.org"),
            second,
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].base_url(), "https://first.example.org");
    }
}
