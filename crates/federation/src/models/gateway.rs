//! Gateway resources: deduplicated sets of databases.

use serde::{Deserialize, Serialize};

use super::Database;

/// A named set of databases queried together.
///
/// Two gateways are the same gateway when their database id sets are equal;
/// order is kept but does not count for identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gateway {
    pub id: String,
    pub databases: Vec<Database>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl Gateway {
    /// Ids of the constituent databases, in gateway order.
    pub fn database_ids(&self) -> Vec<&str> {
        self.databases.iter().map(|db| db.id.as_str()).collect()
    }
}

/// Body of a gateway creation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayCreate {
    /// Ids of registered databases.
    #[serde(default)]
    pub database_ids: Vec<String>,
    /// Full database resources, registered or not.
    #[serde(default)]
    pub databases: Vec<Database>,
}
