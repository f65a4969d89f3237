//! Resource collections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The collections managed by the gateway's resource store.
///
/// Each collection holds one kind of gateway resource. The string form is the
/// collection name used in storage and in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Registered OPTIMADE databases.
    Databases,
    /// Deduplicated sets of databases.
    Gateways,
    /// Federated queries and their merged responses.
    Queries,
}

impl Collection {
    /// All collections, in a stable order.
    pub const ALL: [Collection; 3] = [
        Collection::Databases,
        Collection::Gateways,
        Collection::Queries,
    ];

    /// Returns the collection name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Databases => "databases",
            Collection::Gateways => "gateways",
            Collection::Queries => "queries",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "databases" => Ok(Collection::Databases),
            "gateways" => Ok(Collection::Gateways),
            "queries" => Ok(Collection::Queries),
            other => Err(format!("unknown collection: {}", other)),
        }
    }
}
