//! Search requests: a query against an implicit gateway.

use serde::{Deserialize, Serialize};

use super::QueryParameters;
use crate::endpoint::EntryEndpoint;
use crate::error::{FederationError, FederationResult};

/// A federated search request.
///
/// The target databases are the union of `database_ids` (registered
/// databases) and `optimade_urls` (ad-hoc databases).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Search {
    #[serde(default)]
    pub query_parameters: QueryParameters,
    #[serde(default)]
    pub database_ids: Vec<String>,
    #[serde(default)]
    pub optimade_urls: Vec<String>,
    #[serde(default)]
    pub endpoint: EntryEndpoint,
}

impl Search {
    /// Rejects searches without any target database.
    pub fn validate(&self) -> FederationResult<()> {
        if self.database_ids.is_empty() && self.optimade_urls.is_empty() {
            return Err(FederationError::BadRequest(
                "a search needs at least one of 'database_ids' or 'optimade_urls'".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_search_is_rejected() {
        assert!(Search::default().validate().is_err());
        let search = Search {
            optimade_urls: vec!["https://example.org".to_string()],
            ..Search::default()
        };
        assert!(search.validate().is_ok());
    }
}
