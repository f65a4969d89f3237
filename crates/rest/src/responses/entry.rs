//! Entry resource rendering.
//!
//! Gateway resources are stored flat; over HTTP they are JSON:API resource
//! objects `{id, type, attributes}`. A gateway's embedded databases are
//! rendered the same way, as `links` resources.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RestResult;

/// Entry type of registered databases.
pub const DATABASES_TYPE: &str = "links";
/// Entry type of gateways.
pub const GATEWAYS_TYPE: &str = "gateways";
/// Entry type of queries.
pub const QUERIES_TYPE: &str = "queries";

/// Renders a resource as an entry of `entry_type`.
pub fn to_entry<T: Serialize>(entry_type: &str, resource: &T) -> RestResult<Value> {
    Ok(entry_from_value(entry_type, serde_json::to_value(resource)?))
}

/// Renders a list of resources as entries of `entry_type`.
pub fn to_entries<T: Serialize>(entry_type: &str, resources: &[T]) -> RestResult<Vec<Value>> {
    resources.iter().map(|r| to_entry(entry_type, r)).collect()
}

fn entry_from_value(entry_type: &str, value: Value) -> Value {
    let Value::Object(mut attributes) = value else {
        return value;
    };
    let id = attributes.remove("id").unwrap_or(Value::Null);
    attributes.remove("type");

    if entry_type == GATEWAYS_TYPE {
        if let Some(Value::Array(databases)) = attributes.remove("databases") {
            let nested = databases
                .into_iter()
                .map(|db| entry_from_value(DATABASES_TYPE, db))
                .collect();
            attributes.insert("databases".to_string(), Value::Array(nested));
        }
    }

    let mut entry = Map::new();
    entry.insert("id".to_string(), id);
    entry.insert("type".to_string(), Value::String(entry_type.to_string()));
    entry.insert("attributes".to_string(), Value::Object(attributes));
    Value::Object(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use optigate_federation::models::{Database, Gateway};

    #[test]
    fn test_database_entry() {
        let db = Database::new("mp", "https://mp.example.org");
        let entry = to_entry(DATABASES_TYPE, &db).unwrap();
        assert_eq!(entry["id"], "mp");
        assert_eq!(entry["type"], "links");
        assert_eq!(entry["attributes"]["base_url"], "https://mp.example.org");
        assert_eq!(entry["attributes"]["link_type"], "child");
        assert!(entry["attributes"].get("id").is_none());
    }

    #[test]
    fn test_gateway_nests_database_entries() {
        let gateway = Gateway {
            id: "g1".to_string(),
            databases: vec![Database::new("a", "https://a.example.org")],
            last_modified: None,
        };
        let entry = to_entry(GATEWAYS_TYPE, &gateway).unwrap();
        let nested = &entry["attributes"]["databases"][0];
        assert_eq!(nested["id"], "a");
        assert_eq!(nested["type"], "links");
        assert_eq!(nested["attributes"]["name"], "a");
    }
}
