//! Test infrastructure for the persistence layer.
//!
//! Fixtures for the three gateway collections and a backend-agnostic contract
//! suite that every [`ResourceStore`] implementation must pass.

#![allow(dead_code)]

use serde_json::{Value, json};

use optigate_persistence::types::{Collection, DocumentFilter, FieldUpdate, Pagination};
use optigate_persistence::{ResourceStore, StoreError};

/// A database document as registered through `POST /databases`.
pub fn database(id: &str, base_url: &str) -> Value {
    json!({
        "id": id,
        "type": "links",
        "name": id,
        "description": format!("{} test database", id),
        "base_url": base_url,
        "homepage": null,
        "link_type": "child"
    })
}

/// A gateway document embedding the given databases.
pub fn gateway(id: &str, database_ids: &[&str]) -> Value {
    let databases: Vec<Value> = database_ids
        .iter()
        .map(|db| database(db, &format!("https://{}.example.org", db)))
        .collect();
    json!({"id": id, "type": "gateways", "databases": databases})
}

/// A freshly created query document.
pub fn query(id: &str, gateway_id: &str, filter: &str) -> Value {
    json!({
        "id": id,
        "type": "queries",
        "gateway_id": gateway_id,
        "endpoint": "structures",
        "state": "created",
        "query_parameters": {"filter": filter, "page_limit": 10},
        "response": null
    })
}

/// Exercises the full store contract against a fresh, empty store.
pub async fn run_store_contract<S: ResourceStore>(store: &S) {
    create_and_get(store).await;
    find_preserves_insertion_order_and_paginates(store).await;
    gateway_lookup_by_database_set(store).await;
    query_progress_updates(store).await;
    missing_documents(store).await;
}

async fn create_and_get<S: ResourceStore>(store: &S) {
    let created = store
        .create(
            Collection::Databases,
            database("mcloud/2dstructures", "https://a.example.org"),
        )
        .await
        .unwrap();
    assert_eq!(created.id(), "mcloud/2dstructures");
    assert!(created.content()["last_modified"].is_string());

    let fetched = store
        .get_one(
            Collection::Databases,
            &DocumentFilter::by_id("mcloud/2dstructures"),
        )
        .await
        .unwrap();
    assert_eq!(fetched.content()["base_url"], "https://a.example.org");
    assert!(
        store
            .exists(Collection::Databases, "mcloud/2dstructures")
            .await
            .unwrap()
    );

    let by_url = store
        .get_one(
            Collection::Databases,
            &DocumentFilter::eq("base_url", "https://a.example.org"),
        )
        .await
        .unwrap();
    assert_eq!(by_url.id(), "mcloud/2dstructures");
}

async fn find_preserves_insertion_order_and_paginates<S: ResourceStore>(store: &S) {
    for id in ["q-3", "q-1", "q-2"] {
        store
            .create(Collection::Queries, query(id, "gw", "nelements=2"))
            .await
            .unwrap();
    }

    let all = store
        .find(Collection::Queries, &DocumentFilter::All, Pagination::all())
        .await
        .unwrap();
    let ids: Vec<&str> = all.items.iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec!["q-3", "q-1", "q-2"]);
    assert_eq!(all.total, 3);
    assert!(!all.more_available);

    let page = store
        .find(Collection::Queries, &DocumentFilter::All, Pagination::new(2, 1))
        .await
        .unwrap();
    let ids: Vec<&str> = page.items.iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec!["q-1", "q-2"]);
    assert_eq!(page.total, 3);
    assert!(!page.more_available);

    let first = store
        .find(Collection::Queries, &DocumentFilter::All, Pagination::new(1, 0))
        .await
        .unwrap();
    assert!(first.more_available);
}

async fn gateway_lookup_by_database_set<S: ResourceStore>(store: &S) {
    store
        .create(Collection::Gateways, gateway("gw-ab", &["a", "b"]))
        .await
        .unwrap();
    store
        .create(Collection::Gateways, gateway("gw-abc", &["a", "b", "c"]))
        .await
        .unwrap();

    let found = store
        .find(
            Collection::Gateways,
            &DocumentFilter::set_equals("databases", "id", ["b", "a"]),
            Pagination::all(),
        )
        .await
        .unwrap();
    assert_eq!(found.items.len(), 1);
    assert_eq!(found.items[0].id(), "gw-ab");

    let none = store
        .count(
            Collection::Gateways,
            Some(&DocumentFilter::set_equals("databases", "id", ["a"])),
        )
        .await
        .unwrap();
    assert_eq!(none, 0);
    assert_eq!(store.count(Collection::Gateways, None).await.unwrap(), 2);
}

async fn query_progress_updates<S: ResourceStore>(store: &S) {
    let created = store
        .create(Collection::Queries, query("q-progress", "gw-ab", "elements HAS \"Si\""))
        .await
        .unwrap();

    let updated = store
        .update_fields(
            Collection::Queries,
            created.id(),
            &[
                FieldUpdate::set("state", "in progress"),
                FieldUpdate::set("response.data.a", json!([{"id": "a/1"}])),
                FieldUpdate::increment("response.meta.data_returned", 1),
                FieldUpdate::increment("response.meta.data_available", 5),
            ],
        )
        .await
        .unwrap();
    assert_eq!(updated.content()["state"], "in progress");
    assert!(updated.last_modified() >= created.last_modified());

    store
        .update_fields(
            Collection::Queries,
            created.id(),
            &[
                FieldUpdate::set("response.data.b", json!([{"id": "b/1"}, {"id": "b/2"}])),
                FieldUpdate::increment("response.meta.data_returned", 2),
            ],
        )
        .await
        .unwrap();

    let reloaded = store
        .get_one(Collection::Queries, &DocumentFilter::by_id("q-progress"))
        .await
        .unwrap();
    let content = reloaded.content();
    assert_eq!(content["response"]["meta"]["data_returned"], 3);
    assert_eq!(content["response"]["meta"]["data_available"], 5);
    assert_eq!(content["response"]["data"]["a"][0]["id"], "a/1");
    assert_eq!(content["response"]["data"]["b"][1]["id"], "b/2");

    let dedup = DocumentFilter::eq("endpoint", "structures")
        .and(DocumentFilter::eq("gateway_id", "gw-ab"))
        .and(DocumentFilter::eq(
            "query_parameters",
            json!({"filter": "elements HAS \"Si\"", "page_limit": 10}),
        ));
    let same = store.get_one(Collection::Queries, &dedup).await.unwrap();
    assert_eq!(same.id(), "q-progress");

    let failed = store
        .update_fields(
            Collection::Queries,
            "q-progress",
            &[
                FieldUpdate::set("state", "finished"),
                FieldUpdate::increment("state", 1),
            ],
        )
        .await;
    assert!(matches!(failed, Err(StoreError::Document(_))));
    let unchanged = store
        .get_one(Collection::Queries, &DocumentFilter::by_id("q-progress"))
        .await
        .unwrap();
    assert_eq!(unchanged.content()["state"], "in progress");
}

async fn missing_documents<S: ResourceStore>(store: &S) {
    let err = store
        .get_one(Collection::Gateways, &DocumentFilter::by_id("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let err = store
        .get_one(Collection::Gateways, &DocumentFilter::eq("type", "nothing"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NoMatch { .. }));
    assert!(err.is_not_found());

    assert!(!store.exists(Collection::Gateways, "nope").await.unwrap());
}
