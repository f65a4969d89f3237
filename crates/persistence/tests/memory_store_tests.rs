//! In-memory backend integration tests.

mod common;

use std::sync::Arc;

use serde_json::json;

use optigate_persistence::ResourceStore;
use optigate_persistence::backends::memory::MemoryStore;
use optigate_persistence::types::{Collection, DocumentFilter, FieldUpdate};

#[tokio::test]
async fn test_memory_store_contract() {
    let store = MemoryStore::new();
    common::run_store_contract(&store).await;
}

#[tokio::test]
async fn test_concurrent_increments_are_not_lost() {
    let store: Arc<dyn ResourceStore> = Arc::new(MemoryStore::new());
    store
        .create(Collection::Queries, common::query("q", "gw", "id=\"x\""))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .update_fields(
                    Collection::Queries,
                    "q",
                    &[
                        FieldUpdate::set(format!("response.data.db{}", i), json!([])),
                        FieldUpdate::increment("response.meta.data_returned", 1),
                    ],
                )
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let doc = store
        .get_one(Collection::Queries, &DocumentFilter::by_id("q"))
        .await
        .unwrap();
    assert_eq!(doc.content()["response"]["meta"]["data_returned"], 16);
    assert_eq!(
        doc.content()["response"]["data"].as_object().unwrap().len(),
        16
    );
}
