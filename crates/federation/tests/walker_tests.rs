//! Pagination walker tests.

mod common;

use std::sync::Arc;

use common::MockBackendClient;
use optigate_federation::models::Database;
use optigate_federation::walker::PaginationWalker;
use optigate_federation::{EntryEndpoint, ResponseSchema};

const PAGE_2: &str = "https://db.example.org/v1/structures?page_offset=2";
const PAGE_3: &str = "https://db.example.org/v1/structures?page_offset=4";

fn database() -> Database {
    Database::new("db", "https://db.example.org")
}

async fn walk(client: Arc<MockBackendClient>, max_pages: Option<usize>) -> Vec<String> {
    let walker = PaginationWalker::new(client, max_pages);
    let (entries, db) = walker
        .collect_all(
            &database(),
            EntryEndpoint::Structures,
            ResponseSchema::StructureResponseMany,
        )
        .await;
    assert_eq!(db.id, "db");
    entries
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_follows_next_links_until_exhausted() {
    let client = Arc::new(MockBackendClient::new());
    client
        .respond("db", common::listing("structures", &["1", "2"], true, Some(PAGE_2)))
        .respond_to_url(PAGE_2, common::listing("structures", &["3", "4"], true, Some(PAGE_3)))
        .respond_to_url(PAGE_3, common::listing("structures", &["5"], false, None));

    assert_eq!(walk(client.clone(), None).await, vec!["1", "2", "3", "4", "5"]);
    let urls: Vec<String> = client.requests().into_iter().map(|(_, url)| url).collect();
    assert_eq!(
        urls,
        vec!["https://db.example.org/v1/structures", PAGE_2, PAGE_3]
    );
}

#[tokio::test]
async fn test_error_on_later_page_discards_everything() {
    let client = Arc::new(MockBackendClient::new());
    client
        .respond("db", common::listing("structures", &["1", "2"], true, Some(PAGE_2)))
        .respond_to_url(PAGE_2, common::upstream_error("500", "boom"));

    assert!(walk(client, None).await.is_empty());
}

#[tokio::test]
async fn test_missing_next_link_keeps_partial_result() {
    let client = Arc::new(MockBackendClient::new());
    client.respond("db", common::listing("structures", &["1", "2"], true, None));

    assert_eq!(walk(client.clone(), None).await, vec!["1", "2"]);
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn test_page_bound_stops_the_walk() {
    let client = Arc::new(MockBackendClient::new());
    client
        .respond("db", common::listing("structures", &["1", "2"], true, Some(PAGE_2)))
        .respond_to_url(PAGE_2, common::listing("structures", &["3", "4"], true, Some(PAGE_3)));

    assert_eq!(walk(client.clone(), Some(2)).await, vec!["1", "2", "3", "4"]);
    assert_eq!(client.requests().len(), 2);
}
