//! HTTP backend client tests against a throwaway OPTIMADE server.

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::json;
use tokio::net::TcpListener;

use optigate_federation::client::FailureKind;
use optigate_federation::models::Database;
use optigate_federation::{
    BackendClient, BackendResponse, EntryEndpoint, HttpBackendClient, RequestTarget,
    ResponseSchema,
};

async fn structures() -> impl IntoResponse {
    axum::Json(json!({
        "data": [{"id": "s1", "type": "structures", "attributes": {"nelements": 2}}],
        "meta": {"more_data_available": false, "data_returned": 1},
        "links": {"next": null}
    }))
}

async fn references() -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "errors": [{"status": "400", "title": "Bad Request", "detail": "unknown property"}],
            "meta": {"more_data_available": false}
        })),
    )
}

async fn links() -> impl IntoResponse {
    (StatusCode::BAD_GATEWAY, "<html>502 Bad Gateway</html>")
}

/// Serves a small OPTIMADE API, returning its base URL.
async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/v1/structures", get(structures))
        .route("/v1/references", get(references))
        .route("/v1/links", get(links));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn fetch(base_url: &str, endpoint: EntryEndpoint) -> BackendResponse {
    let client = HttpBackendClient::new(Duration::from_secs(5)).unwrap();
    let database = Database::new("local", base_url);
    client
        .get(
            &database,
            endpoint,
            ResponseSchema::for_endpoint(endpoint),
            &RequestTarget::Query("page_limit=1".to_string()),
        )
        .await
}

#[tokio::test]
async fn test_valid_listing_is_a_success() {
    let base = spawn_backend().await;
    match fetch(&base, EntryEndpoint::Structures).await {
        BackendResponse::Success(response) => {
            assert_eq!(response.data.len(), 1);
            assert!(!response.more_data_available());
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_error_document_is_an_error_regardless_of_status() {
    let base = spawn_backend().await;
    match fetch(&base, EntryEndpoint::References).await {
        BackendResponse::Error(response) => {
            assert_eq!(response.errors[0].status_code(), Some(400));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_body_is_a_decode_failure() {
    let base = spawn_backend().await;
    match fetch(&base, EntryEndpoint::Links).await {
        BackendResponse::Failure(failure) => {
            assert_eq!(failure.kind, FailureKind::JsonDecode);
            assert_eq!(failure.url, format!("{}/v1/links?page_limit=1", base));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_refused_connection_is_a_transport_failure() {
    // Bind and drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    match fetch(&format!("http://{}", addr), EntryEndpoint::Structures).await {
        BackendResponse::Failure(failure) => assert_eq!(failure.kind, FailureKind::Transport),
        other => panic!("unexpected outcome: {:?}", other),
    }
}
