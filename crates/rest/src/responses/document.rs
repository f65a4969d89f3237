//! Top-level OPTIMADE response documents.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use optigate_federation::models::ResponseMeta;
use optigate_federation::orchestrator::next_link;
use serde_json::{Value, json};

use crate::extractors::Pagination;

/// A response document with a single entry in `data`.
pub fn single(status: StatusCode, entry: Value, representation: &str) -> Response {
    let mut meta = ResponseMeta::for_request(representation);
    meta.data_returned = 1;
    meta.data_available = Some(1);
    (status, Json(json!({ "data": entry, "meta": meta }))).into_response()
}

/// A paginated listing document.
///
/// `total` is the number of matching resources; `links_url` is the URL the
/// `next` link is derived from.
pub fn listing(
    entries: Vec<Value>,
    total: u64,
    more_available: bool,
    pagination: Pagination,
    links_url: &str,
    representation: &str,
) -> Response {
    let mut meta = ResponseMeta::for_request(representation);
    meta.data_returned = total;
    meta.data_available = Some(total);
    meta.more_data_available = more_available;

    let next = if more_available {
        next_link(links_url, pagination.next_offset())
    } else {
        None
    };
    Json(json!({
        "data": entries,
        "meta": meta,
        "links": {"next": next},
    }))
    .into_response()
}
