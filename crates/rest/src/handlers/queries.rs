//! Query handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use optigate_federation::models::QueryCreate;
use optigate_persistence::types::DocumentFilter;
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::extractors::{OptimadeQuery, Pagination};
use crate::responses::{QUERIES_TYPE, document, to_entries, to_entry};
use crate::state::AppState;

/// Lists queries.
///
/// # HTTP Request
///
/// `GET [base]/queries?page_limit=&page_offset=`
///
/// # Response
///
/// - `200 OK` - A page of `queries` entries
/// - `501 Not Implemented` - A `filter` was given
pub async fn list_queries_handler(
    State(state): State<AppState>,
    query: OptimadeQuery,
) -> RestResult<Response> {
    debug!(query = %query.representation, "Processing query listing request");
    query.reject_filter()?;

    let config = state.config();
    let pagination = Pagination::from_query(&query, config.default_page_limit, config.max_page_limit);
    let page = state
        .resources()
        .find_queries(&DocumentFilter::All, pagination.to_store())
        .await?;

    let links_url = format!("{}{}", state.base_url(), query.representation);
    Ok(document::listing(
        to_entries(QUERIES_TYPE, &page.items)?,
        page.total,
        page.more_available,
        pagination,
        &links_url,
        &query.representation,
    ))
}

/// Creates (or reuses) a query against an existing gateway.
///
/// The query runs in the background; poll `GET /queries/{id}` for its state.
///
/// # HTTP Request
///
/// `POST [base]/queries` with `gateway_id`, `query_parameters` and `endpoint`
///
/// # Response
///
/// - `202 Accepted` - The query resource
/// - `404 Not Found` - No such gateway
pub async fn create_query_handler(
    State(state): State<AppState>,
    query: OptimadeQuery,
    payload: Result<Json<QueryCreate>, JsonRejection>,
) -> RestResult<Response> {
    let Json(request) = payload.map_err(|e| RestError::bad_request(e.body_text()))?;
    debug!(
        gateway = %request.gateway_id,
        endpoint = %request.endpoint,
        "Processing query creation request"
    );

    // Next links of the stored response point at the equivalent gateway listing.
    let mut links_base = format!(
        "{}/gateways/{}/{}",
        state.base_url(),
        request.gateway_id,
        request.endpoint
    );
    let params = request
        .query_parameters
        .to_query_string(request.query_parameters.filter.as_deref());
    if !params.is_empty() {
        links_base.push('?');
        links_base.push_str(&params);
    }

    let submitted = state.service().create_query(request, &links_base).await?;
    Ok(document::single(
        StatusCode::ACCEPTED,
        to_entry(QUERIES_TYPE, &submitted.query)?,
        &query.representation,
    ))
}

/// Reads a query, including its state and (partial) response.
///
/// # HTTP Request
///
/// `GET [base]/queries/{query_id}`
///
/// # Response
///
/// - `200 OK` - The query resource
/// - `404 Not Found` - No such query
pub async fn read_query_handler(
    State(state): State<AppState>,
    Path(query_id): Path<String>,
    query: OptimadeQuery,
) -> RestResult<Response> {
    debug!(query_id = %query_id, "Processing query read request");
    let stored = state.resources().get_query(&query_id).await?;
    Ok(document::single(
        StatusCode::OK,
        to_entry(QUERIES_TYPE, &stored)?,
        &query.representation,
    ))
}
