//! Gateway handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use optigate_federation::models::{GatewayCreate, QueryCreate};
use optigate_persistence::types::DocumentFilter;
use tracing::debug;

use super::search::{outcome_response, parse_endpoint};
use crate::error::{RestError, RestResult};
use crate::extractors::{OptimadeQuery, Pagination};
use crate::responses::{GATEWAYS_TYPE, document, to_entries, to_entry};
use crate::state::AppState;

/// Lists gateways.
///
/// # HTTP Request
///
/// `GET [base]/gateways?page_limit=&page_offset=`
///
/// # Response
///
/// - `200 OK` - A page of `gateways` entries
/// - `501 Not Implemented` - A `filter` was given
pub async fn list_gateways_handler(
    State(state): State<AppState>,
    query: OptimadeQuery,
) -> RestResult<Response> {
    debug!(query = %query.representation, "Processing gateway listing request");
    query.reject_filter()?;

    let config = state.config();
    let pagination = Pagination::from_query(&query, config.default_page_limit, config.max_page_limit);
    let page = state
        .resources()
        .find_gateways(&DocumentFilter::All, pagination.to_store())
        .await?;

    let links_url = format!("{}{}", state.base_url(), query.representation);
    Ok(document::listing(
        to_entries(GATEWAYS_TYPE, &page.items)?,
        page.total,
        page.more_available,
        pagination,
        &links_url,
        &query.representation,
    ))
}

/// Finds or creates the gateway for a set of databases.
///
/// # HTTP Request
///
/// `POST [base]/gateways` with `database_ids` and/or `databases`
///
/// # Response
///
/// - `201 Created` - A new gateway
/// - `200 OK` - An existing gateway over the same databases
/// - `400 Bad Request` - No databases, or an invalid database
/// - `404 Not Found` - A database id is not registered
pub async fn create_gateway_handler(
    State(state): State<AppState>,
    query: OptimadeQuery,
    payload: Result<Json<GatewayCreate>, JsonRejection>,
) -> RestResult<Response> {
    let Json(request) = payload.map_err(|e| RestError::bad_request(e.body_text()))?;
    debug!(
        database_ids = ?request.database_ids,
        databases = request.databases.len(),
        "Processing gateway creation request"
    );

    let (gateway, created) = state.service().registry().register(request).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(document::single(
        status,
        to_entry(GATEWAYS_TYPE, &gateway)?,
        &query.representation,
    ))
}

/// Reads a gateway by id.
///
/// # HTTP Request
///
/// `GET [base]/gateways/{gateway_id}`
pub async fn read_gateway_handler(
    State(state): State<AppState>,
    Path(gateway_id): Path<String>,
    query: OptimadeQuery,
) -> RestResult<Response> {
    debug!(gateway = %gateway_id, "Processing gateway read request");
    let gateway = state.resources().get_gateway(&gateway_id).await?;
    Ok(document::single(
        StatusCode::OK,
        to_entry(GATEWAYS_TYPE, &gateway)?,
        &query.representation,
    ))
}

/// Runs a federated entry listing against an existing gateway.
///
/// Behaves like `GET /search` with the gateway's databases and the default
/// timeout.
///
/// # HTTP Request
///
/// `GET [base]/gateways/{gateway_id}/{structures|references|links}?filter=...`
///
/// # Response
///
/// - `200 OK` - The merged response
/// - `307 Temporary Redirect` - The query is still running
/// - `404 Not Found` - No such gateway or entry endpoint
pub async fn gateway_entries_handler(
    State(state): State<AppState>,
    Path((gateway_id, endpoint)): Path<(String, String)>,
    query: OptimadeQuery,
) -> RestResult<Response> {
    debug!(
        gateway = %gateway_id,
        endpoint = %endpoint,
        query = %query.representation,
        "Processing gateway entry listing request"
    );
    let endpoint = parse_endpoint(Some(&endpoint)).map_err(|_| RestError::NotFound {
        resource: "endpoints".to_string(),
        id: endpoint.clone(),
    })?;

    let links_base = format!("{}{}", state.base_url(), query.representation);
    let request = QueryCreate {
        gateway_id,
        query_parameters: query.params,
        endpoint,
    };
    let service = state.service();
    let submitted = service.create_query(request, &links_base).await?;
    let outcome = service
        .await_or_redirect(&submitted.query.id, state.config().search_timeout())
        .await?;
    Ok(outcome_response(outcome))
}
