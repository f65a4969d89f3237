//! Database handlers: the registry of OPTIMADE backends.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use optigate_federation::models::Database;
use optigate_persistence::types::DocumentFilter;
use tracing::{debug, info};

use crate::error::{RestError, RestResult};
use crate::extractors::{OptimadeQuery, Pagination};
use crate::responses::{DATABASES_TYPE, document, to_entries, to_entry};
use crate::state::AppState;

/// Lists registered databases.
///
/// # HTTP Request
///
/// `GET [base]/databases?page_limit=&page_offset=`
///
/// # Response
///
/// - `200 OK` - A page of `links` entries
/// - `501 Not Implemented` - A `filter` was given
pub async fn list_databases_handler(
    State(state): State<AppState>,
    query: OptimadeQuery,
) -> RestResult<Response> {
    debug!(query = %query.representation, "Processing database listing request");
    query.reject_filter()?;

    let config = state.config();
    let pagination = Pagination::from_query(&query, config.default_page_limit, config.max_page_limit);
    let page = state
        .resources()
        .find_databases(&DocumentFilter::All, pagination.to_store())
        .await?;

    let links_url = format!("{}{}", state.base_url(), query.representation);
    Ok(document::listing(
        to_entries(DATABASES_TYPE, &page.items)?,
        page.total,
        page.more_available,
        pagination,
        &links_url,
        &query.representation,
    ))
}

/// Registers a database.
///
/// # HTTP Request
///
/// `POST [base]/databases` with a database resource body
///
/// # Response
///
/// - `201 Created` - The registered database
/// - `400 Bad Request` - Invalid body, id or `link_type`
/// - `409 Conflict` - A database with this id exists
pub async fn create_database_handler(
    State(state): State<AppState>,
    query: OptimadeQuery,
    payload: Result<Json<Database>, JsonRejection>,
) -> RestResult<Response> {
    let Json(database) = payload.map_err(|e| RestError::bad_request(e.body_text()))?;
    debug!(database = %database.id, "Processing database registration request");

    database.validate()?;
    let stored = state.resources().insert_database(&database).await?;
    info!(database = %stored.id, base_url = %stored.base_url(), "Registered database");

    Ok(document::single(
        StatusCode::CREATED,
        to_entry(DATABASES_TYPE, &stored)?,
        &query.representation,
    ))
}

/// Reads a database by id.
///
/// # HTTP Request
///
/// `GET [base]/databases/{database_id}`
///
/// # Response
///
/// - `200 OK` - The database
/// - `404 Not Found` - No such database
pub async fn read_database_handler(
    State(state): State<AppState>,
    Path(database_id): Path<String>,
    query: OptimadeQuery,
) -> RestResult<Response> {
    debug!(database = %database_id, "Processing database read request");
    let database = state.resources().get_database(&database_id).await?;
    Ok(document::single(
        StatusCode::OK,
        to_entry(DATABASES_TYPE, &database)?,
        &query.representation,
    ))
}
