//! Search handlers: federated queries against an implicit gateway.
//!
//! `GET /search` submits the search and waits up to `timeout` seconds for
//! it to finish. A finished query is answered with its merged response; a
//! query still running is answered with a `307 Temporary Redirect` to the
//! query resource. `POST /search` only submits.

use std::time::Duration;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use optigate_federation::models::Search;
use optigate_federation::{EntryEndpoint, SearchOutcome};
use tracing::debug;
use url::form_urlencoded;

use crate::error::{RestError, RestResult};
use crate::extractors::OptimadeQuery;
use crate::responses::{QUERIES_TYPE, document, to_entry};
use crate::state::AppState;

/// Handler for a waiting search.
///
/// # HTTP Request
///
/// `GET [base]/search?database_ids=...&optimade_urls=...&endpoint=...&timeout=...&filter=...`
///
/// # Response
///
/// - `200 OK` - The merged response of a successful query
/// - `307 Temporary Redirect` - The query is still running; see `Location`
/// - `4xx`/`5xx` - The status of the first backend error, or a request error
pub async fn search_get_handler(
    State(state): State<AppState>,
    query: OptimadeQuery,
) -> RestResult<Response> {
    debug!(query = %query.representation, "Processing search request");

    let endpoint = parse_endpoint(query.endpoint.as_deref())?;
    let timeout = parse_timeout(query.timeout.as_deref(), state.config().search_timeout())?;
    let links_base = format!("{}{}", state.base_url(), query.representation);
    let search = Search {
        query_parameters: query.params,
        database_ids: query.database_ids,
        optimade_urls: query.optimade_urls,
        endpoint,
    };

    let service = state.service();
    let submitted = service.submit(search, &links_base).await?;
    let outcome = service
        .await_or_redirect(&submitted.query.id, timeout)
        .await?;
    Ok(outcome_response(outcome))
}

/// Handler for a detached search.
///
/// # HTTP Request
///
/// `POST [base]/search` with a search body
/// (`query_parameters`, `database_ids`, `optimade_urls`, `endpoint`)
///
/// # Response
///
/// - `202 Accepted` - The query resource; poll it for the result
/// - `400 Bad Request` - Invalid body or no target database
/// - `404 Not Found` - A database id is not registered
pub async fn search_post_handler(
    State(state): State<AppState>,
    query: OptimadeQuery,
    payload: Result<Json<Search>, JsonRejection>,
) -> RestResult<Response> {
    let Json(search) = payload.map_err(|e| RestError::bad_request(e.body_text()))?;
    debug!(
        database_ids = ?search.database_ids,
        optimade_urls = ?search.optimade_urls,
        endpoint = %search.endpoint,
        "Processing search submission"
    );

    let links_base = search_url(state.base_url(), &search);
    let submitted = state.service().submit(search, &links_base).await?;
    Ok(document::single(
        StatusCode::ACCEPTED,
        to_entry(QUERIES_TYPE, &submitted.query)?,
        &query.representation,
    ))
}

/// Parses the `endpoint` parameter, defaulting to `structures`.
pub(crate) fn parse_endpoint(raw: Option<&str>) -> RestResult<EntryEndpoint> {
    match raw {
        None => Ok(EntryEndpoint::default()),
        Some(raw) => raw.parse().map_err(RestError::bad_request),
    }
}

/// Parses the `timeout` parameter in seconds.
fn parse_timeout(raw: Option<&str>, default: Duration) -> RestResult<Duration> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(Duration::from_secs_f64(secs)),
        _ => Err(RestError::bad_request(format!(
            "'timeout' must be a non-negative number of seconds, got '{}'",
            raw
        ))),
    }
}

/// Renders the result of waiting on a query.
pub(crate) fn outcome_response(outcome: SearchOutcome) -> Response {
    match outcome {
        SearchOutcome::Finished { response, status } => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(response)).into_response()
        }
        SearchOutcome::Redirect { location, query } => {
            debug!(query = %query.id, state = %query.state, "Redirecting to running query");
            (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response()
        }
    }
}

/// The `GET /search` URL equivalent to a submitted search.
fn search_url(base_url: &str, search: &Search) -> String {
    let mut query = search
        .query_parameters
        .to_query_string(search.query_parameters.filter.as_deref());
    let mut extras = form_urlencoded::Serializer::new(String::new());
    for id in &search.database_ids {
        extras.append_pair("database_ids", id);
    }
    for url in &search.optimade_urls {
        extras.append_pair("optimade_urls", url);
    }
    extras.append_pair("endpoint", search.endpoint.as_str());
    let extras = extras.finish();

    if !query.is_empty() {
        query.push('&');
    }
    query.push_str(&extras);
    format!("{}/search?{}", base_url, query)
}
