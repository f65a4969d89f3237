//! OPTIMADE query-parameter extractor.
//!
//! Query strings are parsed by hand with `form_urlencoded` rather than
//! `axum::extract::Query`, since `database_ids` and `optimade_urls` may be
//! repeated.

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::request::Parts;
use optigate_federation::models::QueryParameters;
use url::form_urlencoded;

use crate::error::{RestError, RestResult};
use crate::state::AppState;

/// The OPTIMADE query parameters of a request, plus the gateway extras.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimadeQuery {
    /// The standard OPTIMADE parameters.
    pub params: QueryParameters,
    /// `database_ids`, in request order.
    pub database_ids: Vec<String>,
    /// `optimade_urls`, in request order.
    pub optimade_urls: Vec<String>,
    /// Raw `endpoint` value.
    pub endpoint: Option<String>,
    /// Raw `timeout` value.
    pub timeout: Option<String>,
    /// Path and query of the request, as received.
    pub representation: String,
}

impl OptimadeQuery {
    /// Parses a raw query string.
    ///
    /// `max_page_limit` bounds `page_limit`. Unknown parameters are ignored.
    pub fn parse(query: &str, max_page_limit: usize) -> RestResult<Self> {
        let mut parsed = OptimadeQuery::default();
        let params = &mut parsed.params;

        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.into_owned();
            match name.as_ref() {
                "filter" => params.filter = Some(value),
                "response_format" => params.response_format = Some(value),
                "email_address" => params.email_address = Some(value),
                "response_fields" => params.response_fields = Some(value),
                "sort" => params.sort = Some(value),
                "include" => params.include = Some(value),
                "page_limit" => params.page_limit = Some(parse_count(&name, &value)?),
                "page_offset" => params.page_offset = Some(parse_count(&name, &value)?),
                "page_number" => params.page_number = Some(parse_count(&name, &value)?),
                "page_cursor" => params.page_cursor = Some(parse_count(&name, &value)?),
                "page_above" => params.page_above = Some(value),
                "page_below" => params.page_below = Some(value),
                "database_ids" => parsed.database_ids.push(value),
                "optimade_urls" => parsed.optimade_urls.push(value),
                "endpoint" => parsed.endpoint = Some(value),
                "timeout" => parsed.timeout = Some(value),
                _ => {}
            }
        }

        if let Some(limit) = parsed.params.page_limit {
            if limit > max_page_limit {
                return Err(RestError::bad_request(format!(
                    "page_limit {} exceeds the maximum of {}",
                    limit, max_page_limit
                )));
            }
        }
        Ok(parsed)
    }

    /// Rejects `filter` on endpoints that list the gateway's own resources.
    pub fn reject_filter(&self) -> RestResult<()> {
        match &self.params.filter {
            Some(_) => Err(RestError::NotImplemented {
                feature: "filter on gateway resource listings".to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn parse_count(name: &str, value: &str) -> RestResult<usize> {
    value.trim().parse().map_err(|_| {
        RestError::bad_request(format!(
            "'{}' must be a non-negative integer, got '{}'",
            name, value
        ))
    })
}

impl FromRequestParts<AppState> for OptimadeQuery {
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let uri = match OriginalUri::from_request_parts(parts, state).await {
            Ok(OriginalUri(uri)) => uri,
            Err(never) => match never {},
        };
        let mut parsed = Self::parse(uri.query().unwrap_or_default(), state.config().max_page_limit)?;
        parsed.representation = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_and_repeated_parameters() {
        let query = OptimadeQuery::parse(
            "filter=nelements%3D2&page_limit=5&database_ids=a&database_ids=b\
             &optimade_urls=https%3A%2F%2Fx.org&endpoint=references&timeout=3&unknown=1",
            100,
        )
        .unwrap();
        assert_eq!(query.params.filter.as_deref(), Some("nelements=2"));
        assert_eq!(query.params.page_limit, Some(5));
        assert_eq!(query.database_ids, vec!["a", "b"]);
        assert_eq!(query.optimade_urls, vec!["https://x.org"]);
        assert_eq!(query.endpoint.as_deref(), Some("references"));
        assert_eq!(query.timeout.as_deref(), Some("3"));
    }

    #[test]
    fn test_page_limit_bounds() {
        assert!(OptimadeQuery::parse("page_limit=100", 100).is_ok());
        let err = OptimadeQuery::parse("page_limit=101", 100).unwrap_err();
        assert!(matches!(err, RestError::BadRequest { .. }));
        let err = OptimadeQuery::parse("page_offset=-1", 100).unwrap_err();
        assert!(matches!(err, RestError::BadRequest { .. }));
    }

    #[test]
    fn test_reject_filter() {
        assert!(OptimadeQuery::parse("", 10).unwrap().reject_filter().is_ok());
        let query = OptimadeQuery::parse("filter=id%3D%22x%22", 10).unwrap();
        assert!(matches!(
            query.reject_filter(),
            Err(RestError::NotImplemented { .. })
        ));
    }
}
