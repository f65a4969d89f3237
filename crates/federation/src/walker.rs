//! Pagination walker for bulk inventory fetches.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::client::{BackendClient, BackendResponse, RequestTarget};
use crate::endpoint::{EntryEndpoint, ResponseSchema};
use crate::models::Database;

/// Follows `links.next` until a backend has no more data.
///
/// All or nothing per backend: an error on any page discards what was
/// collected so far. A backend that claims more data without a `next` link
/// keeps the pages already fetched.
#[derive(Clone)]
pub struct PaginationWalker {
    client: Arc<dyn BackendClient>,
    max_pages: Option<usize>,
}

impl PaginationWalker {
    /// Creates a walker; `max_pages` bounds the number of requests per walk.
    pub fn new(client: Arc<dyn BackendClient>, max_pages: Option<usize>) -> Self {
        Self { client, max_pages }
    }

    /// Collects every entry of `endpoint` from `database`.
    pub async fn collect_all(
        &self,
        database: &Database,
        endpoint: EntryEndpoint,
        schema: ResponseSchema,
    ) -> (Vec<Value>, Database) {
        self.collect_from(database, endpoint, schema, RequestTarget::empty())
            .await
    }

    /// Like [`collect_all`](Self::collect_all), starting at an explicit target.
    pub async fn collect_from(
        &self,
        database: &Database,
        endpoint: EntryEndpoint,
        schema: ResponseSchema,
        first: RequestTarget,
    ) -> (Vec<Value>, Database) {
        let mut entries = Vec::new();
        let mut target = first;
        let mut pages = 0usize;

        loop {
            if self.max_pages.is_some_and(|max| pages >= max) {
                warn!(
                    database = %database.id,
                    pages,
                    "Stopped paginating after reaching the page limit"
                );
                break;
            }
            pages += 1;

            let response = match self.client.get(database, endpoint, schema, &target).await {
                BackendResponse::Success(response) => response,
                other => {
                    let errors = other
                        .into_error_response()
                        .map(|r| r.errors)
                        .unwrap_or_default();
                    warn!(
                        database = %database.id,
                        endpoint = %endpoint,
                        errors = ?errors,
                        "Backend returned an error while paginating; discarding its entries"
                    );
                    return (Vec::new(), database.clone());
                }
            };

            let more = response.more_data_available();
            let next = response.next_link();
            entries.extend(response.data);
            debug!(database = %database.id, page = pages, total = entries.len(), "Fetched page");

            if !more {
                break;
            }
            match next {
                Some(url) => target = RequestTarget::Url(url),
                None => {
                    error!(
                        database = %database.id,
                        endpoint = %endpoint,
                        "Backend reports more data available but provides no next link"
                    );
                    break;
                }
            }
        }

        (entries, database.clone())
    }
}
