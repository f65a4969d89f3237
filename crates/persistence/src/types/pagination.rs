//! Pagination types for store listings.

use serde::{Deserialize, Serialize};

use super::StoredDocument;

/// Offset-based pagination for a `find` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of documents to return; `None` returns everything.
    pub limit: Option<usize>,

    /// Number of matching documents to skip.
    pub offset: usize,
}

impl Pagination {
    /// Returns every matching document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates pagination with a limit and offset.
    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }

    /// Applies this pagination to an ordered list of matches.
    ///
    /// Returns the selected page and whether further matches remain after it.
    pub fn apply<T>(&self, matches: Vec<T>) -> (Vec<T>, bool) {
        let total = matches.len();
        let start = self.offset.min(total);
        let end = match self.limit {
            Some(limit) => start.saturating_add(limit).min(total),
            None => total,
        };
        let more = end < total;
        let page = matches.into_iter().skip(start).take(end - start).collect();
        (page, more)
    }
}

/// The result of a `find` call.
#[derive(Debug, Clone)]
pub struct FindResult {
    /// The documents on the requested page, in insertion order.
    pub items: Vec<StoredDocument>,

    /// Total number of documents matching the filter.
    pub total: u64,

    /// Whether more matching documents exist beyond this page.
    pub more_available: bool,
}

impl FindResult {
    /// Returns true if the page is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of documents on the page.
    pub fn len(&self) -> usize {
        self.items.len()
    }
}
