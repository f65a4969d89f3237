//! Pagination of the gateway's own resource listings.

use optigate_persistence::types::Pagination as StorePagination;

use super::OptimadeQuery;

/// `page_limit`/`page_offset` pagination for listing endpoints.
///
/// # Example
///
/// ```rust
/// use optigate_rest::extractors::Pagination;
///
/// let page = Pagination::new(10, 20, 100);
/// assert_eq!(page.next_offset(), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page size (number of items to return).
    limit: usize,
    /// Offset (number of items to skip).
    offset: usize,
}

impl Pagination {
    /// Creates a new Pagination, capping `limit` at `max_limit`.
    pub fn new(limit: usize, offset: usize, max_limit: usize) -> Self {
        Self {
            limit: limit.min(max_limit),
            offset,
        }
    }

    /// Pagination requested by a query, with `default_limit` when unset.
    pub fn from_query(query: &OptimadeQuery, default_limit: usize, max_limit: usize) -> Self {
        Self::new(
            query.params.page_limit.unwrap_or(default_limit),
            query.params.page_offset.unwrap_or(0),
            max_limit,
        )
    }

    /// Returns the page size.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Offset of the following page.
    pub fn next_offset(&self) -> usize {
        self.offset + self.limit
    }

    /// The equivalent store pagination.
    pub fn to_store(&self) -> StorePagination {
        StorePagination::new(self.limit, self.offset)
    }
}
