//! Page request results.

use std::collections::BTreeMap;

use crate::model::Row;

/// Number of pages needed for `total_count` rows.
pub fn total_pages_for(total_count: usize, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(page_size as usize);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// The answer to a page request.
///
/// `data` is the requested page. When prefetching was requested,
/// `all_prefetched_data` holds the window of pages fetched alongside it,
/// keyed by page number (the requested page included).
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    /// Rows of the requested page.
    pub data: Vec<Row>,
    /// Window of pages fetched alongside the requested one.
    pub all_prefetched_data: Option<BTreeMap<u32, Vec<Row>>>,
    /// Rows matching the query across all pages.
    pub total_count: usize,
    /// `ceil(total_count / page_size)`.
    pub total_pages: u32,
    /// The page `data` belongs to.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
}

impl FetchResult {
    /// Creates a result, deriving `total_pages` from the count.
    pub fn new(data: Vec<Row>, total_count: usize, page: u32, page_size: u32) -> Self {
        Self {
            data,
            all_prefetched_data: None,
            total_count,
            total_pages: total_pages_for(total_count, page_size),
            page,
            page_size,
        }
    }

    /// Attaches the prefetch bundle.
    pub fn with_prefetched(mut self, pages: BTreeMap<u32, Vec<Row>>) -> Self {
        self.all_prefetched_data = Some(pages);
        self
    }
}
