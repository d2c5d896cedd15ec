//! Page request options and ordering.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    /// Applies the direction to an ascending comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Server-side ordering on a single column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column key.
    pub column: String,
    /// Direction.
    pub direction: Direction,
}

impl SortSpec {
    /// Ascending order on a column.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    /// Descending order on a column.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// Options for a page request.
///
/// # Example
///
/// ```
/// use datagrid_lib::api::{FetchOptions, SortSpec};
///
/// let options = FetchOptions::new(2, 10)
///     .search("puc")
///     .sort(SortSpec::desc("volume"))
///     .without_prefetch();
///
/// assert_eq!(options.search_term(), "puc");
/// assert!(!options.prefetch);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Search term; `None` or empty means no filter.
    pub search_term: Option<String>,
    /// Ordering.
    pub sort: Option<SortSpec>,
    /// Bypass the page cache.
    pub force_refresh: bool,
    /// Ask the backend for a window of neighbouring pages.
    pub prefetch: bool,
}

impl FetchOptions {
    /// Creates options for one page, with prefetching requested.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            search_term: None,
            sort: None,
            force_refresh: false,
            prefetch: true,
        }
    }

    /// Sets the search term.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search_term = if term.is_empty() { None } else { Some(term) };
        self
    }

    /// Sets the ordering.
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets the ordering from an optional spec.
    pub fn sort_opt(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    /// Bypasses the page cache.
    pub fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    /// Disables the neighbouring-page window.
    pub fn without_prefetch(mut self) -> Self {
        self.prefetch = false;
        self
    }

    /// Returns the search term, `""` when absent.
    pub fn search_term(&self) -> &str {
        self.search_term.as_deref().unwrap_or("")
    }

    /// Index of the first row of the requested page.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.page_size as usize
    }
}
