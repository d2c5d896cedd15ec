//! Server-side page cache
//!
//! A bounded map from page number to rows, tagged with the query (search term
//! and ordering) the pages were fetched under. Pages fetched under another
//! query are never served and never merged.

mod config;
mod eviction;

pub use config::*;
pub use eviction::*;

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::DateTime;
use chrono::Utc;

use crate::api::FetchOptions;
use crate::api::SortSpec;
use crate::model::Row;
use crate::model::RowId;

/// Default page capacity.
pub const MAX_CACHED_PAGES: usize = 10;

/// The query a set of cached pages belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryContext {
    /// Search term; empty when not searching.
    pub search_term: String,
    /// Server-side ordering.
    pub sort: Option<SortSpec>,
}

impl QueryContext {
    /// Creates a context.
    pub fn new(search_term: impl Into<String>, sort: Option<SortSpec>) -> Self {
        Self {
            search_term: search_term.into(),
            sort,
        }
    }

    /// The context a request was made under.
    pub fn of(options: &FetchOptions) -> Self {
        Self {
            search_term: options.search_term().to_string(),
            sort: options.sort.clone(),
        }
    }

    /// Returns `true` while a search term is active.
    pub fn is_searching(&self) -> bool {
        !self.search_term.is_empty()
    }
}

/// One cached page.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPage {
    /// Rows of the page.
    pub rows: Vec<Row>,
    /// When the page was stored.
    pub cached_at: DateTime<Utc>,
}

impl CachedPage {
    /// Creates a page stamped with the current time.
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            cached_at: Utc::now(),
        }
    }
}

/// The result of merging pages into the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Pages were stored; `evicted` lists the pages pruned to stay in capacity.
    Merged { evicted: Vec<u32> },
    /// The pages belong to another query and were dropped.
    StaleContext,
}

/// Summary of what is cached around the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSummary {
    /// Cached page numbers, ascending.
    pub pages: Vec<u32>,
    /// Page capacity.
    pub capacity: usize,
    /// Whether the current page is cached.
    pub current_cached: bool,
    /// Cached pages among the two before the current one.
    pub previous_cached: usize,
    /// How many of the two previous pages exist.
    pub previous_possible: usize,
    /// Cached pages among the two after the current one.
    pub next_cached: usize,
    /// How many of the two next pages exist.
    pub next_possible: usize,
}

/// A bounded page cache with proximity-based eviction.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use datagrid_lib::cache::{PageCache, QueryContext};
/// use datagrid_lib::model::Row;
///
/// let mut cache = PageCache::new(10);
/// let context = QueryContext::default();
///
/// let mut pages = BTreeMap::new();
/// pages.insert(1, vec![Row::new().set("id", 1i64)]);
/// cache.merge(&context, pages, 1, 3);
///
/// assert!(cache.get(1, &context).is_some());
/// assert!(cache.get(1, &QueryContext::new("foo", None)).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct PageCache {
    pages: BTreeMap<u32, CachedPage>,
    context: QueryContext,
    capacity: usize,
}

impl PageCache {
    /// Creates an empty cache for the unfiltered, unsorted query.
    pub fn new(capacity: usize) -> Self {
        Self {
            pages: BTreeMap::new(),
            context: QueryContext::default(),
            capacity,
        }
    }

    /// Creates an empty cache from configuration.
    pub fn with_config(config: &CacheConfig) -> Self {
        Self::new(config.max_cached_pages)
    }

    /// The query the cached pages belong to.
    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    /// Page capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Cached page numbers, ascending.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }

    /// Returns a cached page if it was fetched under `context` and holds rows.
    pub fn get(&self, page: u32, context: &QueryContext) -> Option<&CachedPage> {
        if *context != self.context {
            return None;
        }
        self.pages.get(&page).filter(|p| !p.rows.is_empty())
    }

    /// Returns `true` if [`get`](Self::get) would hit.
    pub fn contains(&self, page: u32, context: &QueryContext) -> bool {
        self.get(page, context).is_some()
    }

    /// Merges fetched pages, pruning around `current` if capacity is exceeded.
    pub fn merge(
        &mut self,
        context: &QueryContext,
        entries: BTreeMap<u32, Vec<Row>>,
        current: u32,
        total_pages: u32,
    ) -> MergeOutcome {
        if *context != self.context {
            log::debug!(
                "Dropping {} page(s) fetched for search '{}', cache holds search '{}'",
                entries.len(),
                context.search_term,
                self.context.search_term
            );
            return MergeOutcome::StaleContext;
        }

        for (page, rows) in entries {
            self.pages.insert(page, CachedPage::new(rows));
        }

        if self.pages.len() <= self.capacity {
            return MergeOutcome::Merged { evicted: Vec::new() };
        }

        let before = self.pages.len();
        let cached: BTreeSet<u32> = self.pages.keys().copied().collect();
        let keep = prioritize_pages(&cached, current, total_pages, self.capacity);
        let evicted: Vec<u32> = cached.difference(&keep).copied().collect();
        self.pages.retain(|page, _| keep.contains(page));

        log::debug!(
            "Pruned cache from {} to {} pages around page {}: keeping {:?}, removed {:?}",
            before,
            self.pages.len(),
            current,
            keep,
            evicted
        );

        MergeOutcome::Merged { evicted }
    }

    /// Drops every page, keeping the current query tag.
    pub fn clear(&mut self) {
        self.pages.clear();
    }

    /// Drops every page and retags the cache for a new query.
    pub fn reset(&mut self, context: QueryContext) {
        self.pages.clear();
        self.context = context;
    }

    /// Drops one page.
    pub fn invalidate(&mut self, page: u32) {
        self.pages.remove(&page);
    }

    /// Applies `changes` to the cached copy of row `id`.
    ///
    /// Returns `true` if a cached row was updated.
    pub fn patch_row(&mut self, unique_key: &str, id: &RowId, changes: &Row) -> bool {
        let mut patched = false;
        for page in self.pages.values_mut() {
            for row in page.rows.iter_mut() {
                if row.id(unique_key).as_ref() == Some(id) {
                    row.apply(changes);
                    patched = true;
                }
            }
        }
        patched
    }

    /// Summarises cache coverage around `current`.
    pub fn summary(&self, current: u32, total_pages: u32) -> CacheSummary {
        let cached = |p: u32| self.pages.get(&p).is_some_and(|page| !page.rows.is_empty());

        let previous: Vec<u32> = [current.saturating_sub(2), current.saturating_sub(1)]
            .into_iter()
            .filter(|p| *p >= 1 && *p < current)
            .collect();
        let next: Vec<u32> = [current + 1, current + 2]
            .into_iter()
            .filter(|p| *p <= total_pages)
            .collect();

        CacheSummary {
            pages: self.page_numbers(),
            capacity: self.capacity,
            current_cached: cached(current),
            previous_cached: previous.iter().filter(|p| cached(**p)).count(),
            previous_possible: previous.len(),
            next_cached: next.iter().filter(|p| cached(**p)).count(),
            next_possible: next.len(),
        }
    }
}
