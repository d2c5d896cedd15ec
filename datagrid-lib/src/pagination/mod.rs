//! Server-side pagination
//!
//! [`ServerPagination`] owns the visible page, the page cache and the active
//! query. Page requests are served from the cache when possible and fetched
//! through the [`DataSource`] otherwise; every prefetch bundle a fetch brings
//! back is merged into the cache under the query it was fetched for.
//!
//! Foreground requests take a generation number. A response that arrives
//! after a newer request was issued still feeds the cache but never replaces
//! the visible page or clears the loading flag.

mod coordinator;
mod navigation;

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::api::DataSource;
use crate::api::FetchOptions;
use crate::cache::CacheConfig;
use crate::cache::CacheSummary;
use crate::cache::PageCache;
use crate::cache::QueryContext;
use crate::model::Row;
use crate::model::RowId;
use crate::notify::Notifier;
use crate::state::State;

/// The page currently shown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageView {
    pub rows: Vec<Row>,
    pub total_count: usize,
    pub total_pages: u32,
    /// 1-based.
    pub current_page: u32,
    /// A foreground fetch is outstanding.
    pub is_loading: bool,
}

/// Cache-backed pagination over a [`DataSource`].
///
/// Cheap to clone; clones share state.
///
/// # Example
///
/// ```ignore
/// use datagrid_lib::pagination::ServerPagination;
///
/// let pagination = ServerPagination::new(source, notifier, 10, &CacheConfig::default());
/// pagination.load().await?;
/// pagination.next_page().await?;
/// println!("{:?}", pagination.cache_status());
/// ```
#[derive(Clone)]
pub struct ServerPagination {
    inner: Arc<ServerPaginationInner>,
}

struct ServerPaginationInner {
    source: Arc<dyn DataSource>,
    notifier: Arc<dyn Notifier>,
    page_size: u32,
    prefetch: bool,
    view: State<PageView>,
    cache: State<PageCache>,
    query: State<QueryContext>,
    generation: AtomicU64,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ServerPagination {
    /// Creates pagination over `source`. Nothing is fetched until
    /// [`load`](Self::load) or a navigation call.
    pub fn new(
        source: Arc<dyn DataSource>,
        notifier: Arc<dyn Notifier>,
        page_size: u32,
        cache: &CacheConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ServerPaginationInner {
                source,
                notifier,
                page_size,
                prefetch: cache.prefetch,
                view: State::new(PageView {
                    current_page: 1,
                    ..PageView::default()
                }),
                cache: State::new(PageCache::with_config(cache)),
                query: State::default(),
                generation: AtomicU64::new(0),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    // =========================================================================
    // View
    // =========================================================================

    /// Snapshot of the visible page.
    pub fn view(&self) -> PageView {
        self.inner.view.get()
    }

    /// Shared handle to the visible page; its dirty flag marks re-render.
    pub fn view_state(&self) -> State<PageView> {
        self.inner.view.clone()
    }

    pub fn rows(&self) -> Vec<Row> {
        self.inner.view.with(|view| view.rows.clone())
    }

    pub fn current_page(&self) -> u32 {
        self.inner.view.with(|view| view.current_page)
    }

    pub fn total_pages(&self) -> u32 {
        self.inner.view.with(|view| view.total_pages)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.view.with(|view| view.is_loading)
    }

    pub fn page_size(&self) -> u32 {
        self.inner.page_size
    }

    /// The active search term and ordering.
    pub fn query(&self) -> QueryContext {
        self.inner.query.get()
    }

    // =========================================================================
    // Cache
    // =========================================================================

    /// Coverage of the cache around the current page.
    pub fn cache_status(&self) -> CacheSummary {
        let (current, total) = self
            .inner
            .view
            .with(|view| (view.current_page, view.total_pages));
        self.inner.cache.with(|cache| cache.summary(current, total))
    }

    /// Cached page numbers, ascending.
    pub fn cached_pages(&self) -> Vec<u32> {
        self.inner.cache.with(|cache| cache.page_numbers())
    }

    /// Drops every cached page.
    pub fn clear_cache(&self) {
        self.inner.cache.update(|cache| cache.clear());
    }

    /// Folds an accepted update into the cached and visible copies of a row.
    pub fn patch_row(&self, unique_key: &str, id: &RowId, changes: &Row) {
        self.inner
            .cache
            .update(|cache| cache.patch_row(unique_key, id, changes));
        self.inner.view.update(|view| {
            for row in view.rows.iter_mut() {
                if row.id(unique_key).as_ref() == Some(id) {
                    row.apply(changes);
                }
            }
        });
    }

    /// Removes a row from the visible page ahead of the refetch.
    pub fn remove_row(&self, unique_key: &str, id: &RowId) {
        self.inner.view.update(|view| {
            view.rows.retain(|row| row.id(unique_key).as_ref() != Some(id));
        });
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Options for `page` under the active query.
    ///
    /// Prefetching is off while searching.
    fn options_for(&self, page: u32) -> FetchOptions {
        let query = self.inner.query.get();
        let options = FetchOptions::new(page, self.inner.page_size)
            .search(query.search_term.as_str())
            .sort_opt(query.sort.clone());
        if !self.inner.prefetch || query.is_searching() {
            options.without_prefetch()
        } else {
            options
        }
    }

    fn next_generation(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == generation
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    async fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.inner.tasks.lock().await;
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    /// Waits for every background task spawned so far.
    pub async fn settle(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = {
                let mut tasks = self.inner.tasks.lock().await;
                std::mem::take(&mut *tasks)
            };
            if pending.is_empty() {
                return;
            }
            for result in futures::future::join_all(pending).await {
                if let Err(e) = result {
                    log::warn!("Background task ended abnormally: {}", e);
                }
            }
        }
    }
}
