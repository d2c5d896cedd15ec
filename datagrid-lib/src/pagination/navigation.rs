//! Page navigation, query changes and background prefetch.

use super::ServerPagination;
use crate::api::FetchOptions;
use crate::api::SortSpec;
use crate::cache::QueryContext;
use crate::error::Error;
use crate::model::Row;
use crate::response::Response;

/// The pages within two of `page` that exist.
///
/// `total_pages == 0` means the page count is not known yet.
pub(crate) fn neighbours(page: u32, total_pages: u32) -> Vec<u32> {
    [page.checked_sub(2), page.checked_sub(1), Some(page + 1), Some(page + 2)]
        .into_iter()
        .flatten()
        .filter(|p| *p >= 1 && (total_pages == 0 || *p <= total_pages))
        .collect()
}

impl ServerPagination {
    /// Fetches the first page under the active query.
    pub async fn load(&self) -> Result<Response<Vec<Row>>, Error> {
        self.fetch_data(self.options_for(1)).await
    }

    /// Shows `page`.
    ///
    /// A cached page is shown at once without the loading flag; if any of its
    /// neighbours is missing, a background fetch centred on `page` refills the
    /// cache. Otherwise the page is fetched in the foreground; the view moves
    /// once the rows arrive and stays put if the fetch fails.
    pub async fn go_to_page(&self, page: u32) -> Result<Response<Vec<Row>>, Error> {
        let page = page.max(1);
        let context = self.inner.query.get();

        if !context.is_searching() {
            let hit = self.inner.cache.with(|cache| {
                cache
                    .get(page, &context)
                    .map(|cached| (cached.rows.clone(), cached.cached_at))
            });
            if let Some((rows, cached_at)) = hit {
                self.next_generation();
                self.inner.view.update(|view| {
                    view.rows = rows.clone();
                    view.current_page = page;
                    view.is_loading = false;
                });
                log::debug!("Page {} served from cache", page);

                if self.inner.prefetch {
                    let total_pages = self.total_pages();
                    let missing = self.inner.cache.with(|cache| {
                        neighbours(page, total_pages)
                            .into_iter()
                            .any(|p| !cache.contains(p, &context))
                    });
                    if missing {
                        self.spawn_prefetch(page).await;
                    }
                }
                return Ok(Response::cache_hit(rows, cached_at));
            }
        }

        self.fetch_data(self.options_for(page)).await
    }

    /// Moves forward one page; does nothing on the last page.
    pub async fn next_page(&self) -> Result<Option<Response<Vec<Row>>>, Error> {
        let (current, total) = self
            .inner
            .view
            .with(|view| (view.current_page, view.total_pages));
        if current >= total {
            return Ok(None);
        }
        self.go_to_page(current + 1).await.map(Some)
    }

    /// Moves back one page; does nothing on the first page.
    pub async fn prev_page(&self) -> Result<Option<Response<Vec<Row>>>, Error> {
        let current = self.current_page();
        if current <= 1 {
            return Ok(None);
        }
        self.go_to_page(current - 1).await.map(Some)
    }

    /// Applies a new search term: fetches page 1 without prefetching.
    ///
    /// The cache is cleared and the term becomes active once the page
    /// arrives; a failed fetch leaves the previous query and page in place.
    pub async fn set_search_term(&self, term: impl Into<String>) -> Result<Response<Vec<Row>>, Error> {
        let sort = self.inner.query.with(|query| query.sort.clone());
        let context = QueryContext::new(term, sort);
        log::debug!("Search term set to '{}'", context.search_term);

        let options = FetchOptions::new(1, self.inner.page_size)
            .search(context.search_term.as_str())
            .sort_opt(context.sort)
            .without_prefetch();
        self.fetch_data(options).await
    }

    /// Applies a new ordering: refetches the current page without
    /// prefetching. Once it arrives the cache is cleared and neighbouring
    /// pages are fetched again on the next navigation.
    pub async fn set_sort(&self, sort: Option<SortSpec>) -> Result<Response<Vec<Row>>, Error> {
        let search_term = self.inner.query.with(|query| query.search_term.clone());
        log::debug!("Sort set to {:?}", sort);

        let options = FetchOptions::new(self.current_page(), self.inner.page_size)
            .search(search_term.as_str())
            .sort_opt(sort)
            .without_prefetch();
        self.fetch_data(options).await
    }

    /// Refetches the current page, bypassing the cache.
    pub async fn refresh(&self) -> Result<Response<Vec<Row>>, Error> {
        let options = self.options_for(self.current_page()).force_refresh();
        self.fetch_data(options).await
    }

    /// Fetches the window around `page` in the background.
    ///
    /// Never touches the visible page or the loading flag. Failures are only
    /// logged.
    pub async fn spawn_prefetch(&self, page: u32) {
        let query = self.inner.query.get();
        let options = FetchOptions::new(page, self.inner.page_size)
            .search(query.search_term.as_str())
            .sort_opt(query.sort.clone());
        let this = self.clone();

        log::debug!("Prefetching around page {} in the background", page);
        let handle = tokio::spawn(async move {
            match this.inner.source.load_data(&options).await {
                Ok(result) => {
                    if let Some(bundle) = result.all_prefetched_data {
                        this.merge_bundle(&query, bundle, page, result.total_pages);
                    }
                }
                Err(e) => log::warn!("Background prefetch around page {} failed: {}", page, e),
            }
        });
        self.track(handle).await;
    }
}
