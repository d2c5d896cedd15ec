//! Page fetch coordination: cache hit or backend fetch, then merge.

use std::collections::BTreeMap;

use chrono::Utc;

use super::ServerPagination;
use crate::api::FetchOptions;
use crate::api::FetchResult;
use crate::cache::MergeOutcome;
use crate::cache::QueryContext;
use crate::error::Error;
use crate::model::Row;
use crate::notify::Toast;
use crate::response::Response;

impl ServerPagination {
    /// Shows `options.page`, from the cache when possible.
    ///
    /// Pages cached under another search term or ordering are never served.
    /// A request under a new query becomes the active query, and resets the
    /// cache, only once its response arrives. `force_refresh` skips the cache
    /// lookup.
    ///
    /// On failure the visible page, the active query and the cache keep their
    /// last good value; the error is logged and reported to the notifier,
    /// then returned.
    pub async fn fetch_data(&self, options: FetchOptions) -> Result<Response<Vec<Row>>, Error> {
        let context = QueryContext::of(&options);
        let generation = self.next_generation();

        if !options.force_refresh {
            let hit = self.inner.cache.with(|cache| {
                cache
                    .get(options.page, &context)
                    .map(|page| (page.rows.clone(), page.cached_at))
            });
            if let Some((rows, cached_at)) = hit {
                log::debug!("Page {} served from cache", options.page);
                self.inner.view.update(|view| {
                    view.rows = rows.clone();
                    view.current_page = options.page;
                    view.is_loading = false;
                });
                return Ok(Response::cache_hit(rows, cached_at));
            }
        }

        log::debug!(
            "Fetching page {} (search '{}', prefetch {}, force {})",
            options.page,
            context.search_term,
            options.prefetch,
            options.force_refresh
        );
        self.inner.view.update(|view| view.is_loading = true);

        match self.inner.source.load_data(&options).await {
            Ok(result) => {
                let rows = result.data.clone();
                if self.is_current(generation) {
                    self.adopt_query(&context);
                }
                self.apply_result(generation, &context, options.page, result);
                if options.force_refresh {
                    Ok(Response::bypassed(rows))
                } else {
                    Ok(Response::cache_miss(rows, Utc::now()))
                }
            }
            Err(e) => {
                if self.is_current(generation) {
                    self.inner.view.update(|view| view.is_loading = false);
                }
                log::error!("Failed to load page {}: {}", options.page, e);
                self.inner
                    .notifier
                    .notify(Toast::error("Failed to load data").with_description(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Makes `context` the active query, resetting the cache if it changed.
    pub(super) fn adopt_query(&self, context: &QueryContext) {
        let changed = self.inner.query.with(|query| query != context);
        if !changed {
            return;
        }
        log::debug!(
            "Query changed to search '{}', sort {:?}; clearing cache",
            context.search_term,
            context.sort
        );
        self.inner.query.set(context.clone());
        self.inner.cache.update(|cache| cache.reset(context.clone()));
    }

    fn apply_result(&self, generation: u64, context: &QueryContext, requested: u32, result: FetchResult) {
        let total_pages = result.total_pages;

        if self.is_current(generation) {
            self.inner.view.update(|view| {
                view.rows = result.data;
                view.total_count = result.total_count;
                view.total_pages = result.total_pages;
                view.current_page = result.page;
                view.is_loading = false;
            });
        } else {
            log::debug!("Discarding stale response for page {}", result.page);
        }

        if let Some(bundle) = result.all_prefetched_data {
            self.merge_bundle(context, bundle, requested, total_pages);
        }
    }

    /// Merges a prefetch bundle centred on `current`.
    pub(super) fn merge_bundle(
        &self,
        context: &QueryContext,
        bundle: BTreeMap<u32, Vec<Row>>,
        current: u32,
        total_pages: u32,
    ) {
        let pages: Vec<u32> = bundle.keys().copied().collect();
        let outcome = self
            .inner
            .cache
            .update(|cache| cache.merge(context, bundle, current, total_pages));
        match outcome {
            MergeOutcome::Merged { evicted } if !evicted.is_empty() => {
                log::debug!("Cached pages {:?}, evicted {:?}", pages, evicted);
            }
            MergeOutcome::Merged { .. } => log::debug!("Cached pages {:?}", pages),
            MergeOutcome::StaleContext => {
                log::debug!("Dropped prefetch bundle {:?} for a superseded query", pages)
            }
        }
    }
}
