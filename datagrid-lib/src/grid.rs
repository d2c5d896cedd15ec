//! The grid facade

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::api::DataSource;
use crate::api::FetchOptions;
use crate::api::Mutate;
use crate::api::UserDirectory;
use crate::cache::CacheSummary;
use crate::config::GridConfig;
use crate::edit::BlurOutcome;
use crate::edit::ChangeOutcome;
use crate::edit::EditState;
use crate::edit::EditTracker;
use crate::edit::PointerTarget;
use crate::edit::RowUpdate;
use crate::error::BackendError;
use crate::error::ConfigError;
use crate::error::Error;
use crate::filter;
use crate::filter::FilterQuery;
use crate::filter::SearchField;
use crate::filter::SortState;
use crate::model::ColumnDefinition;
use crate::model::GridSchema;
use crate::model::Row;
use crate::model::RowId;
use crate::model::User;
use crate::model::Value;
use crate::notify::LogNotifier;
use crate::notify::Notifier;
use crate::notify::Toast;
use crate::pagination::ServerPagination;
use crate::registry::ComponentRegistry;
use crate::registry::EditorView;
use crate::registry::Rendered;
use crate::state::State;

/// Paging figures of the visible page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: usize,
    pub is_loading: bool,
}

/// A headless data grid.
///
/// Pages through a [`DataSource`] with a page cache when
/// `server_side_pagination` is on, otherwise filters, sorts and slices rows
/// held in memory. Cell and row edits are tracked per row and sent through
/// [`Mutate`] with only the changed keys. Every collaborator failure is
/// logged and reported to the [`Notifier`]; the grid stays usable.
///
/// Cheap to clone; clones share state.
///
/// # Example
///
/// ```ignore
/// use datagrid_lib::{DataGrid, GridConfig};
///
/// let grid = DataGrid::builder(schema)
///     .config(GridConfig::default().with_server_side_pagination(true))
///     .backend(backend)
///     .build()?;
///
/// grid.load().await?;
/// grid.next_page().await?;
/// grid.cell_click(&id, "name").await?;
/// ```
#[derive(Clone)]
pub struct DataGrid {
    inner: Arc<DataGridInner>,
}

struct DataGridInner {
    schema: Arc<GridSchema>,
    config: GridConfig,
    registry: ComponentRegistry,
    source: Option<Arc<dyn DataSource>>,
    mutate: Option<Arc<dyn Mutate>>,
    directory: Option<Arc<dyn UserDirectory>>,
    notifier: Arc<dyn Notifier>,
    mode: Mode,
    sort: State<SortState>,
    tracker: State<EditTracker>,
    users: State<Vec<User>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

enum Mode {
    Server(ServerPagination),
    Client {
        rows: State<Vec<Row>>,
        query: State<FilterQuery>,
    },
}

impl DataGrid {
    /// Creates a builder for a grid over `schema`.
    pub fn builder(schema: GridSchema) -> DataGridBuilder {
        DataGridBuilder::new(schema)
    }

    pub fn schema(&self) -> &GridSchema {
        &self.inner.schema
    }

    pub fn config(&self) -> &GridConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.inner.registry
    }

    fn unique_key(&self) -> &str {
        &self.inner.schema.unique_key
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Loads the first page (server mode) or every row (client mode), then
    /// the user directory.
    pub async fn load(&self) -> Result<(), Error> {
        match &self.inner.mode {
            Mode::Server(pagination) => {
                pagination.load().await?;
            }
            Mode::Client { .. } => {
                if let Some(source) = &self.inner.source {
                    let options = FetchOptions::new(1, u32::MAX).without_prefetch();
                    match source.load_data(&options).await {
                        Ok(result) => self.set_data(result.data),
                        Err(e) => return Err(self.report("Failed to load data", e)),
                    }
                }
            }
        }
        self.sync_tracker();
        self.load_users().await
    }

    /// Replaces the in-memory rows (client mode).
    pub fn set_data(&self, rows: Vec<Row>) {
        if let Mode::Client { rows: data, .. } = &self.inner.mode {
            data.set(rows);
            self.sync_tracker();
        } else {
            log::warn!("set_data ignored: grid pages through its data source");
        }
    }

    /// Fetches the user directory, if one is configured.
    pub async fn load_users(&self) -> Result<(), Error> {
        let Some(directory) = &self.inner.directory else {
            return Ok(());
        };
        match directory.users().await {
            Ok(users) => {
                log::debug!("Loaded {} users", users.len());
                self.inner.users.set(users);
                Ok(())
            }
            Err(e) => Err(self.report("Failed to load users", e)),
        }
    }

    pub fn users(&self) -> Vec<User> {
        self.inner.users.get()
    }

    /// Reloads the current page, bypassing the cache.
    pub async fn refresh(&self) -> Result<(), Error> {
        match &self.inner.mode {
            Mode::Server(pagination) => {
                pagination.refresh().await?;
                self.sync_tracker();
                Ok(())
            }
            Mode::Client { .. } => self.load().await,
        }
    }

    // =========================================================================
    // View
    // =========================================================================

    /// Rows of the visible page.
    pub fn visible_rows(&self) -> Vec<Row> {
        match &self.inner.mode {
            Mode::Server(pagination) => pagination.rows(),
            Mode::Client { rows, query } => {
                let query = query.get();
                rows.with(|rows| filter::apply(rows, &self.inner.schema, &query).rows)
            }
        }
    }

    pub fn page_info(&self) -> PageInfo {
        match &self.inner.mode {
            Mode::Server(pagination) => {
                let view = pagination.view();
                PageInfo {
                    current_page: view.current_page,
                    total_pages: view.total_pages,
                    total_count: view.total_count,
                    is_loading: view.is_loading,
                }
            }
            Mode::Client { rows, query } => {
                let query = query.get();
                let view = rows.with(|rows| filter::apply(rows, &self.inner.schema, &query));
                PageInfo {
                    current_page: view.current_page,
                    total_pages: view.total_pages,
                    total_count: view.total_items,
                    is_loading: false,
                }
            }
        }
    }

    /// Page cache coverage (server mode).
    pub fn cache_status(&self) -> Option<CacheSummary> {
        match &self.inner.mode {
            Mode::Server(pagination) => Some(pagination.cache_status()),
            Mode::Client { .. } => None,
        }
    }

    /// The pagination controller (server mode).
    pub fn pagination(&self) -> Option<&ServerPagination> {
        match &self.inner.mode {
            Mode::Server(pagination) => Some(pagination),
            Mode::Client { .. } => None,
        }
    }

    /// Renders one cell, showing the draft while it is edited.
    pub fn render_cell(&self, id: &RowId, key: &str) -> Result<Rendered, Error> {
        let column = self.column(key)?;
        self.inner.tracker.with(|tracker| {
            let row = tracker.row(id).ok_or_else(|| Error::UnknownRow(id.to_string()))?;
            let mut shown = row.clone();
            if let Some(value) = tracker.display_value(id, key) {
                shown.insert(key, value.clone());
            }
            let users = self.inner.users.get();
            Ok(self.inner.registry.render(column, &shown, &users))
        })
    }

    /// The editor of a cell in edit mode, `None` otherwise.
    pub fn cell_editor(&self, id: &RowId, key: &str) -> Result<Option<EditorView>, Error> {
        let column = self.column(key)?;
        self.inner.tracker.with(|tracker| {
            let row = tracker.row(id).ok_or_else(|| Error::UnknownRow(id.to_string()))?;
            if !tracker.is_editing(id, key) {
                return Ok(None);
            }
            let value = tracker.display_value(id, key).cloned().unwrap_or(Value::Null);
            let users = self.inner.users.get();
            Ok(self.inner.registry.editor(column, row, &value, &users))
        })
    }

    fn column(&self, key: &str) -> Result<&ColumnDefinition, Error> {
        self.inner
            .schema
            .get_column(key)
            .ok_or_else(|| Error::UnknownColumn(key.to_string()))
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub async fn go_to_page(&self, page: u32) -> Result<(), Error> {
        match &self.inner.mode {
            Mode::Server(pagination) => {
                pagination.go_to_page(page).await?;
            }
            Mode::Client { query, .. } => {
                let total_pages = self.page_info().total_pages;
                query.update(|query| query.page = page.clamp(1, total_pages.max(1)));
            }
        }
        self.sync_tracker();
        Ok(())
    }

    /// Does nothing on the last page.
    pub async fn next_page(&self) -> Result<(), Error> {
        let info = self.page_info();
        if info.current_page >= info.total_pages {
            return Ok(());
        }
        self.go_to_page(info.current_page + 1).await
    }

    /// Does nothing on the first page.
    pub async fn prev_page(&self) -> Result<(), Error> {
        let info = self.page_info();
        if info.current_page <= 1 {
            return Ok(());
        }
        self.go_to_page(info.current_page - 1).await
    }

    /// Applies a search term and returns to page 1.
    pub async fn set_search_term(&self, term: impl Into<String>) -> Result<(), Error> {
        let term = term.into();
        match &self.inner.mode {
            Mode::Server(pagination) => {
                pagination.set_search_term(term).await?;
            }
            Mode::Client { query, .. } => query.update(|query| {
                query.search_term = term;
                query.page = 1;
            }),
        }
        self.sync_tracker();
        Ok(())
    }

    /// Restricts the search to one column (client mode).
    pub fn set_search_field(&self, field: SearchField) {
        if let Mode::Client { query, .. } = &self.inner.mode {
            query.update(|query| {
                query.search_field = field;
                query.page = 1;
            });
            self.sync_tracker();
        }
    }

    pub fn sort_state(&self) -> SortState {
        self.inner.sort.get()
    }

    /// Cycles the sort of a column through ascending, descending and off.
    ///
    /// Columns declared not sortable are left alone. Client mode keeps every
    /// sorted column, ordered by priority. The server sorts on one column, so
    /// in server mode the toggled column replaces the sort; the cache is
    /// cleared and the current page refetched in the new order. A failed
    /// refetch keeps the previous sort.
    pub async fn toggle_sort(&self, key: &str) -> Result<(), Error> {
        if self.inner.schema.get_column(key).is_some_and(|c| !c.sortable) {
            return Ok(());
        }

        match &self.inner.mode {
            Mode::Server(pagination) => {
                let next = self.inner.sort.with(|sort| {
                    let mut next = match sort.get(key) {
                        Some(config) => SortState::single(key, config.direction),
                        None => SortState::unsorted(),
                    };
                    next.toggle(key);
                    next
                });
                pagination.set_sort(next.primary()).await?;
                self.inner.sort.set(next);
            }
            Mode::Client { query, .. } => {
                let sort = self.inner.sort.update(|sort| {
                    sort.toggle(key);
                    sort.clone()
                });
                query.update(|query| query.sort = sort);
            }
        }
        self.sync_tracker();
        Ok(())
    }

    fn sync_tracker(&self) {
        let rows = self.visible_rows();
        self.inner.tracker.update(|tracker| tracker.sync(&rows));
    }

    // =========================================================================
    // Editing
    // =========================================================================

    pub fn edit_state(&self, id: &RowId) -> EditState {
        self.inner.tracker.with(|tracker| tracker.state(id))
    }

    pub fn is_editing(&self, id: &RowId, key: &str) -> bool {
        self.inner.tracker.with(|tracker| tracker.is_editing(id, key))
    }

    /// Enters cell-edit mode, committing the previously edited cell.
    pub async fn cell_click(&self, id: &RowId, key: &str) -> Result<(), Error> {
        let committed = self.inner.tracker.update(|tracker| tracker.cell_click(id, key))?;
        if let Some(update) = committed {
            self.persist(update).await?;
        }
        Ok(())
    }

    /// Records an editor value; change-committed columns save at once.
    pub async fn cell_change(&self, id: &RowId, key: &str, value: impl Into<Value>) -> Result<(), Error> {
        let value = value.into();
        let outcome = self
            .inner
            .tracker
            .update(|tracker| tracker.cell_change(id, key, value))?;

        if let ChangeOutcome::DeferredExit(update) = outcome {
            let saved = match update {
                Some(update) => self.persist(update).await,
                None => Ok(()),
            };
            self.finish_deferred_exit().await;
            saved?;
        }
        Ok(())
    }

    /// Focus left a cell.
    pub async fn cell_blur(&self, id: &RowId, key: &str) -> Result<(), Error> {
        let outcome = self.inner.tracker.update(|tracker| tracker.cell_blur(id, key));
        self.settle_blur(outcome).await
    }

    /// A pointer press anywhere in the document.
    pub async fn pointer_down(&self, target: &PointerTarget) -> Result<(), Error> {
        let outcome = self.inner.tracker.update(|tracker| tracker.pointer_down(target));
        self.settle_blur(outcome).await
    }

    async fn settle_blur(&self, outcome: BlurOutcome) -> Result<(), Error> {
        match outcome {
            BlurOutcome::Committed(Some(update)) => self.persist(update).await,
            BlurOutcome::DeferredExit(update) => {
                let saved = match update {
                    Some(update) => self.persist(update).await,
                    None => Ok(()),
                };
                self.finish_deferred_exit().await;
                saved
            }
            _ => Ok(()),
        }
    }

    /// Lets the editor's own event handling run before leaving edit mode.
    async fn finish_deferred_exit(&self) {
        tokio::task::yield_now().await;
        self.inner.tracker.update(|tracker| tracker.finish_deferred_exit());
    }

    pub fn edit_row(&self, id: &RowId) -> Result<bool, Error> {
        self.inner.tracker.update(|tracker| tracker.edit_row(id))
    }

    /// Saves a row in row-edit mode; nothing is sent if nothing changed.
    pub async fn save_row(&self, id: &RowId) -> Result<(), Error> {
        let update = self.inner.tracker.update(|tracker| tracker.save_row(id))?;
        match update {
            Some(update) => self.persist(update).await,
            None => Ok(()),
        }
    }

    pub fn cancel_row(&self, id: &RowId) -> Result<(), Error> {
        self.inner.tracker.update(|tracker| tracker.cancel_row(id))
    }

    /// Sends an update and folds the result back in, or rolls the draft back.
    async fn persist(&self, update: RowUpdate) -> Result<(), Error> {
        let Some(mutate) = &self.inner.mutate else {
            log::warn!("No update backend; dropping changes to row {}", update.row_id);
            self.inner.tracker.update(|tracker| tracker.rollback(&update.row_id));
            return Ok(());
        };

        log::debug!("Updating row {} with {} field(s)", update.row_id, update.changes.len());
        match mutate.update(&update.row_id, update.changes.clone()).await {
            Ok(_) => {
                self.inner.tracker.update(|tracker| tracker.confirm(&update));
                match &self.inner.mode {
                    Mode::Server(pagination) => {
                        pagination.patch_row(self.unique_key(), &update.row_id, &update.changes)
                    }
                    Mode::Client { rows, .. } => {
                        let unique_key = self.unique_key();
                        rows.update(|rows| {
                            for row in rows.iter_mut() {
                                if row.id(unique_key).as_ref() == Some(&update.row_id) {
                                    row.apply(&update.changes);
                                }
                            }
                        });
                    }
                }
                self.inner.notifier.notify(Toast::success(update.label));
                Ok(())
            }
            Err(e) => {
                self.inner.tracker.update(|tracker| tracker.rollback(&update.row_id));
                Err(self.report("Failed to update row", e))
            }
        }
    }

    // =========================================================================
    // Add / delete
    // =========================================================================

    /// Adds a row through the backend.
    ///
    /// In server mode page boundaries shift, so the cache is cleared and the
    /// current page refetched.
    pub async fn add_row(&self, row: Row) -> Result<Row, Error> {
        let mutate = self.require_mutate()?;
        let added = match mutate.add(row).await {
            Ok(added) => added,
            Err(e) => return Err(self.report("Failed to add row", e)),
        };

        match &self.inner.mode {
            Mode::Server(pagination) => {
                pagination.clear_cache();
                pagination.refresh().await?;
            }
            Mode::Client { rows, .. } => rows.update(|rows| rows.push(added.clone())),
        }
        self.sync_tracker();
        self.inner.notifier.notify(Toast::success("Row added"));
        Ok(added)
    }

    /// Deletes a row through the backend.
    ///
    /// In server mode the current page is refetched, bypassing the cache,
    /// after the configured refresh delay.
    pub async fn delete_row(&self, id: &RowId) -> Result<(), Error> {
        self.delete_one(id).await?;
        self.after_delete().await;
        self.inner.notifier.notify(Toast::success("Row deleted"));
        Ok(())
    }

    /// Deletes every selected row, then refreshes once.
    ///
    /// Returns how many rows were deleted; failures are reported one by one.
    pub async fn delete_selected(&self) -> Result<usize, Error> {
        let selected = self.selected_rows();
        if selected.is_empty() {
            return Ok(0);
        }

        let mut deleted = 0;
        for id in &selected {
            if self.delete_one(id).await.is_ok() {
                deleted += 1;
            }
        }
        if deleted > 0 {
            self.after_delete().await;
            self.inner
                .notifier
                .notify(Toast::success(format!("{} row(s) deleted", deleted)));
        }
        Ok(deleted)
    }

    async fn delete_one(&self, id: &RowId) -> Result<(), Error> {
        let mutate = self.require_mutate()?;
        if let Err(e) = mutate.delete(id).await {
            return Err(self.report("Failed to delete row", e));
        }
        log::debug!("Deleted row {}", id);

        self.inner.tracker.update(|tracker| tracker.forget(id));
        match &self.inner.mode {
            Mode::Server(pagination) => pagination.remove_row(self.unique_key(), id),
            Mode::Client { rows, .. } => {
                let unique_key = self.unique_key();
                rows.update(|rows| rows.retain(|row| row.id(unique_key).as_ref() != Some(id)));
            }
        }
        Ok(())
    }

    async fn after_delete(&self) {
        match &self.inner.mode {
            Mode::Server(_) => self.spawn_delayed_refresh().await,
            Mode::Client { .. } => self.sync_tracker(),
        }
    }

    async fn spawn_delayed_refresh(&self) {
        let this = self.clone();
        let delay = self.inner.config.refresh_delay();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // failures were already reported by the fetch
            if this.refresh().await.is_err() {
                log::debug!("Refresh after delete failed");
            }
        });
        self.inner.tasks.lock().await.push(handle);
    }

    /// Waits for pending background work (delayed refreshes, prefetches).
    pub async fn settle(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = std::mem::take(&mut *self.inner.tasks.lock().await);
            if pending.is_empty() {
                break;
            }
            for result in futures::future::join_all(pending).await {
                if let Err(e) = result {
                    log::warn!("Background task ended abnormally: {}", e);
                }
            }
        }
        if let Mode::Server(pagination) = &self.inner.mode {
            pagination.settle().await;
        }
    }

    fn require_mutate(&self) -> Result<&Arc<dyn Mutate>, Error> {
        self.inner
            .mutate
            .as_ref()
            .ok_or_else(|| Error::Backend(BackendError::unavailable("no mutation backend configured")))
    }

    /// Logs a collaborator failure and raises an error toast.
    fn report(&self, title: &str, error: BackendError) -> Error {
        log::error!("{}: {}", title, error);
        self.inner
            .notifier
            .notify(Toast::error(title).with_description(error.to_string()));
        Error::Backend(error)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Returns `true` if the row is now selected.
    pub fn toggle_row(&self, id: &RowId) -> bool {
        self.inner.tracker.update(|tracker| tracker.toggle_row(id))
    }

    /// Selects every visible row, or none.
    pub fn toggle_all(&self, checked: bool) {
        self.inner.tracker.update(|tracker| tracker.toggle_all(checked));
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.inner.tracker.with(|tracker| tracker.is_selected(id))
    }

    pub fn selected_rows(&self) -> Vec<RowId> {
        self.inner.tracker.with(|tracker| tracker.selected_rows())
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for constructing a [`DataGrid`].
///
/// A data source is required when server-side pagination is on.
pub struct DataGridBuilder {
    schema: GridSchema,
    config: GridConfig,
    registry: Option<ComponentRegistry>,
    source: Option<Arc<dyn DataSource>>,
    mutate: Option<Arc<dyn Mutate>>,
    directory: Option<Arc<dyn UserDirectory>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl DataGridBuilder {
    /// Creates a builder with default settings.
    pub fn new(schema: GridSchema) -> Self {
        Self {
            schema,
            config: GridConfig::default(),
            registry: None,
            source: None,
            mutate: None,
            directory: None,
            notifier: None,
        }
    }

    pub fn config(mut self, config: GridConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the component registry; defaults to the built-ins.
    pub fn registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn mutate(mut self, mutate: Arc<dyn Mutate>) -> Self {
        self.mutate = Some(mutate);
        self
    }

    pub fn user_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Uses one backend as data source, mutation target and user directory.
    pub fn backend<B>(self, backend: Arc<B>) -> Self
    where
        B: DataSource + Mutate + UserDirectory + 'static,
    {
        self.source(backend.clone())
            .mutate(backend.clone())
            .user_directory(backend)
    }

    /// Sets the notifier; defaults to [`LogNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Validates the configuration and schema and builds the grid.
    pub fn build(self) -> Result<DataGrid, Error> {
        self.config.validate()?;
        self.schema.validate()?;

        let schema = Arc::new(self.schema);
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(LogNotifier));

        let mode = if self.config.server_side_pagination {
            let source = self.source.clone().ok_or_else(|| {
                ConfigError::invalid("server-side pagination needs a data source")
            })?;
            Mode::Server(ServerPagination::new(
                source,
                notifier.clone(),
                self.config.page_size,
                &self.config.cache,
            ))
        } else {
            Mode::Client {
                rows: State::default(),
                query: State::new(FilterQuery::new().with_page(1, self.config.page_size)),
            }
        };

        let tracker = EditTracker::new(schema.clone()).with_edit_disabled(self.config.edit_disabled);

        Ok(DataGrid {
            inner: Arc::new(DataGridInner {
                schema,
                config: self.config,
                registry: self.registry.unwrap_or_else(ComponentRegistry::with_builtins),
                source: self.source,
                mutate: self.mutate,
                directory: self.directory,
                notifier,
                mode,
                sort: State::default(),
                tracker: State::new(tracker),
                users: State::default(),
                tasks: Mutex::new(Vec::new()),
            }),
        })
    }
}
