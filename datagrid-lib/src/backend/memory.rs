//! In-memory backend using DashMap

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Map;

use crate::api::DataSource;
use crate::api::Direction;
use crate::api::FetchOptions;
use crate::api::FetchResult;
use crate::api::Mutate;
use crate::api::UserDirectory;
use crate::api::total_pages_for;
use crate::error::BackendError;
use crate::filter;
use crate::filter::FilterQuery;
use crate::filter::SearchField;
use crate::filter::SortState;
use crate::model::GridSchema;
use crate::model::Row;
use crate::model::RowId;
use crate::model::User;
use crate::model::Value;

/// Pages fetched on each side of the requested one when prefetching.
pub const PREFETCH_RADIUS: u32 = 2;

/// A backend holding storage records in a concurrent hash map.
///
/// Rows pass through the schema's storage mapping on every read and write,
/// so user lists are held as JSON strings under their `dbField` names.
/// Searching, sorting and page windows are done here the way a server
/// would do them.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use datagrid_lib::backend::InMemoryBackend;
/// use datagrid_lib::model::{GridSchema, Row};
///
/// let backend = InMemoryBackend::new(Arc::new(GridSchema::default()));
/// backend.seed((1..=23i64).map(|id| Row::new().set("id", id)));
/// assert_eq!(backend.len(), 23);
/// ```
#[derive(Debug)]
pub struct InMemoryBackend {
    schema: Arc<GridSchema>,
    store: DashMap<RowId, Map<String, serde_json::Value>>,
    users: Vec<User>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new(schema: Arc<GridSchema>) -> Self {
        Self {
            schema,
            store: DashMap::new(),
            users: Vec::new(),
        }
    }

    /// Sets the user directory.
    pub fn with_users(mut self, users: Vec<User>) -> Self {
        self.users = users;
        self
    }

    /// Inserts rows as-is. Rows without an identity are skipped.
    pub fn seed(&self, rows: impl IntoIterator<Item = Row>) {
        for row in rows {
            match row.id(&self.schema.unique_key) {
                Some(id) => {
                    self.store.insert(id, self.schema.to_storage(&row));
                }
                None => log::warn!("Seed row without '{}' skipped", self.schema.unique_key),
            }
        }
    }

    /// Returns the number of stored rows.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns the raw storage record of a row.
    pub fn record(&self, id: &RowId) -> Option<Map<String, serde_json::Value>> {
        self.store.get(id).map(|entry| entry.value().clone())
    }

    fn all_rows(&self) -> Result<Vec<Row>, BackendError> {
        self.store
            .iter()
            .map(|entry| self.schema.from_storage(entry.value()).map_err(BackendError::from))
            .collect()
    }

    fn query(&self, options: &FetchOptions) -> Result<Vec<Row>, BackendError> {
        let rows = self.all_rows()?;
        let sort = match &options.sort {
            Some(spec) => SortState::single(spec.column.clone(), spec.direction),
            None => SortState::single(self.schema.unique_key.clone(), Direction::Asc),
        };
        let query = FilterQuery::new()
            .with_search(options.search_term(), SearchField::All)
            .with_sort(sort);
        Ok(filter::apply(&rows, &self.schema, &query).rows)
    }
}

fn page_of(rows: &[Row], page: u32, page_size: u32) -> Vec<Row> {
    let start = (page.saturating_sub(1) as usize) * page_size as usize;
    rows.iter().skip(start).take(page_size as usize).cloned().collect()
}

#[async_trait]
impl DataSource for InMemoryBackend {
    async fn load_data(&self, options: &FetchOptions) -> Result<FetchResult, BackendError> {
        if options.page_size == 0 {
            return Err(BackendError::rejected("page size must be at least 1"));
        }

        let rows = self.query(options)?;
        let total_count = rows.len();
        let page = options.page.max(1);
        let data = page_of(&rows, page, options.page_size);
        let result = FetchResult::new(data, total_count, page, options.page_size);

        if !options.prefetch {
            return Ok(result);
        }

        let last = total_pages_for(total_count, options.page_size).max(page);
        let first = page.saturating_sub(PREFETCH_RADIUS).max(1);
        let window: BTreeMap<u32, Vec<Row>> = (first..=(page + PREFETCH_RADIUS).min(last))
            .map(|p| (p, page_of(&rows, p, options.page_size)))
            .filter(|(_, rows)| !rows.is_empty())
            .collect();

        log::debug!(
            "Loaded page {} of {} ({} rows) with window {:?}",
            page,
            result.total_pages,
            total_count,
            window.keys().collect::<Vec<_>>()
        );
        Ok(result.with_prefetched(window))
    }
}

#[async_trait]
impl Mutate for InMemoryBackend {
    async fn add(&self, mut row: Row) -> Result<Row, BackendError> {
        let unique_key = self.schema.unique_key.clone();
        let id = match row.id(&unique_key) {
            Some(id) => id,
            None => {
                let id = RowId::new(uuid::Uuid::new_v4().to_string());
                row.insert(unique_key, Value::from(id.as_str()));
                id
            }
        };
        if self.store.contains_key(&id) {
            return Err(BackendError::rejected(format!("row {} already exists", id)));
        }

        let record = self.schema.to_storage(&row);
        let stored = self.schema.from_storage(&record)?;
        self.store.insert(id, record);
        Ok(stored)
    }

    async fn update(&self, id: &RowId, changes: Row) -> Result<Option<Row>, BackendError> {
        let mut entry = self
            .store
            .get_mut(id)
            .ok_or_else(|| BackendError::not_found(id.as_str()))?;

        let record = entry.value_mut();
        for (field, value) in self.schema.to_storage(&changes) {
            record.insert(field, value);
        }
        let updated = self.schema.from_storage(record)?;
        Ok(Some(updated))
    }

    async fn delete(&self, id: &RowId) -> Result<(), BackendError> {
        self.store
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| BackendError::not_found(id.as_str()))
    }
}

#[async_trait]
impl UserDirectory for InMemoryBackend {
    async fn users(&self) -> Result<Vec<User>, BackendError> {
        Ok(self.users.clone())
    }
}
