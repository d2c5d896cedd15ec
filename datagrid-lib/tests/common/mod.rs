//! Shared fixtures: a plasmid schema and a backend that records every call.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use datagrid_lib::api::DataSource;
use datagrid_lib::api::FetchOptions;
use datagrid_lib::api::FetchResult;
use datagrid_lib::api::Mutate;
use datagrid_lib::api::UserDirectory;
use datagrid_lib::backend::InMemoryBackend;
use datagrid_lib::error::BackendError;
use datagrid_lib::model::ColumnDefinition;
use datagrid_lib::model::ColumnKind;
use datagrid_lib::model::GridSchema;
use datagrid_lib::model::Row;
use datagrid_lib::model::RowId;
use datagrid_lib::model::SaveEvent;
use datagrid_lib::model::User;

pub fn plasmid_schema() -> GridSchema {
    GridSchema::new("id")
        .column(
            ColumnDefinition::new("id", "ID", ColumnKind::Link { base_url: "/plasmids/".into() })
                .edit_disabled(),
        )
        .column(
            ColumnDefinition::new("plasmid", "Plasmid", ColumnKind::Tag)
                .save_event(SaveEvent::Change)
                .option("choices", serde_json::json!(["A", "B", "C"])),
        )
        .column(ColumnDefinition::new("name", "Name", ColumnKind::Text))
        .column(ColumnDefinition::new(
            "concentration",
            "Concentration",
            ColumnKind::Number { unit: Some("ng/µL".into()) },
        ))
        .column(
            ColumnDefinition::new("owner", "Owner", ColumnKind::User { multiple: true })
                .db_field("owner_json"),
        )
}

pub fn users() -> Vec<User> {
    vec![
        User::new("u1", "Ada Lovelace", "ada@lab.org"),
        User::new("u2", "Barbara McClintock", "barbara@lab.org"),
    ]
}

/// Rows `1..=count`, plasmid "A", name "pUC-<id>".
pub fn plasmid_rows(count: i64) -> Vec<Row> {
    (1..=count)
        .map(|id| {
            Row::new()
                .set("id", id)
                .set("plasmid", "A")
                .set("name", format!("pUC-{}", id))
                .set("concentration", id * 10)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(FetchOptions),
    Add,
    Update(RowId, Row),
    Delete(RowId),
}

/// An [`InMemoryBackend`] that records calls, can fail loads on demand and
/// can hold back the answer for chosen pages.
pub struct RecordingBackend {
    inner: InMemoryBackend,
    calls: Mutex<Vec<Call>>,
    fail_loads: AtomicBool,
    fail_updates: AtomicBool,
    delays: Mutex<HashMap<u32, Duration>>,
}

impl RecordingBackend {
    pub fn new(rows: Vec<Row>) -> Arc<Self> {
        let inner = InMemoryBackend::new(Arc::new(plasmid_schema())).with_users(users());
        inner.seed(rows);
        Arc::new(Self {
            inner,
            calls: Mutex::new(Vec::new()),
            fail_loads: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
            delays: Mutex::new(HashMap::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn loads(&self) -> Vec<FetchOptions> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Load(options) => Some(options),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<(RowId, Row)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Update(id, changes) => Some((id, changes)),
                _ => None,
            })
            .collect()
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Delays answers for `page`.
    pub fn delay_page(&self, page: u32, delay: Duration) {
        self.delays.lock().unwrap().insert(page, delay);
    }

    pub fn store(&self) -> &InMemoryBackend {
        &self.inner
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DataSource for RecordingBackend {
    async fn load_data(&self, options: &FetchOptions) -> Result<FetchResult, BackendError> {
        self.record(Call::Load(options.clone()));
        let delay = self.delays.lock().unwrap().get(&options.page).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable("backend offline"));
        }
        self.inner.load_data(options).await
    }
}

#[async_trait]
impl Mutate for RecordingBackend {
    async fn add(&self, row: Row) -> Result<Row, BackendError> {
        self.record(Call::Add);
        self.inner.add(row).await
    }

    async fn update(&self, id: &RowId, changes: Row) -> Result<Option<Row>, BackendError> {
        self.record(Call::Update(id.clone(), changes.clone()));
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(BackendError::rejected("validation failed"));
        }
        self.inner.update(id, changes).await
    }

    async fn delete(&self, id: &RowId) -> Result<(), BackendError> {
        self.record(Call::Delete(id.clone()));
        self.inner.delete(id).await
    }
}

#[async_trait]
impl UserDirectory for RecordingBackend {
    async fn users(&self) -> Result<Vec<User>, BackendError> {
        self.inner.users().await
    }
}

/// A source that answers with a fixed result, for exact bundle shapes.
pub struct ScriptedSource {
    results: Mutex<HashMap<u32, FetchResult>>,
    pub calls: Mutex<Vec<FetchOptions>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn answer(&self, page: u32, result: FetchResult) {
        self.results.lock().unwrap().insert(page, result);
    }

    pub fn load_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn load_data(&self, options: &FetchOptions) -> Result<FetchResult, BackendError> {
        self.calls.lock().unwrap().push(options.clone());
        self.results
            .lock()
            .unwrap()
            .get(&options.page)
            .cloned()
            .ok_or_else(|| BackendError::not_found(format!("page {}", options.page)))
    }
}

/// Rows `first..=last` keyed by id.
pub fn rows_between(first: i64, last: i64) -> Vec<Row> {
    (first..=last).map(|id| Row::new().set("id", id)).collect()
}
