//! Backend collaborator contracts
//!
//! The grid never talks to a store directly. It depends on three async
//! traits:
//!
//! - [`DataSource`] loads a page (and optionally a window of neighbouring pages)
//! - [`Mutate`] adds, updates and deletes rows
//! - [`UserDirectory`] lists the users that can be assigned
//!
//! # Example
//!
//! ```ignore
//! use datagrid_lib::api::{DataSource, FetchOptions};
//!
//! let result = source.load_data(&FetchOptions::new(1, 10)).await?;
//! println!("{} rows over {} pages", result.total_count, result.total_pages);
//! ```

mod query;
mod result;

pub use query::*;
pub use result::*;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::model::Row;
use crate::model::RowId;
use crate::model::User;

/// Loads pages of rows.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Loads the page described by `options`.
    ///
    /// When `options.prefetch` is set the result should also carry a window of
    /// neighbouring pages in `all_prefetched_data`. An absent or empty search
    /// term means "no filter".
    async fn load_data(&self, options: &FetchOptions) -> Result<FetchResult, BackendError>;
}

/// Writes rows.
#[async_trait]
pub trait Mutate: Send + Sync {
    /// Adds a row, returning it with server-assigned fields filled in.
    async fn add(&self, row: Row) -> Result<Row, BackendError>;

    /// Applies `changes` (only the changed keys) to the row `id`.
    ///
    /// Returns the updated row when the backend reports it.
    async fn update(&self, id: &RowId, changes: Row) -> Result<Option<Row>, BackendError>;

    /// Deletes the row `id`.
    async fn delete(&self, id: &RowId) -> Result<(), BackendError>;
}

/// Lists assignable users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns every user in the directory.
    async fn users(&self) -> Result<Vec<User>, BackendError>;
}

/// A store that can both load and write rows.
pub trait Backend: DataSource + Mutate {}

impl<T: DataSource + Mutate> Backend for T {}
