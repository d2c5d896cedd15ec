//! Headless data grid library
//!
//! A data grid engine without a view layer: server-side pagination with a
//! bounded page cache and background prefetch, client-side filtering and
//! sorting, per-cell and per-row edit tracking, and a registry of cell
//! components. Backends plug in through the traits in [`api`].

pub mod api;
pub mod backend;
pub mod cache;
pub mod edit;
pub mod error;
pub mod filter;
pub mod model;
pub mod notify;
pub mod pagination;
pub mod picker;
pub mod registry;
pub mod response;
pub mod state;

mod config;
mod grid;

pub use config::*;
pub use error::Error;
pub use grid::*;
pub use response::CacheStatus;
pub use response::Response;
