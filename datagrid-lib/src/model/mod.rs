//! Data model types
//!
//! Rows are open mappings from column key to [`Value`]. The [`GridSchema`]
//! declares each column's kind, which determines the value variant the
//! column holds and how it is stored by the backend.

mod json;
mod row;
mod schema;
mod storage;
mod user;
mod value;

pub use row::*;
pub use schema::*;
pub use user::*;
pub use value::*;
