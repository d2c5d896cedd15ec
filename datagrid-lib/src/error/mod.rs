//! Error types

mod backend;
mod config;
mod field;
mod grid;

pub use backend::*;
pub use config::*;
pub use field::*;
pub use grid::*;
