//! Reference backends

mod memory;

pub use memory::*;
