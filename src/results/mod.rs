//! Per-sample results table.

pub mod store;

pub use store::*;
