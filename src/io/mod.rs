//! Input/output helpers.
//!
//! - CSV ingest (`ingest`)
//! - results exports, CSV/JSON (`export`)
//! - per-sample regression traces (`trace`)

pub mod export;
pub mod ingest;
pub mod trace;

pub use export::*;
pub use ingest::*;
pub use trace::*;
