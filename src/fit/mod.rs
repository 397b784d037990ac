//! Linear-region detection.
//!
//! Responsibilities:
//!
//! - grow an OLS fit one point at a time over the regression window (`sweep`)
//! - pick the elastic/plastic boundary from the R² trace (`detector`)

pub mod detector;
pub mod sweep;

pub use detector::*;
pub use sweep::*;
