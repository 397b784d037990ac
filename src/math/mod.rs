//! Numeric utilities: least squares, incremental line fits, interpolation,
//! differentiation and Savitzky–Golay filtering.

pub mod derivative;
pub mod interp;
pub mod ols;
pub mod savgol;

pub use derivative::*;
pub use interp::*;
pub use ols::*;
pub use savgol::*;
