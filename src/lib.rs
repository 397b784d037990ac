//! `tensile-props` library crate.
//!
//! Extracts mechanical properties (elastic modulus, linear limit, strength,
//! toughness, elongation at break) from tensile test stress-strain curves.
//!
//! Per sample the pipeline runs:
//!
//! `DataStreamliner` -> `CurveSmoother` -> `LinearRegionDetector`, with
//! `PropertyAggregator` working on the cleaned curve, and every outcome landing
//! as one row in the `ResultsStore`.
//!
//! The binary (`tensile`) is a thin wrapper around this library so the core
//! logic is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod properties;
pub mod report;
pub mod results;
pub mod smooth;
pub mod streamline;
