//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - unit handling (`StrainUnit`, `UnitSystem`)
//! - the per-stage curve types (`Sample`, `CleanedCurve`, `ProcessedCurve`)
//! - regression and property outputs (`LinearRegion`, `MechanicalProperties`, `SampleResult`)
//! - the run configuration (`AnalysisConfig`)

pub mod types;

pub use types::*;
