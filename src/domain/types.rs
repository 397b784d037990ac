//! Shared domain types.
//!
//! Each pipeline stage has its own output type so that stale intermediate state
//! cannot be fed to the wrong stage:
//!
//! `Sample` → `CleanedCurve` → `ProcessedCurve` → `LinearRegion` / `MechanicalProperties`
//! → `SampleResult`
//!
//! Curves own their data and are never mutated after construction.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Unit of the strain column.
///
/// Internally strain keeps whatever unit the dataset uses; the conversion factor
/// is applied where a physical quantity needs a dimensionless strain
/// (elastic modulus, toughness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrainUnit {
    /// Strain stored as a fraction (`0.01` = 1 %).
    Dimensionless,
    /// Strain stored in percent.
    Percent,
}

impl StrainUnit {
    /// Parse a unit label as written in lab exports.
    ///
    /// Accepted: `%` / `percent` and the empty label / `dimensionless`.
    pub fn from_label(label: &str) -> Result<Self, AnalysisError> {
        match label.trim().to_ascii_lowercase().as_str() {
            "%" | "percent" => Ok(StrainUnit::Percent),
            "" | "-" | "dimensionless" => Ok(StrainUnit::Dimensionless),
            other => Err(AnalysisError::configuration(format!(
                "No valid strain unit '{other}'. Allowed values are '%' or '' (dimensionless)."
            ))),
        }
    }

    pub fn conversion_factor(self) -> f64 {
        match self {
            StrainUnit::Dimensionless => 1.0,
            StrainUnit::Percent => 100.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StrainUnit::Dimensionless => "",
            StrainUnit::Percent => "%",
        }
    }
}

/// Resolved units of a dataset. Fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSystem {
    pub strain: StrainUnit,
    pub stress: String,
}

impl UnitSystem {
    pub fn new(strain_label: &str, stress_label: &str) -> Result<Self, AnalysisError> {
        Ok(Self {
            strain: StrainUnit::from_label(strain_label)?,
            stress: stress_label.trim().to_string(),
        })
    }

    pub fn strain_conversion_factor(&self) -> f64 {
        self.strain.conversion_factor()
    }
}

/// How the linear limit is picked from the R² trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LimitRule {
    /// Last window size `k` (scanning upward) whose R² reaches the threshold.
    LastAcceptable,
    /// Last window size before R² first drops below the threshold.
    ///
    /// Stops the sweep at the first drop.
    FirstDrop,
}

/// One raw row of a tensile test recording. Any value may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawPoint {
    pub strain: Option<f64>,
    pub stress: Option<f64>,
    /// Distance between the clamping tools (needed for preload rebasing).
    pub tool_distance: Option<f64>,
}

impl RawPoint {
    pub fn new(strain: f64, stress: f64) -> Self {
        Self {
            strain: Some(strain),
            stress: Some(stress),
            tool_distance: None,
        }
    }

    pub fn with_tool_distance(mut self, tool_distance: f64) -> Self {
        self.tool_distance = Some(tool_distance);
        self
    }
}

/// A raw sample as delivered by an importer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sample {
    pub name: String,
    pub points: Vec<RawPoint>,
}

impl Sample {
    pub fn new(name: impl Into<String>, points: Vec<RawPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// Build a sample from complete strain/stress columns.
    pub fn from_columns(name: impl Into<String>, strain: &[f64], stress: &[f64]) -> Self {
        let points = strain
            .iter()
            .zip(stress.iter())
            .map(|(&e, &s)| RawPoint::new(e, s))
            .collect();
        Self::new(name, points)
    }

    /// True if any row carries a tool distance.
    pub fn carries_tool_distance(&self) -> bool {
        self.points.iter().any(|p| p.tool_distance.is_some())
    }
}

/// A cleaned curve: strain strictly increasing, no duplicates, no missing values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedCurve {
    strain: Vec<f64>,
    stress: Vec<f64>,
    tool_distance: Option<Vec<f64>>,
    derivative: Option<Vec<f64>>,
}

impl CleanedCurve {
    /// Validate and wrap complete columns.
    pub fn new(strain: Vec<f64>, stress: Vec<f64>) -> Result<Self, AnalysisError> {
        let invalid = |reason: &str| AnalysisError::data_quality("curve", reason);
        if strain.len() != stress.len() {
            return Err(invalid("strain and stress columns differ in length"));
        }
        if strain.is_empty() {
            return Err(invalid("no points"));
        }
        if strain.iter().chain(stress.iter()).any(|v| !v.is_finite()) {
            return Err(invalid("non-finite value"));
        }
        if strain.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid("strain is not strictly increasing"));
        }
        Ok(Self {
            strain,
            stress,
            tool_distance: None,
            derivative: None,
        })
    }

    /// Columns must already satisfy the invariant; only the streamliner calls this.
    pub(crate) fn from_validated(
        strain: Vec<f64>,
        stress: Vec<f64>,
        tool_distance: Option<Vec<f64>>,
        derivative: Option<Vec<f64>>,
    ) -> Self {
        debug_assert!(strain.windows(2).all(|w| w[0] < w[1]));
        Self {
            strain,
            stress,
            tool_distance,
            derivative,
        }
    }

    pub fn strain(&self) -> &[f64] {
        &self.strain
    }

    pub fn stress(&self) -> &[f64] {
        &self.stress
    }

    pub fn tool_distance(&self) -> Option<&[f64]> {
        self.tool_distance.as_deref()
    }

    /// dσ/dε aligned with `strain()` (only present after preload rebasing).
    pub fn derivative(&self) -> Option<&[f64]> {
        self.derivative.as_deref()
    }

    pub fn len(&self) -> usize {
        self.strain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strain.is_empty()
    }

    /// Rebuild a raw sample from this curve (e.g. to re-run cleaning).
    pub fn to_sample(&self, name: impl Into<String>) -> Sample {
        let points = (0..self.len())
            .map(|i| RawPoint {
                strain: Some(self.strain[i]),
                stress: Some(self.stress[i]),
                tool_distance: self.tool_distance.as_ref().map(|d| d[i]),
            })
            .collect();
        Sample::new(name, points)
    }
}

/// Evenly spaced (smoothed) or passthrough copy of a cleaned curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedCurve {
    strain: Vec<f64>,
    stress: Vec<f64>,
    smoothed: bool,
}

impl ProcessedCurve {
    /// Use the cleaned curve as-is (smoothing disabled).
    pub fn passthrough(curve: &CleanedCurve) -> Self {
        Self {
            strain: curve.strain().to_vec(),
            stress: curve.stress().to_vec(),
            smoothed: false,
        }
    }

    pub(crate) fn smoothed(strain: Vec<f64>, stress: Vec<f64>) -> Self {
        Self {
            strain,
            stress,
            smoothed: true,
        }
    }

    pub fn strain(&self) -> &[f64] {
        &self.strain
    }

    pub fn stress(&self) -> &[f64] {
        &self.stress
    }

    pub fn is_smoothed(&self) -> bool {
        self.smoothed
    }

    pub fn len(&self) -> usize {
        self.strain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strain.is_empty()
    }

    /// Points with strain in `[lower, upper)`.
    pub fn strain_window(&self, lower: f64, upper: f64) -> (&[f64], &[f64]) {
        let start = self.strain.partition_point(|&e| e < lower);
        let end = self.strain.partition_point(|&e| e < upper).max(start);
        (&self.strain[start..end], &self.stress[start..end])
    }
}

/// OLS fit of the first `k` points of the regression window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionEntry {
    pub k: usize,
    /// Strain of the k-th point (right edge of the window).
    pub strain: f64,
    /// Stress of the k-th point.
    pub stress: f64,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Materialized sweep, kept for diagnostic rendering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegressionTrace {
    pub entries: Vec<RegressionEntry>,
    /// Window sizes skipped because of zero strain variance.
    pub degenerate: Vec<usize>,
}

/// Boundary of the linear-elastic region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearRegion {
    pub k: usize,
    pub linear_limit: f64,
    pub linear_limit_stress: f64,
    pub slope_at_limit: f64,
    pub intercept_at_limit: f64,
    pub r_squared_at_limit: f64,
    /// `slope_at_limit * strain_conversion_factor`, unrounded.
    pub elastic_modulus: f64,
    pub trace: Option<RegressionTrace>,
}

/// Properties computed from the cleaned (unsmoothed) curve, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MechanicalProperties {
    pub strength: f64,
    pub toughness: f64,
    pub elongation_at_break: f64,
}

/// One row of the results table. `None` means missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleResult {
    pub name: String,
    pub elastic_modulus: Option<f64>,
    pub linear_limit: Option<f64>,
    pub strength: Option<f64>,
    pub toughness: Option<f64>,
    pub elongation_at_break: Option<f64>,
    pub slope_at_limit: Option<f64>,
    pub intercept_at_limit: Option<f64>,
}

impl SampleResult {
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// Derived from CLI flags (plus defaults); also (de)serializable so runs can be
/// recorded next to their exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// `%` or empty (dimensionless). Validated when the analysis is built.
    pub strain_unit: String,
    pub stress_unit: String,
    /// Stress below which leading slack is cropped before strain rebasing.
    pub preload: Option<f64>,

    pub r_squared_threshold: f64,
    pub lower_strain_limit: f64,
    pub upper_strain_limit: f64,
    pub limit_rule: LimitRule,

    pub smoothing: bool,
    pub smoothing_window: usize,
    pub poly_order: usize,
    /// Resampling point count; `None` = smallest power of ten >= curve length.
    pub data_points: Option<usize>,

    /// Keep the full regression trace of every sample.
    pub keep_traces: bool,
    /// Dispatch samples to a rayon pool.
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            strain_unit: "%".to_string(),
            stress_unit: "kPa".to_string(),
            preload: None,
            r_squared_threshold: 0.995,
            lower_strain_limit: 0.0,
            upper_strain_limit: 50.0,
            limit_rule: LimitRule::LastAcceptable,
            smoothing: true,
            smoothing_window: 501,
            poly_order: 2,
            data_points: None,
            keep_traces: true,
            parallel: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strain_unit_labels() {
        assert_eq!(StrainUnit::from_label("%").unwrap(), StrainUnit::Percent);
        assert_eq!(StrainUnit::from_label("").unwrap(), StrainUnit::Dimensionless);
        assert_eq!(StrainUnit::Percent.conversion_factor(), 100.0);
        assert_eq!(StrainUnit::Dimensionless.conversion_factor(), 1.0);
        let err = StrainUnit::from_label("mm").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn cleaned_curve_rejects_unsorted_strain() {
        let err = CleanedCurve::new(vec![0.0, 2.0, 1.0], vec![0.0, 1.0, 2.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::DataQuality { .. }));
        assert!(CleanedCurve::new(vec![0.0, 1.0, 1.0], vec![0.0, 1.0, 2.0]).is_err());
        assert!(CleanedCurve::new(vec![], vec![]).is_err());
    }

    #[test]
    fn strain_window_is_half_open() {
        let curve = CleanedCurve::new(vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![0.0; 5]).unwrap();
        let processed = ProcessedCurve::passthrough(&curve);
        let (x, _) = processed.strain_window(1.0, 3.0);
        assert_eq!(x, &[1.0, 2.0]);
        let (x, _) = processed.strain_window(10.0, 3.0);
        assert!(x.is_empty());
    }
}
