//! Raw curve cleaning.
//!
//! Real tensile recordings are messy: duplicated strain readings, unsorted rows
//! at the start of the test and holes where the export skipped a value. The
//! streamliner turns a raw `Sample` into a `CleanedCurve` whose strain is
//! strictly increasing, duplicate-free and value-complete.
//!
//! With a preload configured, the leading slack (stress below the preload) is
//! cropped and strain is recomputed from the tool distance, taking the first
//! remaining tool distance as the reference length `h0`:
//!
//! ```text
//! strain = (h0 - tool_distance) / h0 * strain_conversion_factor
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{CleanedCurve, RawPoint, Sample, UnitSystem};
use crate::error::AnalysisError;
use crate::math::{CentralDifference, Differentiator};

/// Cleans raw samples. Cheap to share between threads.
#[derive(Clone)]
pub struct DataStreamliner {
    conversion_factor: f64,
    preload: Option<f64>,
    differentiator: Arc<dyn Differentiator>,
}

impl std::fmt::Debug for DataStreamliner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStreamliner")
            .field("conversion_factor", &self.conversion_factor)
            .field("preload", &self.preload)
            .finish()
    }
}

impl DataStreamliner {
    pub fn new(units: &UnitSystem, preload: Option<f64>) -> Result<Self, AnalysisError> {
        if let Some(p) = preload {
            if !p.is_finite() {
                return Err(AnalysisError::configuration(format!(
                    "Preload must be a finite stress value, got {p}."
                )));
            }
        }
        Ok(Self {
            conversion_factor: units.strain_conversion_factor(),
            preload,
            differentiator: Arc::new(CentralDifference),
        })
    }

    /// Replace the derivative collaborator used after preload rebasing.
    pub fn with_differentiator(mut self, differentiator: Arc<dyn Differentiator>) -> Self {
        self.differentiator = differentiator;
        self
    }

    pub fn preload(&self) -> Option<f64> {
        self.preload
    }

    /// Produce a cleaned copy of `sample`. The sample itself is left untouched.
    ///
    /// Without preload the operation is idempotent. With preload it is
    /// idempotent as long as the tool distance does not grow along the test.
    pub fn clean(&self, sample: &Sample) -> Result<CleanedCurve, AnalysisError> {
        let needs_tool = sample.carries_tool_distance();

        let mut rows = dedup_by_strain(sample.points.iter().copied());
        rows.sort_by(|a, b| cmp_strain(a, b));

        let curve = match self.preload {
            Some(preload) => self.rebase_on_preload(sample, rows, preload, needs_tool)?,
            None => {
                rows.retain(|p| is_complete(p, needs_tool));
                if rows.is_empty() {
                    return Err(AnalysisError::data_quality(
                        &sample.name,
                        "no complete rows remain after cleaning",
                    ));
                }
                let strain = rows.iter().map(|p| value(p.strain)).collect();
                let stress = rows.iter().map(|p| value(p.stress)).collect();
                let tool = needs_tool.then(|| rows.iter().map(|p| value(p.tool_distance)).collect());
                CleanedCurve::from_validated(strain, stress, tool, None)
            }
        };

        debug!(
            sample = %sample.name,
            raw = sample.points.len(),
            cleaned = curve.len(),
            "streamlined sample"
        );
        Ok(curve)
    }

    fn rebase_on_preload(
        &self,
        sample: &Sample,
        mut rows: Vec<RawPoint>,
        preload: f64,
        needs_tool: bool,
    ) -> Result<CleanedCurve, AnalysisError> {
        if !needs_tool {
            return Err(AnalysisError::data_quality(
                &sample.name,
                "preload cropping requires a tool distance column",
            ));
        }

        rows.retain(|p| is_complete(p, true) && value(p.stress) >= preload);
        let Some(first) = rows.first() else {
            return Err(AnalysisError::data_quality(
                &sample.name,
                format!("no complete rows with stress >= preload ({preload})"),
            ));
        };

        let h0 = value(first.tool_distance);
        if h0 == 0.0 {
            return Err(AnalysisError::data_quality(
                &sample.name,
                "reference tool distance h0 is zero",
            ));
        }

        let rebased = rows.iter().map(|p| RawPoint {
            strain: Some((h0 - value(p.tool_distance)) / h0 * self.conversion_factor),
            ..*p
        });
        let mut rows = dedup_by_strain(rebased);
        rows.sort_by(|a, b| cmp_strain(a, b));

        let strain: Vec<f64> = rows.iter().map(|p| value(p.strain)).collect();
        let stress: Vec<f64> = rows.iter().map(|p| value(p.stress)).collect();
        let tool: Vec<f64> = rows.iter().map(|p| value(p.tool_distance)).collect();
        let derivative = self.differentiator.derivative(&strain, &stress);

        Ok(CleanedCurve::from_validated(strain, stress, Some(tool), Some(derivative)))
    }
}

/// Keep the first row of every distinct (finite) strain value.
///
/// Rows without a usable strain are dropped here; they would not survive the
/// completeness filter anyway.
fn dedup_by_strain(points: impl Iterator<Item = RawPoint>) -> Vec<RawPoint> {
    let mut seen = HashSet::new();
    points
        .filter(|p| matches!(p.strain, Some(e) if e.is_finite()))
        .filter(|p| seen.insert(strain_key(value(p.strain))))
        .collect()
}

fn strain_key(strain: f64) -> u64 {
    // +0.0 and -0.0 are the same strain.
    if strain == 0.0 { 0.0f64.to_bits() } else { strain.to_bits() }
}

fn cmp_strain(a: &RawPoint, b: &RawPoint) -> Ordering {
    value(a.strain).total_cmp(&value(b.strain))
}

fn is_complete(p: &RawPoint, needs_tool: bool) -> bool {
    let finite = |v: Option<f64>| v.is_some_and(f64::is_finite);
    finite(p.strain) && finite(p.stress) && (!needs_tool || finite(p.tool_distance))
}

fn value(v: Option<f64>) -> f64 {
    v.unwrap_or(f64::NAN)
}
