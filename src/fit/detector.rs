//! Elastic/plastic boundary detection.
//!
//! The elastic part of a stress-strain curve is linear, so the R² of a fit over
//! the first `k` points stays close to 1 while the window is inside the elastic
//! region and trends downward once plastic points enter it. Under noise the
//! trend is not monotone, which is why the acceptance rule matters:
//!
//! - [`LimitRule::LastAcceptable`] scans the whole sweep and keeps the last `k`
//!   with `R²(k) >= τ` (a dip below τ followed by a recovery extends the region)
//! - [`LimitRule::FirstDrop`] keeps the last `k` before the first dip below τ
//!
//! Windows with zero strain variance are skipped and recorded in the trace.

use tracing::debug;

use crate::domain::{LimitRule, LinearRegion, ProcessedCurve, RegressionEntry, RegressionTrace, UnitSystem};
use crate::error::AnalysisError;
use crate::fit::sweep::RegressionSweep;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegionDetector {
    r_squared_threshold: f64,
    lower_strain_limit: f64,
    upper_strain_limit: f64,
    conversion_factor: f64,
    rule: LimitRule,
}

impl LinearRegionDetector {
    pub fn new(
        r_squared_threshold: f64,
        lower_strain_limit: f64,
        upper_strain_limit: f64,
        units: &UnitSystem,
        rule: LimitRule,
    ) -> Result<Self, AnalysisError> {
        if !(r_squared_threshold.is_finite() && r_squared_threshold > 0.0 && r_squared_threshold <= 1.0) {
            return Err(AnalysisError::configuration(format!(
                "R² threshold must be in (0, 1], got {r_squared_threshold}."
            )));
        }
        if lower_strain_limit.is_nan() || upper_strain_limit.is_nan() || lower_strain_limit >= upper_strain_limit {
            return Err(AnalysisError::configuration(format!(
                "Invalid strain window [{lower_strain_limit}, {upper_strain_limit})."
            )));
        }
        Ok(Self {
            r_squared_threshold,
            lower_strain_limit,
            upper_strain_limit,
            conversion_factor: units.strain_conversion_factor(),
            rule,
        })
    }

    /// Lazy sweep over the strain window `[lower, upper)` of `curve`.
    pub fn sweep<'a>(&self, curve: &'a ProcessedCurve) -> Result<RegressionSweep<'a>, AnalysisError> {
        let (strain, stress) = curve.strain_window(self.lower_strain_limit, self.upper_strain_limit);
        if strain.len() < 2 {
            return Err(AnalysisError::InsufficientData { points: strain.len() });
        }
        Ok(RegressionSweep::new(strain, stress))
    }

    /// Locate the linear limit and keep the full regression trace.
    pub fn detect(&self, curve: &ProcessedCurve) -> Result<LinearRegion, AnalysisError> {
        self.scan(curve, true)
    }

    /// Locate the linear limit without materializing the trace.
    ///
    /// With [`LimitRule::FirstDrop`] the sweep stops at the first rejected window.
    pub fn locate(&self, curve: &ProcessedCurve) -> Result<LinearRegion, AnalysisError> {
        self.scan(curve, false)
    }

    fn scan(&self, curve: &ProcessedCurve, keep_trace: bool) -> Result<LinearRegion, AnalysisError> {
        let sweep = self.sweep(curve)?;
        let points = sweep.points();

        let mut trace = keep_trace.then(|| RegressionTrace {
            entries: Vec::with_capacity(points.saturating_sub(1)),
            degenerate: Vec::new(),
        });
        let mut best: Option<RegressionEntry> = None;
        let mut dropped = false;

        for item in sweep {
            let entry = match item {
                Ok(entry) => entry,
                Err(AnalysisError::NumericDegeneracy { k }) => {
                    if let Some(t) = trace.as_mut() {
                        t.degenerate.push(k);
                    }
                    continue;
                }
                Err(other) => return Err(other),
            };
            if let Some(t) = trace.as_mut() {
                t.entries.push(entry);
            }
            if dropped {
                continue;
            }

            if entry.r_squared >= self.r_squared_threshold {
                best = Some(entry);
            } else if self.rule == LimitRule::FirstDrop && best.is_some() {
                dropped = true;
                if trace.is_none() {
                    break;
                }
            }
        }

        if let Some(t) = trace.as_ref() {
            if !t.degenerate.is_empty() {
                debug!(windows = t.degenerate.len(), "skipped zero-variance regression windows");
            }
        }

        let Some(best) = best else {
            return Err(AnalysisError::NoLinearRegion {
                threshold: self.r_squared_threshold,
            });
        };

        debug!(
            points,
            k = best.k,
            linear_limit = best.strain,
            r_squared = best.r_squared,
            "linear region located"
        );

        Ok(LinearRegion {
            k: best.k,
            linear_limit: best.strain,
            linear_limit_stress: best.stress,
            slope_at_limit: best.slope,
            intercept_at_limit: best.intercept,
            r_squared_at_limit: best.r_squared,
            elastic_modulus: best.slope * self.conversion_factor,
            trace,
        })
    }
}
