//! Curve resampling and smoothing.
//!
//! Savitzky–Golay filtering needs evenly spaced samples, so the cleaned curve is
//! first interpolated onto `N` evenly spaced strains spanning its observed range,
//! then point-mirrored at both ends (to keep the filter from bending the curve
//! near the boundaries) and finally filtered.
//!
//! The numeric filter sits behind the [`Smoother`] trait so tests (or other
//! filters) can be substituted.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{CleanedCurve, ProcessedCurve};
use crate::error::AnalysisError;
use crate::math::{interpolate_sorted, linspace, savgol_filter_mirrored};

/// Parameters handed to a [`Smoother`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoothingParams {
    /// Odd filter window length (points).
    pub window: usize,
    pub poly_order: usize,
    /// Number of evenly spaced output points.
    pub data_points: usize,
}

/// Smoothing collaborator.
///
/// Must interpolate onto `params.data_points` evenly spaced x values, mirror both
/// ends and return `(resampled_x, resampled_y)`. Deterministic for fixed inputs.
pub trait Smoother: Send + Sync {
    fn smooth(
        &self,
        x: &[f64],
        y: &[f64],
        params: &SmoothingParams,
    ) -> Result<(Vec<f64>, Vec<f64>), AnalysisError>;
}

/// Default smoother: linear interpolation + point mirroring + Savitzky–Golay.
#[derive(Debug, Clone, Copy, Default)]
pub struct SavitzkyGolay;

impl Smoother for SavitzkyGolay {
    fn smooth(
        &self,
        x: &[f64],
        y: &[f64],
        params: &SmoothingParams,
    ) -> Result<(Vec<f64>, Vec<f64>), AnalysisError> {
        let (Some(&x0), Some(&x1)) = (x.first(), x.last()) else {
            return Ok((Vec::new(), Vec::new()));
        };

        let grid = linspace(x0, x1, params.data_points);
        let resampled = interpolate_sorted(x, y, &grid);
        let smoothed = savgol_filter_mirrored(&resampled, params.window, params.poly_order)
            .ok_or_else(|| {
                AnalysisError::configuration(format!(
                    "Savitzky-Golay filter cannot be built for window={} poly_order={}",
                    params.window, params.poly_order
                ))
            })?;

        Ok((grid, smoothed))
    }
}

/// Resamples and smooths cleaned curves.
#[derive(Clone)]
pub struct CurveSmoother {
    window: usize,
    poly_order: usize,
    data_points: Option<usize>,
    smoother: Arc<dyn Smoother>,
}

impl std::fmt::Debug for CurveSmoother {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurveSmoother")
            .field("window", &self.window)
            .field("poly_order", &self.poly_order)
            .field("data_points", &self.data_points)
            .finish()
    }
}

impl CurveSmoother {
    pub const DEFAULT_WINDOW: usize = 501;
    pub const DEFAULT_POLY_ORDER: usize = 2;

    pub fn new(
        window: usize,
        poly_order: usize,
        data_points: Option<usize>,
    ) -> Result<Self, AnalysisError> {
        if window % 2 == 0 {
            return Err(AnalysisError::configuration(format!(
                "Smoothing window must be odd, got {window}."
            )));
        }
        if poly_order >= window {
            return Err(AnalysisError::configuration(format!(
                "Polynomial order ({poly_order}) must be smaller than the smoothing window ({window})."
            )));
        }
        if matches!(data_points, Some(n) if n < 2) {
            return Err(AnalysisError::configuration(
                "Resampling needs at least 2 data points.",
            ));
        }
        Ok(Self {
            window,
            poly_order,
            data_points,
            smoother: Arc::new(SavitzkyGolay),
        })
    }

    /// Replace the numeric smoothing collaborator.
    pub fn with_smoother(mut self, smoother: Arc<dyn Smoother>) -> Self {
        self.smoother = smoother;
        self
    }

    /// Resample + smooth. The cleaned curve is not modified.
    ///
    /// A single-point curve has no range to resample and is passed through.
    pub fn process(&self, curve: &CleanedCurve) -> Result<ProcessedCurve, AnalysisError> {
        if curve.len() < 2 {
            return Ok(ProcessedCurve::passthrough(curve));
        }

        let params = SmoothingParams {
            window: self.window,
            poly_order: self.poly_order,
            data_points: self.data_points.unwrap_or_else(|| default_point_count(curve.len())),
        };
        let (x, y) = self.smoother.smooth(curve.strain(), curve.stress(), &params)?;

        if x.len() != y.len() || x.len() < 2 {
            return Err(AnalysisError::data_quality(
                "smoothed curve",
                format!("smoother returned {} x and {} y values", x.len(), y.len()),
            ));
        }
        if x.windows(2).any(|w| !(w[0] < w[1])) || y.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::data_quality(
                "smoothed curve",
                "smoother output is not an increasing, finite curve",
            ));
        }

        debug!(
            points_in = curve.len(),
            points_out = x.len(),
            window = self.window,
            poly_order = self.poly_order,
            "smoothed curve"
        );
        Ok(ProcessedCurve::smoothed(x, y))
    }
}

/// Smallest power of ten that is >= `len`.
pub fn default_point_count(len: usize) -> usize {
    let mut n = 1usize;
    while n < len {
        n = n.saturating_mul(10);
    }
    n.max(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, slope: f64, intercept: f64) -> CleanedCurve {
        let x: Vec<f64> = (0..n).map(|i| i as f64 * 0.37 + (i * i) as f64 * 1e-3).collect();
        let y = x.iter().map(|v| slope * v + intercept).collect();
        CleanedCurve::new(x, y).unwrap()
    }

    #[test]
    fn default_point_count_is_next_power_of_ten() {
        assert_eq!(default_point_count(1), 2);
        assert_eq!(default_point_count(10), 10);
        assert_eq!(default_point_count(11), 100);
        assert_eq!(default_point_count(4321), 10_000);
    }

    #[test]
    fn smoothing_a_line_is_a_no_op() {
        let curve = line(137, 2.5, -1.0);
        for &(window, poly) in &[(5, 0), (11, 1), (51, 2), (501, 2), (31, 4)] {
            let smoother = CurveSmoother::new(window, poly, None).unwrap();
            let processed = smoother.process(&curve).unwrap();

            assert_eq!(processed.len(), 1000);
            assert!(processed.is_smoothed());
            for (x, y) in processed.strain().iter().zip(processed.stress()) {
                let expected = 2.5 * x - 1.0;
                assert!(
                    (y - expected).abs() < 1e-7,
                    "window={window} poly={poly}: {y} vs {expected}"
                );
            }
        }
    }

    #[test]
    fn output_spans_the_observed_range_evenly() {
        let curve = line(20, 1.0, 0.0);
        let smoother = CurveSmoother::new(5, 2, Some(50)).unwrap();
        let processed = smoother.process(&curve).unwrap();

        let x = processed.strain();
        assert_eq!(x.len(), 50);
        assert_eq!(x[0], curve.strain()[0]);
        assert_eq!(x[49], *curve.strain().last().unwrap());
        let step = x[1] - x[0];
        for w in x.windows(2) {
            assert!(((w[1] - w[0]) - step).abs() < 1e-9);
        }
    }

    #[test]
    fn invalid_parameters_fail_at_construction() {
        assert!(CurveSmoother::new(500, 2, None).unwrap_err().is_fatal());
        assert!(CurveSmoother::new(3, 3, None).unwrap_err().is_fatal());
        assert!(CurveSmoother::new(5, 2, Some(1)).unwrap_err().is_fatal());
    }

    struct Halve;

    impl Smoother for Halve {
        fn smooth(
            &self,
            x: &[f64],
            y: &[f64],
            _params: &SmoothingParams,
        ) -> Result<(Vec<f64>, Vec<f64>), AnalysisError> {
            Ok((x.to_vec(), y.iter().map(|v| v / 2.0).collect()))
        }
    }

    #[test]
    fn smoother_is_substitutable() {
        let curve = CleanedCurve::new(vec![0.0, 1.0, 2.0], vec![2.0, 4.0, 6.0]).unwrap();
        let smoother = CurveSmoother::new(5, 2, None)
            .unwrap()
            .with_smoother(Arc::new(Halve));
        let processed = smoother.process(&curve).unwrap();
        assert_eq!(processed.stress(), &[1.0, 2.0, 3.0]);
        // The cleaned curve is untouched.
        assert_eq!(curve.stress(), &[2.0, 4.0, 6.0]);
    }
}
