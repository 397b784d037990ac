//! Least squares solvers.
//!
//! Two flavours are needed:
//!
//! - a small dense solver (SVD) for the Savitzky–Golay normal equations
//! - an incremental straight-line fit that grows one point at a time
//!
//! The incremental fit is the hot path of the linear-region sweep, where the
//! window grows from 2 to several thousand points. Recomputing each fit from
//! scratch would make the sweep quadratic, so the sufficient statistics
//! (means plus centered second moments of x and y) are updated in O(1) per point.
//! Centered moments are algebraically the same information as running sums of
//! `x, y, xy, x²` but do not lose precision when strain values sit far from zero.

use nalgebra::{DMatrix, DVector};

/// Relative tolerance below which a centered variance counts as zero.
const RELATIVE_VARIANCE_EPS: f64 = 1e-12;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Straight-line fit `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Incrementally updated sufficient statistics of a simple linear regression.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningFit {
    n: usize,
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

impl RunningFit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation (Welford update).
    pub fn push(&mut self, x: f64, y: f64) {
        self.n += 1;
        let n = self.n as f64;
        let dx = x - self.mean_x;
        let dy = y - self.mean_y;
        self.mean_x += dx / n;
        self.mean_y += dy / n;
        self.sxx += dx * (x - self.mean_x);
        self.syy += dy * (y - self.mean_y);
        self.sxy += dx * (y - self.mean_y);
    }

    /// True when the x values seen so far have (numerically) zero variance.
    pub fn is_degenerate(&self) -> bool {
        let floor = self.n as f64 * (RELATIVE_VARIANCE_EPS * self.mean_x.abs()).powi(2);
        !(self.sxx > floor)
    }

    /// Current OLS fit; `None` with fewer than 2 points or zero x variance.
    pub fn fit(&self) -> Option<LineFit> {
        if self.n < 2 || self.is_degenerate() {
            return None;
        }

        let slope = self.sxy / self.sxx;
        let intercept = self.mean_y - slope * self.mean_x;

        // Constant y: the horizontal line passes through every point.
        let y_floor = self.n as f64 * (RELATIVE_VARIANCE_EPS * self.mean_y.abs()).powi(2);
        let r_squared = if self.syy <= y_floor {
            1.0
        } else {
            ((self.sxy * self.sxy) / (self.sxx * self.syy)).clamp(0.0, 1.0)
        };

        if !(slope.is_finite() && intercept.is_finite() && r_squared.is_finite()) {
            return None;
        }

        Some(LineFit {
            slope,
            intercept,
            r_squared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn running_fit_matches_closed_form() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.1, 3.9, 6.1, 7.9, 10.1];

        let mut running = RunningFit::new();
        for (&xi, &yi) in x.iter().zip(y.iter()) {
            running.push(xi, yi);
        }
        let fit = running.fit().unwrap();

        let n = x.len() as f64;
        let mx = x.iter().sum::<f64>() / n;
        let my = y.iter().sum::<f64>() / n;
        let sxy: f64 = x.iter().zip(y.iter()).map(|(a, b)| (a - mx) * (b - my)).sum();
        let sxx: f64 = x.iter().map(|a| (a - mx) * (a - mx)).sum();
        let syy: f64 = y.iter().map(|b| (b - my) * (b - my)).sum();

        assert!((fit.slope - sxy / sxx).abs() < 1e-12);
        assert!((fit.intercept - (my - sxy / sxx * mx)).abs() < 1e-12);
        assert!((fit.r_squared - sxy * sxy / (sxx * syy)).abs() < 1e-12);
    }

    #[test]
    fn running_fit_flags_zero_variance() {
        let mut running = RunningFit::new();
        running.push(3.0, 1.0);
        assert!(running.fit().is_none());
        running.push(3.0, 2.0);
        assert!(running.is_degenerate());
        assert!(running.fit().is_none());
        running.push(4.0, 2.0);
        assert!(running.fit().is_some());
    }

    #[test]
    fn running_fit_keeps_precision_far_from_origin() {
        let mut running = RunningFit::new();
        for i in 0..1000 {
            let x = 1.0e6 + i as f64 * 1e-3;
            running.push(x, 5.0 * x - 2.0);
        }
        let fit = running.fit().unwrap();
        assert!((fit.slope - 5.0).abs() < 1e-6, "slope {}", fit.slope);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_response_is_a_perfect_fit() {
        let mut running = RunningFit::new();
        for i in 0..5 {
            running.push(i as f64, 7.0);
        }
        let fit = running.fit().unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 1.0);
    }
}
