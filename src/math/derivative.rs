//! Numerical differentiation of sampled curves.

/// Derivative collaborator: `dy/dx` aligned with `x`.
///
/// Implementations must return one value per input point and be deterministic.
pub trait Differentiator: Send + Sync {
    fn derivative(&self, x: &[f64], y: &[f64]) -> Vec<f64>;
}

/// Central differences at interior points, one-sided differences at both ends.
///
/// A single point has no defined slope and yields `0.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CentralDifference;

impl Differentiator for CentralDifference {
    fn derivative(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        let n = x.len().min(y.len());
        match n {
            0 => Vec::new(),
            1 => vec![0.0],
            _ => {
                let mut out = Vec::with_capacity(n);
                out.push(slope(x[0], y[0], x[1], y[1]));
                for i in 1..n - 1 {
                    out.push(slope(x[i - 1], y[i - 1], x[i + 1], y[i + 1]));
                }
                out.push(slope(x[n - 2], y[n - 2], x[n - 1], y[n - 1]));
                out
            }
        }
    }
}

fn slope(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    let dx = x1 - x0;
    if dx == 0.0 {
        return 0.0;
    }
    (y1 - y0) / dx
}
