//! Savitzky–Golay smoothing.
//!
//! The filter fits a polynomial of order `p` to every window of `2h + 1` evenly
//! spaced samples and replaces the center value by the polynomial at the center.
//! For evenly spaced data this reduces to a fixed convolution whose weights are
//! the first row of the pseudo-inverse of the window's Vandermonde matrix.
//!
//! Window offsets are scaled to `[-1, 1]` before building the normal equations;
//! the value at the center does not depend on that scaling but the conditioning
//! does (windows of several hundred points are common here).

use nalgebra::{DMatrix, DVector};

use crate::math::interp::point_mirror;
use crate::math::ols::solve_least_squares;

/// Convolution weights for a centered window of `window` points.
///
/// Returns `None` for an even window, a window not larger than `poly_order`
/// or an unsolvable system.
pub fn savgol_coefficients(window: usize, poly_order: usize) -> Option<Vec<f64>> {
    if window % 2 == 0 || window <= poly_order {
        return None;
    }
    let half = window / 2;
    if half == 0 {
        return Some(vec![1.0]);
    }

    let cols = poly_order + 1;
    let scale = half as f64;
    let vandermonde = DMatrix::from_fn(window, cols, |r, c| {
        let u = (r as f64 - scale) / scale;
        u.powi(c as i32)
    });

    let normal = vandermonde.transpose() * &vandermonde;
    let mut e0 = DVector::zeros(cols);
    e0[0] = 1.0;
    let z = solve_least_squares(&normal, &e0)?;

    let coeffs: Vec<f64> = (0..window)
        .map(|r| (0..cols).map(|c| vandermonde[(r, c)] * z[c]).sum())
        .collect();
    if coeffs.iter().all(|c| c.is_finite()) {
        Some(coeffs)
    } else {
        None
    }
}

/// Apply the filter to evenly spaced `y`, point-mirroring both ends.
///
/// The window is shrunk to fit the data (`half < y.len()`). When the shrunk
/// window can no longer carry the polynomial, `y` is returned unchanged.
pub fn savgol_filter_mirrored(y: &[f64], window: usize, poly_order: usize) -> Option<Vec<f64>> {
    let n = y.len();
    if n == 0 {
        return Some(Vec::new());
    }

    let half = (window / 2).min(n - 1);
    let effective = 2 * half + 1;
    if effective <= poly_order {
        return Some(y.to_vec());
    }

    let coeffs = savgol_coefficients(effective, poly_order)?;
    let extended = point_mirror(y, half);

    let out = (0..n)
        .map(|i| {
            extended[i..i + effective]
                .iter()
                .zip(coeffs.iter())
                .map(|(v, c)| v * c)
                .sum()
        })
        .collect();
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_five_point_quadratic_weights() {
        // Known SG weights for window 5, order 2: [-3, 12, 17, 12, -3] / 35.
        let c = savgol_coefficients(5, 2).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0];
        for (a, b) in c.iter().zip(expected.iter()) {
            assert!((a - b / 35.0).abs() < 1e-12, "{a} vs {}", b / 35.0);
        }
    }

    #[test]
    fn weights_sum_to_one() {
        for &(w, p) in &[(3, 1), (11, 2), (51, 3), (501, 2)] {
            let c = savgol_coefficients(w, p).unwrap();
            let sum: f64 = c.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "window {w}: sum {sum}");
        }
    }

    #[test]
    fn rejects_invalid_windows() {
        assert!(savgol_coefficients(4, 2).is_none());
        assert!(savgol_coefficients(3, 3).is_none());
    }

    #[test]
    fn quadratic_is_preserved_in_the_interior() {
        let y: Vec<f64> = (0..40).map(|i| 0.5 * (i * i) as f64 - 3.0 * i as f64).collect();
        let out = savgol_filter_mirrored(&y, 9, 2).unwrap();
        for i in 4..36 {
            assert!((out[i] - y[i]).abs() < 1e-8);
        }
    }

    #[test]
    fn window_shrinks_to_short_input() {
        let y = [1.0, 2.0, 3.0];
        let out = savgol_filter_mirrored(&y, 501, 2).unwrap();
        for (a, b) in out.iter().zip(y.iter()) {
            assert!((a - b).abs() < 1e-10);
        }
    }
}
