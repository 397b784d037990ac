//! Resampling helpers used before Savitzky–Golay filtering.

/// `n` evenly spaced values from `start` to `end` (both inclusive).
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n as f64 - 1.0);
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = end;
            out
        }
    }
}

/// Linear interpolation of `(x, y)` at sorted `grid` positions.
///
/// `x` must be strictly increasing. Grid points outside `[x0, xn]` take the
/// nearest end value.
pub fn interpolate_sorted(x: &[f64], y: &[f64], grid: &[f64]) -> Vec<f64> {
    let n = x.len().min(y.len());
    if n == 0 {
        return vec![f64::NAN; grid.len()];
    }

    let mut out = Vec::with_capacity(grid.len());
    let mut seg = 0usize;
    for &g in grid {
        if g <= x[0] {
            out.push(y[0]);
            continue;
        }
        if g >= x[n - 1] {
            out.push(y[n - 1]);
            continue;
        }
        while seg + 1 < n && x[seg + 1] < g {
            seg += 1;
        }
        let (x0, x1) = (x[seg], x[seg + 1]);
        let u = (g - x0) / (x1 - x0);
        out.push(y[seg] + u * (y[seg + 1] - y[seg]));
    }
    out
}

/// Extend `y` by `half` point-mirrored samples on each side.
///
/// Point mirroring reflects through the end point (`2·y₀ − yᵢ`), which keeps
/// straight lines straight across the boundary. Requires `half < y.len()`.
pub fn point_mirror(y: &[f64], half: usize) -> Vec<f64> {
    let n = y.len();
    debug_assert!(half < n.max(1));
    let mut out = Vec::with_capacity(n + 2 * half);
    if n == 0 {
        return out;
    }
    let first = y[0];
    let last = y[n - 1];
    for i in (1..=half).rev() {
        out.push(2.0 * first - y[i]);
    }
    out.extend_from_slice(y);
    for i in 1..=half {
        out.push(2.0 * last - y[n - 1 - i]);
    }
    out
}
