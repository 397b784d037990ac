//! Incremental regression sweep.
//!
//! For window sizes `k = 2..=M` the sweep yields the OLS fit of stress on strain
//! over the first `k` points. Each step adds a single point to a [`RunningFit`],
//! so a full sweep is O(M) no matter how large the window grows.
//!
//! The sweep is lazy and restartable: callers that only need the limit can stop
//! early, diagnostic callers can consume (or `clone` and replay) the full
//! sequence.

use crate::domain::RegressionEntry;
use crate::error::AnalysisError;
use crate::math::RunningFit;

#[derive(Debug, Clone)]
pub struct RegressionSweep<'a> {
    strain: &'a [f64],
    stress: &'a [f64],
    running: RunningFit,
    next: usize,
}

impl<'a> RegressionSweep<'a> {
    /// Sweep over paired columns (the shorter one bounds the window).
    pub fn new(strain: &'a [f64], stress: &'a [f64]) -> Self {
        Self {
            strain,
            stress,
            running: RunningFit::new(),
            next: 0,
        }
    }

    /// Number of points available to the sweep (`M`).
    pub fn points(&self) -> usize {
        self.strain.len().min(self.stress.len())
    }

    /// Rewind to `k = 2`.
    pub fn restart(&mut self) {
        self.running = RunningFit::new();
        self.next = 0;
    }
}

impl Iterator for RegressionSweep<'_> {
    /// `Err(NumericDegeneracy)` marks a window with zero strain variance; the
    /// sweep continues past it.
    type Item = Result<RegressionEntry, AnalysisError>;

    fn next(&mut self) -> Option<Self::Item> {
        let m = self.points();
        if m < 2 {
            return None;
        }
        if self.next == 0 {
            self.running.push(self.strain[0], self.stress[0]);
            self.next = 1;
        }
        if self.next >= m {
            return None;
        }

        let i = self.next;
        self.next += 1;
        self.running.push(self.strain[i], self.stress[i]);
        let k = i + 1;

        let item = match self.running.fit() {
            Some(fit) => Ok(RegressionEntry {
                k,
                strain: self.strain[i],
                stress: self.stress[i],
                slope: fit.slope,
                intercept: fit.intercept,
                r_squared: fit.r_squared,
            }),
            None => Err(AnalysisError::NumericDegeneracy { k }),
        };
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.points().saturating_sub(self.next.max(1));
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RegressionSweep<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_one_entry_per_window_size() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        let sweep = RegressionSweep::new(&x, &y);
        assert_eq!(sweep.len(), 9);

        let entries: Vec<RegressionEntry> = sweep.map(|e| e.unwrap()).collect();
        assert_eq!(entries.first().unwrap().k, 2);
        assert_eq!(entries.last().unwrap().k, 10);
        for e in &entries {
            assert!((e.slope - 3.0).abs() < 1e-12);
            assert!((e.intercept - 1.0).abs() < 1e-12);
            assert!((e.r_squared - 1.0).abs() < 1e-12);
            assert_eq!(e.strain, x[e.k - 1]);
        }
    }

    #[test]
    fn degenerate_windows_do_not_stop_the_sweep() {
        let x = [1.0, 1.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 2.0, 3.0, 4.0];
        let items: Vec<_> = RegressionSweep::new(&x, &y).collect();

        assert_eq!(items.len(), 4);
        assert_eq!(items[0], Err(AnalysisError::NumericDegeneracy { k: 2 }));
        assert_eq!(items[1], Err(AnalysisError::NumericDegeneracy { k: 3 }));
        assert!(items[2].is_ok());
        assert!(items[3].is_ok());
    }

    #[test]
    fn restart_replays_the_same_sequence() {
        let x = [0.0, 1.0, 2.0, 4.0, 8.0];
        let y = [0.0, 1.0, 2.5, 3.0, 3.5];
        let mut sweep = RegressionSweep::new(&x, &y);
        let first: Vec<_> = sweep.by_ref().collect();
        assert!(sweep.next().is_none());

        sweep.restart();
        let second: Vec<_> = sweep.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn too_short_input_yields_nothing() {
        assert_eq!(RegressionSweep::new(&[1.0], &[2.0]).count(), 0);
        assert_eq!(RegressionSweep::new(&[], &[]).len(), 0);
    }
}
