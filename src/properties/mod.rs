//! Curve-wide mechanical properties.
//!
//! Computed from the cleaned curve, never the smoothed one: smoothing flattens
//! the stress peak and shifts the strain at break.

use crate::domain::{CleanedCurve, MechanicalProperties, UnitSystem};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyAggregator {
    conversion_factor: f64,
}

impl PropertyAggregator {
    pub fn new(units: &UnitSystem) -> Self {
        Self {
            conversion_factor: units.strain_conversion_factor(),
        }
    }

    /// Strength, toughness and elongation at break (unrounded).
    ///
    /// - strength: maximum stress
    /// - toughness: trapezoidal ∫σ dε over the whole curve, with strain made
    ///   dimensionless (stress unit, i.e. energy per volume)
    /// - elongation at break: strain at the first maximum of stress
    pub fn aggregate(&self, curve: &CleanedCurve) -> MechanicalProperties {
        let strain = curve.strain();
        let stress = curve.stress();

        let (peak, strength) = stress
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, s)| if s > best.1 { (i, s) } else { best });

        MechanicalProperties {
            strength,
            toughness: trapezoid(strain, stress) / self.conversion_factor,
            elongation_at_break: strain[peak],
        }
    }
}

fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator(strain_unit: &str) -> PropertyAggregator {
        PropertyAggregator::new(&UnitSystem::new(strain_unit, "kPa").unwrap())
    }

    #[test]
    fn toughness_uses_dimensionless_strain() {
        let curve = CleanedCurve::new(vec![0.0, 1.0, 2.0], vec![0.0, 10.0, 20.0]).unwrap();
        let props = aggregator("%").aggregate(&curve);
        assert!((props.toughness - 0.2).abs() < 1e-12);

        let props = aggregator("").aggregate(&curve);
        assert!((props.toughness - 20.0).abs() < 1e-12);
    }

    #[test]
    fn elongation_is_strain_at_peak_stress() {
        let curve = CleanedCurve::new(vec![0.0, 1.0, 2.0], vec![1.0, 5.0, 3.0]).unwrap();
        let props = aggregator("%").aggregate(&curve);
        assert_eq!(props.strength, 5.0);
        assert_eq!(props.elongation_at_break, 1.0);
    }

    #[test]
    fn first_peak_wins_on_ties() {
        let curve = CleanedCurve::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 7.0, 7.0, 2.0]).unwrap();
        let props = aggregator("%").aggregate(&curve);
        assert_eq!(props.elongation_at_break, 1.0);
    }

    #[test]
    fn single_point_curve() {
        let curve = CleanedCurve::new(vec![0.5], vec![3.0]).unwrap();
        let props = aggregator("%").aggregate(&curve);
        assert_eq!(props.strength, 3.0);
        assert_eq!(props.toughness, 0.0);
        assert_eq!(props.elongation_at_break, 0.5);
    }
}
