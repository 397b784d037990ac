//! Synthetic tensile test recordings.
//!
//! Curves are bilinear (linear elastic up to the yield strain, then linear
//! hardening) with a short softening tail before break, plus Gaussian stress
//! noise. The raw rows are then made as messy as real exports: some rows are
//! duplicated, the first rows are shuffled and a few cells are blanked.
//!
//! With a gauge length configured, every row also carries a tool distance. The
//! tools start `slack` further apart than the gauge length, so the first rows
//! show near-zero stress and the recorded strain is measured against the wrong
//! reference length until the curve is rebased on a preload.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{RawPoint, Sample};

/// Shape and noise parameters. Strain in %, stress in kPa.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    /// Elastic modulus (stress per dimensionless strain).
    pub modulus: f64,
    /// Relative per-sample spread of the modulus.
    pub modulus_spread: f64,
    pub yield_strain: f64,
    /// Plastic slope as a fraction of the modulus.
    pub hardening: f64,
    pub break_strain: f64,
    pub points: usize,
    /// Stress noise std as a fraction of the yield stress.
    pub noise: f64,
    pub duplicate_fraction: f64,
    /// Fraction of leading rows recorded out of order.
    pub shuffled_fraction: f64,
    pub missing_fraction: f64,
    /// Initial tool distance at zero strain (mm). `None` = no tool distance column.
    pub gauge_length: Option<f64>,
    /// Extra tool distance travelled before the sample is loaded (mm).
    pub slack: f64,
    pub slack_points: usize,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            modulus: 500.0,
            modulus_spread: 0.01,
            yield_strain: 4.0,
            hardening: 0.05,
            break_strain: 40.0,
            points: 800,
            noise: 0.005,
            duplicate_fraction: 0.02,
            shuffled_fraction: 0.02,
            missing_fraction: 0.01,
            gauge_length: None,
            slack: 0.0,
            slack_points: 0,
        }
    }
}

impl SyntheticSpec {
    /// Default curve shape with tool distance and leading slack.
    pub fn with_preload_slack() -> Self {
        Self {
            gauge_length: Some(20.0),
            slack: 0.5,
            slack_points: 40,
            ..Self::default()
        }
    }

    /// Noise-free stress at `strain` for a given modulus.
    pub fn stress_at(&self, strain: f64, modulus: f64) -> f64 {
        let yield_stress = modulus * self.yield_strain / 100.0;
        let neck = 0.9 * self.break_strain;
        if strain <= self.yield_strain {
            modulus * strain / 100.0
        } else if strain <= neck {
            yield_stress + self.hardening * modulus * (strain - self.yield_strain) / 100.0
        } else {
            let peak = yield_stress + self.hardening * modulus * (neck - self.yield_strain) / 100.0;
            let u = (strain - neck) / (self.break_strain - neck);
            peak * (1.0 - 0.3 * u * u)
        }
    }
}

/// Generate `count` named samples (`S-001`, `S-002`, ...) from one seeded stream.
pub fn generate_samples(spec: &SyntheticSpec, count: usize, seed: u64) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| generate_sample(spec, format!("S-{:03}", i + 1), &mut rng))
        .collect()
}

pub fn generate_sample(spec: &SyntheticSpec, name: String, rng: &mut StdRng) -> Sample {
    let n = spec.points.max(2);
    let spread = (spec.modulus_spread * spec.modulus).abs();
    let modulus = match Normal::new(spec.modulus, spread) {
        Ok(d) if spread > 0.0 => d.sample(rng),
        _ => spec.modulus,
    };
    let noise_std = (spec.noise * modulus * spec.yield_strain / 100.0).abs();
    let noise = Normal::new(0.0, noise_std).ok().filter(|_| noise_std > 0.0);

    // Tool distance and recorded strain are both measured from the slack start.
    let reference = spec.gauge_length.map(|h0| (h0, h0 + spec.slack));
    let recorded_strain = |d: f64, start: f64| (start - d) / start * 100.0;

    let mut rows = Vec::with_capacity(n + spec.slack_points + n / 10);

    if let Some((_, start)) = reference {
        let slack_stress = 0.002 * modulus * spec.yield_strain / 100.0;
        for j in 0..spec.slack_points {
            let u = j as f64 / spec.slack_points as f64;
            let d = start - u * spec.slack;
            let stress = slack_stress * u * rng.gen_range(0.5..1.0);
            rows.push(RawPoint::new(recorded_strain(d, start), stress).with_tool_distance(d));
        }
    }

    for i in 0..n {
        let strain = spec.break_strain * i as f64 / (n - 1) as f64;
        let mut stress = spec.stress_at(strain, modulus);
        if let Some(dist) = noise {
            stress += dist.sample(rng);
        }
        let point = match reference {
            Some((h0, start)) => {
                let d = h0 * (1.0 - strain / 100.0);
                RawPoint::new(recorded_strain(d, start), stress).with_tool_distance(d)
            }
            None => RawPoint::new(strain, stress),
        };
        rows.push(point);
    }

    let duplicates = (spec.duplicate_fraction * n as f64).round() as usize;
    for _ in 0..duplicates {
        let mut dup = rows[rng.gen_range(0..rows.len())];
        if let (Some(s), Some(dist)) = (dup.stress, noise) {
            dup.stress = Some(s + dist.sample(rng));
        }
        rows.push(dup);
    }

    let shuffled = ((spec.shuffled_fraction * rows.len() as f64).round() as usize).min(rows.len());
    rows[..shuffled].shuffle(rng);

    let missing = (spec.missing_fraction * rows.len() as f64).round() as usize;
    for _ in 0..missing {
        let idx = rng.gen_range(0..rows.len());
        if rng.gen_bool(0.5) {
            rows[idx].stress = None;
        } else {
            rows[idx].strain = None;
        }
    }

    Sample::new(name, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_samples() {
        let spec = SyntheticSpec::default();
        assert_eq!(generate_samples(&spec, 3, 7), generate_samples(&spec, 3, 7));
        assert_ne!(generate_samples(&spec, 1, 7), generate_samples(&spec, 1, 8));
    }

    #[test]
    fn samples_are_named_and_messy() {
        let spec = SyntheticSpec::default();
        let samples = generate_samples(&spec, 2, 1);
        assert_eq!(samples[0].name, "S-001");
        assert_eq!(samples[1].name, "S-002");

        let rows = &samples[0].points;
        assert!(rows.len() > spec.points);
        assert!(rows.iter().any(|p| p.stress.is_none() || p.strain.is_none()));
        assert!(!samples[0].carries_tool_distance());
    }

    #[test]
    fn clean_curve_shape() {
        let spec = SyntheticSpec::default();
        assert_eq!(spec.stress_at(0.0, 500.0), 0.0);
        assert!((spec.stress_at(4.0, 500.0) - 20.0).abs() < 1e-12);
        assert!((spec.stress_at(10.0, 500.0) - 21.5).abs() < 1e-12);
        // Softening tail ends below the peak.
        assert!(spec.stress_at(40.0, 500.0) < spec.stress_at(36.0, 500.0));
    }

    #[test]
    fn slack_rows_start_beyond_the_gauge_length() {
        let spec = SyntheticSpec::with_preload_slack();
        let sample = &generate_samples(&spec, 1, 5)[0];
        assert!(sample.carries_tool_distance());
        let max_d = sample
            .points
            .iter()
            .filter_map(|p| p.tool_distance)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((max_d - 20.5).abs() < 1e-12);
    }
}
