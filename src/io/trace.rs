//! Per-sample regression trace files.
//!
//! One JSON file per sample with the R² sweep and the located limit, for
//! plotting outside this tool.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::app::pipeline::SampleOutcome;
use crate::domain::{RegressionEntry, UnitSystem};
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct TraceFile<'a> {
    pub sample: &'a str,
    pub units: &'a UnitSystem,
    pub r_squared_threshold: f64,
    pub limit_k: usize,
    pub linear_limit: f64,
    pub linear_limit_stress: f64,
    pub entries: &'a [RegressionEntry],
    pub degenerate: &'a [usize],
}

/// Write `<dir>/<row>-<sample>.trace.json` for every sample that has a trace.
///
/// `<row>` is the 1-based results row, so samples whose names collide after
/// `file_safe` still get distinct files. Returns the written paths.
pub fn write_traces(
    dir: &Path,
    outcomes: &[SampleOutcome],
    units: &UnitSystem,
    r_squared_threshold: f64,
) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create trace directory '{}': {e}", dir.display())))?;

    let mut written = Vec::new();
    for (idx, outcome) in outcomes.iter().enumerate() {
        let Some(region) = &outcome.region else { continue };
        let Some(trace) = &region.trace else { continue };

        let doc = TraceFile {
            sample: &outcome.name,
            units,
            r_squared_threshold,
            limit_k: region.k,
            linear_limit: region.linear_limit,
            linear_limit_stress: region.linear_limit_stress,
            entries: &trace.entries,
            degenerate: &trace.degenerate,
        };

        let path = dir.join(trace_file_name(idx, &outcome.name));
        let file = File::create(&path)
            .map_err(|e| AppError::new(2, format!("Failed to create trace JSON '{}': {e}", path.display())))?;
        serde_json::to_writer_pretty(file, &doc)
            .map_err(|e| AppError::new(2, format!("Failed to write trace JSON: {e}")))?;
        written.push(path);
    }
    Ok(written)
}

fn trace_file_name(idx: usize, name: &str) -> String {
    format!("{:03}-{}.trace.json", idx + 1, file_safe(name))
}

fn file_safe(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    if cleaned.is_empty() { "sample".to_string() } else { cleaned }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_names_become_safe_file_names() {
        assert_eq!(file_safe("S-001"), "S-001");
        assert_eq!(file_safe("a/b c"), "a_b_c");
        assert_eq!(file_safe(""), "sample");
    }

    #[test]
    fn colliding_sample_names_get_separate_trace_files() {
        use crate::app::pipeline::TensileAnalysis;
        use crate::domain::{AnalysisConfig, Sample};

        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 2.0, 4.0, 6.0];
        let samples = vec![
            Sample::from_columns("a b", &x, &y),
            Sample::from_columns("a_b", &x, &y),
            Sample::from_columns("a_b", &x, &y),
        ];
        let config = AnalysisConfig {
            smoothing: false,
            ..AnalysisConfig::default()
        };
        let analysis = TensileAnalysis::new(&config).unwrap();
        let run = analysis.run(&samples);

        let dir = std::env::temp_dir().join(format!("tensile-traces-{}", std::process::id()));
        let written =
            write_traces(&dir, &run.outcomes, analysis.units(), config.r_squared_threshold).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            ["001-a_b.trace.json", "002-a_b.trace.json", "003-a_b.trace.json"]
        );
        for path in &written {
            assert!(path.is_file());
        }
        let first = fs::read_to_string(&written[0]).unwrap();
        assert!(first.contains("\"sample\": \"a b\""));

        fs::remove_dir_all(&dir).unwrap();
    }
}
