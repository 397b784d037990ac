//! Command-line parsing for the tensile property extractor.
//!
//! Argument parsing stays here; turning arguments into an [`AnalysisConfig`]
//! happens in `app`.
//!
//! [`AnalysisConfig`]: crate::domain::AnalysisConfig

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::LimitRule;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "tensile",
    version,
    about = "Mechanical properties from tensile test stress-strain curves"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze stress-strain curves from one or more CSV files.
    Analyze(AnalyzeArgs),
    /// Analyze generated samples (no input files needed).
    Demo(DemoArgs),
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// CSV files with `strain` and `stress` columns (optional `sample`, `tool_distance`).
    #[arg(value_name = "CSV", required = true)]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Number of synthetic samples.
    #[arg(short = 'n', long, default_value_t = 5)]
    pub samples: usize,

    /// Random seed for sample generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Raw rows per synthetic curve. The default keeps the yield knee several
    /// smoothing windows wide; lower `--window` together with this.
    #[arg(long, default_value_t = 8000)]
    pub points: usize,

    /// Generate tool distances and leading slack (try with `--preload`).
    #[arg(long)]
    pub slack: bool,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

/// Options shared by every analysis command.
#[derive(Debug, Args, Clone)]
pub struct AnalysisArgs {
    /// Strain unit label: `%` or empty / `dimensionless`.
    #[arg(long, default_value = "%", allow_hyphen_values = true)]
    pub strain_unit: String,

    /// Stress unit label (used in column titles only).
    #[arg(long, default_value = "kPa")]
    pub stress_unit: String,

    /// Crop stress below this value and rebase strain on the tool distance.
    #[arg(long)]
    pub preload: Option<f64>,

    /// R² acceptance threshold for the linear region.
    #[arg(long = "r2", default_value_t = 0.995)]
    pub r_squared_threshold: f64,

    /// Lower strain limit of the regression window (inclusive).
    #[arg(long = "lower", default_value_t = 0.0, allow_hyphen_values = true)]
    pub lower_strain_limit: f64,

    /// Upper strain limit of the regression window (exclusive).
    #[arg(long = "upper", default_value_t = 50.0)]
    pub upper_strain_limit: f64,

    /// How the linear limit is picked when R² dips and recovers.
    #[arg(long, value_enum, default_value_t = LimitRule::LastAcceptable)]
    pub limit_rule: LimitRule,

    /// Run the regression on the cleaned curve instead of a smoothed copy.
    #[arg(long)]
    pub no_smoothing: bool,

    /// Savitzky-Golay window (odd).
    #[arg(long, default_value_t = 501)]
    pub window: usize,

    /// Savitzky-Golay polynomial order.
    #[arg(long, default_value_t = 2)]
    pub poly_order: usize,

    /// Resampling point count (default: smallest power of ten >= curve length).
    #[arg(long)]
    pub data_points: Option<usize>,

    /// Analyze samples in parallel.
    #[arg(long)]
    pub parallel: bool,

    /// Do not keep regression traces (faster; disables `--export-traces`).
    #[arg(long)]
    pub no_traces: bool,

    /// Export the results table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the results table and run configuration to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Write one regression trace JSON per sample into this directory.
    #[arg(long = "export-traces", value_name = "DIR")]
    pub export_traces: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analysis_flags_parse() {
        let cli = Cli::parse_from([
            "tensile",
            "analyze",
            "a.csv",
            "b.csv",
            "--r2",
            "0.99",
            "--limit-rule",
            "first-drop",
            "--no-smoothing",
            "--strain-unit",
            "",
        ]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.analysis.r_squared_threshold, 0.99);
        assert_eq!(args.analysis.limit_rule, LimitRule::FirstDrop);
        assert!(args.analysis.no_smoothing);
        assert_eq!(args.analysis.strain_unit, "");
        assert_eq!(args.analysis.window, 501);
    }

    #[test]
    fn demo_defaults() {
        let cli = Cli::parse_from(["tensile", "demo"]);
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.samples, 5);
        assert_eq!(args.points, 8000);
        assert_eq!(args.analysis.strain_unit, "%");
        assert!(args.analysis.preload.is_none());
    }
}
