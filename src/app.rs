//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - installs the log subscriber
//! - parses CLI arguments
//! - loads CSV samples (or generates synthetic ones)
//! - runs the analysis pipeline
//! - prints the report and writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalysisArgs, AnalyzeArgs, Command, DemoArgs};
use crate::data::{SyntheticSpec, generate_samples};
use crate::domain::{AnalysisConfig, Sample};
use crate::error::AppError;

pub mod pipeline;

use pipeline::{RunOutput, TensileAnalysis};

/// Entry point for the `tensile` binary.
pub fn run() -> Result<(), AppError> {
    init_logging();
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Demo(args) => handle_demo(args),
    }
}

/// Logs go to stderr so stdout stays a clean report. `RUST_LOG` overrides the
/// default `info` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args.analysis);
    // Validate everything before touching the input files.
    let analysis = TensileAnalysis::new(&config)?;

    let ingest = crate::io::ingest::load_samples(&args.inputs, config.preload.is_some())?;
    info!(
        files = args.inputs.len(),
        rows = ingest.rows_read,
        samples = ingest.samples.len(),
        skipped_rows = ingest.row_errors.len(),
        "input loaded"
    );
    if ingest.samples.is_empty() {
        return Err(AppError::new(3, "No samples found in the input files."));
    }

    finish(&analysis, &ingest.samples, &args.analysis, &config)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    if args.samples == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }
    let config = analysis_config_from_args(&args.analysis);
    let analysis = TensileAnalysis::new(&config)?;

    let samples = generate_samples(&demo_spec(&args), args.samples, args.seed);

    finish(&analysis, &samples, &args.analysis, &config)
}

fn demo_spec(args: &DemoArgs) -> SyntheticSpec {
    let base = if args.slack {
        SyntheticSpec::with_preload_slack()
    } else {
        SyntheticSpec::default()
    };
    SyntheticSpec {
        points: args.points,
        ..base
    }
}

fn finish(
    analysis: &TensileAnalysis,
    samples: &[Sample],
    args: &AnalysisArgs,
    config: &AnalysisConfig,
) -> Result<(), AppError> {
    if args.export_traces.is_some() && !config.keep_traces {
        return Err(AppError::new(2, "`--export-traces` cannot be combined with `--no-traces`."));
    }
    let run = analysis.run(samples);

    println!("{}", crate::report::format_run_summary(&run, config));
    println!("{}", crate::report::format_results_table(&run.store));
    let failures = crate::report::format_failures(&run);
    if !failures.is_empty() {
        println!("{failures}");
    }

    write_exports(&run, args, config)?;

    if run.store.usable_rows() == 0 {
        return Err(AppError::new(3, "No sample produced any result."));
    }
    Ok(())
}

fn write_exports(run: &RunOutput, args: &AnalysisArgs, config: &AnalysisConfig) -> Result<(), AppError> {
    if let Some(path) = &args.export {
        crate::io::export::write_results_csv(path, &run.store)?;
        info!(path = %path.display(), "results CSV written");
    }
    if let Some(path) = &args.export_json {
        crate::io::export::write_results_json(path, &run.store, config)?;
        info!(path = %path.display(), "results JSON written");
    }
    if let Some(dir) = &args.export_traces {
        let written = crate::io::trace::write_traces(
            dir,
            &run.outcomes,
            run.store.units(),
            config.r_squared_threshold,
        )?;
        info!(dir = %dir.display(), files = written.len(), "regression traces written");
    }
    Ok(())
}

pub fn analysis_config_from_args(args: &AnalysisArgs) -> AnalysisConfig {
    AnalysisConfig {
        strain_unit: args.strain_unit.clone(),
        stress_unit: args.stress_unit.clone(),
        preload: args.preload,
        r_squared_threshold: args.r_squared_threshold,
        lower_strain_limit: args.lower_strain_limit,
        upper_strain_limit: args.upper_strain_limit,
        limit_rule: args.limit_rule,
        smoothing: !args.no_smoothing,
        smoothing_window: args.window,
        poly_order: args.poly_order,
        data_points: args.data_points,
        keep_traces: !args.no_traces,
        parallel: args.parallel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    #[test]
    fn default_flags_match_default_config() {
        let cli = Cli::parse_from(["tensile", "demo"]);
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(analysis_config_from_args(&args.analysis), AnalysisConfig::default());
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from([
            "tensile", "demo", "--no-smoothing", "--no-traces", "--parallel", "--preload", "0.05",
        ]);
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        let config = analysis_config_from_args(&args.analysis);
        assert!(!config.smoothing);
        assert!(!config.keep_traces);
        assert!(config.parallel);
        assert_eq!(config.preload, Some(0.05));
    }

    #[test]
    fn default_demo_recovers_the_modulus() {
        let cli = Cli::parse_from(["tensile", "demo", "-n", "2"]);
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        let spec = demo_spec(&args);
        let config = analysis_config_from_args(&args.analysis);
        let samples = generate_samples(&spec, args.samples, args.seed);
        let run = TensileAnalysis::new(&config).unwrap().run(&samples);

        for row in run.store.rows() {
            let modulus = row.elastic_modulus.unwrap();
            assert!(
                (modulus - spec.modulus).abs() / spec.modulus < 0.1,
                "{}: modulus {modulus}",
                row.name
            );
        }
    }
}
