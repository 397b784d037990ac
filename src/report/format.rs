//! Formatted terminal output.

use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisConfig, LimitRule};
use crate::results::{Column, ResultsStore};

const NAME_WIDTH: usize = 20;
const VALUE_WIDTH: usize = 14;

/// Run header: units, detection and smoothing settings, sample counts.
pub fn format_run_summary(run: &RunOutput, config: &AnalysisConfig) -> String {
    let mut out = String::new();
    let units = run.store.units();

    out.push_str("=== tensile - stress-strain property extraction ===\n");
    out.push_str(&format!(
        "Units: strain [{}] | stress [{}]\n",
        if units.strain.label().is_empty() { "-" } else { units.strain.label() },
        units.stress
    ));
    out.push_str(&format!(
        "Linear region: R² >= {} | strain in [{}, {}) | rule: {}\n",
        config.r_squared_threshold,
        config.lower_strain_limit,
        config.upper_strain_limit,
        match config.limit_rule {
            LimitRule::LastAcceptable => "last acceptable",
            LimitRule::FirstDrop => "first drop",
        }
    ));
    if config.smoothing {
        out.push_str(&format!(
            "Smoothing: Savitzky-Golay window={} poly_order={} points={}\n",
            config.smoothing_window,
            config.poly_order,
            config
                .data_points
                .map_or_else(|| "auto".to_string(), |n| n.to_string())
        ));
    } else {
        out.push_str("Smoothing: off\n");
    }
    if let Some(preload) = config.preload {
        out.push_str(&format!("Preload: {preload} {}\n", units.stress));
    }
    out.push_str(&format!(
        "Samples: n={} | usable={} | with errors={}\n",
        run.store.len(),
        run.store.usable_rows(),
        run.failed_samples().count()
    ));

    out
}

/// The results table, one line per sample. Missing values print as `-`.
pub fn format_results_table(store: &ResultsStore) -> String {
    let mut out = String::new();
    let headers = store.headers();

    let mut line = format!("{:<NAME_WIDTH$}", truncate(&headers[0], NAME_WIDTH));
    for title in &headers[1..] {
        line.push_str(&format!(" {:>VALUE_WIDTH$}", truncate(short_title(title), VALUE_WIDTH)));
    }
    out.push_str(line.trim_end());
    out.push('\n');

    let mut rule = "-".repeat(NAME_WIDTH);
    for _ in Column::ALL {
        rule.push(' ');
        rule.push_str(&"-".repeat(VALUE_WIDTH));
    }
    out.push_str(&rule);
    out.push('\n');

    for row in store.rows() {
        let mut line = format!("{:<NAME_WIDTH$}", truncate(&row.name, NAME_WIDTH));
        for column in Column::ALL {
            let cell = column.get(row).map_or_else(|| "-".to_string(), |v| fmt_value(v, column));
            line.push_str(&format!(" {cell:>VALUE_WIDTH$}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// Per-sample error list (empty string if every sample went through).
pub fn format_failures(run: &RunOutput) -> String {
    let mut out = String::new();
    for outcome in run.failed_samples() {
        if out.is_empty() {
            out.push_str("Issues:\n");
        }
        for err in &outcome.errors {
            out.push_str(&format!("- {}: {err}\n", outcome.name));
        }
    }
    out
}

/// Drop the trailing unit note (`toughness [kPa] (Pa = J/m^3)` -> `toughness [kPa]`).
fn short_title(title: &str) -> &str {
    match title.find(" (") {
        Some(pos) => &title[..pos],
        None => title,
    }
}

fn fmt_value(v: f64, column: Column) -> String {
    match column.decimals() {
        Some(d) => format!("{v:.prec$}", prec = d as usize),
        None => format!("{v:.4}"),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
