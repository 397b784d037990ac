//! Export the results table to CSV or JSON.
//!
//! The CSV uses the unit-labelled column titles so it can be opened directly in
//! a spreadsheet; missing values are empty cells.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{AnalysisConfig, SampleResult, UnitSystem};
use crate::error::AppError;
use crate::results::{Column, ResultsStore};

/// Write the results table as CSV.
pub fn write_results_csv(path: &Path, store: &ResultsStore) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results_csv_to(file, store)
}

pub fn write_results_csv_to<W: Write>(out: W, store: &ResultsStore) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);

    writer
        .write_record(store.headers())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for row in store.rows() {
        let record = std::iter::once(row.name.clone()).chain(
            Column::ALL
                .iter()
                .map(|c| c.get(row).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer
            .write_record(record)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// JSON document written by `--export-json`.
#[derive(Debug, Serialize)]
pub struct ResultsFile<'a> {
    pub tool: &'static str,
    pub generated_at: DateTime<Utc>,
    pub units: &'a UnitSystem,
    pub config: &'a AnalysisConfig,
    pub columns: Vec<String>,
    pub results: &'a [SampleResult],
}

/// Write the results table, units and run configuration as JSON.
pub fn write_results_json(path: &Path, store: &ResultsStore, config: &AnalysisConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create results JSON '{}': {e}", path.display())))?;

    let doc = ResultsFile {
        tool: "tensile",
        generated_at: Utc::now(),
        units: store.units(),
        config,
        columns: store.headers(),
        results: store.rows(),
    };

    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write results JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MechanicalProperties;

    #[test]
    fn csv_has_unit_headers_and_empty_missing_cells() {
        let mut store = ResultsStore::new(UnitSystem::new("%", "kPa").unwrap());
        let row = store.append("S, 1");
        store.record_properties(
            row,
            &MechanicalProperties {
                strength: 5.0,
                toughness: 0.2,
                elongation_at_break: 1.0,
            },
        );
        store.append("S2");

        let mut buf = Vec::new();
        write_results_csv_to(&mut buf, &store).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("sample,e_modulus [kPa],linear_limit [%],strength [kPa]"));
        assert_eq!(lines[1], "\"S, 1\",,,5,0.2,1,,");
        assert_eq!(lines[2], "S2,,,,,,,");
    }
}
