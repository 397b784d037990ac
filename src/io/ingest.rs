//! CSV ingest.
//!
//! Turns tensile test exports into raw [`Sample`]s. No cleaning happens here:
//! unparseable or empty cells become missing values and are dealt with by the
//! streamliner, so that every sample keeps its row in the results table.
//!
//! Layout:
//! - required columns `strain` and `stress`
//! - optional `tool_distance` (needed for preload rebasing)
//! - optional `sample` (or `name`) column grouping rows into samples, in order
//!   of first appearance; without it the whole file is one sample named after
//!   the file stem
//!
//! Header matching is case-insensitive, tolerates a UTF-8 BOM, spaces instead
//! of underscores and a trailing unit label (`strain [%]`).

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{RawPoint, Sample};
use crate::error::{AnalysisError, AppError};

/// A row that could not be read at all.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

/// Ingest output: samples in file order, then first-appearance order.
#[derive(Debug, Clone, Default)]
pub struct IngestedData {
    pub samples: Vec<Sample>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load every CSV in `paths`.
///
/// With `require_tool_distance` set (a preload is configured), a file without a
/// `tool_distance` column is a configuration error.
pub fn load_samples(paths: &[PathBuf], require_tool_distance: bool) -> Result<IngestedData, AppError> {
    let mut data = IngestedData::default();
    for path in paths {
        let file = File::open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        read_samples(file, path, &fallback, require_tool_distance, &mut data)?;
    }
    Ok(data)
}

/// Read one CSV source and append its samples to `data`.
pub fn read_samples<R: Read>(
    source: R,
    path: &Path,
    fallback_name: &str,
    require_tool_distance: bool,
    data: &mut IngestedData,
) -> Result<(), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers of '{}': {e}", path.display())))?
        .clone();
    let columns = Columns::resolve(&headers, path, require_tool_distance)?;

    let first = data.samples.len();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line, and lines are 1-based.
        let line = idx + 2;
        data.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(file = %path.display(), line, "skipping unreadable CSV row: {e}");
                data.row_errors.push(RowError {
                    file: path.to_path_buf(),
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let name = columns
            .sample
            .and_then(|i| get_cell(&record, i))
            .unwrap_or(fallback_name);
        let slot = match index.get(name) {
            Some(&slot) => slot,
            None => {
                data.samples.push(Sample::new(name, Vec::new()));
                index.insert(name.to_string(), data.samples.len() - 1);
                data.samples.len() - 1
            }
        };
        data.samples[slot].points.push(columns.point(&record));
    }

    debug!(
        file = %path.display(),
        samples = data.samples.len() - first,
        "loaded CSV"
    );
    Ok(())
}

/// Resolved column indices of one file.
#[derive(Debug, Clone, Copy)]
struct Columns {
    strain: usize,
    stress: usize,
    tool_distance: Option<usize>,
    sample: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, path: &Path, require_tool_distance: bool) -> Result<Self, AppError> {
        let header_map = build_header_map(headers);
        let required = |name: &str| {
            header_map.get(name).copied().ok_or_else(|| {
                AppError::from(AnalysisError::configuration(format!(
                    "Missing required column `{name}` in '{}'.",
                    path.display()
                )))
            })
        };

        let columns = Columns {
            strain: required("strain")?,
            stress: required("stress")?,
            tool_distance: header_map.get("tool_distance").copied(),
            sample: header_map
                .get("sample")
                .or_else(|| header_map.get("name"))
                .copied(),
        };

        if require_tool_distance && columns.tool_distance.is_none() {
            return Err(AnalysisError::configuration(format!(
                "A preload is configured but '{}' has no `tool_distance` column.",
                path.display()
            ))
            .into());
        }
        Ok(columns)
    }

    fn point(&self, record: &StringRecord) -> RawPoint {
        RawPoint {
            strain: parse_opt_f64(get_cell(record, self.strain)),
            stress: parse_opt_f64(get_cell(record, self.stress)),
            tool_distance: self
                .tool_distance
                .and_then(|i| parse_opt_f64(get_cell(record, i))),
        }
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First column wins if two headers normalize to the same name.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}').trim();
    let name = match name.find('[') {
        Some(pos) => name[..pos].trim_end(),
        None => name,
    };
    name.to_ascii_lowercase().replace([' ', '-'], "_")
}

fn get_cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let v = s?.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
