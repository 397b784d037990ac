//! Error types.
//!
//! Two layers:
//!
//! - [`AnalysisError`] is the typed taxonomy used by the analysis core. Only
//!   configuration errors are fatal; everything else is caught at the sample
//!   (or regression window) boundary and turns into missing values.
//! - [`AppError`] is what the binary reports: a message plus a process exit code.

use thiserror::Error;

/// Errors raised by the analysis core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid unit, smoothing parameter or import layout. Raised before any
    /// sample is processed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A sample has no usable rows after cleaning.
    #[error("Data quality error in sample '{sample}': {reason}")]
    DataQuality { sample: String, reason: String },

    /// Fewer than two points fall inside the regression strain window.
    #[error("Insufficient data: {points} point(s) in the regression window, at least 2 required")]
    InsufficientData { points: usize },

    /// The first `k` points of the window have zero strain variance.
    #[error("Numeric degeneracy: zero strain variance in regression window k={k}")]
    NumericDegeneracy { k: usize },

    /// No regression window reached the R² acceptance threshold.
    #[error("No linear region: no regression window reached R² >= {threshold}")]
    NoLinearRegion { threshold: f64 },
}

impl AnalysisError {
    pub fn configuration(message: impl Into<String>) -> Self {
        AnalysisError::Configuration(message.into())
    }

    pub fn data_quality(sample: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::DataQuality {
            sample: sample.into(),
            reason: reason.into(),
        }
    }

    /// Fatal errors abort the whole run; all others are recorded per sample.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalysisError::Configuration(_))
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        let exit_code = if err.is_fatal() { 2 } else { 3 };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_configuration_errors_are_fatal() {
        assert!(AnalysisError::configuration("bad unit").is_fatal());
        assert!(!AnalysisError::data_quality("s1", "empty").is_fatal());
        assert!(!AnalysisError::InsufficientData { points: 1 }.is_fatal());
        assert!(!AnalysisError::NumericDegeneracy { k: 3 }.is_fatal());
    }

    #[test]
    fn app_error_exit_code_follows_severity() {
        let fatal: AppError = AnalysisError::configuration("bad unit").into();
        assert_eq!(fatal.exit_code(), 2);
        let soft: AppError = AnalysisError::InsufficientData { points: 0 }.into();
        assert_eq!(soft.exit_code(), 3);
        assert!(soft.to_string().contains("Insufficient data"));
    }
}
