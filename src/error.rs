//! Error types for the nitrate response analysis

use thiserror::Error;

/// Main error type for the analysis pipeline
#[derive(Error, Debug)]
pub enum CkError {
    #[error("Invalid measurement table: {reason}")]
    InvalidTable { reason: String },

    #[error("Unknown treatment code '{code}' in {path} (expected '+' or '-')")]
    UnknownTreatment { code: String, path: String },

    #[error("Invalid design matrix: {reason}")]
    InvalidDesignMatrix { reason: String },

    #[error("Model fitting failed: {reason}")]
    FitFailed { reason: String },

    #[error("Empty data: {reason}")]
    EmptyData { reason: String },

    #[error("Plot rendering failed: {reason}")]
    PlotFailed { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, CkError>;
