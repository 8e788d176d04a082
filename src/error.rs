use std::path::PathBuf;
use thiserror::Error;

use crate::correction::CorrectionError;
use crate::ir::StructuralError;

/// The main error type for tiercheck operations.
#[derive(Debug, Error)]
pub enum TiercheckError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TextGrid {path} (line {line}): {message}")]
    TextGridParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to parse annotation JSON from {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write annotation JSON to {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read orthography {path}: {source}")]
    OrthographyRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write report {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("{path}: {source}")]
    Structural {
        path: PathBuf,
        #[source]
        source: StructuralError,
    },

    #[error("Correction of {path} failed: {source}")]
    Correction {
        path: PathBuf,
        #[source]
        source: CorrectionError,
    },

    #[error("Refusing to overwrite existing file {path} (pass --overwrite to replace it)")]
    OutputExists { path: PathBuf },

    #[error("No input given: specify a file with --textgrid and/or a directory with --directory")]
    NoInputs,

    #[error("No annotation files found in --textgrid or --directory")]
    EmptyWorkSet,

    #[error("{failed} of {total} file(s) could not be processed")]
    BatchFailed { failed: usize, total: usize },

    #[error("Validation failed for {invalid} of {total} file(s)")]
    ValidationFailed { invalid: usize, total: usize },
}

impl TiercheckError {
    /// Attaches a file path to a structural error.
    pub(crate) fn structural(path: impl Into<PathBuf>, source: StructuralError) -> Self {
        Self::Structural {
            path: path.into(),
            source,
        }
    }
}
