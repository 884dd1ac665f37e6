//! I/O error types for cadence-io.

use std::path::PathBuf;

/// Errors from file I/O, CSV parsing, table construction, and result serialization.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a required column is absent from the CSV header.
    #[error("column \"{column}\" not found in header of {path}")]
    MissingColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// Name of the missing column.
        column: String,
    },

    /// Returned when no complete data row remains after loading.
    #[error("empty dataset (no complete data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a feature cell is present but not a finite number.
    #[error("non-numeric value in column \"{column}\": row {row_index}, raw value \"{raw}\"")]
    NonNumericValue {
        /// Name of the offending column.
        column: String,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// The raw value that failed validation.
        raw: String,
    },

    /// Returned when a feature name is requested that the table does not have.
    #[error("unknown feature \"{name}\"")]
    UnknownFeature {
        /// The requested feature name.
        name: String,
    },

    /// Returned when a feature name appears twice in a schema.
    #[error("duplicate feature \"{name}\"")]
    DuplicateFeature {
        /// The repeated feature name.
        name: String,
    },

    /// Returned when parallel table vectors disagree in shape.
    #[error("table shape mismatch: {reason}")]
    ShapeMismatch {
        /// Human-readable description of the mismatch.
        reason: String,
    },

    /// Returned when a genre label is empty.
    #[error("genre label must not be empty")]
    EmptyGenre,

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when an artifact cannot be encoded as JSON.
    #[error("cannot encode {path} as JSON")]
    Encode {
        /// Path of the artifact being written.
        path: PathBuf,
        /// Underlying serde_json error.
        source: serde_json::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
