//! CSV track reader with column lookup by name and row-level validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::domain::{FeatureTable, Genre};
use crate::IoError;

/// Default name of the genre label column.
pub const DEFAULT_GENRE_COLUMN: &str = "genre";

/// Default audio feature columns, in output order.
pub const DEFAULT_FEATURES: [&str; 12] = [
    "acousticness",
    "danceability",
    "duration",
    "energy",
    "instrumentalness",
    "key",
    "liveness",
    "loudness",
    "mode",
    "speechiness",
    "tempo",
    "valence",
];

/// Cell values treated as missing rather than malformed.
const MISSING_MARKERS: [&str; 4] = ["", "na", "nan", "null"];

/// Row accounting for a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Data rows read from the file.
    pub n_read: usize,
    /// Rows excluded because a required field was missing.
    pub n_incomplete: usize,
    /// Rows kept in the table.
    pub n_loaded: usize,
}

/// Reads a track table (genre label + numeric audio features) from a CSV file.
///
/// Expected CSV format:
/// - Header row required; columns are located by name, so their order and
///   any extra columns (ids, titles, subgenres) do not matter
/// - One row per track, all rows with the same number of fields as the header
///
/// Rows with a missing genre or feature (empty cell, `NA`, `NaN`, `null`)
/// are dropped and counted. Present-but-invalid numbers are fatal.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | Genre or a feature column is not in the header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonNumericValue`] | Feature cell is text or infinite |
/// | [`IoError::EmptyDataset`] | No complete rows |
pub struct TrackReader {
    path: PathBuf,
    genre_column: String,
    feature_columns: Vec<String>,
}

impl TrackReader {
    /// Create a new reader for the given CSV file path with default columns.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            genre_column: DEFAULT_GENRE_COLUMN.to_string(),
            feature_columns: DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Set the name of the genre label column.
    #[must_use]
    pub fn with_genre_column(mut self, column: impl Into<String>) -> Self {
        self.genre_column = column.into();
        self
    }

    /// Set the feature columns to load, in output order.
    #[must_use]
    pub fn with_feature_columns(mut self, columns: Vec<String>) -> Self {
        self.feature_columns = columns;
        self
    }

    /// Return the feature columns this reader will load.
    #[must_use]
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Read and validate the CSV file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<(FeatureTable, LoadReport), IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that our own InconsistentRowLength check fires
        // instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        let locate = |column: &str| {
            header
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| IoError::MissingColumn {
                    path: self.path.clone(),
                    column: column.to_string(),
                })
        };
        let genre_pos = locate(&self.genre_column)?;
        let feature_pos = self
            .feature_columns
            .iter()
            .map(|c| locate(c))
            .collect::<Result<Vec<_>, _>>()?;

        let mut genres = Vec::new();
        let mut rows = Vec::new();
        let mut n_read = 0usize;
        let mut n_incomplete = 0usize;

        'records: for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            n_read += 1;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let genre = record.get(genre_pos).unwrap_or("");
            if is_missing(genre) {
                debug!(row_index, "row has no genre label");
                n_incomplete += 1;
                continue;
            }

            let mut values = Vec::with_capacity(feature_pos.len());
            for (name, &pos) in self.feature_columns.iter().zip(&feature_pos) {
                let raw = record.get(pos).unwrap_or("");
                if is_missing(raw) {
                    debug!(row_index, column = %name, "row has a missing feature");
                    n_incomplete += 1;
                    continue 'records;
                }
                let value: f64 = raw.parse().map_err(|_| IoError::NonNumericValue {
                    column: name.clone(),
                    row_index,
                    raw: raw.to_string(),
                })?;
                if !value.is_finite() {
                    return Err(IoError::NonNumericValue {
                        column: name.clone(),
                        row_index,
                        raw: raw.to_string(),
                    });
                }
                values.push(value);
            }

            genres.push(Genre::new(genre)?);
            rows.push(values);
        }

        if rows.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }
        if n_incomplete > 0 {
            warn!(n_incomplete, "excluded rows with missing required fields");
        }

        let report = LoadReport {
            n_read,
            n_incomplete,
            n_loaded: rows.len(),
        };
        let table = FeatureTable::new(self.feature_columns.clone(), genres, rows)?;

        info!(
            n_tracks = report.n_loaded,
            n_features = table.n_features(),
            n_incomplete,
            "track table loaded"
        );

        Ok((table, report))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

fn is_missing(raw: &str) -> bool {
    MISSING_MARKERS
        .iter()
        .any(|marker| raw.eq_ignore_ascii_case(marker))
}
