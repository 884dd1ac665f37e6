//! Tukey-style IQR outlier removal on a single feature column.

use cadence_io::FeatureTable;
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::PrepError;
use crate::stats::{quantile_sorted, sorted_copy};

/// Column filtered by default.
pub const DEFAULT_OUTLIER_COLUMN: &str = "duration";

/// Default IQR multiplier.
pub const DEFAULT_OUTLIER_K: f64 = 4.0;

/// Quartiles and fences computed for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fences {
    /// First quartile.
    pub q1: f64,
    /// Third quartile.
    pub q3: f64,
    /// `q3 - q1`.
    pub iqr: f64,
    /// `q1 - k * iqr`.
    pub lower: f64,
    /// `q3 + k * iqr`.
    pub upper: f64,
}

impl Fences {
    /// Return `true` when `value` lies strictly outside the fences.
    ///
    /// Always `false` when the IQR is zero.
    #[must_use]
    pub fn is_outlier(&self, value: f64) -> bool {
        self.iqr > 0.0 && (value < self.lower || value > self.upper)
    }
}

/// Summary of one outlier-filter pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    /// Filtered column.
    pub column: String,
    /// Multiplier used.
    pub k: f64,
    /// Quartiles and fences.
    pub fences: Fences,
    /// Rows removed.
    pub n_removed: usize,
    /// Rows kept.
    pub n_retained: usize,
}

/// Removes rows whose value in one column falls outside `[Q1 - k·IQR, Q3 + k·IQR]`.
#[derive(Debug, Clone)]
pub struct OutlierFilter {
    column: String,
    k: f64,
}

impl OutlierFilter {
    /// Create a filter for `column` with multiplier `k`.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::InvalidMultiplier`] when `k` is negative or not finite.
    pub fn new(column: impl Into<String>, k: f64) -> Result<Self, PrepError> {
        if !k.is_finite() || k < 0.0 {
            return Err(PrepError::InvalidMultiplier { k });
        }
        Ok(Self {
            column: column.into(),
            k,
        })
    }

    /// Return the filtered column name.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Return the IQR multiplier.
    #[must_use]
    pub fn k(&self) -> f64 {
        self.k
    }

    /// Compute quartiles and fences for `values`.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::TooFewRows`] when `values` is empty.
    pub fn fences(&self, values: &[f64]) -> Result<Fences, PrepError> {
        if values.is_empty() {
            return Err(PrepError::TooFewRows {
                operation: "outlier fences",
                required: 1,
                got: 0,
            });
        }
        let sorted = sorted_copy(values);
        let q1 = quantile_sorted(&sorted, 0.25);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        Ok(Fences {
            q1,
            q3,
            iqr,
            lower: q1 - self.k * iqr,
            upper: q3 + self.k * iqr,
        })
    }

    /// Return a copy of `table` without the outlier rows, and a report.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::Table`] | The column is not in the table |
    /// | [`PrepError::TooFewRows`] | The table is empty |
    #[instrument(skip_all, fields(column = %self.column, k = self.k, n_rows = table.n_tracks()))]
    pub fn apply(&self, table: &FeatureTable) -> Result<(FeatureTable, OutlierReport), PrepError> {
        let values = table.column(&self.column)?;
        let fences = self.fences(&values)?;
        let keep: Vec<bool> = values.iter().map(|&v| !fences.is_outlier(v)).collect();
        let filtered = table.retain_rows(&keep);

        let report = OutlierReport {
            column: self.column.clone(),
            k: self.k,
            fences,
            n_removed: table.n_tracks() - filtered.n_tracks(),
            n_retained: filtered.n_tracks(),
        };
        info!(
            n_removed = report.n_removed,
            n_retained = report.n_retained,
            lower = fences.lower,
            upper = fences.upper,
            "outliers removed"
        );
        Ok((filtered, report))
    }
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self {
            column: DEFAULT_OUTLIER_COLUMN.to_string(),
            k: DEFAULT_OUTLIER_K,
        }
    }
}
