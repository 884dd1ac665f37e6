use cadence_io::IoError;

/// Errors from cleaning, splitting, and exploratory statistics.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// Returned when the outlier multiplier is negative or not finite.
    #[error("outlier multiplier must be finite and >= 0, got {k}")]
    InvalidMultiplier {
        /// The invalid multiplier.
        k: f64,
    },

    /// Returned when an exclusion names a feature the table does not have.
    #[error("cannot exclude unknown feature '{name}'")]
    UnknownExclusion {
        /// The unknown feature name.
        name: String,
    },

    /// Returned when the exclusion set removes every feature.
    #[error("excluding {n_excluded} feature(s) leaves no features")]
    NoFeaturesLeft {
        /// Number of features excluded.
        n_excluded: usize,
    },

    /// Returned when split parameters cannot produce two non-empty sides.
    #[error("invalid split configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a column has zero variance and cannot be standardized.
    #[error("feature '{name}' is constant and cannot be standardized")]
    ConstantColumn {
        /// The constant feature's name.
        name: String,
    },

    /// Returned when a statistic needs more rows than the table holds.
    #[error("{operation} needs at least {required} rows, got {got}")]
    TooFewRows {
        /// The statistic being computed.
        operation: &'static str,
        /// Minimum rows required.
        required: usize,
        /// Rows available.
        got: usize,
    },

    /// Wraps a table error (unknown column, shape mismatch).
    #[error("table error: {0}")]
    Table(#[from] IoError),
}
