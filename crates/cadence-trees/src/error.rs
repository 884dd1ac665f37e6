/// Errors from tree, forest, and boosting operations.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when the number of boosting rounds is zero.
    #[error("n_rounds must be at least 1, got {n_rounds}")]
    InvalidRoundCount {
        /// The invalid n_rounds value provided.
        n_rounds: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid min_samples_leaf value provided.
        min_samples_leaf: usize,
    },

    /// Returned when max_features resolves to 0 or exceeds n_features.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved max_features value.
        max_features: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when a max-features setting is not `sqrt`, `log2`, `all` or a positive count.
    #[error("unknown max_features '{spec}' (expected sqrt, log2, all, or a positive count)")]
    UnknownMaxFeatures {
        /// The text that failed to parse.
        spec: String,
    },

    /// Returned when a split criterion name is not `gini` or `entropy`.
    #[error("unknown split criterion '{spec}' (expected gini or entropy)")]
    UnknownCriterion {
        /// The text that failed to parse.
        spec: String,
    },

    /// Returned when a sampling fraction is not in (0.0, 1.0].
    #[error("{name} must be in (0.0, 1.0], got {fraction}")]
    InvalidFraction {
        /// Which parameter was out of range.
        name: &'static str,
        /// The invalid value provided.
        fraction: f64,
    },

    /// Returned when the boosting learning rate is not positive and finite.
    #[error("learning_rate must be positive and finite, got {learning_rate}")]
    InvalidLearningRate {
        /// The invalid learning rate.
        learning_rate: f64,
    },

    /// Returned when the L2 leaf regularization is negative or not finite.
    #[error("lambda must be non-negative and finite, got {lambda}")]
    InvalidLambda {
        /// The invalid regularization value.
        lambda: f64,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when the label vector length differs from the sample count.
    #[error("got {n_labels} labels for {n_samples} samples")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },
}

/// Validate a row-major training matrix and its labels.
///
/// Returns `(n_samples, n_features)` on success.
pub(crate) fn validate_training_data(
    features: &[Vec<f64>],
    n_labels: usize,
) -> Result<(usize, usize), TreeError> {
    if features.is_empty() {
        return Err(TreeError::EmptyDataset);
    }
    let n_samples = features.len();
    if n_labels != n_samples {
        return Err(TreeError::LabelCountMismatch {
            n_samples,
            n_labels,
        });
    }
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(TreeError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(TreeError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(TreeError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok((n_samples, n_features))
}
