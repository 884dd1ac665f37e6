use cadence_trees::TreeError;

/// Errors raised by a classifier adapter.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The training table cannot produce a model.
    #[error("{model}: training failed: {reason}")]
    Training {
        /// Adapter name.
        model: String,
        /// Description of the problem.
        reason: String,
    },

    /// The test table does not match the fitted schema.
    #[error("{model}: inference failed: {reason}")]
    Inference {
        /// Adapter name.
        model: String,
        /// Description of the problem.
        reason: String,
    },

    /// The fitting engine rejected its inputs.
    #[error("{model}: tree engine error: {source}")]
    Engine {
        /// Adapter name.
        model: String,
        /// Underlying engine error.
        #[source]
        source: TreeError,
    },
}

/// Errors from aggregating and running a comparison.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// Returned when a model produced no prediction records.
    #[error("no predictions recorded for model '{model}'")]
    NoPredictions {
        /// Model name.
        model: String,
    },

    /// Returned when truth and prediction vectors differ in length.
    #[error("{model}: {n_truth} true labels but {n_predicted} predictions")]
    LengthMismatch {
        /// Model name.
        model: String,
        /// Number of true labels.
        n_truth: usize,
        /// Number of predictions.
        n_predicted: usize,
    },

    /// Wraps an adapter failure.
    #[error(transparent)]
    Model(#[from] ModelError),
}
