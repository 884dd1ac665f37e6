//! Classifier adapters and model comparison.
//!
//! Each model family implements [`ClassifierAdapter`]; [`compare_models`]
//! fits all three on one [`cadence_prep::Split`] in parallel and aggregates
//! accuracy per (model, class) and z-normalized feature importance.

mod accuracy;
mod adapter;
mod adapters;
mod confusion;
mod error;
mod importance;
mod records;
mod run;

pub use accuracy::{AccuracyAggregator, AccuracyTable, ClassAccuracy, ModelAccuracy};
pub use adapter::{ClassifierAdapter, FittedSchema};
pub use adapters::{BoostedAdapter, Fitted, ForestAdapter, TreeAdapter};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use error::{CompareError, ModelError};
pub use importance::{
    FeatureScore, ImportanceAggregator, ImportanceRecord, ImportanceTable, RawImportance,
};
pub use records::PredictionRecord;
pub use run::{compare_models, evaluate, Comparison, ModelRun, ModelSuite};
