//! File I/O, validation, and serialization for the cadence pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, FeatureTable, Genre, Track};
pub use error::IoError;
pub use reader::{LoadReport, TrackReader, DEFAULT_FEATURES, DEFAULT_GENRE_COLUMN};
pub use writer::{
    ClassAccuracyEntry, ComponentEntry, CorrelatedPairEntry, FeatureSummaryEntry,
    ImportanceEntry, ModelEntry, ResultWriter, RunSummary,
};
