//! Cleaning, splitting, and exploratory statistics over a [`cadence_io::FeatureTable`].
//!
//! Every operation is a pure function of its inputs: tables go in, new
//! tables and reports come out.

mod error;
mod explore;
mod outlier;
mod pca;
mod reduce;
mod scale;
mod split;
mod stats;

pub use error::PrepError;
pub use explore::{
    correlated_pairs, correlation_matrix, summarize, CorrelatedPair, CorrelationMatrix,
    FeatureSummary,
};
pub use outlier::{Fences, OutlierFilter, OutlierReport, DEFAULT_OUTLIER_COLUMN, DEFAULT_OUTLIER_K};
pub use pca::{covariance, variance_explained, PrincipalComponent, VarianceExplained};
pub use reduce::{FeatureReducer, DEFAULT_EXCLUDED};
pub use scale::standardize;
pub use split::{DatasetSplitter, Split, SplitConfig};
