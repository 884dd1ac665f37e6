//! Tree-based classifiers: CART decision trees, random forests, and
//! softmax gradient boosting.
//!
//! All models take row-major `&[Vec<f64>]` features with zero-based
//! `usize` class labels, train deterministically from a seed, and expose
//! per-feature importances.

mod boost;
mod config;
mod error;
mod forest;
mod importance;
mod node;
mod predict;
mod regression;
mod split;
mod tree;

pub use boost::{GradientBoostedTrees, GradientBoostingConfig};
pub use config::{MaxFeatures, RandomForestConfig};
pub use error::TreeError;
pub use forest::RandomForest;
pub use importance::rank_features;
pub use predict::ClassDistribution;
pub use split::SplitCriterion;
pub use tree::{DecisionTree, DecisionTreeConfig};
