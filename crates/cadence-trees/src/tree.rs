use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    error::validate_training_data,
    node::{Arena, ClassLeaf},
    split::{find_best_split, SplitCriterion},
    TreeError,
};

/// Configuration for a single CART classification tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `criterion`         | `Gini`                |
/// | `max_depth`         | `None` (unlimited)    |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (all features) |
/// | `seed`              | 42                    |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the maximum tree depth (root is depth 0). `None` means unlimited.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the number of features considered at each split. `None` means all.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Train a tree on a row-major dataset with zero-based class labels.
    ///
    /// The class count is `max(labels) + 1`.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`TreeError::EmptyDataset`] | `features` is empty |
    /// | [`TreeError::LabelCountMismatch`] | `labels.len() != features.len()` |
    /// | [`TreeError::ZeroFeatures`] | rows have zero feature columns |
    /// | [`TreeError::FeatureCountMismatch`] | rows have inconsistent lengths |
    /// | [`TreeError::NonFiniteValue`] | any value is NaN or infinite |
    /// | [`TreeError::InvalidMaxFeatures`] | `max_features` resolves outside [1, n_features] |
    /// | [`TreeError::InvalidMaxDepth`] | `max_depth` is `Some(0)` |
    /// | [`TreeError::InvalidMinSamplesSplit`] | `min_samples_split` < 2 |
    /// | [`TreeError::InvalidMinSamplesLeaf`] | `min_samples_leaf` < 1 |
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, TreeError> {
        let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
        self.fit_with_classes(features, labels, n_classes)
    }

    /// Train with an explicit class count, so leaf distributions share one
    /// width even when the highest class is absent (bootstrap samples).
    #[instrument(skip(self, features, labels), fields(n_samples = features.len()))]
    pub(crate) fn fit_with_classes(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<DecisionTree, TreeError> {
        let (n_samples, n_features) = validate_training_data(features, labels.len())?;
        self.validate()?;

        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(TreeError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }

        debug!(n_samples, n_features, n_classes, max_features, "fitting decision tree");

        let columns: Vec<Vec<f64>> = (0..n_features)
            .map(|j| features.iter().map(|row| row[j]).collect())
            .collect();

        let mut builder = TreeBuilder {
            columns: &columns,
            labels,
            n_classes,
            max_features,
            config: self,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            arena: Arena::new(),
        };
        let sample_indices: Vec<usize> = (0..n_samples).collect();
        builder.build(&sample_indices, 0);

        debug!(n_nodes = builder.arena.len(), "decision tree built");

        Ok(DecisionTree {
            arena: builder.arena,
            n_features,
            n_classes,
        })
    }

    pub(crate) fn validate(&self) -> Result<(), TreeError> {
        if self.max_depth == Some(0) {
            return Err(TreeError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(TreeError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(TreeError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }
        Ok(())
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursive arena builder state for one tree.
struct TreeBuilder<'a> {
    columns: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    max_features: usize,
    config: &'a DecisionTreeConfig,
    rng: ChaCha8Rng,
    arena: Arena<ClassLeaf>,
}

impl TreeBuilder<'_> {
    fn build(&mut self, sample_indices: &[usize], depth: usize) -> usize {
        let n_samples = sample_indices.len();
        let mut class_counts = vec![0usize; self.n_classes];
        for &si in sample_indices {
            class_counts[self.labels[si]] += 1;
        }
        let impurity = self.config.criterion.impurity(&class_counts, n_samples);

        let depth_exceeded = self.config.max_depth.is_some_and(|d| depth >= d);
        let stop = n_samples < self.config.min_samples_split || impurity == 0.0 || depth_exceeded;

        let split = if stop {
            None
        } else {
            find_best_split(
                self.columns,
                self.labels,
                sample_indices,
                self.n_classes,
                self.config.criterion,
                self.max_features,
                self.config.min_samples_leaf,
                &mut self.rng,
            )
        };

        let Some(split) = split else {
            return self.arena.push_leaf(ClassLeaf::from_counts(class_counts));
        };

        let node_idx = self.arena.open_split(split.feature, split.threshold, split.score);
        let left = self.build(&split.left_indices, depth + 1);
        let right = self.build(&split.right_indices, depth + 1);
        self.arena.link(node_idx, left, right);
        node_idx
    }
}

/// A fitted CART classification tree.
///
/// Leaves keep the genre counts of the training rows that reached them.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    arena: Arena<ClassLeaf>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Predict the class label for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, TreeError> {
        Ok(self.leaf_for(sample)?.majority())
    }

    /// Return the class probability distribution (length `n_classes`) for a sample.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<&[f64], TreeError> {
        Ok(self.leaf_for(sample)?.distribution())
    }

    /// Predict class labels for a batch of samples.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] if any sample has the wrong width.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, TreeError> {
        features.iter().map(|sample| self.predict(sample)).collect()
    }

    /// Mean Decrease in Impurity feature importances, normalized to sum to 1.0.
    ///
    /// All zeros when the tree is a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        self.arena.accumulate_gain(&mut totals);
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the total number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.arena.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.arena.leaves().count()
    }

    /// Return the number of features the tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the maximum depth; a single-leaf tree has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.arena.depth()
    }

    fn leaf_for(&self, sample: &[f64]) -> Result<&ClassLeaf, TreeError> {
        if sample.len() != self.n_features {
            return Err(TreeError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(self.arena.leaf_for(sample))
    }
}
