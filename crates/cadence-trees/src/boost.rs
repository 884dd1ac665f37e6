//! Multiclass gradient boosting with softmax loss.
//!
//! Each round fits one [`RegressionTree`] per class to the softmax
//! gradients `p - y` and hessians `p (1 - p)`, then adds the shrunken
//! leaf weights to that class's raw score.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::error::{validate_training_data, TreeError};
use crate::predict::ClassDistribution;
use crate::regression::{RegressionParams, RegressionTree};

const MIN_HESSIAN: f64 = 1e-7;
const MIN_PRIOR: f64 = 1e-12;

/// Configuration for gradient-boosted classification trees.
///
/// # Defaults
///
/// | Parameter          | Default |
/// |--------------------|---------|
/// | `learning_rate`    | 0.1     |
/// | `max_depth`        | 3       |
/// | `min_samples_leaf` | 1       |
/// | `subsample`        | 1.0     |
/// | `lambda`           | 1.0     |
/// | `seed`             | 42      |
#[derive(Debug, Clone)]
pub struct GradientBoostingConfig {
    n_rounds: usize,
    learning_rate: f64,
    max_depth: usize,
    min_samples_leaf: usize,
    subsample: f64,
    lambda: f64,
    seed: u64,
}

impl GradientBoostingConfig {
    /// Create a new config with the given number of boosting rounds.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidRoundCount`] if `n_rounds` is zero.
    pub fn new(n_rounds: usize) -> Result<Self, TreeError> {
        if n_rounds == 0 {
            return Err(TreeError::InvalidRoundCount { n_rounds });
        }
        Ok(Self {
            n_rounds,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            lambda: 1.0,
            seed: 42,
        })
    }

    /// Set the shrinkage applied to every tree's contribution.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the maximum depth of each regression tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples in each leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the fraction of rows drawn (without replacement) per round.
    #[must_use]
    pub fn with_subsample(mut self, subsample: f64) -> Self {
        self.subsample = subsample;
        self
    }

    /// Set the L2 regularization on leaf weights.
    #[must_use]
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Set the random seed for row subsampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<(), TreeError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TreeError::InvalidLearningRate {
                learning_rate: self.learning_rate,
            });
        }
        if self.max_depth == 0 {
            return Err(TreeError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_leaf == 0 {
            return Err(TreeError::InvalidMinSamplesLeaf { min_samples_leaf: 0 });
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(TreeError::InvalidFraction {
                name: "subsample",
                fraction: self.subsample,
            });
        }
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return Err(TreeError::InvalidLambda { lambda: self.lambda });
        }
        Ok(())
    }

    /// Train a boosted ensemble on a row-major dataset with zero-based labels.
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
    /// | [`TreeError::InvalidLearningRate`] | learning rate not positive and finite |
    /// | [`TreeError::InvalidMaxDepth`] | `max_depth` is zero |
    /// | [`TreeError::InvalidMinSamplesLeaf`] | `min_samples_leaf` is zero |
    /// | [`TreeError::InvalidFraction`] | `subsample` not in (0.0, 1.0] |
    /// | [`TreeError::InvalidLambda`] | `lambda` negative or not finite |
    #[instrument(skip_all, fields(n_rounds = self.n_rounds, n_samples = features.len()))]
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
    ) -> Result<GradientBoostedTrees, TreeError> {
        let (n_samples, n_features) = validate_training_data(features, labels.len())?;
        self.validate()?;

        let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
        let draw_count = ((n_samples as f64) * self.subsample).ceil() as usize;

        info!(
            n_rounds = self.n_rounds,
            n_samples,
            n_features,
            n_classes,
            learning_rate = self.learning_rate,
            max_depth = self.max_depth,
            "training gradient boosting"
        );

        let columns: Vec<Vec<f64>> = (0..n_features)
            .map(|j| features.iter().map(|row| row[j]).collect())
            .collect();

        let mut class_counts = vec![0usize; n_classes];
        for &label in labels {
            class_counts[label] += 1;
        }
        let init_scores: Vec<f64> = class_counts
            .iter()
            .map(|&c| (c as f64 / n_samples as f64).max(MIN_PRIOR).ln())
            .collect();

        let params = RegressionParams {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            lambda: self.lambda,
        };

        // raw[i][k]: accumulated score of class k for sample i.
        let mut raw: Vec<Vec<f64>> = vec![init_scores.clone(); n_samples];
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut all_indices: Vec<usize> = (0..n_samples).collect();
        let mut rounds: Vec<Vec<RegressionTree>> = Vec::with_capacity(self.n_rounds);

        for round in 0..self.n_rounds {
            let sample_indices: Vec<usize> = if draw_count < n_samples {
                all_indices.shuffle(&mut rng);
                let mut drawn = all_indices[..draw_count].to_vec();
                drawn.sort_unstable();
                drawn
            } else {
                all_indices.clone()
            };

            let probs: Vec<Vec<f64>> = raw.iter().map(|scores| softmax(scores)).collect();

            let trees: Vec<RegressionTree> = (0..n_classes)
                .into_par_iter()
                .map(|k| {
                    let mut grad = vec![0.0; n_samples];
                    let mut hess = vec![0.0; n_samples];
                    for &i in &sample_indices {
                        let p = probs[i][k];
                        let y = if labels[i] == k { 1.0 } else { 0.0 };
                        grad[i] = p - y;
                        hess[i] = (p * (1.0 - p)).max(MIN_HESSIAN);
                    }
                    RegressionTree::fit(&columns, &grad, &hess, &sample_indices, params)
                })
                .collect();

            for (scores, row) in raw.iter_mut().zip(features) {
                for (score, tree) in scores.iter_mut().zip(&trees) {
                    *score += self.learning_rate * tree.predict(row);
                }
            }
            rounds.push(trees);

            if round % 10 == 0 {
                let loss = log_loss(&raw, labels);
                debug!(round, loss, "boosting round complete");
            }
        }

        Ok(GradientBoostedTrees {
            init_scores,
            rounds,
            learning_rate: self.learning_rate,
            n_features,
            n_classes,
        })
    }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn log_loss(raw: &[Vec<f64>], labels: &[usize]) -> f64 {
    let total: f64 = raw
        .iter()
        .zip(labels)
        .map(|(scores, &label)| -softmax(scores)[label].max(MIN_PRIOR).ln())
        .sum();
    total / raw.len() as f64
}

/// A fitted gradient-boosted multiclass ensemble.
#[derive(Debug, Clone)]
pub struct GradientBoostedTrees {
    init_scores: Vec<f64>,
    /// `rounds[r][k]`: the class-`k` tree of round `r`.
    rounds: Vec<Vec<RegressionTree>>,
    learning_rate: f64,
    n_features: usize,
    n_classes: usize,
}

impl GradientBoostedTrees {
    /// Return the raw (pre-softmax) class scores for one sample.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn decision_function(&self, sample: &[f64]) -> Result<Vec<f64>, TreeError> {
        if sample.len() != self.n_features {
            return Err(TreeError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut scores = self.init_scores.clone();
        for trees in &self.rounds {
            for (score, tree) in scores.iter_mut().zip(trees) {
                *score += self.learning_rate * tree.predict(sample);
            }
        }
        Ok(scores)
    }

    /// Return the softmax class distribution for one sample.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<ClassDistribution, TreeError> {
        Ok(ClassDistribution::new(softmax(&self.decision_function(sample)?)))
    }

    /// Predict the class label for one sample.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, TreeError> {
        Ok(self.predict_proba(sample)?.predicted_class())
    }

    /// Predict class labels for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] if any sample has the wrong width.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, TreeError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Total split gain per feature, summed over every tree.
    #[must_use]
    pub fn feature_gains(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for tree in self.rounds.iter().flatten() {
            tree.accumulate_gain(&mut totals);
        }
        totals
    }

    /// Split-gain importances normalized to sum to 1.0 (all zeros if no split).
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut gains = self.feature_gains();
        let sum: f64 = gains.iter().sum();
        if sum > 0.0 {
            gains.iter_mut().for_each(|g| *g /= sum);
        }
        gains
    }

    /// Return the number of boosting rounds.
    #[must_use]
    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// Return the number of features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}
