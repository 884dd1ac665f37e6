//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::RandomForestConfig;
use crate::error::{validate_training_data, TreeError};
use crate::importance::aggregate_importances;
use crate::tree::DecisionTree;

/// A fitted Random Forest ensemble.
#[derive(Debug, Clone)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl RandomForest {
    /// Borrow the fitted trees.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Mean Decrease in Impurity, averaged over trees and normalized to sum to 1.0.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let per_tree: Vec<Vec<f64>> = self.trees.iter().map(DecisionTree::feature_importances).collect();
        aggregate_importances(&per_tree, self.n_features)
    }
}

/// Draw `draw_count` sample indices with replacement.
fn bootstrap_sample(n_samples: usize, draw_count: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..draw_count).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Train the Random Forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
) -> Result<RandomForest, TreeError> {
    let (n_samples, n_features) = validate_training_data(features, labels.len())?;

    let max_features_resolved = config.max_features.resolve(n_features)?;

    if config.bootstrap_fraction <= 0.0 || config.bootstrap_fraction > 1.0 {
        return Err(TreeError::InvalidFraction {
            name: "bootstrap_fraction",
            fraction: config.bootstrap_fraction,
        });
    }

    let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
    let draw_count = ((n_samples as f64) * config.bootstrap_fraction).ceil() as usize;

    let base_tree = config.tree.clone().with_max_features(Some(max_features_resolved));
    base_tree.validate()?;

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features = max_features_resolved,
        draw_count,
        "training random forest"
    );

    // Per-tree seeds come from one master stream so results do not depend on
    // the rayon schedule.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.gen()).collect();

    let trees = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bootstrap_indices = bootstrap_sample(n_samples, draw_count, &mut rng);

            let boot_features: Vec<Vec<f64>> = bootstrap_indices
                .iter()
                .map(|&i| features[i].clone())
                .collect();
            let boot_labels: Vec<usize> = bootstrap_indices.iter().map(|&i| labels[i]).collect();

            base_tree
                .clone()
                .with_seed(rng.gen())
                .fit_with_classes(&boot_features, &boot_labels, n_classes)
        })
        .collect::<Result<Vec<DecisionTree>, TreeError>>()?;

    debug!(n_trees_trained = trees.len(), "tree training complete");

    Ok(RandomForest {
        trees,
        n_features,
        n_classes,
    })
}

#[cfg(test)]
mod tests {
    use crate::config::{MaxFeatures, RandomForestConfig};
    use crate::TreeError;

    /// Generate a simple 3-class separable dataset.
    fn make_separable_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for (class, offset) in [0.0, 10.0, 20.0].into_iter().enumerate() {
            for i in 0..20 {
                features.push(vec![offset + i as f64 * 0.15, 0.5]);
                labels.push(class);
            }
        }
        (features, labels)
    }

    #[test]
    fn three_class_separable_accuracy() {
        let (features, labels) = make_separable_data();
        let forest = RandomForestConfig::new(50)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .with_seed(42)
            .fit(&features, &labels)
            .unwrap();

        let predictions = forest.predict_batch(&features).unwrap();
        let correct = predictions
            .iter()
            .zip(&labels)
            .filter(|&(&p, &l)| p == l)
            .count();
        let accuracy = correct as f64 / labels.len() as f64;
        assert!(accuracy > 0.9, "accuracy = {accuracy}");
        assert_eq!(forest.n_trees(), 50);
        assert_eq!(forest.n_classes(), 3);
    }

    #[test]
    fn feature_importances_sum_to_one() {
        let (features, labels) = make_separable_data();
        let forest = RandomForestConfig::new(20)
            .unwrap()
            .with_seed(42)
            .fit(&features, &labels)
            .unwrap();

        let importances = forest.feature_importances();
        let total: f64 = importances.iter().sum();
        assert!((total - 1.0).abs() < 1e-10, "total = {total}");
        // The constant column never splits.
        assert!(importances[1].abs() < f64::EPSILON);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, labels) = make_separable_data();
        let fit = || {
            RandomForestConfig::new(10)
                .unwrap()
                .with_seed(99)
                .fit(&features, &labels)
                .unwrap()
        };
        let preds1 = fit().predict_batch(&features).unwrap();
        let preds2 = fit().predict_batch(&features).unwrap();
        assert_eq!(preds1, preds2);
    }

    #[test]
    fn bootstrap_fraction_validated() {
        let (features, labels) = make_separable_data();
        let err = RandomForestConfig::new(5)
            .unwrap()
            .with_bootstrap_fraction(1.5)
            .fit(&features, &labels)
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidFraction { name: "bootstrap_fraction", .. }));
    }

    #[test]
    fn empty_dataset_error() {
        let config = RandomForestConfig::new(10).unwrap();
        let err = config.fit(&[], &[]).unwrap_err();
        assert!(matches!(err, TreeError::EmptyDataset));
    }
}
