//! Accuracy regression tests for cadence-trees.
//!
//! Guard against algorithmic changes that degrade held-out accuracy of the
//! three model families on a deterministic synthetic dataset.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use cadence_trees::{
    rank_features, DecisionTreeConfig, GradientBoostingConfig, RandomForestConfig,
};

/// 300 samples, 10 features, 3 classes assigned round-robin.
///
/// Features 0-2 are informative (class * 3.0 + noise in [0, 0.5]);
/// features 3-9 are pure noise in [0, 0.5].
fn make_classification(seed: u64) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n_samples = 300;
    let n_features = 10;
    let n_classes = 3;

    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % n_classes;
        labels.push(class);
        let row: Vec<f64> = (0..n_features)
            .map(|f| {
                let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
                base + rng.gen::<f64>() * 0.5
            })
            .collect();
        features.push(row);
    }
    (features, labels)
}

fn accuracy(predictions: &[usize], labels: &[usize]) -> f64 {
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|&(&p, &l)| p == l)
        .count();
    correct as f64 / labels.len() as f64
}

#[test]
fn decision_tree_generalizes() {
    let (train_x, train_y) = make_classification(42);
    let (test_x, test_y) = make_classification(7);
    let tree = DecisionTreeConfig::new().fit(&train_x, &train_y).unwrap();
    let acc = accuracy(&tree.predict_batch(&test_x).unwrap(), &test_y);
    assert!(acc > 0.9, "held-out tree accuracy {acc} <= 0.9");
}

#[test]
fn random_forest_generalizes() {
    let (train_x, train_y) = make_classification(42);
    let (test_x, test_y) = make_classification(7);
    let forest = RandomForestConfig::new(100)
        .unwrap()
        .with_seed(42)
        .fit(&train_x, &train_y)
        .unwrap();
    let acc = accuracy(&forest.predict_batch(&test_x).unwrap(), &test_y);
    assert!(acc > 0.9, "held-out forest accuracy {acc} <= 0.9");
}

#[test]
fn gradient_boosting_generalizes() {
    let (train_x, train_y) = make_classification(42);
    let (test_x, test_y) = make_classification(7);
    let model = GradientBoostingConfig::new(50)
        .unwrap()
        .with_seed(42)
        .fit(&train_x, &train_y)
        .unwrap();
    let acc = accuracy(&model.predict_batch(&test_x).unwrap(), &test_y);
    assert!(acc > 0.9, "held-out boosting accuracy {acc} <= 0.9");
}

/// The top 3 features by importance must include at least 2 of f0, f1, f2.
#[test]
fn top_features_are_informative() {
    let (features, labels) = make_classification(42);
    let forest = RandomForestConfig::new(100)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels)
        .unwrap();
    let boosted = GradientBoostingConfig::new(20)
        .unwrap()
        .fit(&features, &labels)
        .unwrap();

    for importances in [forest.feature_importances(), boosted.feature_importances()] {
        let top3: Vec<usize> = rank_features(&importances).into_iter().take(3).collect();
        let informative = top3.iter().filter(|&&f| f < 3).count();
        assert!(
            informative >= 2,
            "only {informative}/3 of top-3 features are informative; top-3: {top3:?}"
        );
    }
}

#[test]
fn deterministic_predictions() {
    let (features, labels) = make_classification(42);
    let config = RandomForestConfig::new(30).unwrap().with_seed(42);
    let preds1 = config.fit(&features, &labels).unwrap().predict_batch(&features).unwrap();
    let preds2 = config.fit(&features, &labels).unwrap().predict_batch(&features).unwrap();
    assert_eq!(preds1, preds2, "predictions differ across runs with the same seed");
}
