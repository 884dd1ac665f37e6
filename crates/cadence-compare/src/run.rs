//! Fit, predict, and aggregate all three model families on one split.

use cadence_prep::Split;
use cadence_trees::{DecisionTreeConfig, GradientBoostingConfig, RandomForestConfig, TreeError};
use tracing::{debug, info, instrument};

use crate::accuracy::{AccuracyAggregator, AccuracyTable};
use crate::adapter::ClassifierAdapter;
use crate::adapters::{BoostedAdapter, ForestAdapter, TreeAdapter};
use crate::error::CompareError;
use crate::importance::{ImportanceAggregator, ImportanceTable, RawImportance};
use crate::records::PredictionRecord;

/// Predictions and raw importance of one adapter on one split.
#[derive(Debug, Clone)]
pub struct ModelRun {
    /// Adapter name.
    pub model: String,
    /// One record per test row.
    pub records: Vec<PredictionRecord>,
    /// Importance as reported by the adapter.
    pub importance: RawImportance,
}

/// Everything a comparison produces.
#[derive(Debug, Clone)]
pub struct Comparison {
    /// Per-adapter outputs, in tree / forest / boosting order.
    pub runs: Vec<ModelRun>,
    /// Accuracy keyed by (model, class).
    pub accuracy: AccuracyTable,
    /// Z-normalized importances.
    pub importance: ImportanceTable,
}

/// The three adapters compared in one run.
#[derive(Debug, Clone)]
pub struct ModelSuite {
    /// Decision tree adapter.
    pub tree: TreeAdapter,
    /// Random forest adapter.
    pub forest: ForestAdapter,
    /// Gradient boosting adapter.
    pub boosted: BoostedAdapter,
}

impl ModelSuite {
    /// Default hyperparameters, every model pinned to `seed`.
    ///
    /// Forest: 100 trees, sqrt features. Boosting: 100 rounds, learning
    /// rate 0.1, depth 3.
    ///
    /// # Errors
    ///
    /// Propagates [`TreeError`] from config construction.
    pub fn with_seed(seed: u64) -> Result<Self, TreeError> {
        Ok(Self {
            tree: TreeAdapter::new(DecisionTreeConfig::new().with_seed(seed)),
            forest: ForestAdapter::new(RandomForestConfig::new(100)?.with_seed(seed)),
            boosted: BoostedAdapter::new(
                GradientBoostingConfig::new(100)?
                    .with_learning_rate(0.1)
                    .with_max_depth(3)
                    .with_seed(seed),
            ),
        })
    }
}

/// Fit `adapter` on the training side and predict the test side.
///
/// # Errors
///
/// Propagates adapter errors.
pub fn evaluate<A: ClassifierAdapter>(adapter: &A, split: &Split) -> Result<ModelRun, CompareError> {
    let model = adapter.fit(&split.train)?;
    let predicted = adapter.predict(&model, &split.test)?;
    let records = PredictionRecord::from_predictions(adapter.name(), split.test.genres(), &predicted)?;
    debug!(
        model = adapter.name(),
        n_correct = records.iter().filter(|r| r.is_correct()).count(),
        n_test = records.len(),
        "test predictions recorded"
    );
    Ok(ModelRun {
        model: adapter.name().to_string(),
        records,
        importance: adapter.feature_importance(&model),
    })
}

/// Run the three adapters in parallel on `split` and aggregate the results.
///
/// # Errors
///
/// The first adapter or aggregation error, in tree / forest / boosting order.
#[instrument(skip_all, fields(n_train = split.train.n_tracks(), n_test = split.test.n_tracks()))]
pub fn compare_models(suite: &ModelSuite, split: &Split) -> Result<Comparison, CompareError> {
    let (tree, (forest, boosted)) = rayon::join(
        || evaluate(&suite.tree, split),
        || {
            rayon::join(
                || evaluate(&suite.forest, split),
                || evaluate(&suite.boosted, split),
            )
        },
    );
    let runs = vec![tree?, forest?, boosted?];

    let records: Vec<PredictionRecord> = runs.iter().flat_map(|r| r.records.iter().cloned()).collect();
    let accuracy = AccuracyAggregator.aggregate(&records)?;

    let raw: Vec<(String, RawImportance)> = runs
        .iter()
        .map(|r| (r.model.clone(), r.importance.clone()))
        .collect();
    let importance = ImportanceAggregator.aggregate(&raw);

    for m in accuracy.models() {
        info!(model = %m.model, accuracy = m.overall, "comparison result");
    }
    Ok(Comparison {
        runs,
        accuracy,
        importance,
    })
}

#[cfg(test)]
mod tests {
    use cadence_io::{FeatureTable, Genre};
    use cadence_prep::{DatasetSplitter, SplitConfig};

    use super::*;

    fn split() -> Split {
        let genres: Vec<Genre> = (0..60).map(|i| Genre::new(["a", "b", "c"][i % 3]).unwrap()).collect();
        let rows: Vec<Vec<f64>> = (0..60)
            .map(|i| vec![(i % 3) as f64 * 2.0 + (i % 7) as f64 * 0.05, (i % 11) as f64])
            .collect();
        let table = FeatureTable::new(vec!["signal".into(), "noise".into()], genres, rows).unwrap();
        DatasetSplitter::new(SplitConfig::new(0.75).unwrap())
            .split(&table)
            .unwrap()
    }

    fn small_suite() -> ModelSuite {
        ModelSuite {
            tree: TreeAdapter::default(),
            forest: ForestAdapter::new(RandomForestConfig::new(10).unwrap()),
            boosted: BoostedAdapter::new(GradientBoostingConfig::new(10).unwrap()),
        }
    }

    #[test]
    fn compares_all_three_models() {
        let split = split();
        let comparison = compare_models(&small_suite(), &split).unwrap();
        let names: Vec<&str> = comparison.runs.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(names, vec![TreeAdapter::NAME, ForestAdapter::NAME, BoostedAdapter::NAME]);
        for run in &comparison.runs {
            assert_eq!(run.records.len(), split.test.n_tracks());
        }
        for m in comparison.accuracy.models() {
            assert!(m.overall > 0.9, "{} accuracy {}", m.model, m.overall);
        }
        assert_eq!(comparison.importance.models().len(), 3);
        for model in comparison.importance.models() {
            assert_eq!(comparison.importance.ranking(model)[0].feature, "signal");
        }
    }

    #[test]
    fn comparison_is_deterministic() {
        let split = split();
        let a = compare_models(&small_suite(), &split).unwrap();
        let b = compare_models(&small_suite(), &split).unwrap();
        assert_eq!(a.accuracy, b.accuracy);
        assert_eq!(a.importance, b.importance);
    }

    #[test]
    fn default_suite_builds() {
        let suite = ModelSuite::with_seed(7).unwrap();
        assert_eq!(suite.tree.name(), "decision_tree");
    }
}
