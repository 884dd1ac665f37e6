//! Synthetic end-to-end run: clean → reduce → split → fit → compare.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use cadence_compare::{
    compare_models, evaluate, AccuracyAggregator, BoostedAdapter, ForestAdapter, ModelSuite,
    TreeAdapter,
};
use cadence_io::{FeatureTable, Genre, DEFAULT_FEATURES};
use cadence_prep::{DatasetSplitter, FeatureReducer, OutlierFilter, SplitConfig};
use cadence_trees::{GradientBoostingConfig, RandomForestConfig};

const GENRES: [&str; 6] = ["edm", "latin", "pop", "r&b", "rap", "rock"];

/// 1000 rows, 6 balanced genres, the 12 default features.
///
/// Only `danceability` and `energy` carry genre signal, and neither alone
/// separates all six genres; the rest are noise.
fn synthetic_table() -> FeatureTable {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let names: Vec<String> = DEFAULT_FEATURES.iter().map(|s| (*s).to_string()).collect();
    let mut genres = Vec::with_capacity(1000);
    let mut rows = Vec::with_capacity(1000);
    for i in 0..1000 {
        let g = i % GENRES.len();
        genres.push(Genre::new(GENRES[g]).unwrap());
        let row: Vec<f64> = names
            .iter()
            .map(|name| match name.as_str() {
                "danceability" => (g / 2) as f64 * 0.3 + rng.gen::<f64>() * 0.2,
                "energy" => (g % 2) as f64 * 0.3 + rng.gen::<f64>() * 0.2,
                "duration" => 150_000.0 + rng.gen::<f64>() * 100_000.0,
                "loudness" => -20.0 + rng.gen::<f64>() * 20.0,
                "tempo" => 80.0 + rng.gen::<f64>() * 80.0,
                _ => rng.gen::<f64>(),
            })
            .collect();
        rows.push(row);
    }
    FeatureTable::new(names, genres, rows).unwrap()
}

fn prepared_split() -> cadence_prep::Split {
    let table = synthetic_table();
    let (filtered, report) = OutlierFilter::default().apply(&table).unwrap();
    assert_eq!(report.n_removed + report.n_retained, 1000);
    let reduced = FeatureReducer::default().apply(&filtered).unwrap();
    assert_eq!(reduced.n_features(), 11);
    DatasetSplitter::new(SplitConfig::new(0.8).unwrap().with_seed(42))
        .split(&reduced)
        .unwrap()
}

#[test]
fn tree_beats_chance() {
    let split = prepared_split();
    assert_eq!(split.train.n_tracks(), 800);
    assert_eq!(split.test.n_tracks(), 200);

    let run = evaluate(&TreeAdapter::default(), &split).unwrap();
    let accuracy = AccuracyAggregator.summarize(&run.model, &run.records).unwrap();
    assert!(
        accuracy.overall > 1.0 / 6.0,
        "tree accuracy {} not above chance",
        accuracy.overall
    );
    assert_eq!(accuracy.per_class.len(), 6);
}

#[test]
fn all_models_find_the_signal_features() {
    let split = prepared_split();
    let suite = ModelSuite {
        tree: TreeAdapter::default(),
        forest: ForestAdapter::new(RandomForestConfig::new(30).unwrap().with_seed(42)),
        boosted: BoostedAdapter::new(GradientBoostingConfig::new(20).unwrap().with_seed(42)),
    };
    let comparison = compare_models(&suite, &split).unwrap();

    for m in comparison.accuracy.models() {
        assert!(m.overall > 0.5, "{} accuracy {}", m.model, m.overall);
        let weighted: f64 = m
            .per_class
            .iter()
            .map(|c| c.accuracy * c.support as f64)
            .sum::<f64>()
            / m.n_predictions as f64;
        assert!((weighted - m.overall).abs() < 1e-12);
    }

    for model in comparison.importance.models() {
        let top2: Vec<&str> = comparison
            .importance
            .ranking(model)
            .iter()
            .take(2)
            .map(|r| r.feature.as_str())
            .collect();
        assert!(top2.contains(&"danceability"), "{model}: top-2 {top2:?}");
        assert!(top2.contains(&"energy"), "{model}: top-2 {top2:?}");
    }
}
