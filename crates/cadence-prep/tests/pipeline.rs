//! Load → filter → reduce → split on a CSV fixture.

use std::io::Write;

use cadence_io::TrackReader;
use cadence_prep::{DatasetSplitter, FeatureReducer, OutlierFilter, SplitConfig};

fn write_fixture(rows: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "track_id,genre,duration,energy,loudness,tempo").unwrap();
    for i in 0..rows {
        let genre = ["rock", "pop", "rap"][i % 3];
        // Every 25th track is absurdly long.
        let duration = if i % 25 == 0 { 5_000_000.0 } else { 180_000.0 + (i % 40) as f64 * 1_000.0 };
        writeln!(
            file,
            "t{i},{genre},{duration},{},{},{}",
            (i % 10) as f64 / 10.0,
            -((i % 20) as f64),
            90.0 + (i % 50) as f64
        )
        .unwrap();
    }
    writeln!(file, "t_missing,rock,NA,0.5,-3,120").unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn full_preparation_chain() {
    let fixture = write_fixture(100);
    let features: Vec<String> = ["duration", "energy", "loudness", "tempo"]
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    let (table, load) = TrackReader::new(fixture.path())
        .with_feature_columns(features)
        .read()
        .unwrap();
    assert_eq!(load.n_incomplete, 1);
    assert_eq!(table.n_tracks(), 100);

    let (filtered, report) = OutlierFilter::default().apply(&table).unwrap();
    assert_eq!(report.n_removed, 4);
    assert_eq!(filtered.n_tracks(), 96);

    let reduced = FeatureReducer::default().apply(&filtered).unwrap();
    assert_eq!(reduced.feature_names(), ["duration", "energy", "tempo"]);

    let split = DatasetSplitter::new(SplitConfig::new(0.75).unwrap().with_seed(42))
        .split(&reduced)
        .unwrap();
    assert_eq!(split.train.n_tracks(), 72);
    assert_eq!(split.test.n_tracks(), 24);
    assert_eq!(split.train.feature_names(), reduced.feature_names());
}

#[test]
fn split_is_reproducible_across_runs() {
    let fixture = write_fixture(60);
    let (table, _) = TrackReader::new(fixture.path())
        .with_feature_columns(vec!["energy".into(), "tempo".into()])
        .read()
        .unwrap();
    let splitter = DatasetSplitter::default();
    let a = splitter.split(&table).unwrap();
    let b = splitter.split(&table).unwrap();
    assert_eq!(a.train_indices, b.train_indices);
    assert_eq!(a.test, b.test);
}
