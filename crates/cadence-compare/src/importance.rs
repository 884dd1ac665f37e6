//! Raw per-model importance scores and their per-model z-normalization.

use cadence_io::ImportanceEntry;
use serde::Serialize;
use tracing::{debug, warn};

/// One feature's raw score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureScore {
    /// Feature name.
    pub feature: String,
    /// Non-negative raw score.
    pub score: f64,
}

/// Importance scores tagged by the algorithm that produced them.
///
/// Scores from different variants are on different scales and are only
/// comparable after [`ImportanceAggregator::aggregate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "scores", rename_all = "snake_case")]
pub enum RawImportance {
    /// Single-tree mean decrease in impurity.
    ImpurityDecrease(Vec<FeatureScore>),
    /// Impurity decrease averaged over a forest.
    MeanImpurityDecrease(Vec<FeatureScore>),
    /// Total loss reduction from boosted splits.
    SplitGain(Vec<FeatureScore>),
}

impl RawImportance {
    /// Pair feature names with scores.
    #[must_use]
    pub fn zip(feature_names: &[String], scores: &[f64]) -> Vec<FeatureScore> {
        feature_names
            .iter()
            .zip(scores)
            .map(|(feature, &score)| FeatureScore {
                feature: feature.clone(),
                score,
            })
            .collect()
    }

    /// Borrow the scores regardless of variant.
    #[must_use]
    pub fn scores(&self) -> &[FeatureScore] {
        match self {
            RawImportance::ImpurityDecrease(s)
            | RawImportance::MeanImpurityDecrease(s)
            | RawImportance::SplitGain(s) => s,
        }
    }

    /// Short label for the variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RawImportance::ImpurityDecrease(_) => "impurity_decrease",
            RawImportance::MeanImpurityDecrease(_) => "mean_impurity_decrease",
            RawImportance::SplitGain(_) => "split_gain",
        }
    }

    fn score_of(&self, feature: &str) -> f64 {
        self.scores()
            .iter()
            .find(|s| s.feature == feature)
            .map_or(0.0, |s| s.score)
    }
}

/// One feature's importance for one model after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportanceRecord {
    /// Feature name.
    pub feature: String,
    /// Model name.
    pub model: String,
    /// Score as reported by the model (0 if the model omitted the feature).
    pub raw: f64,
    /// Per-model z-score.
    pub score: f64,
    /// 1-based rank within the model by `score`.
    pub rank: usize,
}

/// Normalized importances over the union of features of several models.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportanceTable {
    features: Vec<String>,
    models: Vec<String>,
    records: Vec<ImportanceRecord>,
}

impl ImportanceTable {
    /// Union of features, first-seen order.
    #[must_use]
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Models, input order.
    #[must_use]
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// All records, grouped by model in input order, features in union order.
    #[must_use]
    pub fn records(&self) -> &[ImportanceRecord] {
        &self.records
    }

    /// Normalized score of `feature` for `model`.
    #[must_use]
    pub fn score(&self, model: &str, feature: &str) -> Option<f64> {
        self.records
            .iter()
            .find(|r| r.model == model && r.feature == feature)
            .map(|r| r.score)
    }

    /// Records of one model, most important first.
    #[must_use]
    pub fn ranking(&self, model: &str) -> Vec<&ImportanceRecord> {
        let mut ranked: Vec<&ImportanceRecord> =
            self.records.iter().filter(|r| r.model == model).collect();
        ranked.sort_by_key(|r| r.rank);
        ranked
    }

    /// Flatten into writer entries.
    #[must_use]
    pub fn entries(&self) -> Vec<ImportanceEntry> {
        self.records
            .iter()
            .map(|r| ImportanceEntry {
                model: r.model.clone(),
                feature: r.feature.clone(),
                raw: r.raw,
                normalized: r.score,
                rank: r.rank,
            })
            .collect()
    }
}

/// Puts importance vectors from different algorithms on a common scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportanceAggregator;

impl ImportanceAggregator {
    /// Z-score each model's vector independently (population variance).
    ///
    /// Features a model did not report count as 0. A model whose vector has
    /// zero variance gets 0 for every feature.
    #[must_use]
    pub fn aggregate(&self, per_model: &[(String, RawImportance)]) -> ImportanceTable {
        let mut features: Vec<String> = Vec::new();
        for (_, raw) in per_model {
            for s in raw.scores() {
                if !features.contains(&s.feature) {
                    features.push(s.feature.clone());
                }
            }
        }

        let mut records = Vec::with_capacity(features.len() * per_model.len());
        for (model, raw) in per_model {
            let values: Vec<f64> = features.iter().map(|f| raw.score_of(f)).collect();
            let normalized = z_scores(&values);
            if normalized.iter().all(|&z| z == 0.0) && !values.is_empty() {
                warn!(model = %model, kind = raw.kind(), "importance vector has zero variance");
            }

            let mut order: Vec<usize> = (0..features.len()).collect();
            order.sort_by(|&a, &b| normalized[b].total_cmp(&normalized[a]));
            let mut ranks = vec![0usize; features.len()];
            for (position, &idx) in order.iter().enumerate() {
                ranks[idx] = position + 1;
            }

            for (i, feature) in features.iter().enumerate() {
                records.push(ImportanceRecord {
                    feature: feature.clone(),
                    model: model.clone(),
                    raw: values[i],
                    score: normalized[i],
                    rank: ranks[i],
                });
            }
            debug!(model = %model, n_features = features.len(), "importance normalized");
        }

        ImportanceTable {
            features,
            models: per_model.iter().map(|(m, _)| m.clone()).collect(),
            records,
        }
    }
}

fn z_scores(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if var <= f64::EPSILON * f64::EPSILON {
        return vec![0.0; values.len()];
    }
    let sd = var.sqrt();
    values.iter().map(|v| (v - mean) / sd).collect()
}
