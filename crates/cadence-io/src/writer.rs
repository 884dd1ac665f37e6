//! JSON result writer for comparison, exploration, and variance artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::ExperimentName;
use crate::IoError;

/// Row accounting and configuration of one comparison run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Rows kept by the loader.
    pub n_loaded: usize,
    /// Rows dropped by the loader for missing fields.
    pub n_incomplete: usize,
    /// Rows removed by the outlier filter.
    pub n_outliers: usize,
    /// Training rows.
    pub n_train: usize,
    /// Test rows.
    pub n_test: usize,
    /// Features the models were trained on.
    pub features: Vec<String>,
    /// Features excluded before training.
    pub excluded: Vec<String>,
    /// Train fraction used for the split.
    pub train_fraction: f64,
    /// Split and model seed.
    pub seed: u64,
}

/// Overall result for one model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelEntry {
    /// Model name.
    pub model: String,
    /// Overall test accuracy.
    pub accuracy: f64,
    /// Number of test predictions.
    pub n_predictions: usize,
    /// Class labels indexing the confusion matrix rows and columns.
    pub classes: Vec<String>,
    /// `confusion[true][predicted]` counts.
    pub confusion: Vec<Vec<usize>>,
}

/// Accuracy of one model on one true class.
#[derive(Debug, Clone, Serialize)]
pub struct ClassAccuracyEntry {
    /// Model name.
    pub model: String,
    /// True class label.
    pub class: String,
    /// Correct predictions within the class.
    pub correct: usize,
    /// Test rows in the class.
    pub support: usize,
    /// `correct / support`.
    pub accuracy: f64,
    /// Share of predictions of this class that were right.
    pub precision: f64,
    /// Share of this class's rows predicted correctly.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
}

/// Importance of one feature for one model.
#[derive(Debug, Clone, Serialize)]
pub struct ImportanceEntry {
    /// Model name.
    pub model: String,
    /// Feature name.
    pub feature: String,
    /// Score as reported by the model.
    pub raw: f64,
    /// Score after per-model z-normalization.
    pub normalized: f64,
    /// 1-based rank within the model.
    pub rank: usize,
}

/// Distribution summary of one feature.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureSummaryEntry {
    /// Feature name.
    pub feature: String,
    /// Minimum value.
    pub min: f64,
    /// First quartile.
    pub q1: f64,
    /// Median.
    pub median: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Third quartile.
    pub q3: f64,
    /// Maximum value.
    pub max: f64,
}

/// A pair of features with a strong linear correlation.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelatedPairEntry {
    /// First feature.
    pub a: String,
    /// Second feature.
    pub b: String,
    /// Pearson correlation coefficient.
    pub r: f64,
}

/// One principal component of the standardized feature table.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentEntry {
    /// 1-based component number, by decreasing eigenvalue.
    pub component: usize,
    /// Eigenvalue (variance along the component).
    pub eigenvalue: f64,
    /// Share of total variance.
    pub proportion: f64,
    /// Running share of total variance.
    pub cumulative: f64,
    /// Loadings, one per feature.
    pub loadings: Vec<f64>,
}

#[derive(Serialize)]
struct CompareArtifact<'a> {
    experiment: &'a str,
    run: &'a RunSummary,
    models: &'a [ModelEntry],
    class_accuracy: &'a [ClassAccuracyEntry],
    importances: &'a [ImportanceEntry],
}

#[derive(Serialize)]
struct ExploreArtifact<'a> {
    experiment: &'a str,
    n_tracks: usize,
    genre_counts: &'a [(String, usize)],
    summaries: &'a [FeatureSummaryEntry],
    feature_names: &'a [String],
    correlation: &'a [Vec<f64>],
    correlated_pairs: &'a [CorrelatedPairEntry],
}

#[derive(Serialize)]
struct VarianceArtifact<'a> {
    experiment: &'a str,
    feature_names: &'a [String],
    components: &'a [ComponentEntry],
}

/// Writes run artifacts to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_compare.json`,
/// `{experiment}_explore.json`, and `{experiment}_variance.json`.
///
/// Accepts plain entry structs so this crate has no dependency on the
/// model or statistics crates.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Return the path an artifact with the given suffix is written to.
    #[must_use]
    pub fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}.json", self.experiment.as_str()))
    }

    /// Write a model comparison to `{experiment}_compare.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_comparison(
        &self,
        run: &RunSummary,
        models: &[ModelEntry],
        class_accuracy: &[ClassAccuracyEntry],
        importances: &[ImportanceEntry],
    ) -> Result<PathBuf, IoError> {
        let artifact = CompareArtifact {
            experiment: self.experiment.as_str(),
            run,
            models,
            class_accuracy,
            importances,
        };
        self.write_json("compare", &artifact)
    }

    /// Write exploration statistics to `{experiment}_explore.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip_all)]
    pub fn write_exploration(
        &self,
        n_tracks: usize,
        genre_counts: &[(String, usize)],
        summaries: &[FeatureSummaryEntry],
        feature_names: &[String],
        correlation: &[Vec<f64>],
        correlated_pairs: &[CorrelatedPairEntry],
    ) -> Result<PathBuf, IoError> {
        let artifact = ExploreArtifact {
            experiment: self.experiment.as_str(),
            n_tracks,
            genre_counts,
            summaries,
            feature_names,
            correlation,
            correlated_pairs,
        };
        self.write_json("explore", &artifact)
    }

    /// Write the variance-explained analysis to `{experiment}_variance.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_variance(
        &self,
        feature_names: &[String],
        components: &[ComponentEntry],
    ) -> Result<PathBuf, IoError> {
        let artifact = VarianceArtifact {
            experiment: self.experiment.as_str(),
            feature_names,
            components,
        };
        self.write_json("variance", &artifact)
    }

    fn write_json<T: Serialize>(&self, suffix: &str, artifact: &T) -> Result<PathBuf, IoError> {
        let path = self.artifact_path(suffix);
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Encode {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        info!(path = %path.display(), "{suffix} result written");
        Ok(path)
    }
}
