use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use cadence_compare::{compare_models, BoostedAdapter, ForestAdapter, ModelSuite, TreeAdapter};
use cadence_io::{
    ComponentEntry, CorrelatedPairEntry, ExperimentName, FeatureSummaryEntry, FeatureTable,
    LoadReport, ResultWriter, RunSummary, TrackReader, DEFAULT_FEATURES, DEFAULT_GENRE_COLUMN,
};
use cadence_prep::{
    correlated_pairs, correlation_matrix, summarize, variance_explained, DatasetSplitter,
    FeatureReducer, OutlierFilter, OutlierReport, SplitConfig, DEFAULT_OUTLIER_COLUMN,
};
use cadence_trees::{
    DecisionTreeConfig, GradientBoostingConfig, MaxFeatures, RandomForestConfig, SplitCriterion,
};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Genre classification from audio features with tree-based models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for the split and every model
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Input file and column selection.
#[derive(Args, Debug, Clone)]
struct DataArgs {
    /// Path to the input CSV file
    #[arg(long)]
    data: PathBuf,

    /// Name of the genre label column
    #[arg(long, default_value = DEFAULT_GENRE_COLUMN)]
    genre_column: String,

    /// Comma-separated feature columns (defaults to the 12 audio features)
    #[arg(long, value_delimiter = ',')]
    features: Option<Vec<String>>,
}

/// Outlier removal and feature exclusion.
#[derive(Args, Debug, Clone)]
struct CleanArgs {
    /// Column screened for outliers
    #[arg(long, default_value = DEFAULT_OUTLIER_COLUMN)]
    outlier_column: String,

    /// IQR multiplier for the outlier fences
    #[arg(long, default_value_t = 4.0)]
    outlier_k: f64,

    /// Comma-separated features to drop before modelling [default: loudness, if loaded]
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// Keep every feature (ignores --exclude)
    #[arg(long)]
    keep_all: bool,
}

/// Model hyperparameters.
#[derive(Args, Debug, Clone)]
struct ModelArgs {
    /// Split criterion for the tree and forest: "gini" or "entropy"
    #[arg(long, default_value = "gini")]
    criterion: SplitCriterion,

    /// Minimum training rows in every leaf of every model
    #[arg(long, default_value_t = 1)]
    min_samples_leaf: usize,

    /// Maximum depth of the single decision tree (unlimited if not set)
    #[arg(long)]
    tree_max_depth: Option<usize>,

    /// Number of trees in the random forest
    #[arg(long, default_value_t = 100)]
    n_trees: usize,

    /// Maximum depth of each forest tree (unlimited if not set)
    #[arg(long)]
    forest_max_depth: Option<usize>,

    /// Features tried per forest split: "sqrt", "log2", "all", or a count
    #[arg(long, default_value = "sqrt")]
    max_features: MaxFeatures,

    /// Fraction of rows drawn (with replacement) for each forest tree
    #[arg(long, default_value_t = 1.0)]
    bootstrap_fraction: f64,

    /// Number of boosting rounds
    #[arg(long, default_value_t = 100)]
    n_rounds: usize,

    /// Boosting learning rate
    #[arg(long, default_value_t = 0.1)]
    learning_rate: f64,

    /// Depth of each boosted regression tree
    #[arg(long, default_value_t = 3)]
    boost_max_depth: usize,

    /// Row fraction sampled per boosting round
    #[arg(long, default_value_t = 1.0)]
    subsample: f64,

    /// L2 regularization on boosted leaf weights
    #[arg(long, default_value_t = 1.0)]
    lambda: f64,
}

/// Artifact destination.
#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// Experiment name for output files (must match [a-zA-Z0-9_-]+); no file is written without it
    #[arg(long)]
    experiment: Option<String>,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Train the three classifiers on one split and compare accuracy and importance
    Compare {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        clean: CleanArgs,

        /// Fraction of rows used for training
        #[arg(long, default_value_t = 0.8)]
        train_fraction: f64,

        #[command(flatten)]
        model: ModelArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Summarize feature distributions and correlations
    Explore {
        #[command(flatten)]
        data: DataArgs,

        /// Column screened for outliers before summarizing
        #[arg(long, default_value = DEFAULT_OUTLIER_COLUMN)]
        outlier_column: String,

        /// IQR multiplier; skip outlier removal if not set
        #[arg(long)]
        outlier_k: Option<f64>,

        /// Report feature pairs with |r| at or above this value
        #[arg(long, default_value_t = 0.7)]
        correlation_threshold: f64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Variance explained by principal components of the standardized features
    Variance {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        clean: CleanArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct CompareOutput {
    experiment: Option<String>,
    n_loaded: usize,
    n_incomplete: usize,
    n_outliers: usize,
    n_train: usize,
    n_test: usize,
    features: Vec<String>,
    models: Vec<ModelOutput>,
    artifact: Option<PathBuf>,
}

#[derive(Serialize)]
struct ModelOutput {
    model: String,
    accuracy: f64,
    top_features: Vec<String>,
}

#[derive(Serialize)]
struct ExploreOutput {
    experiment: Option<String>,
    n_tracks: usize,
    n_incomplete: usize,
    n_outliers: usize,
    genre_counts: Vec<(String, usize)>,
    correlated_pairs: Vec<CorrelatedPairEntry>,
    artifact: Option<PathBuf>,
}

#[derive(Serialize)]
struct VarianceOutput {
    experiment: Option<String>,
    n_tracks: usize,
    features: Vec<String>,
    proportions: Vec<f64>,
    components_for_90_percent: usize,
    artifact: Option<PathBuf>,
}

fn load(args: &DataArgs) -> Result<(FeatureTable, LoadReport)> {
    let features = args
        .features
        .clone()
        .unwrap_or_else(|| DEFAULT_FEATURES.iter().map(|s| (*s).to_string()).collect());
    let (table, report) = TrackReader::new(&args.data)
        .with_genre_column(args.genre_column.clone())
        .with_feature_columns(features)
        .read()
        .context("failed to read input CSV")?;
    info!(
        n_tracks = table.n_tracks(),
        n_incomplete = report.n_incomplete,
        "dataset loaded"
    );
    Ok((table, report))
}

fn clean(table: &FeatureTable, args: &CleanArgs) -> Result<(FeatureTable, OutlierReport, Vec<String>)> {
    let (filtered, outliers) = OutlierFilter::new(args.outlier_column.clone(), args.outlier_k)?
        .apply(table)
        .context("outlier removal failed")?;
    let reducer = match (&args.exclude, args.keep_all) {
        (_, true) => FeatureReducer::new(Vec::new()),
        (Some(names), false) => FeatureReducer::new(names.clone()),
        (None, false) => FeatureReducer::default(),
    };
    let excluded = reducer.removed(filtered.feature_names());
    let reduced = reducer
        .apply(&filtered)
        .context("feature reduction failed")?;
    Ok((reduced, outliers, excluded))
}

fn build_suite(args: &ModelArgs, seed: u64) -> Result<ModelSuite> {
    let limits = DecisionTreeConfig::new()
        .with_criterion(args.criterion)
        .with_min_samples_leaf(args.min_samples_leaf);
    let tree = limits
        .clone()
        .with_max_depth(args.tree_max_depth)
        .with_seed(seed);
    let forest = RandomForestConfig::new(args.n_trees)?
        .with_max_features(args.max_features)
        .with_bootstrap_fraction(args.bootstrap_fraction)
        .with_tree(limits.with_max_depth(args.forest_max_depth))
        .with_seed(seed);
    let boosted = GradientBoostingConfig::new(args.n_rounds)?
        .with_learning_rate(args.learning_rate)
        .with_max_depth(args.boost_max_depth)
        .with_min_samples_leaf(args.min_samples_leaf)
        .with_subsample(args.subsample)
        .with_lambda(args.lambda)
        .with_seed(seed);
    Ok(ModelSuite {
        tree: TreeAdapter::new(tree),
        forest: ForestAdapter::new(forest),
        boosted: BoostedAdapter::new(boosted),
    })
}

fn writer_for(output: &OutputArgs) -> Result<Option<ResultWriter>> {
    output
        .experiment
        .as_ref()
        .map(|name| -> Result<ResultWriter> {
            let experiment = ExperimentName::new(name.clone())?;
            Ok(ResultWriter::new(&output.output_dir, experiment)?)
        })
        .transpose()
}

fn genre_counts(table: &FeatureTable) -> Vec<(String, usize)> {
    table
        .distinct_genres()
        .into_iter()
        .map(|g| {
            let n = table.genres().iter().filter(|x| **x == g).count();
            (g.to_string(), n)
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Compare {
            data,
            clean: clean_args,
            train_fraction,
            model,
            output,
        } => {
            let writer = writer_for(&output)?;
            let suite = build_suite(&model, cli.seed)?;

            let (table, load_report) = load(&data)?;
            let (reduced, outliers, excluded) = clean(&table, &clean_args)?;

            let split = DatasetSplitter::new(SplitConfig::new(train_fraction)?.with_seed(cli.seed))
                .split(&reduced)
                .context("train/test split failed")?;

            let comparison = compare_models(&suite, &split).context("model comparison failed")?;

            let run = RunSummary {
                n_loaded: load_report.n_loaded,
                n_incomplete: load_report.n_incomplete,
                n_outliers: outliers.n_removed,
                n_train: split.train.n_tracks(),
                n_test: split.test.n_tracks(),
                features: reduced.feature_names().to_vec(),
                excluded,
                train_fraction,
                seed: cli.seed,
            };

            let artifact = writer
                .map(|w| {
                    w.write_comparison(
                        &run,
                        &comparison.accuracy.model_entries(),
                        &comparison.accuracy.class_entries(),
                        &comparison.importance.entries(),
                    )
                })
                .transpose()
                .context("failed to write comparison artifact")?;

            let models = comparison
                .accuracy
                .models()
                .iter()
                .map(|m| ModelOutput {
                    model: m.model.clone(),
                    accuracy: m.overall,
                    top_features: comparison
                        .importance
                        .ranking(&m.model)
                        .iter()
                        .take(3)
                        .map(|r| r.feature.clone())
                        .collect(),
                })
                .collect();

            let output = CompareOutput {
                experiment: output.experiment,
                n_loaded: run.n_loaded,
                n_incomplete: run.n_incomplete,
                n_outliers: run.n_outliers,
                n_train: run.n_train,
                n_test: run.n_test,
                features: run.features,
                models,
                artifact,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Explore {
            data,
            outlier_column,
            outlier_k,
            correlation_threshold,
            output,
        } => {
            let writer = writer_for(&output)?;
            let (table, load_report) = load(&data)?;

            let (table, n_outliers) = match outlier_k {
                Some(k) => {
                    let (filtered, report) = OutlierFilter::new(outlier_column, k)?
                        .apply(&table)
                        .context("outlier removal failed")?;
                    (filtered, report.n_removed)
                }
                None => (table, 0),
            };

            let summaries: Vec<FeatureSummaryEntry> = summarize(&table)
                .context("feature summary failed")?
                .into_iter()
                .map(|s| FeatureSummaryEntry {
                    feature: s.feature,
                    min: s.min,
                    q1: s.q1,
                    median: s.median,
                    mean: s.mean,
                    q3: s.q3,
                    max: s.max,
                })
                .collect();
            let matrix = correlation_matrix(&table).context("correlation failed")?;
            let pairs: Vec<CorrelatedPairEntry> = correlated_pairs(&matrix, correlation_threshold)
                .into_iter()
                .map(|p| CorrelatedPairEntry { a: p.a, b: p.b, r: p.r })
                .collect();
            let counts = genre_counts(&table);

            let artifact = writer
                .map(|w| {
                    w.write_exploration(
                        table.n_tracks(),
                        &counts,
                        &summaries,
                        matrix.feature_names(),
                        matrix.values(),
                        &pairs,
                    )
                })
                .transpose()
                .context("failed to write exploration artifact")?;

            let output = ExploreOutput {
                experiment: output.experiment,
                n_tracks: table.n_tracks(),
                n_incomplete: load_report.n_incomplete,
                n_outliers,
                genre_counts: counts,
                correlated_pairs: pairs,
                artifact,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Variance {
            data,
            clean: clean_args,
            output,
        } => {
            let writer = writer_for(&output)?;
            let (table, _) = load(&data)?;
            let (reduced, _, _) = clean(&table, &clean_args)?;

            let explained = variance_explained(&reduced).context("variance analysis failed")?;
            let components: Vec<ComponentEntry> = explained
                .components
                .iter()
                .map(|c| ComponentEntry {
                    component: c.component,
                    eigenvalue: c.eigenvalue,
                    proportion: c.proportion,
                    cumulative: c.cumulative,
                    loadings: c.loadings.clone(),
                })
                .collect();

            let artifact = writer
                .map(|w| w.write_variance(&explained.feature_names, &components))
                .transpose()
                .context("failed to write variance artifact")?;

            let output = VarianceOutput {
                experiment: output.experiment,
                n_tracks: reduced.n_tracks(),
                features: explained.feature_names.clone(),
                proportions: explained.components.iter().map(|c| c.proportion).collect(),
                components_for_90_percent: explained.components_for(0.9),
                artifact,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
