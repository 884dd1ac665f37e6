//! Seeded train/test partition.

use cadence_io::FeatureTable;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument};

use crate::error::PrepError;

/// Validated split parameters.
///
/// # Defaults
///
/// | Parameter        | Default |
/// |------------------|---------|
/// | `train_fraction` | 0.8     |
/// | `seed`           | 42      |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    train_fraction: f64,
    seed: u64,
}

impl SplitConfig {
    /// Create a config with the given training fraction.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::InvalidConfiguration`] unless `0 < train_fraction < 1`.
    pub fn new(train_fraction: f64) -> Result<Self, PrepError> {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(PrepError::InvalidConfiguration {
                reason: format!("train fraction must be in (0, 1), got {train_fraction}"),
            });
        }
        Ok(Self {
            train_fraction,
            seed: 42,
        })
    }

    /// Set the shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the training fraction.
    #[must_use]
    pub fn train_fraction(&self) -> f64 {
        self.train_fraction
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            seed: 42,
        }
    }
}

/// A disjoint train/test partition of one table.
#[derive(Debug, Clone)]
pub struct Split {
    /// Training row positions, ascending.
    pub train_indices: Vec<usize>,
    /// Test row positions, ascending.
    pub test_indices: Vec<usize>,
    /// Training rows.
    pub train: FeatureTable,
    /// Test rows.
    pub test: FeatureTable,
}

/// Deterministic train/test splitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetSplitter {
    config: SplitConfig,
}

impl DatasetSplitter {
    /// Create a splitter from a validated config.
    #[must_use]
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// Return the config.
    #[must_use]
    pub fn config(&self) -> SplitConfig {
        self.config
    }

    /// Compute train and test row positions for a table of `n_rows`.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::InvalidConfiguration`] if `n_rows < 2` or either
    /// side would be empty.
    pub fn indices(&self, n_rows: usize) -> Result<(Vec<usize>, Vec<usize>), PrepError> {
        if n_rows < 2 {
            return Err(PrepError::InvalidConfiguration {
                reason: format!("need at least 2 rows to split, got {n_rows}"),
            });
        }
        let n_train = (n_rows as f64 * self.config.train_fraction).floor() as usize;
        if n_train == 0 || n_train == n_rows {
            return Err(PrepError::InvalidConfiguration {
                reason: format!(
                    "train fraction {} on {n_rows} rows leaves an empty side",
                    self.config.train_fraction
                ),
            });
        }

        let mut order: Vec<usize> = (0..n_rows).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        order.shuffle(&mut rng);

        let mut train = order[..n_train].to_vec();
        let mut test = order[n_train..].to_vec();
        train.sort_unstable();
        test.sort_unstable();
        Ok((train, test))
    }

    /// Partition `table` into training and test tables.
    ///
    /// # Errors
    ///
    /// Same as [`DatasetSplitter::indices`].
    #[instrument(skip_all, fields(n_rows = table.n_tracks(), train_fraction = self.config.train_fraction))]
    pub fn split(&self, table: &FeatureTable) -> Result<Split, PrepError> {
        let (train_indices, test_indices) = self.indices(table.n_tracks())?;
        let train = table.select_rows(&train_indices);
        let test = table.select_rows(&test_indices);
        info!(n_train = train.n_tracks(), n_test = test.n_tracks(), "dataset split");
        Ok(Split {
            train_indices,
            test_indices,
            train,
            test,
        })
    }
}
