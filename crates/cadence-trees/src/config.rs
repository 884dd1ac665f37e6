//! Random forest configuration: ensemble size, per-tree row and feature
//! sampling, and the growth limits every member tree shares.

use std::str::FromStr;

use crate::error::TreeError;
use crate::forest::RandomForest;
use crate::tree::DecisionTreeConfig;

/// How many feature columns each split may inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    /// `ceil(sqrt(n_features))`.
    Sqrt,
    /// `ceil(log2(n_features))`, at least 1.
    Log2,
    /// A fixed count.
    Fixed(usize),
    /// Every feature.
    All,
}

impl MaxFeatures {
    /// Resolve the strategy against a concrete feature count.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidMaxFeatures`] when the count falls outside
    /// `[1, n_features]`.
    pub fn resolve(self, n_features: usize) -> Result<usize, TreeError> {
        let width = n_features as f64;
        let resolved = match self {
            MaxFeatures::Sqrt => width.sqrt().ceil() as usize,
            MaxFeatures::Log2 => width.log2().ceil().max(1.0) as usize,
            MaxFeatures::Fixed(n) => n,
            MaxFeatures::All => n_features,
        };
        if !(1..=n_features).contains(&resolved) {
            return Err(TreeError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

/// Parses `sqrt`, `log2`, `all` (any case) or a positive count.
impl FromStr for MaxFeatures {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "log2" => Ok(MaxFeatures::Log2),
            "all" => Ok(MaxFeatures::All),
            other => other
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .map(MaxFeatures::Fixed)
                .ok_or_else(|| TreeError::UnknownMaxFeatures {
                    spec: s.to_string(),
                }),
        }
    }
}

/// Bagged ensemble of CART trees.
///
/// Each member tree is grown with the limits of [`RandomForestConfig::with_tree`]
/// on a bootstrap draw of `ceil(n * bootstrap_fraction)` rows, inspecting
/// [`MaxFeatures`] columns per split. Defaults: `Sqrt` features, a full
/// bootstrap, unlimited depth, seed 42.
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) bootstrap_fraction: f64,
    pub(crate) tree: DecisionTreeConfig,
    pub(crate) seed: u64,
}

impl RandomForestConfig {
    /// Create a config for an ensemble of `n_trees` trees.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, TreeError> {
        if n_trees == 0 {
            return Err(TreeError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            bootstrap_fraction: 1.0,
            tree: DecisionTreeConfig::new(),
            seed: 42,
        })
    }

    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    #[must_use]
    pub fn with_bootstrap_fraction(mut self, bootstrap_fraction: f64) -> Self {
        self.bootstrap_fraction = bootstrap_fraction;
        self
    }

    /// Growth limits shared by every member tree. The tree's own
    /// `max_features` and seed are replaced per tree.
    #[must_use]
    pub fn with_tree(mut self, tree: DecisionTreeConfig) -> Self {
        self.tree = tree;
        self
    }

    /// Master seed from which every member tree's seed is drawn.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Train the ensemble on row-major `features` with zero-based class labels.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`TreeError::EmptyDataset`] | `features` is empty |
    /// | [`TreeError::LabelCountMismatch`] | `labels.len() != features.len()` |
    /// | [`TreeError::ZeroFeatures`] / [`TreeError::FeatureCountMismatch`] | malformed rows |
    /// | [`TreeError::NonFiniteValue`] | any value is NaN or infinite |
    /// | [`TreeError::InvalidMaxFeatures`] | the strategy resolves outside [1, n_features] |
    /// | [`TreeError::InvalidFraction`] | `bootstrap_fraction` is not in (0.0, 1.0] |
    /// | tree limit variants | the shared tree config is invalid |
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<RandomForest, TreeError> {
        crate::forest::train(self, features, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_against_twelve_features() {
        assert_eq!(MaxFeatures::Sqrt.resolve(12).unwrap(), 4);
        assert_eq!(MaxFeatures::Log2.resolve(12).unwrap(), 4);
        assert_eq!(MaxFeatures::Log2.resolve(1).unwrap(), 1);
        assert_eq!(MaxFeatures::Fixed(3).resolve(12).unwrap(), 3);
        assert_eq!(MaxFeatures::All.resolve(12).unwrap(), 12);
    }

    #[test]
    fn resolve_out_of_range() {
        let err = MaxFeatures::Fixed(13).resolve(12).unwrap_err();
        assert!(matches!(
            err,
            TreeError::InvalidMaxFeatures { max_features: 13, n_features: 12 }
        ));
    }

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("sqrt".parse::<MaxFeatures>().unwrap(), MaxFeatures::Sqrt);
        assert_eq!("LOG2".parse::<MaxFeatures>().unwrap(), MaxFeatures::Log2);
        assert_eq!(" all ".parse::<MaxFeatures>().unwrap(), MaxFeatures::All);
        assert_eq!("5".parse::<MaxFeatures>().unwrap(), MaxFeatures::Fixed(5));
        for bad in ["0", "half", "-2", ""] {
            assert!(
                matches!(bad.parse::<MaxFeatures>(), Err(TreeError::UnknownMaxFeatures { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn zero_trees_rejected() {
        assert!(matches!(
            RandomForestConfig::new(0),
            Err(TreeError::InvalidTreeCount { n_trees: 0 })
        ));
    }

    #[test]
    fn shared_tree_limits_reach_every_member() {
        let features: Vec<Vec<f64>> = (0..40u32).map(|i| vec![f64::from(i), f64::from(i % 4)]).collect();
        let labels: Vec<usize> = (0..40).map(|i| i % 4).collect();
        let forest = RandomForestConfig::new(8)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .with_tree(DecisionTreeConfig::new().with_max_depth(Some(1)))
            .fit(&features, &labels)
            .unwrap();
        assert!(forest.trees().iter().all(|tree| tree.depth() <= 1));
    }

    #[test]
    fn invalid_shared_tree_limits_rejected() {
        let features = vec![vec![0.0], vec![1.0]];
        let err = RandomForestConfig::new(2)
            .unwrap()
            .with_tree(DecisionTreeConfig::new().with_min_samples_split(1))
            .fit(&features, &[0, 1])
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidMinSamplesSplit { min_samples_split: 1 }));
    }
}
