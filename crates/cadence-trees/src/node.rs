//! Node arena shared by the classification and gradient trees.
//!
//! A fitted tree is a flat `Vec` of nodes with the root at index 0. The leaf
//! payload is generic: CART leaves keep the genre counts of the rows that
//! reached them, gradient leaves keep one additive weight.

/// One node of a tree arena.
#[derive(Debug, Clone)]
pub(crate) enum Node<L> {
    /// Rows with `sample[feature] <= threshold` descend to `left`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Criterion-specific gain credited to `feature`.
        gain: f64,
    },
    Leaf(L),
}

/// Leaf of a classification tree.
#[derive(Debug, Clone)]
pub(crate) struct ClassLeaf {
    counts: Vec<usize>,
    distribution: Vec<f64>,
}

impl ClassLeaf {
    /// Build a leaf from per-class row counts. An empty leaf has an all-zero
    /// distribution.
    pub(crate) fn from_counts(counts: Vec<usize>) -> Self {
        let total = counts.iter().sum::<usize>() as f64;
        let distribution = counts
            .iter()
            .map(|&c| if total > 0.0 { c as f64 / total } else { 0.0 })
            .collect();
        Self {
            counts,
            distribution,
        }
    }

    /// Majority class. Ties go to the lowest class index.
    pub(crate) fn majority(&self) -> usize {
        self.counts
            .iter()
            .enumerate()
            .fold((0, 0), |best, (idx, &c)| if c > best.1 { (idx, c) } else { best })
            .0
    }

    pub(crate) fn distribution(&self) -> &[f64] {
        &self.distribution
    }

    #[cfg(test)]
    pub(crate) fn n_samples(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Flat node storage built in pre-order by a recursive grower.
#[derive(Debug, Clone)]
pub(crate) struct Arena<L> {
    nodes: Vec<Node<L>>,
}

impl<L> Arena<L> {
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub(crate) fn push_leaf(&mut self, leaf: L) -> usize {
        self.nodes.push(Node::Leaf(leaf));
        self.nodes.len() - 1
    }

    /// Push a split whose children are not grown yet; finish it with [`Arena::link`].
    pub(crate) fn open_split(&mut self, feature: usize, threshold: f64, gain: f64) -> usize {
        self.nodes.push(Node::Split {
            feature,
            threshold,
            left: usize::MAX,
            right: usize::MAX,
            gain,
        });
        self.nodes.len() - 1
    }

    pub(crate) fn link(&mut self, idx: usize, left_child: usize, right_child: usize) {
        if let Node::Split { left, right, .. } = &mut self.nodes[idx] {
            *left = left_child;
            *right = right_child;
        }
    }

    /// Walk from the root to the leaf that `sample` falls into.
    ///
    /// The caller checks the sample width.
    pub(crate) fn leaf_for(&self, sample: &[f64]) -> &L {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf(leaf) => return leaf,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => idx = if sample[*feature] <= *threshold { *left } else { *right },
            }
        }
    }

    /// Add each split's gain to `totals[feature]`.
    pub(crate) fn accumulate_gain(&self, totals: &mut [f64]) {
        for node in &self.nodes {
            if let Node::Split { feature, gain, .. } = node {
                totals[*feature] += gain;
            }
        }
    }

    pub(crate) fn leaves(&self) -> impl Iterator<Item = &L> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Leaf(leaf) => Some(leaf),
            Node::Split { .. } => None,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Longest root-to-leaf path; a single leaf has depth 0.
    pub(crate) fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf(_) => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((*left, d + 1));
                    stack.push((*right, d + 1));
                }
            }
        }
        max_depth
    }
}
