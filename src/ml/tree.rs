//! CART decision tree with Gini impurity.
//!
//! Nodes live in a flat array; a split sends samples with
//! `x[feature] <= threshold` to the left child. Leaves carry the class
//! distribution of the training samples that reached them, so a single tree
//! already yields probabilities and a forest can average them.

use ndarray::ArrayView2;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Candidate features drawn per split; `None` considers all of them
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class probabilities, one entry per class
        distribution: Vec<f64>,
    },
}

impl TreeNode {
    pub const fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
    n_classes: usize,
    /// Impurity decrease per feature, normalised to sum to 1 (all zero for a stump)
    importances: Vec<f64>,
}

struct Builder<'a, R: Rng + ?Sized> {
    x: ArrayView2<'a, f64>,
    y: &'a [usize],
    n_classes: usize,
    params: TreeParams,
    rng: &'a mut R,
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
    n_root: f64,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    weighted_impurity: f64,
}

impl DecisionTree {
    /// Fit on the rows listed in `samples` (duplicates allowed, as produced by bootstrapping).
    pub fn fit<R: Rng + ?Sized>(
        x: ArrayView2<'_, f64>,
        y: &[usize],
        samples: Vec<usize>,
        n_classes: usize,
        params: TreeParams,
        rng: &mut R,
    ) -> Self {
        let n_features = x.ncols();
        let mut builder = Builder {
            x: x.reborrow(),
            y,
            n_classes,
            params,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
            n_root: samples.len().max(1) as f64,
        };
        builder.grow(samples, 0);

        let mut importances = builder.importances;
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        Self {
            nodes: builder.nodes,
            n_features,
            n_classes,
            importances,
        }
    }

    /// Class distribution of the leaf reached by `features`
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { distribution } => return distribution,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Most probable class; ties go to the lowest class index
    pub fn predict(&self, features: &[f64]) -> usize {
        argmax(self.predict_proba(features))
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Tree depth (longest root-to-leaf path)
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        self.node_depth(0)
    }

    fn node_depth(&self, idx: usize) -> usize {
        match &self.nodes[idx] {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => {
                1 + self.node_depth(*left).max(self.node_depth(*right))
            }
        }
    }
}

impl<R: Rng + ?Sized> Builder<'_, R> {
    /// Grow the subtree for `samples`; returns its node index
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&samples);
        let n = samples.len();
        let impurity = gini(&counts, n);

        let can_split = depth < self.params.max_depth
            && n >= self.params.min_samples_split
            && n >= 2 * self.params.min_samples_leaf
            && impurity > 0.0
            && self.x.ncols() > 0;

        let best = if can_split { self.best_split(&samples, &counts) } else { None };
        let Some(best) = best else {
            return self.push_leaf(&counts, n);
        };

        let decrease = impurity - best.weighted_impurity / n as f64;
        self.importances[best.feature] += (n as f64 / self.n_root) * decrease;

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&row| self.x[[row, best.feature]] <= best.threshold);

        let idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            distribution: Vec::new(),
        });
        let left = self.grow(left, depth + 1);
        let right = self.grow(right, depth + 1);
        self.nodes[idx] = TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        idx
    }

    fn push_leaf(&mut self, counts: &[usize], n: usize) -> usize {
        let total = n.max(1) as f64;
        let distribution = counts.iter().map(|&c| c as f64 / total).collect();
        self.nodes.push(TreeNode::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &row in samples {
            counts[self.y[row]] += 1;
        }
        counts
    }

    /// Exhaustive threshold sweep over `max_features` random features.
    ///
    /// Features that are constant within the node do not count towards the
    /// budget, so a node only becomes a leaf when no feature can separate it.
    fn best_split(&mut self, samples: &[usize], counts: &[usize]) -> Option<BestSplit> {
        let n_features = self.x.ncols();
        let k = self
            .params
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features);
        let order = index::sample(&mut *self.rng, n_features, n_features);

        let min_leaf = self.params.min_samples_leaf.max(1);
        let n = samples.len();
        let mut best: Option<BestSplit> = None;
        let mut column: Vec<(f64, usize)> = Vec::with_capacity(n);
        let mut visited = 0usize;

        for feature in order.iter() {
            if visited >= k {
                break;
            }
            column.clear();
            column.extend(samples.iter().map(|&row| (self.x[[row, feature]], self.y[row])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));
            if column[0].0 == column[n - 1].0 {
                continue;
            }
            visited += 1;

            let mut left = vec![0usize; self.n_classes];
            let mut right = counts.to_vec();

            for i in 0..n - 1 {
                let (value, class) = column[i];
                left[class] += 1;
                right[class] -= 1;

                let next = column[i + 1].0;
                if value == next {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let weighted =
                    n_left as f64 * gini(&left, n_left) + n_right as f64 * gini(&right, n_right);
                if best
                    .as_ref()
                    .map_or(true, |b| weighted < b.weighted_impurity)
                {
                    let mut threshold = value + (next - value) / 2.0;
                    // Midpoint can round up to `next` for adjacent floats
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        weighted_impurity: weighted,
                    });
                }
            }
        }
        best
    }
}

/// Gini impurity of a class histogram over `n` samples
pub fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Index of the largest value; ties go to the lowest index
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fit_all(x: &Array2<f64>, y: &[usize], n_classes: usize, params: TreeParams) -> DecisionTree {
        let samples: Vec<usize> = (0..y.len()).collect();
        DecisionTree::fit(x.view(), y, samples, n_classes, params, &mut StdRng::seed_from_u64(0))
    }

    #[test]
    fn test_single_threshold_learned() {
        let x = array![[0.1, 5.0], [0.2, 5.0], [0.3, 5.0], [0.7, 5.0], [0.8, 5.0], [0.9, 5.0]];
        let y = [0, 0, 0, 1, 1, 1];
        let tree = fit_all(&x, &y, 2, TreeParams::default());

        assert_eq!(tree.predict(&[0.25, 5.0]), 0);
        assert_eq!(tree.predict(&[0.75, 5.0]), 1);
        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        // Constant column contributes nothing
        assert_eq!(tree.feature_importances(), &[1.0, 0.0]);
    }

    #[test]
    fn test_boundary_goes_left() {
        let x = array![[0.0], [1.0]];
        let tree = fit_all(&x, &[0, 1], 2, TreeParams::default());
        assert_eq!(tree.predict(&[0.5]), 0);
        assert_eq!(tree.predict(&[0.5000001]), 1);
    }

    #[test]
    fn test_max_depth_respected() {
        let x = Array2::from_shape_fn((64, 1), |(i, _)| i as f64);
        let y: Vec<usize> = (0..64).map(|i| i % 2).collect();
        let params = TreeParams {
            max_depth: 3,
            ..TreeParams::default()
        };
        let tree = fit_all(&x, &y, 2, params);
        assert!(tree.depth() <= 3);
    }

    #[test]
    fn test_min_samples_split_makes_leaf() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let params = TreeParams {
            min_samples_split: 5,
            ..TreeParams::default()
        };
        let tree = fit_all(&x, &[0, 0, 1, 1], 2, params);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_proba(&[0.0]), &[0.5, 0.5]);
        assert!(tree.feature_importances().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_leaf_distribution_sums_to_one() {
        let x = array![[1.0], [1.0], [1.0], [2.0]];
        let tree = fit_all(&x, &[0, 1, 1, 2], 3, TreeParams::default());
        let proba = tree.predict_proba(&[1.0]);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((proba[1] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(tree.predict(&[1.0]), 1);
    }

    #[test]
    fn test_bootstrap_duplicates_counted() {
        let x = array![[0.0], [1.0]];
        // Row 1 drawn three times, row 0 once; no split allowed
        let params = TreeParams {
            max_depth: 0,
            ..TreeParams::default()
        };
        let tree = DecisionTree::fit(
            x.view(),
            &[0, 1],
            vec![0, 1, 1, 1],
            2,
            params,
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(tree.predict_proba(&[0.0]), &[0.25, 0.75]);
    }

    #[test]
    fn test_one_view_feeds_several_fits() {
        let x = array![[0.1], [0.2], [0.8], [0.9]];
        let y = [0, 0, 1, 1];
        let view = x.view();

        // The view outlives each per-tree rng borrow
        let trees: Vec<DecisionTree> = (0..3)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                DecisionTree::fit(view, &y, vec![0, 1, 2, 3], 2, TreeParams::default(), &mut rng)
            })
            .collect();

        assert!(trees.iter().all(|tree| tree.predict(&[0.15]) == 0));
        assert!(trees.iter().all(|tree| tree.predict(&[0.85]) == 1));
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[4, 0], 4), 0.0);
        assert!((gini(&[2, 2], 4) - 0.5).abs() < 1e-12);
        assert_eq!(gini(&[], 0), 0.0);
    }

    #[test]
    fn test_argmax_ties_lowest() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[]), 0);
    }
}
