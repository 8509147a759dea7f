//! Random forest: bootstrap-aggregated CART trees.
//!
//! Each tree is grown on a bootstrap resample of the training rows and
//! considers `sqrt(n_features)` random candidate features per split. Class
//! probabilities are the mean of the per-tree leaf distributions and the
//! predicted class is their argmax.
//!
//! Trees are independent, so fitting fans out over rayon. Every tree draws
//! from its own RNG seeded from `(seed, tree index)`, which keeps a seeded fit
//! identical regardless of thread scheduling.

use crate::error::{AppError, Result};
use crate::ml::tree::{argmax, DecisionTree, TreeParams};
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub tree: TreeParams,
    /// Resample rows with replacement per tree
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams::default(),
            bootstrap: true,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
    params: ForestParams,
}

impl RandomForest {
    /// Fit `params.n_estimators` trees on `x` / `y` (class indices below `n_classes`).
    ///
    /// When `params.tree.max_features` is unset, `sqrt(n_features)` is used.
    pub fn fit(x: &Array2<f64>, y: &[usize], n_classes: usize, params: ForestParams) -> Result<Self> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(AppError::Training("cannot fit on an empty dataset".into()));
        }
        if y.len() != n_samples {
            return Err(AppError::Training(format!(
                "{} rows but {} labels",
                n_samples,
                y.len()
            )));
        }
        if params.n_estimators == 0 {
            return Err(AppError::Training("n_estimators must be at least 1".into()));
        }
        if let Some(&bad) = y.iter().find(|&&label| label >= n_classes) {
            return Err(AppError::Training(format!(
                "label index {} out of range for {} classes",
                bad, n_classes
            )));
        }

        let n_features = x.ncols();
        let mut tree_params = params.tree;
        if tree_params.max_features.is_none() {
            tree_params.max_features = Some(((n_features as f64).sqrt() as usize).max(1));
        }

        let view = x.view();
        let trees: Vec<DecisionTree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let samples: Vec<usize> = if params.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                DecisionTree::fit(view, y, samples, n_classes, tree_params, &mut rng)
            })
            .collect();

        Ok(Self {
            trees,
            n_features,
            n_classes,
            params: ForestParams {
                tree: tree_params,
                ..params
            },
        })
    }

    /// Mean leaf distribution across trees for one sample
    pub fn predict_proba_row(&self, features: ArrayView1<'_, f64>) -> Vec<f64> {
        let row: Vec<f64> = features.to_vec();
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(&row)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len().max(1) as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        proba
    }

    /// Class probabilities (n_samples × n_classes)
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.outer_iter().enumerate() {
            for (j, p) in self.predict_proba_row(row).into_iter().enumerate() {
                proba[[i, j]] = p;
            }
        }
        proba
    }

    /// Predicted class per row: argmax of the averaged distribution
    pub fn predict(&self, x: &Array2<f64>) -> Vec<usize> {
        x.outer_iter()
            .map(|row| argmax(&self.predict_proba_row(row)))
            .collect()
    }

    /// Mean of per-tree importances, normalised to sum to 1
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut importances = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in importances.iter_mut().zip(tree.feature_importances()) {
                *acc += v;
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        importances
    }

    /// Number of trees in the forest
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub const fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Average tree depth across the forest
    pub fn avg_depth(&self) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: usize = self.trees.iter().map(DecisionTree::depth).sum();
        total as f64 / self.trees.len() as f64
    }

    /// Total number of nodes across all trees
    pub fn total_nodes(&self) -> usize {
        self.trees.iter().map(DecisionTree::n_nodes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two informative columns (class = quadrant) plus two noise columns
    fn quadrant_data(n: usize) -> (Array2<f64>, Vec<usize>) {
        let mut rng = StdRng::seed_from_u64(99);
        let mut x = Array2::zeros((n, 4));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let a: f64 = rng.gen_range(0.0..1.0);
            let b: f64 = rng.gen_range(0.0..1.0);
            x[[i, 0]] = a;
            x[[i, 1]] = rng.gen_range(0.0..1.0);
            x[[i, 2]] = b;
            x[[i, 3]] = rng.gen_range(0.0..1.0);
            y.push(usize::from(a > 0.5) * 2 + usize::from(b > 0.5));
        }
        (x, y)
    }

    fn params(n_estimators: usize, seed: u64) -> ForestParams {
        ForestParams {
            n_estimators,
            seed,
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_fit_and_predict_quadrants() {
        let (x, y) = quadrant_data(400);
        let forest = RandomForest::fit(&x, &y, 4, params(30, 1)).unwrap();

        let predictions = forest.predict(&x);
        let correct = predictions.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(correct as f64 / y.len() as f64 > 0.9);
        assert_eq!(forest.n_trees(), 30);
        assert_eq!(forest.params().tree.max_features, Some(2));
    }

    #[test]
    fn test_probabilities_are_distributions() {
        let (x, y) = quadrant_data(200);
        let forest = RandomForest::fit(&x, &y, 4, params(10, 2)).unwrap();
        let proba = forest.predict_proba(&x);

        assert_eq!(proba.shape(), &[200, 4]);
        for row in proba.outer_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn test_predict_matches_proba_argmax() {
        let (x, y) = quadrant_data(150);
        let forest = RandomForest::fit(&x, &y, 4, params(15, 3)).unwrap();
        let proba = forest.predict_proba(&x);
        for (i, class) in forest.predict(&x).into_iter().enumerate() {
            let row = proba.row(i).to_vec();
            assert_eq!(class, argmax(&row));
        }
    }

    #[test]
    fn test_importances_favour_informative_columns() {
        let (x, y) = quadrant_data(400);
        let forest = RandomForest::fit(&x, &y, 4, params(40, 4)).unwrap();
        let importances = forest.feature_importances();

        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[1]);
        assert!(importances[2] > importances[3]);
    }

    #[test]
    fn test_seeded_fit_is_deterministic() {
        let (x, y) = quadrant_data(100);
        let a = RandomForest::fit(&x, &y, 4, params(8, 7)).unwrap();
        let b = RandomForest::fit(&x, &y, 4, params(8, 7)).unwrap();
        assert_eq!(a.predict_proba(&x), b.predict_proba(&x));
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let (x, y) = quadrant_data(10);
        assert!(RandomForest::fit(&x, &y[..5], 4, params(3, 0)).is_err());
        assert!(RandomForest::fit(&x, &y, 4, params(0, 0)).is_err());
        assert!(RandomForest::fit(&x, &y, 2, params(3, 0)).is_err());
        assert!(RandomForest::fit(&Array2::zeros((0, 4)), &[], 4, params(3, 0)).is_err());
    }
}
