use crate::dataset::Dataset;
use crate::error::{AppError, Result};
use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classifier training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Learning algorithm backing the classifier
    #[serde(default)]
    pub algorithm: ModelType,

    /// Held-out fraction (0.0 - 1.0, exclusive)
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    /// Number of trees in the ensemble
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    /// Maximum tree depth
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Minimum samples a node needs before it may split
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,

    /// Minimum samples on each side of a split
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,

    /// How many importances the training report lists
    #[serde(default = "default_top_importances")]
    pub top_importances: usize,

    /// Fixed seed for reproducible noise, split and bootstrap; random if unset
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            algorithm: ModelType::default(),
            test_size: default_test_size(),
            n_estimators: default_n_estimators(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            top_importances: default_top_importances(),
            seed: None,
        }
    }
}

fn default_test_size() -> f64 {
    0.2
}

fn default_n_estimators() -> usize {
    200
}

fn default_max_depth() -> usize {
    10
}

fn default_min_samples_split() -> usize {
    5
}

fn default_min_samples_leaf() -> usize {
    1
}

fn default_top_importances() -> usize {
    5
}

/// Model type enumeration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Bagged ensemble of Gini trees
    #[default]
    RandomForest,

    /// Single Gini tree
    DecisionTree,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::RandomForest => write!(f, "Random Forest"),
            ModelType::DecisionTree => write!(f, "Decision Tree"),
        }
    }
}

/// Label-encoded training data
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    /// Feature matrix (n_samples × n_features)
    pub features: Array2<f64>,

    /// Class index per row, into `classes`
    pub labels: Vec<usize>,

    /// Sorted class names
    pub classes: Vec<String>,
}

impl TrainingDataset {
    /// Pair (possibly perturbed) features with the clean dataset's labels
    pub fn encode(features: Array2<f64>, clean: &Dataset) -> Result<Self> {
        if features.nrows() != clean.n_samples() {
            return Err(AppError::Validation(format!(
                "Feature rows ({}) and labels ({}) differ in length",
                features.nrows(),
                clean.n_samples()
            )));
        }

        let classes = clean.classes();
        let labels = clean
            .labels
            .iter()
            .map(|label| {
                classes
                    .binary_search(label)
                    .map_err(|_| AppError::Internal(format!("Unindexed label {}", label)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            features,
            labels,
            classes,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Row counts per class index
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes()];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }

    /// Split into train/test partitions, stratified by label.
    ///
    /// Each class contributes `round(n_class * test_size)` rows to the test
    /// partition, bounded so that both partitions keep at least one row of
    /// every class.
    pub fn stratified_split<R: Rng + ?Sized>(
        &self,
        test_size: f64,
        rng: &mut R,
    ) -> Result<(TrainingDataset, TrainingDataset)> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(AppError::Configuration(format!(
                "test_size must be between 0 and 1, got {}",
                test_size
            )));
        }

        let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); self.n_classes()];
        for (row, &label) in self.labels.iter().enumerate() {
            by_class[label].push(row);
        }

        let mut train_rows = Vec::with_capacity(self.n_samples());
        let mut test_rows = Vec::new();
        for (class, mut rows) in by_class.into_iter().enumerate() {
            if rows.len() < 2 {
                return Err(AppError::Validation(format!(
                    "Class '{}' has {} member(s); stratified split needs at least 2",
                    self.classes[class],
                    rows.len()
                )));
            }
            rows.shuffle(rng);
            let n_test = ((rows.len() as f64 * test_size).round() as usize).clamp(1, rows.len() - 1);
            test_rows.extend_from_slice(&rows[..n_test]);
            train_rows.extend_from_slice(&rows[n_test..]);
        }
        train_rows.shuffle(rng);
        test_rows.shuffle(rng);

        Ok((self.subset(&train_rows), self.subset(&test_rows)))
    }

    fn subset(&self, rows: &[usize]) -> TrainingDataset {
        TrainingDataset {
            features: self.features.select(Axis(0), rows),
            labels: rows.iter().map(|&r| self.labels[r]).collect(),
            classes: self.classes.clone(),
        }
    }
}

/// Per-class evaluation metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Held-out evaluation: accuracy, per-class report and averages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Accuracy
    pub accuracy: f64,

    /// Unweighted mean over classes
    pub macro_avg: ClassMetrics,

    /// Support-weighted mean over classes
    pub weighted_avg: ClassMetrics,

    /// Rows: true class, columns: predicted class
    pub confusion_matrix: Array2<usize>,

    /// Per-class metrics keyed by class name
    pub per_class_metrics: BTreeMap<String, ClassMetrics>,
}

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Unique id of this training run
    pub model_id: uuid::Uuid,

    /// Model type
    pub model_type: ModelType,

    /// Crate version that produced the artifact
    pub version: String,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    /// Number of training samples
    pub n_training_samples: usize,

    /// Number of held-out samples
    pub n_test_samples: usize,

    /// Number of features
    pub n_features: usize,

    /// Validation metrics
    pub validation_metrics: Option<ModelMetrics>,

    /// Hyperparameters
    pub hyperparameters: BTreeMap<String, String>,
}
