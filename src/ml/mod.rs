/// Machine Learning module for flood-risk classification
///
/// This module provides:
/// - A CART decision tree and a bagged random forest built on it
/// - A pluggable `Classifier` trait with random-forest and smartcore backends
/// - Stratified train/test splitting and held-out evaluation
/// - Model persistence and a shared, reloadable model handle

pub mod classifier;
pub mod forest;
pub mod metrics;
pub mod models;
pub mod persist;
pub mod registry;
pub mod tree;

pub use classifier::{
    Classifier, DecisionTreeClassifierWrapper, RandomForestClassifier, TrainedClassifier,
};
pub use forest::{ForestParams, RandomForest};
pub use metrics::evaluate;
pub use models::{
    ClassMetrics, ModelMetadata, ModelMetrics, ModelType, TrainingConfig, TrainingDataset,
};
pub use persist::{LabelPrediction, PersistedModel, MODEL_FORMAT_VERSION};
pub use registry::ModelHandle;
pub use tree::{DecisionTree, TreeParams};
