use crate::error::{AppError, Result};
use crate::ml::forest::{ForestParams, RandomForest};
use crate::ml::models::{ModelType, TrainingConfig, TrainingDataset};
use crate::ml::tree::TreeParams;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters, SplitCriterion,
};
use std::collections::BTreeMap;

/// Trait for classifiers
pub trait Classifier: Send + Sync {
    /// Train the classifier
    fn fit(&mut self, dataset: &TrainingDataset) -> Result<()>;

    /// Predict class indices
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>>;

    /// Predict class probabilities (n_samples × n_classes)
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>>;

    /// Normalised per-feature importances, if the algorithm exposes them
    fn feature_importances(&self) -> Option<Vec<f64>>;

    /// Get model type
    fn model_type(&self) -> ModelType;

    /// Hyperparameters as reported to operators
    fn hyperparameters(&self) -> BTreeMap<String, String>;

    /// Number of fitted estimators (1 for single trees)
    fn n_estimators(&self) -> usize;

    /// Configured depth bound
    fn max_depth(&self) -> usize;

    /// Check if model is trained
    fn is_trained(&self) -> bool;
}

/// Random forest on the in-crate CART implementation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: ForestParams,
    forest: Option<RandomForest>,
}

impl RandomForestClassifier {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            forest: None,
        }
    }

    pub fn forest(&self) -> Option<&RandomForest> {
        self.forest.as_ref()
    }

    fn fitted(&self) -> Result<&RandomForest> {
        self.forest
            .as_ref()
            .ok_or_else(|| AppError::Prediction("Model not trained".to_string()))
    }
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, dataset: &TrainingDataset) -> Result<()> {
        let forest = RandomForest::fit(
            &dataset.features,
            &dataset.labels,
            dataset.n_classes(),
            self.params,
        )?;
        self.params = *forest.params();
        self.forest = Some(forest);
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        let forest = self.fitted()?;
        check_width(features, forest.n_features())?;
        Ok(forest.predict(features))
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        let forest = self.fitted()?;
        check_width(features, forest.n_features())?;
        Ok(forest.predict_proba(features))
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.forest.as_ref().map(RandomForest::feature_importances)
    }

    fn model_type(&self) -> ModelType {
        ModelType::RandomForest
    }

    fn hyperparameters(&self) -> BTreeMap<String, String> {
        let tree = &self.params.tree;
        let max_features = tree
            .max_features
            .map_or_else(|| "sqrt".to_string(), |k| k.to_string());
        [
            ("n_estimators", self.params.n_estimators.to_string()),
            ("max_depth", tree.max_depth.to_string()),
            ("min_samples_split", tree.min_samples_split.to_string()),
            ("min_samples_leaf", tree.min_samples_leaf.to_string()),
            ("max_features", max_features),
            ("bootstrap", self.params.bootstrap.to_string()),
            ("criterion", "gini".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn n_estimators(&self) -> usize {
        self.forest
            .as_ref()
            .map_or(self.params.n_estimators, RandomForest::n_trees)
    }

    fn max_depth(&self) -> usize {
        self.params.tree.max_depth
    }

    fn is_trained(&self) -> bool {
        self.forest.is_some()
    }
}

/// Decision Tree Classifier backed by smartcore
#[derive(Serialize, Deserialize)]
pub struct DecisionTreeClassifierWrapper {
    /// Trained model
    model: Option<DecisionTreeClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>>,

    /// Number of classes
    n_classes: usize,

    /// Maximum depth
    max_depth: usize,

    min_samples_split: usize,

    min_samples_leaf: usize,

    /// Expected feature width, set on fit
    n_features: usize,
}

impl DecisionTreeClassifierWrapper {
    pub fn new(max_depth: usize, min_samples_split: usize, min_samples_leaf: usize) -> Self {
        Self {
            model: None,
            n_classes: 0,
            max_depth,
            min_samples_split,
            min_samples_leaf,
            n_features: 0,
        }
    }

    fn ndarray_to_densematrix(arr: &Array2<f64>) -> DenseMatrix<f64> {
        let shape = arr.shape();
        let data: Vec<f64> = arr.iter().copied().collect();
        DenseMatrix::new(shape[0], shape[1], data, false)
    }

    fn fitted(&self) -> Result<&DecisionTreeClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>> {
        self.model
            .as_ref()
            .ok_or_else(|| AppError::Prediction("Model not trained".to_string()))
    }
}

impl Classifier for DecisionTreeClassifierWrapper {
    fn fit(&mut self, dataset: &TrainingDataset) -> Result<()> {
        let x = Self::ndarray_to_densematrix(&dataset.features);
        let y: Vec<i32> = dataset.labels.iter().map(|&label| label as i32).collect();

        let params = DecisionTreeClassifierParameters::default()
            .with_max_depth(self.max_depth.min(u16::MAX as usize) as u16)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_criterion(SplitCriterion::Gini);

        let model = DecisionTreeClassifier::fit(&x, &y, params)
            .map_err(|e| AppError::Training(format!("Failed to train decision tree: {}", e)))?;

        self.model = Some(model);
        self.n_classes = dataset.n_classes();
        self.n_features = dataset.n_features();
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        let model = self.fitted()?;
        check_width(features, self.n_features)?;

        let x = Self::ndarray_to_densematrix(features);
        let predictions = model
            .predict(&x)
            .map_err(|e| AppError::Prediction(format!("Prediction failed: {}", e)))?;

        Ok(predictions.iter().map(|&p| p.max(0) as usize).collect())
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        // smartcore 0.3 trees expose no leaf distribution: one-hot
        let predictions = self.predict(features)?;
        let mut proba = Array2::zeros((predictions.len(), self.n_classes));

        for (i, &pred) in predictions.iter().enumerate() {
            if pred < self.n_classes {
                proba[[i, pred]] = 1.0;
            }
        }

        Ok(proba)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }

    fn model_type(&self) -> ModelType {
        ModelType::DecisionTree
    }

    fn hyperparameters(&self) -> BTreeMap<String, String> {
        [
            ("max_depth", self.max_depth.to_string()),
            ("min_samples_split", self.min_samples_split.to_string()),
            ("min_samples_leaf", self.min_samples_leaf.to_string()),
            ("criterion", "gini".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn n_estimators(&self) -> usize {
        1
    }

    fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }
}

/// Serialisable union of the supported classifiers
#[derive(Serialize, Deserialize)]
pub enum TrainedClassifier {
    RandomForest(RandomForestClassifier),
    DecisionTree(DecisionTreeClassifierWrapper),
}

impl TrainedClassifier {
    /// Unfitted classifier for the configured algorithm
    pub fn from_config(config: &TrainingConfig, seed: u64) -> Self {
        match config.algorithm {
            ModelType::RandomForest => TrainedClassifier::RandomForest(RandomForestClassifier::new(
                ForestParams {
                    n_estimators: config.n_estimators,
                    tree: TreeParams {
                        max_depth: config.max_depth,
                        min_samples_split: config.min_samples_split,
                        min_samples_leaf: config.min_samples_leaf,
                        max_features: None,
                    },
                    bootstrap: true,
                    seed,
                },
            )),
            ModelType::DecisionTree => TrainedClassifier::DecisionTree(
                DecisionTreeClassifierWrapper::new(
                    config.max_depth,
                    config.min_samples_split,
                    config.min_samples_leaf,
                ),
            ),
        }
    }

    /// Fitted forest, when this is the forest backend
    pub fn forest(&self) -> Option<&RandomForest> {
        match self {
            TrainedClassifier::RandomForest(c) => c.forest(),
            TrainedClassifier::DecisionTree(_) => None,
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            TrainedClassifier::RandomForest(c) => c,
            TrainedClassifier::DecisionTree(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            TrainedClassifier::RandomForest(c) => c,
            TrainedClassifier::DecisionTree(c) => c,
        }
    }
}

impl Classifier for TrainedClassifier {
    fn fit(&mut self, dataset: &TrainingDataset) -> Result<()> {
        self.inner_mut().fit(dataset)
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        self.inner().predict(features)
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        self.inner().predict_proba(features)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.inner().feature_importances()
    }

    fn model_type(&self) -> ModelType {
        self.inner().model_type()
    }

    fn hyperparameters(&self) -> BTreeMap<String, String> {
        self.inner().hyperparameters()
    }

    fn n_estimators(&self) -> usize {
        self.inner().n_estimators()
    }

    fn max_depth(&self) -> usize {
        self.inner().max_depth()
    }

    fn is_trained(&self) -> bool {
        self.inner().is_trained()
    }
}

fn check_width(features: &Array2<f64>, expected: usize) -> Result<()> {
    if features.ncols() != expected {
        return Err(AppError::Prediction(format!(
            "Expected {} features, got {}",
            expected,
            features.ncols()
        )));
    }
    Ok(())
}
