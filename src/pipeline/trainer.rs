use crate::config::Config;
use crate::dataset::{load_dataset, Dataset, NoiseAugmenter, NoiseConfig};
use crate::error::{AppError, Result};
use crate::ml::{
    evaluate, Classifier, ModelMetadata, ModelMetrics, ModelType, PersistedModel,
    TrainedClassifier, TrainingConfig, TrainingDataset,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Fits the flood-risk classifier on noise-augmented features and persists it
pub struct Trainer {
    dataset_path: PathBuf,
    model_path: PathBuf,
    noise: NoiseConfig,
    training: TrainingConfig,
}

/// Outcome of one training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub model_id: uuid::Uuid,
    pub model_type: ModelType,
    pub n_estimators: usize,
    pub max_depth: usize,
    /// Seed actually used, so a run can be replayed
    pub seed: u64,
    pub n_training_samples: usize,
    pub n_test_samples: usize,
    pub metrics: ModelMetrics,
    /// Highest-weighted features, descending
    pub top_importances: Vec<(String, f64)>,
    pub model_path: PathBuf,
}

impl Trainer {
    pub fn new(config: &Config) -> Self {
        Self {
            dataset_path: config.paths.dataset.clone(),
            model_path: config.paths.model.clone(),
            noise: config.noise.clone(),
            training: config.training.clone(),
        }
    }

    /// Load the configured dataset, then train on it
    pub fn run(&self) -> Result<TrainingReport> {
        let dataset = load_dataset(&self.dataset_path)?;
        self.train_on(&dataset)
    }

    /// Augment, split, fit, evaluate and persist.
    ///
    /// The artifact is written only after every earlier step succeeded, so a
    /// failed run leaves the previous model in place.
    pub fn train_on(&self, dataset: &Dataset) -> Result<TrainingReport> {
        if dataset.is_empty() {
            return Err(AppError::Validation("Dataset has no rows".to_string()));
        }

        let started = Instant::now();
        let seed = self.training.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);

        let augmenter = NoiseAugmenter::new(&self.noise)?;
        let noisy = augmenter.augment(&dataset.features, &mut rng)?;

        // Perturbed features, clean labels
        let encoded = TrainingDataset::encode(noisy, dataset)?;
        let (train, test) = encoded.stratified_split(self.training.test_size, &mut rng)?;

        info!(
            algorithm = %self.training.algorithm,
            seed,
            train = train.n_samples(),
            test = test.n_samples(),
            classes = ?encoded.classes,
            "Training classifier"
        );

        let mut classifier = TrainedClassifier::from_config(&self.training, rng.gen());
        classifier.fit(&train)?;

        let predictions = classifier.predict(&test.features)?;
        let metrics = evaluate(&test.labels, &predictions, &test.classes);

        let metadata = ModelMetadata {
            model_id: uuid::Uuid::new_v4(),
            model_type: classifier.model_type(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: chrono::Utc::now(),
            n_training_samples: train.n_samples(),
            n_test_samples: test.n_samples(),
            n_features: train.n_features(),
            validation_metrics: Some(metrics.clone()),
            hyperparameters: classifier.hyperparameters(),
        };

        let n_estimators = classifier.n_estimators();
        let max_depth = classifier.max_depth();
        let model = PersistedModel::new(metadata, encoded.classes, classifier);

        let mut top_importances = model.ranked_importances().unwrap_or_default();
        top_importances.truncate(self.training.top_importances);

        model.save(&self.model_path)?;

        info!(
            model_id = %model.metadata.model_id,
            accuracy = metrics.accuracy,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Training complete"
        );

        Ok(TrainingReport {
            model_id: model.metadata.model_id,
            model_type: model.metadata.model_type,
            n_estimators,
            max_depth,
            seed,
            n_training_samples: model.metadata.n_training_samples,
            n_test_samples: model.metadata.n_test_samples,
            metrics,
            top_importances,
            model_path: self.model_path.clone(),
        })
    }
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(40);
        writeln!(f, "{rule}")?;
        writeln!(f, "TRAINING RESULT")?;
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "Algorithm: {} ({} estimator(s), max depth {})",
            self.model_type, self.n_estimators, self.max_depth
        )?;
        writeln!(
            f,
            "Samples: {} train / {} test (seed {})",
            self.n_training_samples, self.n_test_samples, self.seed
        )?;
        writeln!(f, "Accuracy: {:.2}%", self.metrics.accuracy * 100.0)?;
        writeln!(f)?;
        writeln!(f, "Per-class performance")?;
        write!(f, "{}", self.metrics.report())?;
        writeln!(f)?;
        writeln!(f, "Model saved to: {}", self.model_path.display())?;
        if !self.top_importances.is_empty() {
            writeln!(f)?;
            writeln!(f, "Top feature importances")?;
            for (name, weight) in &self.top_importances {
                writeln!(f, "  {:<20} {:.6}", name, weight)?;
            }
        }
        Ok(())
    }
}
