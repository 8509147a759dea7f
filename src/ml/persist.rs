use crate::error::{AppError, Result};
use crate::ml::classifier::{Classifier, TrainedClassifier};
use crate::ml::models::ModelMetadata;
use crate::models::{FeatureVector, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Bumped whenever the envelope layout changes
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Fitted classifier plus everything needed to use it safely
#[derive(Serialize, Deserialize)]
pub struct PersistedModel {
    pub format_version: u32,
    pub metadata: ModelMetadata,
    /// Column order the classifier was fitted on
    pub feature_names: Vec<String>,
    /// Class names indexed by the classifier's class indices
    pub classes: Vec<String>,
    pub classifier: TrainedClassifier,
}

/// Label and class distribution for one sample
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPrediction {
    pub label: String,
    /// Probability per class, aligned with `PersistedModel::classes`
    pub probabilities: Vec<f64>,
}

impl PersistedModel {
    pub fn new(metadata: ModelMetadata, classes: Vec<String>, classifier: TrainedClassifier) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            metadata,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            classes,
            classifier,
        }
    }

    /// Write atomically: serialize to a sibling temp file, then rename over `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        let written = self
            .write_to(&tmp_path)
            .and_then(|()| fs::rename(&tmp_path, path).map_err(AppError::from));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        info!(
            path = %path.display(),
            model_id = %self.metadata.model_id,
            "Model persisted"
        );
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::ModelNotFound(format!(
                "{} does not exist; run training first",
                path.display()
            )));
        }

        let reader = BufReader::new(File::open(path)?);
        let model: PersistedModel = bincode::deserialize_from(reader)?;

        if model.format_version != MODEL_FORMAT_VERSION {
            return Err(AppError::Serialization(format!(
                "Unsupported model format version {} (expected {})",
                model.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if model.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
            return Err(AppError::Validation(format!(
                "Model feature order {:?} does not match {:?}",
                model.feature_names, FEATURE_NAMES
            )));
        }
        if !model.classifier.is_trained() {
            return Err(AppError::Validation("Persisted classifier is not fitted".to_string()));
        }

        debug!(
            path = %path.display(),
            model_id = %model.metadata.model_id,
            classes = ?model.classes,
            "Model loaded"
        );
        Ok(model)
    }

    /// Most likely label and the full class distribution
    pub fn predict(&self, features: &FeatureVector) -> Result<LabelPrediction> {
        features.validate()?;
        let row = features.to_row();

        let index = self
            .classifier
            .predict(&row)?
            .first()
            .copied()
            .ok_or_else(|| AppError::Prediction("Classifier returned no prediction".to_string()))?;
        let probabilities = self.classifier.predict_proba(&row)?.row(0).to_vec();

        let label = self.classes.get(index).cloned().ok_or_else(|| {
            AppError::Prediction(format!("Class index {} outside model classes", index))
        })?;

        Ok(LabelPrediction {
            label,
            probabilities,
        })
    }

    /// Feature importances sorted by descending weight
    pub fn ranked_importances(&self) -> Option<Vec<(String, f64)>> {
        let importances = self.classifier.feature_importances()?;
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(importances)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Some(ranked)
    }
}
