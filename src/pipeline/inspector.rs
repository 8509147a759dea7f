use crate::error::Result;
use crate::ml::{Classifier, ModelType, PersistedModel};
use crate::models::{FeatureVector, SAMPLE_FEATURES};
use std::collections::BTreeMap;
use std::fmt;

/// Read-only summary of a persisted model plus a sample prediction
#[derive(Debug, Clone)]
pub struct InspectionReport {
    pub model_id: uuid::Uuid,
    pub model_type: ModelType,
    pub n_estimators: usize,
    pub max_depth: usize,
    pub hyperparameters: BTreeMap<String, String>,
    /// Average fitted depth and node count; forest backend only
    pub forest_shape: Option<(f64, usize)>,
    pub classes: Vec<String>,
    /// All features, descending weight; empty when the algorithm has none
    pub importances: Vec<(String, f64)>,
    pub sample: FeatureVector,
    pub sample_label: String,
    /// Max class probability × 100
    pub sample_confidence: f64,
}

impl InspectionReport {
    pub fn from_model(model: &PersistedModel) -> Result<Self> {
        let sample = FeatureVector::from_array(SAMPLE_FEATURES);
        let prediction = model.predict(&sample)?;
        let max_proba = prediction
            .probabilities
            .iter()
            .copied()
            .fold(0.0_f64, f64::max);

        Ok(Self {
            model_id: model.metadata.model_id,
            model_type: model.classifier.model_type(),
            n_estimators: model.classifier.n_estimators(),
            max_depth: model.classifier.max_depth(),
            hyperparameters: model.classifier.hyperparameters(),
            forest_shape: model
                .classifier
                .forest()
                .map(|forest| (forest.avg_depth(), forest.total_nodes())),
            classes: model.classes.clone(),
            importances: model.ranked_importances().unwrap_or_default(),
            sample,
            sample_label: prediction.label,
            sample_confidence: max_proba * 100.0,
        })
    }
}

impl fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model {}", self.model_id)?;
        writeln!(f, "{}", "-".repeat(30))?;
        writeln!(f, "Algorithm: {}", self.model_type)?;
        writeln!(f, "Parameters:")?;
        writeln!(f, "    - Estimators: {}", self.n_estimators)?;
        writeln!(f, "    - Max depth: {}", self.max_depth)?;
        for (key, value) in &self.hyperparameters {
            if key != "n_estimators" && key != "max_depth" {
                writeln!(f, "    - {}: {}", key, value)?;
            }
        }
        if let Some((avg_depth, total_nodes)) = self.forest_shape {
            writeln!(f, "Fitted trees: average depth {:.1}, {} nodes", avg_depth, total_nodes)?;
        }
        writeln!(f, "Classes: {}", self.classes.join(", "))?;

        writeln!(f)?;
        if self.importances.is_empty() {
            writeln!(f, "Feature importances: not available for {}", self.model_type)?;
        } else {
            writeln!(f, "Feature importances:")?;
            for (name, weight) in &self.importances {
                writeln!(f, "    {:<20} {:.6}", name, weight)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Sample prediction:")?;
        writeln!(
            f,
            "    Input: rain {} mm/24h, soil moisture {}",
            self.sample.rain_sum_24h, self.sample.soil_moisture_avg
        )?;
        writeln!(f, "    Prediction: {}", self.sample_label)?;
        writeln!(f, "    Confidence: {:.2}%", self.sample_confidence)
    }
}
