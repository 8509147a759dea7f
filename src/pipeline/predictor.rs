use crate::error::Result;
use crate::ml::PersistedModel;
use crate::models::{ErrorResponse, FeatureVector, RiskLabel, RiskResponse};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Label, confidence, score and color for one feature vector.
///
/// Labels outside the known four still score as AMAN, but are logged so a
/// model trained on unexpected classes does not go unnoticed.
pub fn assess_risk(model: &PersistedModel, features: &FeatureVector) -> Result<RiskResponse> {
    let prediction = model.predict(features)?;
    let label = RiskLabel::parse(&prediction.label);
    if !label.is_known() {
        warn!(
            label = %label,
            model_id = %model.metadata.model_id,
            "Unrecognized risk label, scoring as AMAN"
        );
    }

    let response = RiskResponse::from_prediction(&label, &prediction.probabilities);
    debug!(
        status = %response.status,
        final_risk = response.final_risk,
        confidence = response.confidence,
        "Risk assessed"
    );
    Ok(response)
}

/// Single-sample predictor over a loaded model
#[derive(Clone)]
pub struct Predictor {
    model: Arc<PersistedModel>,
}

impl Predictor {
    pub fn new(model: Arc<PersistedModel>) -> Self {
        Self { model }
    }

    /// Fails with `ModelNotFound` when no artifact exists at `path`
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(PersistedModel::load(path)?)))
    }

    pub fn model(&self) -> &PersistedModel {
        &self.model
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<RiskResponse> {
        assess_risk(&self.model, features)
    }

    /// Parse a JSON feature object and predict
    pub fn predict_json(&self, raw: &str) -> Result<RiskResponse> {
        let features = FeatureVector::from_json(raw)?;
        self.predict(&features)
    }
}

/// One JSON line: the response, or `{"error": ...}` carrying the message
pub fn render_line(outcome: &Result<RiskResponse>) -> String {
    let rendered = match outcome {
        Ok(response) => serde_json::to_string(response),
        Err(err) => serde_json::to_string(&ErrorResponse::new(err.to_string())),
    };
    rendered.unwrap_or_else(|e| {
        serde_json::json!({ "error": format!("Failed to encode response: {}", e) }).to_string()
    })
}
