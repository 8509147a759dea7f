use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// Flood-risk category assigned by the classifier.
///
/// Class membership is defined by the training data, so anything outside the
/// four known categories is carried verbatim in [`RiskLabel::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RiskLabel {
    Aman,
    Waspada,
    Siaga,
    Bahaya,
    Unknown(String),
}

impl RiskLabel {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "AMAN" => RiskLabel::Aman,
            "WASPADA" => RiskLabel::Waspada,
            "SIAGA" => RiskLabel::Siaga,
            "BAHAYA" => RiskLabel::Bahaya,
            other => RiskLabel::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RiskLabel::Aman => "AMAN",
            RiskLabel::Waspada => "WASPADA",
            RiskLabel::Siaga => "SIAGA",
            RiskLabel::Bahaya => "BAHAYA",
            RiskLabel::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, RiskLabel::Unknown(_))
    }

    /// Fixed score/color table. Unknown labels share the AMAN row.
    pub fn risk_score(&self) -> (u8, RiskColor) {
        match self {
            RiskLabel::Bahaya => (95, RiskColor::Red),
            RiskLabel::Siaga => (75, RiskColor::Orange),
            RiskLabel::Waspada => (50, RiskColor::Yellow),
            RiskLabel::Aman | RiskLabel::Unknown(_) => (10, RiskColor::Green),
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for RiskLabel {
    fn from(raw: &str) -> Self {
        RiskLabel::parse(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskColor {
    Green,
    Yellow,
    Orange,
    Red,
}

/// External-facing prediction result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskResponse {
    /// Predicted label, verbatim from the model
    pub status: String,

    /// Risk score (0-100)
    pub final_risk: u8,

    pub color: RiskColor,

    /// Max class probability as a percentage, one decimal
    pub confidence: f64,
}

impl RiskResponse {
    /// Assemble a response from the predicted label and the class distribution
    pub fn from_prediction(label: &RiskLabel, probabilities: &[f64]) -> Self {
        let (final_risk, color) = label.risk_score();
        Self {
            status: label.as_str().to_string(),
            final_risk,
            color,
            confidence: confidence_percent(probabilities),
        }
    }

    pub fn exceeds(&self, threshold: u8) -> bool {
        self.final_risk > threshold
    }
}

/// `max(probabilities) * 100` rounded to one decimal (halves to even), clamped into [0, 100]
pub fn confidence_percent(probabilities: &[f64]) -> f64 {
    let max = probabilities
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .fold(0.0_f64, f64::max)
        .clamp(0.0, 1.0);
    (max * 100.0 * 10.0).round_ties_even() / 10.0
}

/// Error object emitted in place of a [`RiskResponse`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
