use crate::error::{AppError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Number of features every model is trained on
pub const N_FEATURES: usize = 10;

/// Canonical column order. Any consumer of a persisted model must present
/// features in exactly this sequence.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "lat",
    "lon",
    "elevation",
    "temp_avg",
    "humidity_avg",
    "rain_sum_24h",
    "rain_peak_1h",
    "soil_moisture_avg",
    "pressure_min",
    "wind_gust_max",
];

/// Column index of `rain_sum_24h`
pub const RAIN_SUM_24H: usize = 5;
/// Column index of `soil_moisture_avg`
pub const SOIL_MOISTURE_AVG: usize = 7;
/// Column index of `wind_gust_max`
pub const WIND_GUST_MAX: usize = 9;

/// Sample scored by the inspector: heavy rain on saturated lowland soil
pub const SAMPLE_FEATURES: [f64; N_FEATURES] =
    [-6.2, 106.8, 5.0, 28.0, 85.0, 160.0, 40.0, 0.7, 1005.0, 50.0];

/// One location/time sample described by the ten weather and terrain features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureVector {
    pub lat: f64,
    pub lon: f64,
    pub elevation: f64,
    pub temp_avg: f64,
    pub humidity_avg: f64,
    pub rain_sum_24h: f64,
    pub rain_peak_1h: f64,
    pub soil_moisture_avg: f64,
    pub pressure_min: f64,
    pub wind_gust_max: f64,
}

impl FeatureVector {
    /// Values in canonical order
    pub fn to_array(&self) -> [f64; N_FEATURES] {
        [
            self.lat,
            self.lon,
            self.elevation,
            self.temp_avg,
            self.humidity_avg,
            self.rain_sum_24h,
            self.rain_peak_1h,
            self.soil_moisture_avg,
            self.pressure_min,
            self.wind_gust_max,
        ]
    }

    /// Build from values in canonical order
    pub fn from_array(values: [f64; N_FEATURES]) -> Self {
        Self {
            lat: values[0],
            lon: values[1],
            elevation: values[2],
            temp_avg: values[3],
            humidity_avg: values[4],
            rain_sum_24h: values[5],
            rain_peak_1h: values[6],
            soil_moisture_avg: values[7],
            pressure_min: values[8],
            wind_gust_max: values[9],
        }
    }

    /// Parse a JSON object carrying exactly the ten feature fields
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::Validation(format!("Invalid feature vector: {}", e)))
    }

    /// Single-row matrix for classifier input
    pub fn to_row(&self) -> Array2<f64> {
        to_matrix(std::slice::from_ref(self))
    }

    /// Reject values that cannot come from a real sensor reading
    pub fn validate(&self) -> Result<()> {
        for (name, value) in FEATURE_NAMES.iter().zip(self.to_array()) {
            if !value.is_finite() {
                return Err(AppError::Validation(format!(
                    "Feature '{}' must be a finite number",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Stack feature vectors into an `n × 10` matrix
pub fn to_matrix(vectors: &[FeatureVector]) -> Array2<f64> {
    let mut matrix = Array2::zeros((vectors.len(), N_FEATURES));
    for (i, vector) in vectors.iter().enumerate() {
        for (j, value) in vector.to_array().into_iter().enumerate() {
            matrix[[i, j]] = value;
        }
    }
    matrix
}
