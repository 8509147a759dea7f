//! Sensor-noise simulation for training data.
//!
//! Real gauges drift: rainfall totals, soil sensors and anemometers all report
//! with measurement error. Training on perturbed features against the clean
//! labels keeps the classifier from memorising exact sensor readings.

use crate::error::{AppError, Result};
use crate::models::{N_FEATURES, RAIN_SUM_24H, SOIL_MOISTURE_AVG, WIND_GUST_MAX};
use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Standard deviations of the zero-mean Gaussian noise per perturbed column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Rainfall total over 24h (mm)
    #[serde(default = "default_rain_sigma")]
    pub rain_sum_24h_sigma: f64,

    /// Volumetric soil moisture (m³/m³)
    #[serde(default = "default_soil_sigma")]
    pub soil_moisture_avg_sigma: f64,

    /// Peak wind gust (km/h)
    #[serde(default = "default_wind_sigma")]
    pub wind_gust_max_sigma: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            rain_sum_24h_sigma: default_rain_sigma(),
            soil_moisture_avg_sigma: default_soil_sigma(),
            wind_gust_max_sigma: default_wind_sigma(),
        }
    }
}

fn default_rain_sigma() -> f64 {
    15.0
}

fn default_soil_sigma() -> f64 {
    0.05
}

fn default_wind_sigma() -> f64 {
    5.0
}

/// Adds Gaussian noise to the rain, soil and wind columns, then floors every
/// feature column at zero.
#[derive(Debug, Clone)]
pub struct NoiseAugmenter {
    columns: Vec<(usize, Normal<f64>)>,
}

impl NoiseAugmenter {
    pub fn new(config: &NoiseConfig) -> Result<Self> {
        let targets = [
            (RAIN_SUM_24H, config.rain_sum_24h_sigma),
            (SOIL_MOISTURE_AVG, config.soil_moisture_avg_sigma),
            (WIND_GUST_MAX, config.wind_gust_max_sigma),
        ];

        let columns = targets
            .into_iter()
            .map(|(column, sigma)| {
                if !sigma.is_finite() || sigma < 0.0 {
                    return Err(AppError::Configuration(format!(
                        "Noise sigma must be a non-negative number, got {}",
                        sigma
                    )));
                }
                Normal::new(0.0, sigma)
                    .map(|dist| (column, dist))
                    .map_err(|e| AppError::Configuration(format!("Invalid noise sigma: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { columns })
    }

    /// Returns a perturbed copy; `features` is left untouched.
    pub fn augment<R: Rng + ?Sized>(&self, features: &Array2<f64>, rng: &mut R) -> Result<Array2<f64>> {
        if features.ncols() != N_FEATURES {
            return Err(AppError::Validation(format!(
                "Expected {} feature columns, got {}",
                N_FEATURES,
                features.ncols()
            )));
        }

        let mut noisy = features.to_owned();
        for (column, dist) in &self.columns {
            for value in noisy.column_mut(*column).iter_mut() {
                *value += dist.sample(rng);
            }
        }

        // NaN compares false and stays NaN
        noisy.mapv_inplace(|v| if v < 0.0 { 0.0 } else { v });

        debug!(rows = noisy.nrows(), "Applied sensor noise");
        Ok(noisy)
    }
}
