use crate::error::{AppError, Result};
use crate::models::FeatureVector;
use serde::{Deserialize, Serialize};

/// Soil moisture assumed when the forecast carries no soil series
pub const DEFAULT_SOIL_MOISTURE: f64 = 0.5;

/// Hourly forecast series, one entry per hour of the window
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyWeather {
    #[serde(default)]
    pub rain: Vec<f64>,
    #[serde(default)]
    pub temperature_2m: Vec<f64>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<f64>,
    #[serde(default)]
    pub surface_pressure: Vec<f64>,
    #[serde(default)]
    pub wind_gusts_10m: Vec<f64>,
    #[serde(default)]
    pub soil_moisture_0_to_1cm: Option<Vec<f64>>,
}

/// Location plus its hourly forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub lat: f64,
    pub lon: f64,
    pub elevation: f64,
    pub hourly: HourlyWeather,
}

impl WeatherObservation {
    /// Aggregate the hourly series into the training feature layout
    pub fn to_features(&self) -> Result<FeatureVector> {
        let h = &self.hourly;
        let soil_moisture_avg = match h.soil_moisture_0_to_1cm.as_deref() {
            Some(series) if !series.is_empty() => mean(series),
            _ => DEFAULT_SOIL_MOISTURE,
        };

        let features = FeatureVector {
            lat: self.lat,
            lon: self.lon,
            elevation: self.elevation,
            temp_avg: mean(required("temperature_2m", &h.temperature_2m)?),
            humidity_avg: mean(required("relative_humidity_2m", &h.relative_humidity_2m)?),
            rain_sum_24h: required("rain", &h.rain)?.iter().sum(),
            rain_peak_1h: max(&h.rain),
            soil_moisture_avg,
            pressure_min: min(required("surface_pressure", &h.surface_pressure)?),
            wind_gust_max: max(required("wind_gusts_10m", &h.wind_gusts_10m)?),
        };
        features.validate()?;
        Ok(features)
    }
}

/// Short-horizon rainfall totals for charting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RainSummary {
    pub rain1h: f64,
    pub rain3h: f64,
    pub rain6h: f64,
    #[serde(rename = "raw6hrain")]
    pub raw_6h: [f64; 6],
}

impl RainSummary {
    /// Missing hours count as zero rain
    pub fn from_hourly(rain: &[f64]) -> Self {
        let mut raw_6h = [0.0; 6];
        for (slot, value) in raw_6h.iter_mut().zip(rain) {
            *slot = *value;
        }
        Self {
            rain1h: raw_6h[0],
            rain3h: raw_6h[..3].iter().sum(),
            rain6h: raw_6h.iter().sum(),
            raw_6h,
        }
    }
}

fn required<'a>(name: &str, series: &'a [f64]) -> Result<&'a [f64]> {
    if series.is_empty() {
        return Err(AppError::Validation(format!(
            "Hourly series '{}' is empty",
            name
        )));
    }
    Ok(series)
}

fn mean(series: &[f64]) -> f64 {
    series.iter().sum::<f64>() / series.len() as f64
}

fn max(series: &[f64]) -> f64 {
    series.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min(series: &[f64]) -> f64 {
    series.iter().copied().fold(f64::INFINITY, f64::min)
}
