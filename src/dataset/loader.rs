use crate::error::{AppError, Result};
use crate::models::{to_matrix, FeatureVector, FEATURE_NAMES};
use ndarray::Array2;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Name of the label column in the training CSV
pub const LABEL_COLUMN: &str = "risk_label";

/// Clean training data: the ten feature columns and the ground-truth labels
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature matrix (n_samples × 10), canonical column order
    pub features: Array2<f64>,

    /// Ground-truth label per row
    pub labels: Vec<String>,
}

impl Dataset {
    pub fn new(features: Array2<f64>, labels: Vec<String>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(AppError::Validation(format!(
                "Feature rows ({}) and labels ({}) differ in length",
                features.nrows(),
                labels.len()
            )));
        }
        if features.ncols() != FEATURE_NAMES.len() {
            return Err(AppError::Validation(format!(
                "Expected {} feature columns, got {}",
                FEATURE_NAMES.len(),
                features.ncols()
            )));
        }
        Ok(Self { features, labels })
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sorted distinct labels
    pub fn classes(&self) -> Vec<String> {
        let mut classes = self.labels.clone();
        classes.sort();
        classes.dedup();
        classes
    }
}

/// One CSV row. Columns beyond these (city, date, ...) are ignored.
#[derive(Debug, Deserialize)]
struct DatasetRecord {
    lat: f64,
    lon: f64,
    elevation: f64,
    temp_avg: f64,
    humidity_avg: f64,
    rain_sum_24h: f64,
    rain_peak_1h: f64,
    soil_moisture_avg: f64,
    pressure_min: f64,
    wind_gust_max: f64,
    risk_label: String,
}

impl DatasetRecord {
    fn into_parts(self) -> (FeatureVector, String) {
        let features = FeatureVector {
            lat: self.lat,
            lon: self.lon,
            elevation: self.elevation,
            temp_avg: self.temp_avg,
            humidity_avg: self.humidity_avg,
            rain_sum_24h: self.rain_sum_24h,
            rain_peak_1h: self.rain_peak_1h,
            soil_moisture_avg: self.soil_moisture_avg,
            pressure_min: self.pressure_min,
            wind_gust_max: self.wind_gust_max,
        };
        (features, self.risk_label.trim().to_string())
    }
}

/// Read the training dataset, failing fast when the file is absent
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(AppError::DatasetNotFound(format!(
            "{} does not exist; generate the dataset before training",
            path.display()
        )));
    }

    info!(path = %path.display(), "Reading dataset");
    let file = std::fs::File::open(path)?;
    let dataset = read_dataset(file)?;
    info!(rows = dataset.n_samples(), "Dataset loaded");
    Ok(dataset)
}

/// Parse CSV content with a header row
pub fn read_dataset<R: Read>(reader: R) -> Result<Dataset> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in FEATURE_NAMES.iter().chain(std::iter::once(&LABEL_COLUMN)) {
        if !headers.iter().any(|h| h == *column) {
            return Err(AppError::Validation(format!(
                "Dataset is missing column '{}'",
                column
            )));
        }
    }

    let mut vectors = Vec::new();
    let mut labels = Vec::new();
    for (line, record) in csv_reader.deserialize::<DatasetRecord>().enumerate() {
        let record = record.map_err(|e| {
            AppError::Validation(format!("Dataset row {} is malformed: {}", line + 1, e))
        })?;
        let (features, label) = record.into_parts();
        if label.is_empty() {
            return Err(AppError::Validation(format!(
                "Dataset row {} has an empty {}",
                line + 1,
                LABEL_COLUMN
            )));
        }
        vectors.push(features);
        labels.push(label);
    }

    debug!(rows = labels.len(), "Parsed dataset rows");
    Dataset::new(to_matrix(&vectors), labels)
}
