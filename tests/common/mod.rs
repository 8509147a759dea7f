//! Common test utilities: synthetic datasets and trained model fixtures

#![allow(dead_code)]

use floodguard::config::Config;
use floodguard::models::FEATURE_NAMES;
use floodguard::pipeline::{Trainer, TrainingReport};
use std::path::{Path, PathBuf};

/// Rain totals per class, far enough apart that noise cannot blur them
pub const CLASS_RAIN: [(&str, f64); 4] = [
    ("AMAN", 5.0),
    ("WASPADA", 80.0),
    ("SIAGA", 170.0),
    ("BAHAYA", 300.0),
];

/// CSV with the ten feature columns, the label and two ignored extras
pub fn synthetic_csv(rows: usize) -> String {
    let mut csv = String::from("city,date,");
    csv.push_str(&FEATURE_NAMES.join(","));
    csv.push_str(",risk_label\n");

    for i in 0..rows {
        let (label, rain) = CLASS_RAIN[i % CLASS_RAIN.len()];
        let jitter = (i % 7) as f64;
        csv.push_str(&format!(
            "Jakarta,2024-01-{:02},-6.2,106.8,{},{},{},{},{},{},{},{},{}\n",
            i % 28 + 1,
            8.0 + jitter,
            27.0 + jitter / 10.0,
            80.0 + jitter,
            rain + jitter,
            rain / 5.0,
            0.3 + rain / 1000.0,
            1008.0 - jitter,
            20.0 + rain / 10.0,
            label
        ));
    }
    csv
}

pub fn write_dataset(dir: &Path, rows: usize) -> PathBuf {
    let path = dir.join("dataset.csv");
    std::fs::write(&path, synthetic_csv(rows)).expect("write dataset");
    path
}

/// Small, seeded configuration rooted in `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.paths.dataset = dir.join("dataset.csv");
    config.paths.model = dir.join("models").join("flood_risk_model.bin");
    config.training.n_estimators = 25;
    config.training.seed = Some(7);
    config
}

/// Train a model into `dir` and return its configuration and report
pub fn trained_model(dir: &Path) -> (Config, TrainingReport) {
    write_dataset(dir, 160);
    let config = test_config(dir);
    let report = Trainer::new(&config).run().expect("training succeeds");
    (config, report)
}

/// JSON object for the given feature values in canonical order
pub fn features_json(values: [f64; 10]) -> String {
    let fields: Vec<String> = FEATURE_NAMES
        .iter()
        .zip(values)
        .map(|(name, value)| format!("\"{}\":{}", name, value))
        .collect();
    format!("{{{}}}", fields.join(","))
}
