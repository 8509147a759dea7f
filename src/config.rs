use crate::dataset::NoiseConfig;
use crate::ml::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dataset and model artifact locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Sensor-noise simulation applied before training
    #[serde(default)]
    pub noise: NoiseConfig,

    /// Classifier and split configuration
    #[serde(default)]
    pub training: TrainingConfig,

    /// Risk server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("FLOODGUARD_CONFIG")
            .unwrap_or_else(|_| "config/floodguard.toml".to_string());

        Self::load_layered(&config_path, environment())
    }

    fn load_layered(
        config_path: &str,
        environment: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(config_path).required(false))
            // Override with environment variables
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}

/// `FLOODGUARD__SECTION__KEY` variables
fn environment() -> config::Environment {
    config::Environment::with_prefix("FLOODGUARD")
        .separator("__")
        .try_parsing(true)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Training dataset (CSV)
    #[serde(default = "default_dataset_path")]
    pub dataset: PathBuf,

    /// Persisted model artifact
    #[serde(default = "default_model_path")]
    pub model: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset_path(),
            model: default_model_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub port: u16,

    /// finalRisk strictly above this raises the alert flag
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_http_port(),
            alert_threshold: default_alert_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

// Default value functions
fn default_dataset_path() -> PathBuf {
    PathBuf::from("dataset.csv")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/flood_risk_model.bin")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    3000
}

fn default_alert_threshold() -> u8 {
    70
}

fn default_log_level() -> String {
    "info".to_string()
}
