use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::ml::{Classifier, ModelType};
use crate::models::*;
use crate::pipeline::assess_risk;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: state.model.is_loaded(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
}

/// Score a ready-made feature vector
pub async fn predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<FeatureVector>, JsonRejection>,
) -> Result<Json<RiskResponse>> {
    let Json(features) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let model = state.model.current()?;
    Ok(Json(assess_risk(&model, &features)?))
}

/// Aggregate an hourly forecast, score it and flag high risk
pub async fn assess_weather(
    State(state): State<AppState>,
    payload: std::result::Result<Json<WeatherObservation>, JsonRejection>,
) -> Result<Json<WeatherRiskResponse>> {
    let Json(observation) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let features = observation.to_features()?;
    let model = state.model.current()?;
    let risk = assess_risk(&model, &features)?;

    let alert = risk.exceeds(state.alert_threshold);
    if alert {
        tracing::info!(
            lat = observation.lat,
            lon = observation.lon,
            status = %risk.status,
            final_risk = risk.final_risk,
            "Flood risk above alert threshold"
        );
    }

    Ok(Json(WeatherRiskResponse {
        rain: RainSummary::from_hourly(&observation.hourly.rain),
        final_risk: risk,
        alert,
        nearby_reports: state.reports.nearby(observation.lat, observation.lon),
    }))
}

#[derive(Debug, Serialize)]
pub struct WeatherRiskResponse {
    #[serde(rename = "final")]
    pub final_risk: RiskResponse,
    pub rain: RainSummary,
    pub alert: bool,
    #[serde(rename = "nearbyReports")]
    pub nearby_reports: usize,
}

/// Record a user flood report
pub async fn submit_report(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewReport>, JsonRejection>,
) -> Result<Json<ReportAck>> {
    let Json(report) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let (lat, lon) = (report.lat, report.lon);
    let total_reports = state.reports.submit(report)?;
    tracing::info!(lat, lon, total_reports, "User report received");

    Ok(Json(ReportAck {
        success: true,
        total_reports,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAck {
    pub success: bool,
    pub total_reports: usize,
}

/// Describe the active model
pub async fn model_info(State(state): State<AppState>) -> Result<Json<ModelInfoResponse>> {
    let model = state.model.current()?;
    let importances = model
        .ranked_importances()
        .unwrap_or_default()
        .into_iter()
        .map(|(feature, importance)| FeatureImportance {
            feature,
            importance,
        })
        .collect();

    Ok(Json(ModelInfoResponse {
        model_id: model.metadata.model_id,
        model_type: model.metadata.model_type,
        version: model.metadata.version.clone(),
        trained_at: model.metadata.trained_at,
        n_estimators: model.classifier.n_estimators(),
        hyperparameters: model.metadata.hyperparameters.clone(),
        classes: model.classes.clone(),
        feature_importances: importances,
        accuracy: model.metadata.validation_metrics.as_ref().map(|m| m.accuracy),
    }))
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub model_id: Uuid,
    pub model_type: ModelType,
    pub version: String,
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub n_estimators: usize,
    pub hyperparameters: BTreeMap<String, String>,
    pub classes: Vec<String>,
    /// Descending weight
    pub feature_importances: Vec<FeatureImportance>,
    /// Held-out accuracy at training time
    pub accuracy: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Re-read the model artifact and swap it in
pub async fn reload_model(State(state): State<AppState>) -> Result<Json<ReloadResponse>> {
    let handle = state.model.clone();
    let path = handle.path().display().to_string();
    let model = tokio::task::spawn_blocking(move || handle.reload())
        .await
        .map_err(|e| AppError::Internal(format!("Reload task failed: {}", e)))??;

    Ok(Json(ReloadResponse {
        path,
        model_id: model.metadata.model_id,
        model_type: model.metadata.model_type,
        trained_at: model.metadata.trained_at,
    }))
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub path: String,
    pub model_id: Uuid,
    pub model_type: ModelType,
    pub trained_at: chrono::DateTime<chrono::Utc>,
}
