/// Integration tests for the risk server HTTP API
///
/// Requests are driven through the router with `tower::ServiceExt::oneshot`;
/// no socket is bound.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use common::{features_json, trained_model};
use floodguard::{
    api::{build_router, AppState},
    ml::ModelHandle,
    models::SAMPLE_FEATURES,
    pipeline::Trainer,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(handle: ModelHandle) -> Router {
    build_router(AppState::new(Arc::new(handle)).with_alert_threshold(70))
}

async fn send(app: Router, method: &str, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn weather_body(rain: &[f64]) -> String {
    let hours = rain.len();
    json!({
        "lat": -6.2,
        "lon": 106.8,
        "elevation": 8.0,
        "hourly": {
            "rain": rain,
            "temperature_2m": vec![27.0; hours],
            "relative_humidity_2m": vec![82.0; hours],
            "surface_pressure": vec![1007.0; hours],
            "wind_gusts_10m": vec![22.0; hours],
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_health_reports_model_state() {
    let dir = tempfile::tempdir().unwrap();
    let empty = ModelHandle::empty(dir.path().join("absent.bin"));

    let (status, body) = send(app(empty), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn test_predict_returns_risk_response() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = trained_model(dir.path());
    let handle = ModelHandle::load(config.paths.model.clone()).unwrap();

    let (status, body) = send(
        app(handle),
        "POST",
        "/v1/predict",
        Some(features_json(SAMPLE_FEATURES)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 4);
    for key in ["status", "finalRisk", "color", "confidence"] {
        assert!(object.contains_key(key), "missing {key}");
    }
}

#[tokio::test]
async fn test_predict_rejects_malformed_body() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = trained_model(dir.path());
    let handle = ModelHandle::load(config.paths.model.clone()).unwrap();

    let (status, body) = send(app(handle), "POST", "/v1/predict", Some(r#"{"lat": 1}"#.into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_predict_without_model_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let empty = ModelHandle::empty(dir.path().join("absent.bin"));

    let (status, body) = send(
        app(empty),
        "POST",
        "/v1/predict",
        Some(features_json(SAMPLE_FEATURES)),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "MODEL_NOT_FOUND");
}

#[tokio::test]
async fn test_weather_risk_with_rain_summary() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = trained_model(dir.path());
    let handle = ModelHandle::load(config.paths.model.clone()).unwrap();

    let rain = [12.0, 10.0, 8.0, 20.0, 30.0, 25.0, 40.0, 35.0, 30.0, 20.0];
    let (status, body) = send(app(handle), "POST", "/v1/risk", Some(weather_body(&rain))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rain"]["rain1h"], 12.0);
    assert_eq!(body["rain"]["rain3h"], 30.0);
    assert_eq!(body["rain"]["rain6h"], 105.0);
    assert_eq!(body["rain"]["raw6hrain"].as_array().unwrap().len(), 6);

    let final_risk = body["final"]["finalRisk"].as_u64().unwrap();
    assert_eq!(body["alert"], final_risk > 70);
}

#[tokio::test]
async fn test_reports_counted_near_risk_location() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = trained_model(dir.path());
    let router = app(ModelHandle::load(config.paths.model.clone()).unwrap());

    let reports = [
        json!({"lat": -6.2, "lon": 106.8, "message": "water at the curb"}),
        json!({"lat": -6.205, "lon": 106.805}),
        json!({"lat": -7.0, "lon": 110.0, "message": "flooded underpass"}),
    ];
    for (i, report) in reports.iter().enumerate() {
        let (status, body) =
            send(router.clone(), "POST", "/v1/reports", Some(report.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["totalReports"], i + 1);
    }

    let (status, body) =
        send(router.clone(), "POST", "/v1/risk", Some(weather_body(&[1.0, 2.0, 3.0]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nearbyReports"], 2);

    let (status, body) = send(
        router,
        "POST",
        "/v1/reports",
        Some(r#"{"lat": 120.0, "lon": 0.0}"#.into()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_weather_risk_rejects_empty_series() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = trained_model(dir.path());
    let handle = ModelHandle::load(config.paths.model.clone()).unwrap();

    let (status, body) = send(app(handle), "POST", "/v1/risk", Some(weather_body(&[]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_model_info_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let (config, first) = trained_model(dir.path());
    let handle = Arc::new(ModelHandle::load(config.paths.model.clone()).unwrap());
    let router = build_router(AppState::new(Arc::clone(&handle)));

    let (status, body) = send(router.clone(), "GET", "/v1/model", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_id"], first.model_id.to_string());
    assert_eq!(body["model_type"], "random_forest");
    assert_eq!(body["classes"].as_array().unwrap().len(), 4);
    let weights: Vec<f64> = body["feature_importances"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["importance"].as_f64().unwrap())
        .collect();
    assert_eq!(weights.len(), 10);
    assert!(weights.windows(2).all(|w| w[0] >= w[1]));

    let second = Trainer::new(&config).run().unwrap();
    let (status, body) = send(router.clone(), "POST", "/v1/model/reload", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_id"], second.model_id.to_string());
    assert_eq!(body["path"], config.paths.model.display().to_string());
    assert_eq!(handle.current().unwrap().metadata.model_id, second.model_id);
}

#[tokio::test]
async fn test_reload_without_artifact_fails() {
    let dir = tempfile::tempdir().unwrap();
    let empty = ModelHandle::empty(dir.path().join("absent.bin"));

    let (status, _) = send(app(empty), "POST", "/v1/model/reload", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
