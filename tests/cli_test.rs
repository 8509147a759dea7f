/// Integration tests for the `floodguard-cli` binary contracts
///
/// - `predict` writes exactly one JSON line to stdout
/// - a missing model exits 1; malformed input exits 0 with an error object
/// - `train` and `inspect` produce their console reports

mod common;

use common::{features_json, trained_model, write_dataset};
use floodguard::models::SAMPLE_FEATURES;
use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

fn cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_floodguard-cli"))
        .args(args)
        .current_dir(dir)
        .env("FLOODGUARD_CONFIG", dir.join("floodguard.toml"))
        .env("RUST_LOG", "warn")
        .output()
        .expect("run floodguard-cli")
}

fn single_json_line(output: &Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1, "stdout was {stdout:?}");
    serde_json::from_str(lines[0]).unwrap()
}

#[test]
fn test_predict_emits_one_json_line() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = trained_model(dir.path());
    let model = config.paths.model.to_str().unwrap();

    let output = cli(
        dir.path(),
        &["predict", "--model", model, &features_json(SAMPLE_FEATURES)],
    );

    assert!(output.status.success());
    let value = single_json_line(&output);
    let object = value.as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["color", "confidence", "finalRisk", "status"]);
}

#[test]
fn test_predict_without_model_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.bin");

    let output = cli(
        dir.path(),
        &["predict", "--model", missing.to_str().unwrap(), &features_json(SAMPLE_FEATURES)],
    );

    assert_eq!(output.status.code(), Some(1));
    let value = single_json_line(&output);
    assert!(value["error"].as_str().unwrap().contains("absent.bin"));
}

#[test]
fn test_predict_malformed_input_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = trained_model(dir.path());
    let model = config.paths.model.to_str().unwrap();

    for input in ["{not json", r#"{"lat": -6.2}"#] {
        let output = cli(dir.path(), &["predict", "--model", model, input]);
        assert_eq!(output.status.code(), Some(0));
        let value = single_json_line(&output);
        assert_eq!(value.as_object().unwrap().len(), 1);
        assert!(value["error"].is_string());
    }
}

#[test]
fn test_predict_without_argument_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = trained_model(dir.path());
    let model = config.paths.model.to_str().unwrap();

    let output = cli(dir.path(), &["predict", "--model", model]);

    assert_eq!(output.status.code(), Some(0));
    let value = single_json_line(&output);
    assert_eq!(value.as_object().unwrap().len(), 1);
    assert!(value["error"].as_str().unwrap().contains("FEATURES_JSON"));
}

#[test]
fn test_train_and_inspect_reports() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), 80);
    let model = dir.path().join("out").join("model.bin");

    let output = cli(
        dir.path(),
        &[
            "train",
            "--dataset",
            dataset.to_str().unwrap(),
            "--model",
            model.to_str().unwrap(),
            "--seed",
            "3",
            "--n-estimators",
            "10",
        ],
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{stdout}");
    assert!(stdout.contains("Accuracy:"));
    assert!(stdout.contains("Top feature importances"));
    assert!(model.exists());

    let output = cli(dir.path(), &["inspect", "--model", model.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{stdout}");
    assert!(stdout.contains("Estimators: 10"));
    assert!(stdout.contains("Confidence:"));
}

#[test]
fn test_train_without_dataset_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli(
        dir.path(),
        &["train", "--dataset", dir.path().join("absent.csv").to_str().unwrap()],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Dataset not found"));
}
