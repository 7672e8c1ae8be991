// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use std::path::PathBuf;
use velvet::{Config, VelvetError};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("velvet_config_{}_{}", std::process::id(), name))
}

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.capture.width, 1280);
    assert_eq!(config.capture.height, 720);
    assert_eq!(config.refresh_rate_hz, 60);
    assert!(config.log_filter.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_gives_defaults() {
    let config = Config::load(&temp_path("missing.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_load() {
    let path = temp_path("dir").join("config.json");
    let mut config = Config::default();
    config.capture.device = Some(PathBuf::from("/dev/video2"));
    config.log_filter = Some("velvet=debug".to_string());

    config.save(&path).unwrap();
    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.capture.device_path(), PathBuf::from("/dev/video2"));

    let _ = std::fs::remove_dir_all(temp_path("dir"));
}

#[test]
fn test_malformed_file_is_config_error() {
    let path = temp_path("bad.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, VelvetError::Config(_)));
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let path = temp_path("zero.json");
    std::fs::write(&path, r#"{"capture": {"width": 0}}"#).unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, VelvetError::Config(_)));
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_processor_chains_are_not_persisted() {
    let json = serde_json::to_value(Config::default()).unwrap();
    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert!(keys.iter().all(|k| !k.contains("processor")));
}
