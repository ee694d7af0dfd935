//! Integration-level unit tests for the SettingsEngine public API.
//!
//! These tests exercise the SettingsEngine through its public trait interface,
//! validating default loading, value persistence, validation and reset.

use scrollkeeper::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use scrollkeeper::types::errors::SettingsError;
use scrollkeeper::types::settings::{HistorySettings, ScrollSettings};
use serde_json::json;
use tempfile::TempDir;

/// Helper: create a SettingsEngine backed by a temp directory that lives for the
/// duration of the test (the caller holds the `TempDir` handle).
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    let path = dir
        .path()
        .join("settings.json")
        .to_string_lossy()
        .to_string();
    SettingsEngine::new(Some(path))
}

#[test]
fn test_load_defaults_when_no_config_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();

    assert_eq!(settings, ScrollSettings::default());
    assert!(settings.restoration.enabled);
    assert_eq!(settings.history.max_entries, 50);
    assert_eq!(settings.history.retain_on_overflow, 25);
    assert_eq!(settings.storage.key_prefix, "scroll_");
}

#[test]
fn test_set_value_persists_changes() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine.set_value("restoration.enabled", json!(false)).unwrap();
        engine.set_value("history.max_entries", json!(80)).unwrap();
    }

    let mut engine = engine_in_temp(&dir);
    let settings = engine.load().unwrap();
    assert!(!settings.restoration.enabled);
    assert_eq!(settings.history.max_entries, 80);
}

#[test]
fn test_set_value_unknown_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    assert!(matches!(
        engine.set_value("restoration.nope", json!(true)),
        Err(SettingsError::InvalidKey(_))
    ));
    assert!(matches!(
        engine.set_value("missing.section", json!(1)),
        Err(SettingsError::InvalidKey(_))
    ));
    assert!(matches!(
        engine.set_value("history.max_entries.deeper", json!(1)),
        Err(SettingsError::InvalidKey(_))
    ));
    assert!(matches!(engine.set_value("", json!(1)), Err(SettingsError::InvalidKey(_))));
}

#[test]
fn test_set_value_wrong_type_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let result = engine.set_value("restoration.enabled", json!("yes"));
    assert!(matches!(result, Err(SettingsError::InvalidValue(_))));
    assert!(engine.get_settings().restoration.enabled, "failed set must not apply");
}

#[test]
fn test_set_value_enforces_history_bounds() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    assert!(matches!(
        engine.set_value("history.max_entries", json!(0)),
        Err(SettingsError::InvalidValue(_))
    ));
    assert!(matches!(
        engine.set_value("history.retain_on_overflow", json!(51)),
        Err(SettingsError::InvalidValue(_))
    ));
    assert!(matches!(
        engine.set_value("storage.key_prefix", json!("")),
        Err(SettingsError::InvalidValue(_))
    ));
    assert_eq!(engine.get_settings(), &ScrollSettings::default());
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();
    let mut engine = engine_in_temp(&dir);

    assert!(matches!(engine.load(), Err(SettingsError::SerializationError(_))));
}

#[test]
fn test_partial_file_fills_missing_sections() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{"restoration": {"enabled": false}}"#,
    )
    .unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();
    assert!(!settings.restoration.enabled);
    assert!(settings.restoration.smooth_scroll_to_top);
    assert_eq!(settings.history, HistorySettings::default());
}

#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();
    engine.set_value("storage.key_prefix", json!("pos:")).unwrap();

    engine.reset().unwrap();
    assert_eq!(engine.get_settings(), &ScrollSettings::default());

    let mut reloaded = engine_in_temp(&dir);
    assert_eq!(reloaded.load().unwrap(), ScrollSettings::default());
}

#[test]
fn test_config_path_override() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in_temp(&dir);
    assert!(engine.get_config_path().ends_with("settings.json"));
    assert!(engine.get_config_path().starts_with(&*dir.path().to_string_lossy()));
}
