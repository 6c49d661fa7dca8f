//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global: REPLACE (global defines the real baseline)
//! - Global → Local: UNION with negation support
//! - Any → Env vars: REPLACE (explicit user override)
//!
//! Note: These tests run without a global config (temp directories only),
//! so they effectively test local config merging with defaults.

use std::fs;

use tempfile::TempDir;

use restree::config::{local_config_path, Settings};

#[test]
fn given_local_config_with_origins_when_load_then_unions_with_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        r#"
stage = "qa"

[cors]
enabled = true
allow_origins = ["https://library.nd.edu"]
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.stage, "qa");
    assert!(settings.cors.enabled);
    assert_eq!(
        settings.cors.allow_origins,
        vec!["*".to_string(), "https://library.nd.edu".to_string()]
    );
}

#[test]
fn given_local_config_with_negation_when_load_then_removes_inherited_method() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "[cors]\nallow_methods = [\"!DELETE\", \"!ANY\"]\n",
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert!(!settings.cors.allow_methods.contains(&"DELETE".to_string()));
    assert!(!settings.cors.allow_methods.contains(&"ANY".to_string()));
    assert!(settings.cors.allow_methods.contains(&"GET".to_string()));
    assert_eq!(settings.cors.allow_methods.len(), 6);
}

#[test]
fn given_local_config_without_cors_when_load_then_keeps_default_cors() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "region = \"eu-west-1\"\n").unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert_eq!(settings.region, "eu-west-1");
    assert!(!settings.cors.enabled);
    assert_eq!(settings.cors.allow_origins, vec!["*".to_string()]);
}

#[test]
fn given_invalid_local_config_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "stage = [\n").unwrap();

    let result = Settings::load(Some(dir.path()));

    assert!(result.is_err());
}

#[test]
fn given_dir_without_local_config_when_load_then_defaults() {
    let dir = TempDir::new().unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert_eq!(settings.stage, "dev");
    assert_eq!(settings.blueprint.to_string_lossy(), "gateway.toml");
}
