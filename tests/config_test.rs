//! Configuration tests
//!
//! This module contains tests for the configuration system.

use std::fs;
use std::io::Write;

use serial_test::serial;
use tempfile::NamedTempFile;

use sanctum_admin::config::{self, AdminConfig, ConfigLoader};

/// Test default configuration
#[test]
fn test_default_config() {
    let config = AdminConfig::default();

    assert_eq!(config.api_base.as_str(), "http://127.0.0.1:8080/api");
    assert_eq!(config.csrf_cookie, "sanctum_csrf");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.connection_timeout, 30);
    assert!(config.validate().is_ok());
}

/// Test configuration from file
#[test]
fn test_file_config() {
    let config_content = r#"{
        "api_base": "https://admin.example.com/api",
        "csrf_cookie": "custom_csrf",
        "log_level": "debug",
        "connection_timeout": 60
    }"#;

    let mut file = NamedTempFile::new().expect("Failed to create temp config file");
    file.write_all(config_content.as_bytes())
        .expect("Failed to write test config file");

    let config = AdminConfig::from_file(file.path()).expect("Failed to load config from file");

    assert_eq!(config.api_base.as_str(), "https://admin.example.com/api");
    assert_eq!(config.csrf_cookie, "custom_csrf");
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.connection_timeout, 60);
}

/// Partial files fall back to defaults for missing settings
#[test]
fn test_partial_file_config() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{"log_level": "trace"}"#).unwrap();

    let config = AdminConfig::from_file(file.path()).unwrap();

    assert_eq!(config.log_level, "trace");
    assert_eq!(config.csrf_cookie, "sanctum_csrf");
}

/// Unknown fields are rejected rather than silently ignored
#[test]
fn test_unknown_field_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{"log_levle": "debug"}"#).unwrap();

    assert!(AdminConfig::from_file(file.path()).is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(AdminConfig::from_file("definitely-not-a-real-file.json").is_err());
}

/// Test configuration from environment variables
#[test]
#[serial]
fn test_env_overlay() {
    std::env::set_var("SANCTUM_API_BASE", "https://env.example.com/api");
    std::env::set_var("SANCTUM_CSRF_COOKIE", "env_csrf");
    std::env::set_var("SANCTUM_LOG_LEVEL", "warn");
    std::env::set_var("SANCTUM_CONNECTION_TIMEOUT", "15");

    let config = AdminConfig::default().overlay_env().unwrap();

    std::env::remove_var("SANCTUM_API_BASE");
    std::env::remove_var("SANCTUM_CSRF_COOKIE");
    std::env::remove_var("SANCTUM_LOG_LEVEL");
    std::env::remove_var("SANCTUM_CONNECTION_TIMEOUT");

    assert_eq!(config.api_base.as_str(), "https://env.example.com/api");
    assert_eq!(config.csrf_cookie, "env_csrf");
    assert_eq!(config.log_level, "warn");
    assert_eq!(config.connection_timeout, 15);
}

/// Environment values take precedence over file values
#[test]
#[serial]
fn test_env_overrides_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{"log_level": "debug"}"#).unwrap();

    std::env::set_var("SANCTUM_LOG_LEVEL", "error");

    let config = AdminConfig::auto_load(Some(file.path())).unwrap();

    std::env::remove_var("SANCTUM_LOG_LEVEL");

    assert_eq!(config.log_level, "error");
}

#[test]
#[serial]
fn test_invalid_env_timeout_is_an_error() {
    std::env::set_var("SANCTUM_CONNECTION_TIMEOUT", "soon");

    let result = AdminConfig::default().overlay_env();

    std::env::remove_var("SANCTUM_CONNECTION_TIMEOUT");

    assert!(result.is_err());
}

/// Test validation failures
#[test]
fn test_validation_rejects_bad_values() {
    let mut config = AdminConfig::default();
    config.log_level = "loud".to_string();
    assert!(config.validate().is_err());

    let mut config = AdminConfig::default();
    config.connection_timeout = 0;
    assert!(config.validate().is_err());

    let mut config = AdminConfig::default();
    config.csrf_cookie = "has spaces".to_string();
    assert!(config.validate().is_err());

    let mut config = AdminConfig::default();
    config.csrf_cookie = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_parse_api_base_rejects_non_http_schemes() {
    assert!(config::parse_api_base("ftp://example.com/api").is_err());
    assert!(config::parse_api_base("not a url").is_err());
    assert!(config::parse_api_base("https://example.com/api").is_ok());
}

/// Test the global configuration manager
#[test]
#[serial]
fn test_global_config_roundtrip() {
    let config_content = r#"{"csrf_cookie": "global_csrf"}"#;
    let path = std::env::temp_dir().join("sanctum-admin-config-test.json");
    fs::write(&path, config_content).expect("Failed to write test config file");

    config::initialize(Some(path.as_path())).expect("Failed to initialize config");

    let config = config::get_config();
    assert_eq!(config.csrf_cookie, "global_csrf");

    let mut updated = config.clone();
    updated.log_level = "debug".to_string();
    config::update_config(updated).unwrap();
    assert_eq!(config::get_config().log_level, "debug");

    // Restore defaults so other serial tests see a clean slate.
    config::update_config(AdminConfig::default()).unwrap();

    fs::remove_file(&path).expect("Failed to remove test config file");
}
