// ==========================
// tests/unit/config_tests.rs
// ==========================
//! Unit tests for the configuration module
use backend_lib::config::{ConfigError, Settings, StorageBackend};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_settings_default() {
    let settings = Settings::default();

    assert_eq!(settings.bind_addr.to_string(), "127.0.0.1:8080");
    assert_eq!(settings.log_level, "info");
    assert_eq!(settings.auth.token_ttl_secs, 300);
    assert_eq!(settings.rate_limit.rate, 10);
    assert_eq!(settings.rate_limit.burst, 5);
    assert_eq!(settings.rate_limit.window_secs, 60);
    assert_eq!(settings.storage.backend, StorageBackend::Postgres);
    assert_eq!(settings.storage.max_connections, 100);
    assert_eq!(settings.storage.min_connections, 10);
    assert_eq!(settings.storage.query_timeout_secs, 5);
}

#[test]
fn test_default_settings_need_a_secret() {
    let settings = Settings::default();
    assert!(matches!(settings.validate(), Err(ConfigError::MissingSecret)));
}

#[test]
fn test_settings_load_from_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("usergate.toml");
    fs::write(
        &path,
        r#"
bind_addr = "0.0.0.0:9000"
log_level = "debug"

[auth]
jwt_secret = "from-file"

[rate_limit]
rate = 20
burst = 0

[storage]
backend = "memory"
"#,
    )
    .unwrap();

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.bind_addr.port(), 9000);
    assert_eq!(settings.log_level, "debug");
    assert!(!settings.auth.jwt_secret.is_empty());
    assert_eq!(settings.rate_limit.rate, 20);
    assert_eq!(settings.rate_limit.burst, 0);
    // Untouched sections keep their defaults
    assert_eq!(settings.rate_limit.window_secs, 60);
    assert_eq!(settings.storage.backend, StorageBackend::Memory);
}

#[test]
fn test_settings_reject_bad_values() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("bad.toml");
    fs::write(
        &path,
        r#"
[auth]
jwt_secret = "x"
token_ttl_secs = 0
"#,
    )
    .unwrap();

    let err = Settings::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field, .. } if field == "auth.token_ttl_secs"));
}

#[test]
fn test_settings_reject_malformed_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("broken.toml");
    fs::write(&path, "bind_addr = [not toml").unwrap();

    assert!(matches!(Settings::load_from(&path), Err(ConfigError::Load(_))));
}
