//! Tests for loading client configuration from TOML.

use patricians::{ClientConfig, PlayerId, SEAT_ENV};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_loads_full_file() {
    let file = write_config(
        r#"
server_url = "http://game.local:9090"
seat = "CLEOPATRA"
request_timeout_ms = 2500
poll_interval_ms = 250
"#,
    );

    let config = ClientConfig::from_file(file.path()).unwrap();

    assert_eq!(config.server_url(), "http://game.local:9090");
    assert_eq!(config.seat(), &Some(PlayerId::Cleopatra));
    assert_eq!(*config.request_timeout_ms(), 2500);
    assert_eq!(*config.poll_interval_ms(), 250);
}

#[test]
fn test_missing_fields_use_defaults() {
    let file = write_config("seat = \"CAESAR\"\n");

    let config = ClientConfig::from_file(file.path()).unwrap();

    assert_eq!(config.server_url(), "http://localhost:8080");
    assert_eq!(config.seat(), &Some(PlayerId::Caesar));
    assert_eq!(*config.request_timeout_ms(), 5000);
}

#[test]
fn test_malformed_file_is_rejected() {
    let file = write_config("server_url = [not toml");

    let error = ClientConfig::from_file(file.path()).unwrap_err();

    assert!(error.message.starts_with("Failed to parse config"));
}

#[test]
fn test_missing_file_is_rejected() {
    let error = ClientConfig::from_file("/nonexistent/patricians.toml").unwrap_err();
    assert!(error.message.starts_with("Failed to read config file"));
}

#[test]
fn test_environment_wins_over_file() {
    let file = write_config("seat = \"CAESAR\"\n");

    let config = ClientConfig::from_file(file.path())
        .unwrap()
        .with_env_overrides(|key| (key == SEAT_ENV).then(|| "cleopatra".to_string()))
        .unwrap();

    assert_eq!(config.seat(), &Some(PlayerId::Cleopatra));
}
