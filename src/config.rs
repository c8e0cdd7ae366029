//! Client configuration.

use crate::game::PlayerId;
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Environment variable overriding the server URL.
pub const SERVER_URL_ENV: &str = "PATRICIANS_SERVER_URL";

/// Environment variable overriding the seat.
pub const SEAT_ENV: &str = "PATRICIANS_SEAT";

/// Configuration for a Patricians client session.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_", into)]
pub struct ClientConfig {
    /// Backend base URL.
    #[serde(default = "default_server_url")]
    server_url: String,

    /// Player this client acts for; absent means hot-seat.
    #[serde(default)]
    seat: Option<PlayerId>,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    request_timeout_ms: u64,

    /// Interval between state polls while waiting, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            seat: None,
            request_timeout_ms: default_request_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(server_url = %config.server_url, seat = ?config.seat, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if given, else defaults, then applies environment overrides.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(SERVER_URL_ENV).filter(|url| !url.trim().is_empty()) {
            debug!(%url, "Server URL from environment");
            self.server_url = url;
        }
        if let Some(seat) = lookup(SEAT_ENV).filter(|seat| !seat.trim().is_empty()) {
            self.seat = Some(parse_seat(&seat)?);
        }
        Ok(self)
    }
}

/// Parses a seat name such as `caesar`.
pub fn parse_seat(value: &str) -> Result<PlayerId, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::new(format!("Unknown seat '{}', expected CAESAR or CLEOPATRA", value)))
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::default()
            .with_env_overrides(|key| match key {
                SERVER_URL_ENV => Some("http://game:9000".to_string()),
                SEAT_ENV => Some("cleopatra".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.server_url(), "http://game:9000");
        assert_eq!(config.seat(), &Some(PlayerId::Cleopatra));
        assert_eq!(*config.poll_interval_ms(), 1000);
    }

    #[test]
    fn test_bad_seat_is_rejected() {
        let result = ClientConfig::default().with_env_overrides(|key| {
            (key == SEAT_ENV).then(|| "brutus".to_string())
        });
        assert!(result.unwrap_err().message.contains("brutus"));
    }

    #[test]
    fn test_setters() {
        let config = ClientConfig::default()
            .with_server_url("http://127.0.0.1:1")
            .with_seat(Some(PlayerId::Caesar));
        assert_eq!(config.server_url(), "http://127.0.0.1:1");
        assert_eq!(*config.request_timeout_ms(), 5000);
    }
}
