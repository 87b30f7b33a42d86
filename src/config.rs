//! Configuration management for the AirWatch service
//!
//! Settings are layered: optional `config.toml`, then environment
//! variables with the `AIRWATCH_` prefix (e.g.
//! `AIRWATCH_PROVIDERS__OPENWEATHERMAP_API_KEY`). Every field has a
//! working default so the service runs out of the box with mock data and
//! a local SQLite file.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::AirWatchError;

/// Root configuration for the AirWatch service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AirWatchConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// External provider credentials and timeouts
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Session secret key
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; defaults to a local SQLite file
    #[serde(default = "default_database_url")]
    pub url: String,
}

/// External provider credentials and timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// OpenWeatherMap API key. Absence is a recognized mode: the service
    /// falls back to mock pollution data and gazetteer-only geocoding.
    pub openweathermap_api_key: Option<String>,
    /// NASA Earthdata credential (accepted but currently unused)
    pub nasa_api_key: Option<String>,
    /// Geocoding request timeout in seconds
    #[serde(default = "default_geocode_timeout")]
    pub geocode_timeout_seconds: u64,
    /// Pollution fetch timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_port() -> u16 {
    3000
}

fn default_secret_key() -> String {
    "dev-secret-key-123".to_string()
}

fn default_database_url() -> String {
    "sqlite://pollution.db".to_string()
}

fn default_geocode_timeout() -> u64 {
    5
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            secret_key: default_secret_key(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openweathermap_api_key: None,
            nasa_api_key: None,
            geocode_timeout_seconds: default_geocode_timeout(),
            fetch_timeout_seconds: default_fetch_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AirWatchConfig {
    /// Load configuration from `config.toml` (if present) and environment
    /// variables.
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| PathBuf::from("config.toml"));
        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("AIRWATCH")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: Self = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration settings.
    pub fn validate(&self) -> Result<()> {
        if let Some(api_key) = &self.providers.openweathermap_api_key {
            if api_key.len() > 100 {
                return Err(AirWatchError::config(
                    "OpenWeatherMap API key appears to be invalid (too long)",
                )
                .into());
            }
        }

        if self.providers.geocode_timeout_seconds == 0
            || self.providers.geocode_timeout_seconds > 60
        {
            return Err(
                AirWatchError::config("Geocode timeout must be between 1 and 60 seconds").into(),
            );
        }

        if self.providers.fetch_timeout_seconds == 0 || self.providers.fetch_timeout_seconds > 120 {
            return Err(
                AirWatchError::config("Fetch timeout must be between 1 and 120 seconds").into(),
            );
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AirWatchError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AirWatchError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if self.database.url.is_empty() {
            return Err(AirWatchError::config("Database URL cannot be empty").into());
        }

        Ok(())
    }

    /// Whether a usable pollution-provider credential is configured.
    #[must_use]
    pub fn has_pollution_credential(&self) -> bool {
        self.providers
            .openweathermap_api_key
            .as_deref()
            .is_some_and(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AirWatchConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite://pollution.db");
        assert_eq!(config.providers.geocode_timeout_seconds, 5);
        assert_eq!(config.providers.fetch_timeout_seconds, 10);
        assert_eq!(config.logging.level, "info");
        assert!(config.providers.openweathermap_api_key.is_none());
        assert!(!config.has_pollution_credential());
    }

    #[test]
    fn test_defaults_pass_validation() {
        assert!(AirWatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_credential_is_not_usable() {
        let mut config = AirWatchConfig::default();
        config.providers.openweathermap_api_key = Some(String::new());
        assert!(!config.has_pollution_credential());

        config.providers.openweathermap_api_key = Some("abcdef0123456789".to_string());
        assert!(config.has_pollution_credential());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = AirWatchConfig::default();
        config.logging.level = "verbose".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid log level")
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = AirWatchConfig::default();
        config.providers.geocode_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }
}
