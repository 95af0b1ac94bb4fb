//! Configuration management for the `WeatherDash` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WeatherDashError;
use crate::models::UnitSystem;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `WeatherDash` application
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WeatherDashConfig {
    /// Weather provider configuration
    pub api: ApiConfig,
    /// Location resolution settings
    pub location: LocationConfig,
    /// Display settings
    pub display: DisplayConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Preference store settings
    pub preferences: PreferencesConfig,
}

/// OpenWeatherMap API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    /// Base URL of the weather endpoints
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Base URL of the geocoding endpoints
    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// How long the optional air quality and UV calls may take, in milliseconds
    #[serde(default = "default_optional_timeout")]
    pub optional_timeout_ms: u64,
}

/// Location resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// City loaded whenever resolution or fetching fails
    #[serde(default = "default_city")]
    pub default_city: String,
    /// Wait budget for a device position fix, in seconds
    #[serde(default = "default_device_timeout")]
    pub device_timeout_seconds: u32,
    /// Prefer the most accurate fix the sensor can give
    #[serde(default = "default_high_accuracy")]
    pub high_accuracy: bool,
    /// Endpoint of the IP-based position sensor
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,
}

/// Display settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    /// Unit system (metric or imperial)
    #[serde(default)]
    pub units: UnitSystem,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Preference store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// Directory of the preference database
    #[serde(default = "default_preferences_path")]
    pub path: String,
}

// Default value functions
fn default_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_geo_base_url() -> String {
    "https://api.openweathermap.org/geo/1.0".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_optional_timeout() -> u64 {
    5000
}

fn default_city() -> String {
    "New York".to_string()
}

fn default_device_timeout() -> u32 {
    10
}

fn default_high_accuracy() -> bool {
    true
}

fn default_ip_lookup_url() -> String {
    "http://ip-api.com/json/?fields=status,message,lat,lon".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_preferences_path() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("weatherdash").join("preferences"))
        .unwrap_or_else(|| PathBuf::from(".weatherdash/preferences"))
        .to_string_lossy()
        .into_owned()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            geo_base_url: default_geo_base_url(),
            timeout_seconds: default_timeout(),
            optional_timeout_ms: default_optional_timeout(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            default_city: default_city(),
            device_timeout_seconds: default_device_timeout(),
            high_accuracy: default_high_accuracy(),
            ip_lookup_url: default_ip_lookup_url(),
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

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }

    #[must_use]
    pub fn optional_timeout(&self) -> Duration {
        Duration::from_millis(self.optional_timeout_ms)
    }

    /// The API key, or a configuration error explaining how to set it
    pub fn require_api_key(&self) -> crate::Result<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty()).ok_or_else(|| {
            WeatherDashError::config(
                "An OpenWeatherMap API key is required. Set api.api_key or WEATHERDASH_API__API_KEY.",
            )
        })
    }
}

impl LocationConfig {
    #[must_use]
    pub fn device_timeout(&self) -> Duration {
        Duration::from_secs(self.device_timeout_seconds.into())
    }
}

impl WeatherDashConfig {
    /// Load configuration from `config_path` (or the default location) and
    /// `WEATHERDASH_*` environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides, e.g. WEATHERDASH_API__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("WEATHERDASH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WeatherDashConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherdash").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.api.base_url.is_empty() {
            self.api.base_url = default_base_url();
        }
        if self.api.geo_base_url.is_empty() {
            self.api.geo_base_url = default_geo_base_url();
        }
        if self.api.timeout_seconds == 0 {
            self.api.timeout_seconds = default_timeout();
        }
        if self.api.optional_timeout_ms == 0 {
            self.api.optional_timeout_ms = default_optional_timeout();
        }
        if self.location.default_city.trim().is_empty() {
            self.location.default_city = default_city();
        }
        if self.location.device_timeout_seconds == 0 {
            self.location.device_timeout_seconds = default_device_timeout();
        }
        if self.location.ip_lookup_url.is_empty() {
            self.location.ip_lookup_url = default_ip_lookup_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.preferences.path.is_empty() {
            self.preferences.path = default_preferences_path();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        // A missing key only fails once a weather call is attempted
        if let Some(api_key) = &self.api.api_key {
            if api_key.is_empty() {
                return Err(WeatherDashError::config(
                    "Weather API key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if api_key.len() < 8 {
                return Err(WeatherDashError::config(
                    "Weather API key appears to be invalid (too short). Please check your API key."
                ).into());
            }

            if api_key.len() > 100 {
                return Err(WeatherDashError::config(
                    "Weather API key appears to be invalid (too long). Please check your API key."
                ).into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.api.timeout_seconds > 300 {
            return Err(WeatherDashError::config(
                "Weather API timeout cannot exceed 300 seconds"
            ).into());
        }

        if self.api.optional_timeout_ms > 60_000 {
            return Err(WeatherDashError::config(
                "Optional call timeout cannot exceed 60000 ms"
            ).into());
        }

        if self.location.device_timeout_seconds > 120 {
            return Err(WeatherDashError::config(
                "Device location timeout cannot exceed 120 seconds"
            ).into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherDashError::config(
                format!("Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_log_levels.join(", ")
                )
            ).into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherDashError::config(
                format!("Invalid log format '{}'. Must be one of: {}",
                    self.logging.format,
                    valid_log_formats.join(", ")
                )
            ).into());
        }

        for (name, url) in [
            ("Weather API base URL", &self.api.base_url),
            ("Geocoding base URL", &self.api.geo_base_url),
            ("IP lookup URL", &self.location.ip_lookup_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WeatherDashError::config(
                    format!("{name} must be a valid HTTP or HTTPS URL")
                ).into());
            }
        }

        Ok(())
    }
}
