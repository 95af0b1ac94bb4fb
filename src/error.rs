//! Error types and handling for the `WeatherDash` application

use std::fmt;

use thiserror::Error;

/// The two weather calls a dashboard cannot be built without
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredCall {
    Current,
    Forecast,
}

impl fmt::Display for RequiredCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredCall::Current => write!(f, "current"),
            RequiredCall::Forecast => write!(f, "forecast"),
        }
    }
}

/// Main error type for the `WeatherDash` application
#[derive(Error, Debug)]
pub enum WeatherDashError {
    /// The platform has no position sensor
    #[error("Location lookup is not supported on this platform")]
    LocationUnsupported,

    /// The user (or the sensor backend) refused the position request
    #[error("Location permission denied")]
    LocationPermissionDenied,

    /// The sensor answered but could not produce a fix
    #[error("Location unavailable: {message}")]
    LocationUnavailable { message: String },

    /// No fix within the configured wait budget
    #[error("Location request timed out")]
    LocationTimeout,

    /// The geocoder returned no candidates
    #[error("City not found: {name}")]
    CityNotFound { name: String },

    /// The geocoder could not be queried
    #[error("City lookup failed: {message}")]
    LookupFailed { message: String },

    /// A required weather call failed
    #[error("Failed to fetch {call} weather data: {message}")]
    FetchFailed { call: RequiredCall, message: String },

    /// Transport or status errors from a provider
    #[error("API error: {message}")]
    Api { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Preference store errors
    #[error("Preference store error: {message}")]
    Preferences { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WeatherDashError {
    /// Create a new location-unavailable error
    pub fn location_unavailable<S: Into<String>>(message: S) -> Self {
        Self::LocationUnavailable {
            message: message.into(),
        }
    }

    /// Create a new city-not-found error
    pub fn city_not_found<S: Into<String>>(name: S) -> Self {
        Self::CityNotFound { name: name.into() }
    }

    /// Create a new lookup error
    pub fn lookup_failed<S: Into<String>>(message: S) -> Self {
        Self::LookupFailed {
            message: message.into(),
        }
    }

    /// Wrap the failure of a required weather call
    pub fn fetch_failed(call: RequiredCall, cause: impl fmt::Display) -> Self {
        Self::FetchFailed {
            call,
            message: cause.to_string(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new preference store error
    pub fn preferences<S: Into<String>>(message: S) -> Self {
        Self::Preferences {
            message: message.into(),
        }
    }

    /// True for failures the session recovers from by loading the default city
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::LocationUnsupported
                | Self::LocationPermissionDenied
                | Self::LocationUnavailable { .. }
                | Self::LocationTimeout
                | Self::CityNotFound { .. }
                | Self::LookupFailed { .. }
                | Self::FetchFailed { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::LocationUnsupported => "Geolocation is not supported on this device".to_string(),
            Self::LocationPermissionDenied => "Location access denied".to_string(),
            Self::LocationUnavailable { .. } => "Location information unavailable".to_string(),
            Self::LocationTimeout => "Location request timed out".to_string(),
            Self::CityNotFound { name } => format!("No city named '{name}' was found"),
            Self::LookupFailed { .. } => "Failed to look up the specified city".to_string(),
            Self::FetchFailed { .. } | Self::Api { .. } => {
                "Failed to fetch weather data. Please check your API key.".to_string()
            }
            Self::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            Self::Validation { message } => format!("Invalid input: {message}"),
            Self::Preferences { .. } => {
                "Preference store failed. Please check file permissions.".to_string()
            }
            Self::Io { .. } => "File operation failed. Please check file permissions.".to_string(),
        }
    }
}
