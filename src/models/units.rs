//! Unit systems and their display conventions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::WeatherDashError;

/// Unit system requested from the provider and used for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Celsius, m/s
    #[default]
    Metric,
    /// Fahrenheit, mph
    Imperial,
}

impl UnitSystem {
    /// Value of the provider's `units` query parameter
    #[must_use]
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    /// Convert a provider wind speed into the display unit
    ///
    /// Metric providers report m/s, which is shown as km/h; imperial
    /// providers already report mph.
    #[must_use]
    pub fn display_wind_speed(&self, provider_speed: f64) -> f64 {
        match self {
            Self::Metric => provider_speed * 3.6,
            Self::Imperial => provider_speed,
        }
    }

    #[must_use]
    pub fn wind_unit(&self) -> &'static str {
        match self {
            Self::Metric => "km/h",
            Self::Imperial => "mph",
        }
    }

    /// Convert a precipitation volume in millimeters to the display unit
    #[must_use]
    pub fn display_precipitation(&self, millimeters: f64) -> f64 {
        match self {
            Self::Metric => millimeters / 10.0,
            Self::Imperial => millimeters / 25.4,
        }
    }

    #[must_use]
    pub fn precipitation_unit(&self) -> &'static str {
        match self {
            Self::Metric => "cm",
            Self::Imperial => "in",
        }
    }

    /// Decimal places used when printing precipitation totals
    #[must_use]
    pub fn precipitation_decimals(&self) -> usize {
        match self {
            Self::Metric => 1,
            Self::Imperial => 2,
        }
    }

    /// Temperature range of the feels-like gauge (0-50 °C)
    #[must_use]
    pub fn gauge_range(&self) -> (f64, f64) {
        match self {
            Self::Metric => (0.0, 50.0),
            Self::Imperial => (32.0, 122.0),
        }
    }

    #[must_use]
    pub fn temperature_unit(&self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_query())
    }
}

impl FromStr for UnitSystem {
    type Err = WeatherDashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            other => Err(WeatherDashError::validation(format!(
                "Unknown unit system '{other}'. Must be one of: metric, imperial"
            ))),
        }
    }
}
