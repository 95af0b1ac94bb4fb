//! Presentation-ready view model

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BackgroundTheme, UnitSystem};

/// Comfort bucket derived from relative humidity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HumidityTier {
    Good,
    Normal,
    Bad,
}

impl HumidityTier {
    /// `>60` bad, `>40` normal, otherwise good
    #[must_use]
    pub fn from_percent(humidity: f64) -> Self {
        if humidity > 60.0 {
            Self::Bad
        } else if humidity > 40.0 {
            Self::Normal
        } else {
            Self::Good
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Normal => "normal",
            Self::Bad => "bad",
        }
    }
}

impl fmt::Display for HumidityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// WHO exposure category of a UV index reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UvTier {
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "very high")]
    VeryHigh,
    #[serde(rename = "extreme")]
    Extreme,
}

impl UvTier {
    /// Bucket a reading; fractional readings are rounded first
    #[must_use]
    pub fn from_index(uv_index: f64) -> Self {
        match crate::view_model::round_half_up(uv_index) as i64 {
            i64::MIN..=2 => Self::Low,
            3..=5 => Self::Medium,
            6..=7 => Self::High,
            8..=10 => Self::VeryHigh,
            _ => Self::Extreme,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very high",
            Self::Extreme => "extreme",
        }
    }
}

impl fmt::Display for UvTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One column of the hourly chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    /// "Now" for the first entry, "HH:00" afterwards
    pub label: String,
    pub icon: String,
    /// Rounded temperature
    pub temperature: i64,
    /// Probability of precipitation, 0-100
    pub precipitation_percent: u8,
    /// Bar height on a 0-100 scale
    pub bar_height_percent: u8,
}

/// Normalized, rendering-agnostic dashboard state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub units: UnitSystem,
    /// "City, CC"
    pub location_label: String,
    /// "Today Nov 14" for the observation date in the location's local time
    pub date_label: String,
    /// Observation time as "HH:MM" in the location's local time
    pub clock: String,
    /// Rounded current temperature
    pub temperature: i64,
    pub temperature_label: String,
    /// Provider description with the first letter capitalized
    pub description: String,
    pub icon: String,
    /// "HH:MM" in the location's local time, "--:--" when unknown
    pub sunrise: String,
    pub sunset: String,
    /// Relative humidity, 0-100
    pub humidity: u8,
    pub humidity_tier: HumidityTier,
    /// Wind speed in the display unit, rounded
    pub wind_speed: i64,
    pub wind_unit: String,
    /// Degrees; drives the direction arrow rotation
    pub wind_direction: f64,
    /// Next-24h rain + snow in the display unit
    pub precipitation_total: f64,
    pub precipitation_label: String,
    /// Absent when no UV source answered
    pub uv_index: Option<f64>,
    pub uv_tier: Option<UvTier>,
    pub uv_label: String,
    pub feels_like: i64,
    pub feels_like_label: String,
    /// Marker position on the feels-like gauge, 0-100
    pub feels_like_position: f64,
    /// Average next-24h probability of precipitation, 0-100
    pub rain_chance: u8,
    pub rain_chance_label: String,
    /// Width of the probability fill bar, 0-100
    pub rain_chance_fill: u8,
    pub hourly: Vec<HourlyEntry>,
    pub is_daytime: bool,
    /// `None` keeps the current background
    pub theme: Option<BackgroundTheme>,
}
