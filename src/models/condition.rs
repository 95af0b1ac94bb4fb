//! Weather condition categories and the presentation keys derived from them

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse weather classification reported by the provider (`weather[0].main`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    #[default]
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Mist,
}

impl Category {
    /// Category used for anything the provider reports that we do not map
    pub const FALLBACK: Category = Category::Clear;

    /// Parse a provider category string; unknown values fall back to `Clear`
    #[must_use]
    pub fn from_provider(main: &str) -> Self {
        match main.trim() {
            "Clear" => Self::Clear,
            "Clouds" => Self::Clouds,
            "Rain" => Self::Rain,
            "Drizzle" => Self::Drizzle,
            "Thunderstorm" => Self::Thunderstorm,
            "Snow" => Self::Snow,
            "Mist" => Self::Mist,
            _ => Self::FALLBACK,
        }
    }

    /// Icon identifier understood by the presentation layer
    #[must_use]
    pub fn icon_key(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Clouds => "clouds",
            Self::Rain => "rain",
            Self::Drizzle => "drizzle",
            Self::Thunderstorm => "thunderstorm",
            Self::Snow => "snow",
            Self::Mist => "mist",
        }
    }

    /// Background theme for this category, `None` keeps whatever is shown
    #[must_use]
    pub fn background_theme(&self, is_daytime: bool) -> Option<BackgroundTheme> {
        match self {
            Self::Clear if is_daytime => Some(BackgroundTheme::ClearDay),
            Self::Clear => Some(BackgroundTheme::ClearNight),
            Self::Clouds => Some(BackgroundTheme::Cloudy),
            Self::Rain | Self::Drizzle => Some(BackgroundTheme::Rainy),
            Self::Thunderstorm => Some(BackgroundTheme::Stormy),
            Self::Snow => Some(BackgroundTheme::Snowy),
            Self::Mist => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Rain => "Rain",
            Self::Drizzle => "Drizzle",
            Self::Thunderstorm => "Thunderstorm",
            Self::Snow => "Snow",
            Self::Mist => "Mist",
        };
        write!(f, "{name}")
    }
}

/// Page background selected from the current conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundTheme {
    ClearDay,
    ClearNight,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
}

impl BackgroundTheme {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClearDay => "clear-day",
            Self::ClearNight => "clear-night",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Stormy => "stormy",
            Self::Snowy => "snowy",
        }
    }
}

impl fmt::Display for BackgroundTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
