//! Data models for the WeatherDash application
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and geocoding candidates
//! - Condition: Weather categories with icon and theme mapping
//! - Units: Metric/imperial display conventions
//! - Weather: Normalized provider data and the raw bundle
//! - View: The presentation-ready view model
//! - Openweather: OpenWeatherMap wire formats

pub mod condition;
pub mod location;
pub mod openweather;
pub mod units;
pub mod view;
pub mod weather;

// Re-export all public types for convenient access
pub use condition::{BackgroundTheme, Category};
pub use location::{Coordinate, GeocodingCandidate};
pub use units::UnitSystem;
pub use view::{HourlyEntry, HumidityTier, UvTier, ViewModel};
pub use weather::{AirQuality, CurrentConditions, ForecastPoint, ForecastSeries, RawWeatherBundle};
