//! `WeatherDash` - Weather dashboard backend
//!
//! Resolves a location from a device position or a city name, fetches
//! current conditions and a forecast from OpenWeatherMap, and turns them into
//! a rendering-agnostic view model handed to a presentation port.

pub mod api;
pub mod config;
pub mod error;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod preferences;
pub mod presentation;
pub mod session;
pub mod view_model;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::WeatherDashConfig;
pub use error::{RequiredCall, WeatherDashError};
pub use location_resolver::{
    Geocoder, IpPositionSensor, LocationResolver, PositionOptions, PositionSensor,
    UnsupportedSensor,
};
pub use models::{Coordinate, RawWeatherBundle, UnitSystem, ViewModel};
pub use preferences::PreferenceStore;
pub use presentation::{ConsolePresenter, Notice, PresentationPort, RecordingPresenter};
pub use session::{CycleOutcome, DashboardSession, Target};
pub use view_model::ViewModelBuilder;
pub use weather::{OpenWeatherClient, OpenWeatherGeocoder, WeatherFetcher, WeatherSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherDashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
