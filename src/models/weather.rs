//! Normalized provider data held for one resolve-fetch-render cycle

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use sunrise::{Coordinates, SolarDay, SolarEvent};

use super::{Category, Coordinate};

/// Current conditions at the resolved coordinate
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Place name reported by the provider
    pub place_name: String,
    /// Country code (ISO 3166-1 alpha-2)
    pub country: String,
    /// Coordinate echoed by the provider, `None` when the response lacks it
    pub coordinate: Option<Coordinate>,
    /// Temperature in the configured unit system
    pub temperature: f64,
    pub feels_like: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Wind speed, m/s (metric) or mph (imperial)
    pub wind_speed: f64,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: f64,
    pub category: Category,
    /// Free-text description, e.g. "light rain"
    pub description: String,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub observed_at: DateTime<Utc>,
    /// Shift of the location's local time from UTC, in seconds
    pub utc_offset_seconds: i32,
}

impl CurrentConditions {
    /// The location's local time zone, UTC when the provider offset is out of range
    #[must_use]
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_seconds).unwrap_or(Utc.fix())
    }

    /// Sunrise and sunset, computed from the coordinate when the provider omits them
    #[must_use]
    pub fn sun_times(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        if self.sunrise.is_some() && self.sunset.is_some() {
            return (self.sunrise, self.sunset);
        }

        let Some(coordinates) = self
            .coordinate
            .and_then(|c| Coordinates::new(c.latitude, c.longitude))
        else {
            return (self.sunrise, self.sunset);
        };

        let date = self
            .observed_at
            .with_timezone(&self.local_offset())
            .date_naive();
        let solar_day = SolarDay::new(coordinates, date);
        let sunrise: Option<DateTime<Utc>> = solar_day.event_time(SolarEvent::Sunrise).into();
        let sunset: Option<DateTime<Utc>> = solar_day.event_time(SolarEvent::Sunset).into();

        (self.sunrise.or(sunrise), self.sunset.or(sunset))
    }
}

/// One 3-hourly forecast step
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    /// Probability of precipitation, 0.0-1.0
    pub pop: f64,
    /// Rain volume for the 3h window in mm
    pub rain_3h: Option<f64>,
    /// Snow volume for the 3h window in mm
    pub snow_3h: Option<f64>,
    pub category: Category,
}

impl ForecastPoint {
    /// Rain plus snow volume for this window, missing values count as zero
    #[must_use]
    pub fn precipitation_mm(&self) -> f64 {
        self.rain_3h.unwrap_or(0.0) + self.snow_3h.unwrap_or(0.0)
    }
}

/// Ordered forecast at a fixed 3-hour cadence
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ForecastSeries {
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    /// Number of 3h steps covering the next 24 hours
    pub const NEXT_24H_STEPS: usize = 8;

    #[must_use]
    pub fn new(points: Vec<ForecastPoint>) -> Self {
        Self { points }
    }

    /// The first `min(len, 8)` points
    #[must_use]
    pub fn next_24h(&self) -> &[ForecastPoint] {
        let end = self.points.len().min(Self::NEXT_24H_STEPS);
        &self.points[..end]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Air quality reading, kept opaque beyond the headline index
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AirQuality {
    /// Provider air quality index (1 = good .. 5 = very poor)
    pub aqi: u8,
    /// Raw pollutant concentrations as reported
    pub components: serde_json::Value,
}

/// Everything fetched for one coordinate
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RawWeatherBundle {
    pub current: CurrentConditions,
    pub forecast: ForecastSeries,
    pub air_quality: Option<AirQuality>,
    /// UV index from a dedicated UV source, absent when that call failed
    pub uv_index: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(pop: f64) -> ForecastPoint {
        ForecastPoint {
            timestamp: Utc::now(),
            temperature: 20.0,
            pop,
            rain_3h: None,
            snow_3h: None,
            category: Category::Clear,
        }
    }

    #[test]
    fn test_next_24h_caps_at_eight_points() {
        let series = ForecastSeries::new((0..40).map(|_| point(0.1)).collect());
        assert_eq!(series.next_24h().len(), 8);

        let short = ForecastSeries::new((0..3).map(|_| point(0.1)).collect());
        assert_eq!(short.next_24h().len(), 3);

        assert!(ForecastSeries::default().next_24h().is_empty());
    }

    fn quito() -> CurrentConditions {
        CurrentConditions {
            place_name: "Quito".to_string(),
            country: "EC".to_string(),
            coordinate: Some(Coordinate::new(-0.2299, -78.5249)),
            temperature: 15.0,
            feels_like: 15.0,
            humidity: 60.0,
            wind_speed: 2.0,
            wind_direction: 90.0,
            category: Category::Clouds,
            description: "few clouds".to_string(),
            sunrise: None,
            sunset: None,
            observed_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            utc_offset_seconds: -18000,
        }
    }

    #[test]
    fn test_sun_times_computed_when_missing() {
        let (sunrise, sunset) = quito().sun_times();
        let (sunrise, sunset) = (sunrise.unwrap(), sunset.unwrap());
        assert!(sunrise < sunset);
        // Equatorial day length stays close to 12 hours
        let hours = (sunset - sunrise).num_hours();
        assert!((11..=13).contains(&hours));
    }

    #[test]
    fn test_sun_times_unknown_without_coordinate() {
        let current = CurrentConditions {
            coordinate: None,
            ..quito()
        };
        assert_eq!(current.sun_times(), (None, None));
    }

    #[test]
    fn test_precipitation_defaults_missing_volumes_to_zero() {
        let mut p = point(0.0);
        assert_eq!(p.precipitation_mm(), 0.0);
        p.rain_3h = Some(1.5);
        p.snow_3h = Some(0.5);
        assert_eq!(p.precipitation_mm(), 2.0);
    }
}
