//! View model builder
//!
//! Turns a [`RawWeatherBundle`] into a [`ViewModel`]. Building is pure and
//! infallible: missing numbers were already zeroed while decoding, and
//! anything still absent (UV, sun times) degrades to a placeholder.

use chrono::{DateTime, FixedOffset, Utc};

use crate::models::{
    ForecastPoint, ForecastSeries, HourlyEntry, HumidityTier, RawWeatherBundle, UnitSystem,
    UvTier, ViewModel,
};

const MISSING_CLOCK: &str = "--:--";
const MISSING_UV: &str = "—";

/// Round half towards positive infinity, matching how dashboards round for display
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Builds view models for one unit system
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewModelBuilder {
    units: UnitSystem,
}

impl ViewModelBuilder {
    #[must_use]
    pub fn new(units: UnitSystem) -> Self {
        Self { units }
    }

    /// Derive every presentation field from the bundle
    #[must_use]
    pub fn build(&self, bundle: &RawWeatherBundle) -> ViewModel {
        let current = &bundle.current;
        let offset = current.local_offset();
        let (sunrise, sunset) = current.sun_times();
        let is_daytime = is_daytime(current.observed_at, sunrise, sunset);

        let temperature = round_half_up(current.temperature) as i64;
        let feels_like = round_half_up(current.feels_like) as i64;
        let precipitation_total = precipitation_total(&bundle.forecast, self.units);
        let rain_chance = average_rain_chance(&bundle.forecast);
        let uv_index = bundle.uv_index.filter(|uv| uv.is_finite());
        let observed_local = current.observed_at.with_timezone(&offset);

        ViewModel {
            units: self.units,
            location_label: location_label(&current.place_name, &current.country),
            date_label: observed_local.format("Today %b %-d").to_string(),
            clock: observed_local.format("%H:%M").to_string(),
            temperature,
            temperature_label: format!("{temperature}°"),
            description: capitalize(&current.description),
            icon: current.category.icon_key().to_string(),
            sunrise: clock(sunrise, offset),
            sunset: clock(sunset, offset),
            humidity: percent(current.humidity),
            humidity_tier: HumidityTier::from_percent(current.humidity),
            wind_speed: wind_speed(current.wind_speed, self.units),
            wind_unit: self.units.wind_unit().to_string(),
            wind_direction: current.wind_direction,
            precipitation_total,
            precipitation_label: precipitation_label(
                &bundle.forecast,
                precipitation_total,
                self.units,
            ),
            uv_index,
            uv_tier: uv_index.map(UvTier::from_index),
            uv_label: uv_index
                .map(|uv| format!("{}", round_half_up(uv) as i64))
                .unwrap_or_else(|| MISSING_UV.to_string()),
            feels_like,
            feels_like_label: format!("{feels_like}°"),
            feels_like_position: feels_like_position(current.feels_like, self.units),
            rain_chance,
            rain_chance_label: format!("{rain_chance}%"),
            rain_chance_fill: rain_chance,
            hourly: hourly_entries(&bundle.forecast, offset),
            is_daytime,
            theme: current.category.background_theme(is_daytime),
        }
    }
}

/// Display wind speed; metric m/s become km/h
#[must_use]
pub fn wind_speed(provider_speed: f64, units: UnitSystem) -> i64 {
    round_half_up(units.display_wind_speed(provider_speed)) as i64
}

/// Next-24h rain + snow in the display unit, rounded to the display precision
#[must_use]
pub fn precipitation_total(forecast: &ForecastSeries, units: UnitSystem) -> f64 {
    let millimeters: f64 = forecast
        .next_24h()
        .iter()
        .map(ForecastPoint::precipitation_mm)
        .sum();
    let scale = 10_f64.powi(units.precipitation_decimals() as i32);
    (units.display_precipitation(millimeters) * scale).round() / scale
}

fn precipitation_label(forecast: &ForecastSeries, total: f64, units: UnitSystem) -> String {
    if forecast.is_empty() {
        return format!("0 {}", units.precipitation_unit());
    }
    format!(
        "{:.*} {}",
        units.precipitation_decimals(),
        total,
        units.precipitation_unit()
    )
}

/// Mean probability of precipitation over the next 24h as a 0-100 percent
#[must_use]
pub fn average_rain_chance(forecast: &ForecastSeries) -> u8 {
    let window = forecast.next_24h();
    if window.is_empty() {
        return 0;
    }
    let total: f64 = window.iter().map(|point| point.pop).sum();
    percent(total / window.len() as f64 * 100.0)
}

/// Marker position on the feels-like gauge, clamped to 0-100
#[must_use]
pub fn feels_like_position(feels_like: f64, units: UnitSystem) -> f64 {
    let (min, max) = units.gauge_range();
    ((feels_like - min) / (max - min) * 100.0).clamp(0.0, 100.0)
}

/// `sunrise <= observed <= sunset`; unknown sun times count as daytime
#[must_use]
pub fn is_daytime(
    observed: DateTime<Utc>,
    sunrise: Option<DateTime<Utc>>,
    sunset: Option<DateTime<Utc>>,
) -> bool {
    match (sunrise, sunset) {
        (Some(sunrise), Some(sunset)) => sunrise <= observed && observed <= sunset,
        _ => true,
    }
}

/// The first eight forecast points as chart columns
#[must_use]
pub fn hourly_entries(forecast: &ForecastSeries, offset: FixedOffset) -> Vec<HourlyEntry> {
    forecast
        .next_24h()
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let label = if index == 0 {
                "Now".to_string()
            } else {
                point.timestamp.with_timezone(&offset).format("%H:00").to_string()
            };
            let precipitation = percent(point.pop * 100.0);

            HourlyEntry {
                label,
                icon: point.category.icon_key().to_string(),
                temperature: round_half_up(point.temperature) as i64,
                precipitation_percent: precipitation,
                bar_height_percent: precipitation,
            }
        })
        .collect()
}

fn percent(value: f64) -> u8 {
    if value.is_finite() {
        round_half_up(value).clamp(0.0, 100.0) as u8
    } else {
        0
    }
}

fn clock(time: Option<DateTime<Utc>>, offset: FixedOffset) -> String {
    time.map(|t| t.with_timezone(&offset).format("%H:%M").to_string())
        .unwrap_or_else(|| MISSING_CLOCK.to_string())
}

fn location_label(name: &str, country: &str) -> String {
    match (name.is_empty(), country.is_empty()) {
        (false, false) => format!("{name}, {country}"),
        (false, true) => name.to_string(),
        (true, false) => country.to_string(),
        (true, true) => String::new(),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
