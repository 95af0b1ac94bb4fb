//! OpenWeatherMap API response structures and conversion into domain models
//!
//! Every numeric field is decoded leniently: a missing or malformed value
//! becomes zero (or `None` for optional volumes) instead of failing the
//! whole response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{
    AirQuality, Category, Coordinate, CurrentConditions, ForecastPoint, ForecastSeries,
    GeocodingCandidate,
};

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(0.0))
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .unwrap_or(0))
}

fn lenient_opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_i64().or_else(|| value.as_f64().map(|f| f as i64)))
}

fn timestamp(seconds: i64) -> Option<DateTime<Utc>> {
    if seconds > 0 {
        DateTime::from_timestamp(seconds, 0)
    } else {
        None
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
#[serde(default)]
pub struct Coord {
    #[serde(deserialize_with = "lenient_f64")]
    pub lat: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub lon: f64,
}

/// One entry of the `weather` array
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct WeatherDescriptor {
    pub main: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct MainReadings {
    #[serde(deserialize_with = "lenient_f64")]
    pub temp: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub feels_like: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub humidity: f64,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Wind {
    #[serde(deserialize_with = "lenient_f64")]
    pub speed: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub deg: f64,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SysInfo {
    pub country: String,
    #[serde(deserialize_with = "lenient_opt_i64")]
    pub sunrise: Option<i64>,
    #[serde(deserialize_with = "lenient_opt_i64")]
    pub sunset: Option<i64>,
}

/// Response of `/data/2.5/weather`
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CurrentWeatherResponse {
    pub coord: Option<Coord>,
    pub weather: Vec<WeatherDescriptor>,
    pub main: MainReadings,
    pub wind: Wind,
    #[serde(deserialize_with = "lenient_i64")]
    pub dt: i64,
    pub sys: SysInfo,
    /// Shift in seconds from UTC
    #[serde(deserialize_with = "lenient_i64")]
    pub timezone: i64,
    pub name: String,
}

/// Rain or snow volume block of a forecast step
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Volume {
    #[serde(rename = "3h", deserialize_with = "lenient_opt_f64")]
    pub three_hour: Option<f64>,
}

/// One entry of the forecast `list`
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ForecastItem {
    #[serde(deserialize_with = "lenient_i64")]
    pub dt: i64,
    pub main: MainReadings,
    pub weather: Vec<WeatherDescriptor>,
    #[serde(deserialize_with = "lenient_f64")]
    pub pop: f64,
    pub rain: Option<Volume>,
    pub snow: Option<Volume>,
}

/// Response of `/data/2.5/forecast`
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ForecastResponse {
    pub list: Vec<ForecastItem>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct AqiMain {
    pub aqi: u8,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct AirPollutionItem {
    pub main: AqiMain,
    pub components: Value,
}

/// Response of `/data/2.5/air_pollution`
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct AirPollutionResponse {
    pub list: Vec<AirPollutionItem>,
}

/// Response of `/data/2.5/uvi`; `value` is mandatory so a payload without it
/// is treated as a failed call
#[derive(Debug, Deserialize, Clone)]
pub struct UvResponse {
    pub value: f64,
}

/// Entry of the `/geo/1.0/direct` response array
#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingResult {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
    pub state: Option<String>,
}

impl From<&CurrentWeatherResponse> for CurrentConditions {
    fn from(response: &CurrentWeatherResponse) -> Self {
        let weather = response.weather.first();

        Self {
            place_name: response.name.clone(),
            country: response.sys.country.clone(),
            coordinate: response
                .coord
                .map(|coord| Coordinate::new(coord.lat, coord.lon)),
            temperature: response.main.temp,
            feels_like: response.main.feels_like,
            humidity: response.main.humidity,
            wind_speed: response.wind.speed,
            wind_direction: response.wind.deg,
            category: weather
                .map(|w| Category::from_provider(&w.main))
                .unwrap_or(Category::FALLBACK),
            description: weather.map(|w| w.description.clone()).unwrap_or_default(),
            sunrise: response.sys.sunrise.and_then(timestamp),
            sunset: response.sys.sunset.and_then(timestamp),
            observed_at: timestamp(response.dt).unwrap_or_else(Utc::now),
            utc_offset_seconds: i32::try_from(response.timezone).unwrap_or(0),
        }
    }
}

impl From<&ForecastItem> for ForecastPoint {
    fn from(item: &ForecastItem) -> Self {
        let weather = item.weather.first();

        Self {
            timestamp: timestamp(item.dt).unwrap_or_else(Utc::now),
            temperature: item.main.temp,
            pop: item.pop.clamp(0.0, 1.0),
            rain_3h: item.rain.as_ref().and_then(|r| r.three_hour),
            snow_3h: item.snow.as_ref().and_then(|s| s.three_hour),
            category: weather
                .map(|w| Category::from_provider(&w.main))
                .unwrap_or(Category::FALLBACK),
        }
    }
}

impl From<&ForecastResponse> for ForecastSeries {
    fn from(response: &ForecastResponse) -> Self {
        ForecastSeries::new(response.list.iter().map(ForecastPoint::from).collect())
    }
}

impl AirPollutionResponse {
    /// The first reading of the list, if any
    #[must_use]
    pub fn into_air_quality(self) -> Option<AirQuality> {
        self.list.into_iter().next().map(|item| AirQuality {
            aqi: item.main.aqi,
            components: item.components,
        })
    }
}

impl From<GeocodingResult> for GeocodingCandidate {
    fn from(result: GeocodingResult) -> Self {
        Self {
            name: result.name,
            country: result.country,
            state: result.state,
            coordinate: Coordinate::new(result.lat, result.lon),
        }
    }
}
