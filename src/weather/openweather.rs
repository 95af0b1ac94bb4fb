//! OpenWeatherMap HTTP client
//!
//! Implements [`WeatherSource`] against the `/data/2.5` endpoints and
//! [`Geocoder`] against `/geo/1.0/direct`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};

use super::WeatherSource;
use crate::config::WeatherDashConfig;
use crate::location_resolver::Geocoder;
use crate::models::openweather::{
    AirPollutionResponse, CurrentWeatherResponse, ForecastResponse, GeocodingResult, UvResponse,
};
use crate::models::{
    AirQuality, Coordinate, CurrentConditions, ForecastSeries, GeocodingCandidate, UnitSystem,
};
use crate::{Result, WeatherDashError};

/// Responses slower than this are logged at `warn`
const SLOW_RESPONSE: Duration = Duration::from_secs(5);

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("WeatherDash/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| WeatherDashError::config(format!("Failed to create HTTP client: {e}")))
}

/// GET `url` and decode the JSON body. `display_url` is what gets logged.
async fn get_json<T: DeserializeOwned>(client: &Client, url: &str, display_url: &str) -> Result<T> {
    debug!("OpenWeatherMap request URL: {}", display_url);
    let start_time = Instant::now();

    let response = client.get(url).send().await.map_err(|e| {
        error!("Request to {} failed: {}", display_url, e);
        WeatherDashError::api(format!("request failed: {e}"))
    })?;

    let elapsed = start_time.elapsed();
    if elapsed > SLOW_RESPONSE {
        warn!("Slow response from {}: {:?}", display_url, elapsed);
    }

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(WeatherDashError::api(format!("HTTP {status}: {body}")));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| WeatherDashError::api(format!("failed to parse response: {e}")))
}

/// Weather client for the OpenWeatherMap 2.5 API
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
    units: UnitSystem,
}

impl OpenWeatherClient {
    /// Create a client from the loaded configuration; fails without an API key
    pub fn new(config: &WeatherDashConfig) -> Result<Self> {
        let api_key = config.api.require_api_key()?.to_string();

        Ok(Self {
            client: build_client(config.api.timeout())?,
            api_key,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            units: config.display.units,
        })
    }

    /// Create a client against an arbitrary base URL
    pub fn with_base_url(api_key: &str, base_url: &str, units: UnitSystem) -> Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_secs(30))?,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            units,
        })
    }

    fn endpoint(&self, name: &str, coordinate: Coordinate, with_units: bool) -> (String, String) {
        let mut query = format!("lat={}&lon={}", coordinate.latitude, coordinate.longitude);
        if with_units {
            query.push_str("&units=");
            query.push_str(self.units.as_query());
        }
        let display = format!("{}/{}?{}&appid=***", self.base_url, name, query);
        let url = format!(
            "{}/{}?{}&appid={}",
            self.base_url,
            name,
            query,
            urlencoding::encode(&self.api_key)
        );
        (url, display)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    async fn current(&self, coordinate: Coordinate) -> Result<CurrentConditions> {
        let (url, display) = self.endpoint("weather", coordinate, true);
        let response: CurrentWeatherResponse = get_json(&self.client, &url, &display).await?;
        Ok(CurrentConditions::from(&response))
    }

    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    async fn forecast(&self, coordinate: Coordinate) -> Result<ForecastSeries> {
        let (url, display) = self.endpoint("forecast", coordinate, true);
        let response: ForecastResponse = get_json(&self.client, &url, &display).await?;
        Ok(ForecastSeries::from(&response))
    }

    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    async fn air_quality(&self, coordinate: Coordinate) -> Result<Option<AirQuality>> {
        let (url, display) = self.endpoint("air_pollution", coordinate, false);
        let response: AirPollutionResponse = get_json(&self.client, &url, &display).await?;
        Ok(response.into_air_quality())
    }

    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    async fn uv_index(&self, coordinate: Coordinate) -> Result<f64> {
        let (url, display) = self.endpoint("uvi", coordinate, false);
        let response: UvResponse = get_json(&self.client, &url, &display).await?;
        Ok(response.value)
    }
}

/// Forward geocoder on the OpenWeatherMap geocoding API
pub struct OpenWeatherGeocoder {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherGeocoder {
    pub fn new(config: &WeatherDashConfig) -> Result<Self> {
        let api_key = config.api.require_api_key()?.to_string();

        Ok(Self {
            client: build_client(config.api.timeout())?,
            api_key,
            base_url: config.api.geo_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_secs(30))?,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for OpenWeatherGeocoder {
    #[instrument(skip(self))]
    async fn lookup(&self, name: &str, limit: u8) -> Result<Vec<GeocodingCandidate>> {
        let query = format!("q={}&limit={}", urlencoding::encode(name), limit);
        let display = format!("{}/direct?{}&appid=***", self.base_url, query);
        let url = format!(
            "{}/direct?{}&appid={}",
            self.base_url,
            query,
            urlencoding::encode(&self.api_key)
        );

        let results: Vec<GeocodingResult> = get_json(&self.client, &url, &display)
            .await
            .map_err(|e| WeatherDashError::lookup_failed(e.to_string()))?;

        Ok(results.into_iter().map(GeocodingCandidate::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "test_api_key_123";

    fn coordinate() -> Coordinate {
        Coordinate::new(51.5074, -0.1278)
    }

    #[tokio::test]
    async fn test_current_weather() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("appid", KEY))
            .and(query_param("units", "imperial"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "coord": {"lat": 51.5074, "lon": -0.1278},
                "weather": [{"main": "Drizzle", "description": "light intensity drizzle"}],
                "main": {"temp": 57.2, "feels_like": 55.0, "humidity": 81},
                "wind": {"speed": 9.2, "deg": 250},
                "dt": 1_700_000_000,
                "sys": {"country": "GB", "sunrise": 1_699_975_000, "sunset": 1_700_008_000},
                "timezone": 0,
                "name": "London"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client =
            OpenWeatherClient::with_base_url(KEY, &mock_server.uri(), UnitSystem::Imperial).unwrap();
        let current = client.current(coordinate()).await.unwrap();

        assert_eq!(current.place_name, "London");
        assert_eq!(current.category, Category::Drizzle);
        assert_eq!(current.temperature, 57.2);
    }

    #[tokio::test]
    async fn test_forecast_and_units_default_to_metric() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [
                    {"dt": 1_700_000_000, "main": {"temp": 11.0}, "pop": 0.4,
                     "weather": [{"main": "Rain"}], "rain": {"3h": 2.5}}
                ],
                "city": {"name": "London", "country": "GB", "timezone": 0}
            })))
            .mount(&mock_server)
            .await;

        let client =
            OpenWeatherClient::with_base_url(KEY, &mock_server.uri(), UnitSystem::default()).unwrap();
        let forecast = client.forecast(coordinate()).await.unwrap();

        assert_eq!(forecast.points.len(), 1);
        assert_eq!(forecast.points[0].rain_3h, Some(2.5));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&mock_server)
            .await;

        let client =
            OpenWeatherClient::with_base_url(KEY, &mock_server.uri(), UnitSystem::Metric).unwrap();
        let err = client.current(coordinate()).await.unwrap_err();

        assert!(matches!(err, WeatherDashError::Api { .. }));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_uv_and_air_quality() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/uvi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lat": 51.5, "lon": -0.13, "date_iso": "2023-11-14T12:00:00Z", "value": 1.62
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/air_pollution"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [{"main": {"aqi": 3}, "components": {"no2": 22.3}}]
            })))
            .mount(&mock_server)
            .await;

        let client =
            OpenWeatherClient::with_base_url(KEY, &mock_server.uri(), UnitSystem::Metric).unwrap();

        assert_eq!(client.uv_index(coordinate()).await.unwrap(), 1.62);
        let air = client.air_quality(coordinate()).await.unwrap().unwrap();
        assert_eq!(air.aqi, 3);
    }

    #[tokio::test]
    async fn test_uv_without_value_fails() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/uvi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"lat": 0.0})))
            .mount(&mock_server)
            .await;

        let client =
            OpenWeatherClient::with_base_url(KEY, &mock_server.uri(), UnitSystem::Metric).unwrap();
        assert!(client.uv_index(coordinate()).await.is_err());
    }

    #[tokio::test]
    async fn test_geocoder_lookup() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .and(query_param("q", "São Paulo"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "São Paulo", "lat": -23.5506, "lon": -46.6333, "country": "BR", "state": "São Paulo"}
            ])))
            .mount(&mock_server)
            .await;

        let geocoder = OpenWeatherGeocoder::with_base_url(KEY, &mock_server.uri()).unwrap();
        let candidates = geocoder.lookup("São Paulo", 1).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].country.as_deref(), Some("BR"));
        assert_eq!(candidates[0].coordinate, Coordinate::new(-23.5506, -46.6333));
    }

    #[tokio::test]
    async fn test_geocoder_failure_is_lookup_failed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let geocoder = OpenWeatherGeocoder::with_base_url(KEY, &mock_server.uri()).unwrap();
        let err = geocoder.lookup("Paris", 1).await.unwrap_err();
        assert!(matches!(err, WeatherDashError::LookupFailed { .. }));
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = WeatherDashConfig::default();
        assert!(matches!(
            OpenWeatherClient::new(&config),
            Err(WeatherDashError::Config { .. })
        ));
    }
}
