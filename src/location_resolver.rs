//! Location Resolution Module
//!
//! Turns either a device position fix or a free-text place name into a
//! [`Coordinate`]. Sensors and geocoders sit behind traits so the session can
//! run against real HTTP backends or in-memory fakes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::LocationConfig;
use crate::models::{Coordinate, GeocodingCandidate};
use crate::{Result, WeatherDashError};

/// Parameters of a single position request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Wait budget for the fix
    pub timeout: Duration,
    /// Oldest cached fix the sensor may return; zero forces a fresh one
    pub maximum_age: Duration,
    /// Prefer the most precise source the sensor has, at the cost of latency
    pub high_accuracy: bool,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
            high_accuracy: true,
        }
    }
}

impl From<&LocationConfig> for PositionOptions {
    fn from(config: &LocationConfig) -> Self {
        Self {
            timeout: config.device_timeout(),
            maximum_age: Duration::ZERO,
            high_accuracy: config.high_accuracy,
        }
    }
}

/// Source of the device's own position
#[async_trait]
pub trait PositionSensor: Send + Sync {
    /// Whether the platform offers a sensor at all
    fn is_available(&self) -> bool;

    /// Request one fix. Implementations report refusal as
    /// `LocationPermissionDenied` and any other failure as `LocationUnavailable`.
    ///
    /// A sensor that caches fixes must not return one older than
    /// `options.maximum_age`. Sensors with a single precision level may
    /// ignore `options.high_accuracy`.
    async fn current_position(&self, options: &PositionOptions) -> Result<Coordinate>;
}

/// Forward geocoding of place names
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// At most `limit` candidates, best match first
    async fn lookup(&self, name: &str, limit: u8) -> Result<Vec<GeocodingCandidate>>;
}

/// Sensor for platforms without any position support
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSensor;

#[async_trait]
impl PositionSensor for UnsupportedSensor {
    fn is_available(&self) -> bool {
        false
    }

    async fn current_position(&self, _options: &PositionOptions) -> Result<Coordinate> {
        Err(WeatherDashError::LocationUnsupported)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate device position from the public IP address
///
/// Every call queries the lookup service, so `maximum_age` is always met.
/// Precision is that of the IP geolocation database; `high_accuracy` cannot
/// improve it and is only logged.
pub struct IpPositionSensor {
    client: Client,
    lookup_url: String,
}

impl IpPositionSensor {
    /// Create a sensor querying `lookup_url`
    pub fn new(lookup_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("WeatherDash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WeatherDashError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            lookup_url: lookup_url.into(),
        })
    }
}

#[async_trait]
impl PositionSensor for IpPositionSensor {
    fn is_available(&self) -> bool {
        true
    }

    #[instrument(skip(self), fields(url = %self.lookup_url))]
    async fn current_position(&self, options: &PositionOptions) -> Result<Coordinate> {
        debug!(
            "Requesting position fix (high accuracy: {})",
            options.high_accuracy
        );

        let response = self
            .client
            .get(&self.lookup_url)
            .send()
            .await
            .map_err(|e| WeatherDashError::location_unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(WeatherDashError::LocationPermissionDenied);
            }
            status if !status.is_success() => {
                return Err(WeatherDashError::location_unavailable(format!(
                    "position service returned HTTP {status}"
                )));
            }
            _ => {}
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| WeatherDashError::location_unavailable(e.to_string()))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) if Coordinate::new(lat, lon).is_valid() => {
                Ok(Coordinate::new(lat, lon))
            }
            _ => Err(WeatherDashError::location_unavailable(
                body.message
                    .unwrap_or_else(|| "position service returned no fix".to_string()),
            )),
        }
    }
}

/// Service for resolving locations
pub struct LocationResolver {
    sensor: Arc<dyn PositionSensor>,
    geocoder: Arc<dyn Geocoder>,
    options: PositionOptions,
}

impl LocationResolver {
    pub fn new(
        sensor: Arc<dyn PositionSensor>,
        geocoder: Arc<dyn Geocoder>,
        options: PositionOptions,
    ) -> Self {
        Self {
            sensor,
            geocoder,
            options,
        }
    }

    /// Resolve the device's own position with a single bounded request
    #[instrument(skip(self))]
    pub async fn resolve_by_device(&self) -> Result<Coordinate> {
        if !self.sensor.is_available() {
            warn!("No position sensor available");
            return Err(WeatherDashError::LocationUnsupported);
        }

        let start_time = Instant::now();
        let coordinate = tokio::time::timeout(
            self.options.timeout,
            self.sensor.current_position(&self.options),
        )
        .await
        .map_err(|_| {
            warn!(
                "Position request exceeded {}s",
                self.options.timeout.as_secs()
            );
            WeatherDashError::LocationTimeout
        })??;

        info!(
            "Resolved device position {} in {:?}",
            coordinate.format_coordinates(),
            start_time.elapsed()
        );
        Ok(coordinate)
    }

    /// Resolve a place name to the coordinate of its best match
    #[instrument(skip(self))]
    pub async fn resolve_by_name(&self, name: &str) -> Result<Coordinate> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WeatherDashError::city_not_found(name));
        }

        debug!("Geocoding location name: {}", name);

        let candidates = self.geocoder.lookup(name, 1).await.map_err(|e| match e {
            WeatherDashError::LookupFailed { .. } => e,
            other => WeatherDashError::lookup_failed(other.to_string()),
        })?;

        let Some(candidate) = candidates.into_iter().next() else {
            return Err(WeatherDashError::city_not_found(name));
        };

        info!(
            "Found location: {} ({})",
            candidate.label(),
            candidate.coordinate.format_coordinates()
        );
        Ok(candidate.coordinate)
    }
}
