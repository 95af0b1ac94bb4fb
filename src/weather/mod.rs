//! Weather acquisition
//!
//! [`WeatherFetcher`] issues the four provider calls for a coordinate at the
//! same time. Current conditions and the forecast are required; air quality
//! and UV degrade to `None` when they fail or run past their time bound.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::error::RequiredCall;
use crate::models::{AirQuality, Coordinate, CurrentConditions, ForecastSeries, RawWeatherBundle};
use crate::{Result, WeatherDashError};

pub mod openweather;

pub use openweather::{OpenWeatherClient, OpenWeatherGeocoder};

/// Default bound for the optional calls
pub const DEFAULT_OPTIONAL_TIMEOUT: Duration = Duration::from_secs(5);

/// A provider of the raw weather payloads
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, coordinate: Coordinate) -> Result<CurrentConditions>;

    async fn forecast(&self, coordinate: Coordinate) -> Result<ForecastSeries>;

    /// `Ok(None)` when the provider has no reading for the coordinate
    async fn air_quality(&self, coordinate: Coordinate) -> Result<Option<AirQuality>>;

    async fn uv_index(&self, coordinate: Coordinate) -> Result<f64>;
}

/// Runs one fetch cycle against a [`WeatherSource`]
pub struct WeatherFetcher {
    source: Arc<dyn WeatherSource>,
    optional_timeout: Duration,
}

impl WeatherFetcher {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self {
            source,
            optional_timeout: DEFAULT_OPTIONAL_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_optional_timeout(mut self, optional_timeout: Duration) -> Self {
        self.optional_timeout = optional_timeout;
        self
    }

    /// Fetch everything for `coordinate`.
    ///
    /// The first required failure aborts the cycle and the sibling requests
    /// are dropped.
    #[instrument(skip(self), fields(coordinate = %coordinate.format_coordinates()))]
    pub async fn fetch(&self, coordinate: Coordinate) -> Result<RawWeatherBundle> {
        let start_time = Instant::now();

        let current = async {
            self.source
                .current(coordinate)
                .await
                .map_err(|e| WeatherDashError::fetch_failed(RequiredCall::Current, e))
        };
        let forecast = async {
            self.source
                .forecast(coordinate)
                .await
                .map_err(|e| WeatherDashError::fetch_failed(RequiredCall::Forecast, e))
        };
        let optional = async {
            let (air_quality, uv_index) = tokio::join!(
                self.optional("air quality", self.source.air_quality(coordinate)),
                self.optional("uv index", self.source.uv_index(coordinate)),
            );
            Ok::<_, WeatherDashError>((air_quality.flatten(), uv_index))
        };

        let (current, forecast, (air_quality, uv_index)) =
            tokio::try_join!(current, forecast, optional)?;

        info!(
            "Fetched weather for {} ({} forecast points) in {:?}",
            current.place_name,
            forecast.points.len(),
            start_time.elapsed()
        );

        Ok(RawWeatherBundle {
            current,
            forecast,
            air_quality,
            uv_index,
        })
    }

    async fn optional<T>(
        &self,
        name: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Option<T> {
        match tokio::time::timeout(self.optional_timeout, call).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!("Optional {} call failed: {}", name, e);
                None
            }
            Err(_) => {
                warn!(
                    "Optional {} call exceeded {:?}, continuing without it",
                    name, self.optional_timeout
                );
                None
            }
        }
    }
}
