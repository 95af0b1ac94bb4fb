//! Dashboard session
//!
//! Owns the mutable dashboard state and drives resolve → fetch → build →
//! present cycles. Every cycle is stamped with a generation number and only
//! the newest cycle may write its result, so a slow response can never
//! overwrite a newer one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::config::WeatherDashConfig;
use crate::location_resolver::{LocationResolver, PositionOptions, PositionSensor};
use crate::models::{BackgroundTheme, Coordinate, RawWeatherBundle, ViewModel};
use crate::presentation::{Notice, PresentationPort};
use crate::view_model::ViewModelBuilder;
use crate::weather::{OpenWeatherClient, OpenWeatherGeocoder, WeatherFetcher};
use crate::{Result, WeatherDashError};

/// What a cycle is asked to load
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Device,
    City(String),
    Coordinate(Coordinate),
}

/// Result of a cycle that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The cycle was the newest one and its view model is now current
    Applied(ViewModel),
    /// A newer cycle started in the meantime; nothing was written
    Superseded,
}

impl CycleOutcome {
    #[must_use]
    pub fn view(&self) -> Option<&ViewModel> {
        match self {
            Self::Applied(view) => Some(view),
            Self::Superseded => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SessionState {
    coordinate: Option<Coordinate>,
    bundle: Option<RawWeatherBundle>,
    view: Option<ViewModel>,
    theme: Option<BackgroundTheme>,
    /// Where the default city resolved to, once it has been loaded
    default_coordinate: Option<Coordinate>,
}

pub struct DashboardSession {
    resolver: LocationResolver,
    fetcher: WeatherFetcher,
    builder: ViewModelBuilder,
    presenter: Arc<dyn PresentationPort>,
    default_city: String,
    generation: AtomicU64,
    state: RwLock<SessionState>,
}

impl DashboardSession {
    pub fn new(
        resolver: LocationResolver,
        fetcher: WeatherFetcher,
        builder: ViewModelBuilder,
        presenter: Arc<dyn PresentationPort>,
        default_city: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            builder,
            presenter,
            default_city: default_city.into(),
            generation: AtomicU64::new(0),
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Wire the OpenWeatherMap client and geocoder from configuration
    pub fn from_config(
        config: &WeatherDashConfig,
        sensor: Arc<dyn PositionSensor>,
        presenter: Arc<dyn PresentationPort>,
    ) -> Result<Self> {
        let geocoder = Arc::new(OpenWeatherGeocoder::new(config)?);
        let source = Arc::new(OpenWeatherClient::new(config)?);

        let resolver =
            LocationResolver::new(sensor, geocoder, PositionOptions::from(&config.location));
        let fetcher =
            WeatherFetcher::new(source).with_optional_timeout(config.api.optional_timeout());

        Ok(Self::new(
            resolver,
            fetcher,
            ViewModelBuilder::new(config.display.units),
            presenter,
            config.location.default_city.clone(),
        ))
    }

    #[must_use]
    pub fn default_city(&self) -> &str {
        &self.default_city
    }

    /// First load: try the device position, fall back to the default city
    pub async fn load_initial(&self) -> Result<CycleOutcome> {
        self.run_cycle(Target::Device).await
    }

    /// Re-resolve the device position on request
    pub async fn locate(&self) -> Result<CycleOutcome> {
        self.run_cycle(Target::Device).await
    }

    pub async fn change_city(&self, name: &str) -> Result<CycleOutcome> {
        self.run_cycle(Target::City(name.to_string())).await
    }

    /// Re-fetch the current coordinate, or the default city if none is loaded
    pub async fn refresh(&self) -> Result<CycleOutcome> {
        let coordinate = self.state.read().await.coordinate;
        match coordinate {
            Some(coordinate) => self.run_cycle(Target::Coordinate(coordinate)).await,
            None => self.run_cycle(Target::City(self.default_city.clone())).await,
        }
    }

    /// The view model currently on screen
    pub async fn current_view(&self) -> Option<ViewModel> {
        self.state.read().await.view.clone()
    }

    /// The background theme currently in effect
    pub async fn current_theme(&self) -> Option<BackgroundTheme> {
        self.state.read().await.theme
    }

    pub async fn current_coordinate(&self) -> Option<Coordinate> {
        self.state.read().await.coordinate
    }

    #[instrument(skip(self))]
    pub async fn run_cycle(&self, target: Target) -> Result<CycleOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let start_time = Instant::now();
        debug!("Starting cycle {} for {:?}", generation, target);

        let is_default = self.targets_default(&target).await;
        let result = match self.load(&target).await {
            Ok((coordinate, bundle)) => {
                self.apply(generation, is_default, coordinate, bundle).await
            }
            Err(e) if e.is_recoverable() && !is_default => self.fall_back(generation, &e).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(CycleOutcome::Applied(view)) => info!(
                "Cycle {} applied for {} in {:?}",
                generation,
                view.location_label,
                start_time.elapsed()
            ),
            Ok(CycleOutcome::Superseded) => {
                debug!("Cycle {} superseded by a newer request", generation);
            }
            Err(e) => {
                error!("Cycle {} failed: {}", generation, e);
                if self.is_current(generation) {
                    self.presenter.notify(&Notice::error(e.user_message()));
                }
            }
        }

        result
    }

    async fn load(&self, target: &Target) -> Result<(Coordinate, RawWeatherBundle)> {
        let coordinate = match target {
            Target::Device => self.resolver.resolve_by_device().await?,
            Target::City(name) => self.resolver.resolve_by_name(name).await?,
            Target::Coordinate(coordinate) => *coordinate,
        };
        let bundle = self.fetcher.fetch(coordinate).await?;
        Ok((coordinate, bundle))
    }

    async fn fall_back(&self, generation: u64, cause: &WeatherDashError) -> Result<CycleOutcome> {
        if !self.is_current(generation) {
            return Ok(CycleOutcome::Superseded);
        }

        warn!(
            "Falling back to default city {} after: {}",
            self.default_city, cause
        );
        self.presenter.notify(&fallback_notice(cause));

        let (coordinate, bundle) = self
            .load(&Target::City(self.default_city.clone()))
            .await?;
        self.apply(generation, true, coordinate, bundle).await
    }

    /// Whether `target` already is the default location; such a cycle has
    /// nothing to fall back to
    async fn targets_default(&self, target: &Target) -> bool {
        match target {
            Target::Device => false,
            Target::City(name) => {
                name.trim().to_lowercase() == self.default_city.trim().to_lowercase()
            }
            Target::Coordinate(coordinate) => {
                self.state.read().await.default_coordinate == Some(*coordinate)
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn apply(
        &self,
        generation: u64,
        is_default: bool,
        coordinate: Coordinate,
        bundle: RawWeatherBundle,
    ) -> Result<CycleOutcome> {
        let mut state = self.state.write().await;
        // checked under the write lock so two finishing cycles cannot interleave
        if !self.is_current(generation) {
            return Ok(CycleOutcome::Superseded);
        }

        let view = self.builder.build(&bundle);
        if view.theme.is_some() {
            state.theme = view.theme;
        }
        if is_default {
            state.default_coordinate = Some(coordinate);
        }
        state.coordinate = Some(coordinate);
        state.bundle = Some(bundle);
        state.view = Some(view.clone());

        self.presenter.render(&view, state.theme);
        Ok(CycleOutcome::Applied(view))
    }
}

fn fallback_notice(cause: &WeatherDashError) -> Notice {
    let message = cause.user_message();
    Notice::warning(format!(
        "{}. Using default location.",
        message.trim_end_matches('.')
    ))
}
