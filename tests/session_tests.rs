//! End-to-end dashboard cycles against in-memory ports

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use weatherdash::api::{ApiDashboard, ApiError, ApiUser, AppState};
use weatherdash::models::{
    AirQuality, BackgroundTheme, Category, CurrentConditions, ForecastPoint, ForecastSeries,
    GeocodingCandidate,
};
use weatherdash::presentation::NoticeLevel;
use weatherdash::{
    Coordinate, CycleOutcome, DashboardSession, Geocoder, LocationResolver, PositionOptions,
    PositionSensor, PreferenceStore, RecordingPresenter, RequiredCall, Result, ViewModelBuilder,
    WeatherDashError, WeatherFetcher, WeatherSource, web,
};

struct City {
    name: &'static str,
    country: &'static str,
    coordinate: Coordinate,
    delay: Duration,
    category: Category,
}

fn cities() -> Vec<City> {
    vec![
        City {
            name: "New York",
            country: "US",
            coordinate: Coordinate::new(40.7128, -74.006),
            delay: Duration::ZERO,
            category: Category::Clear,
        },
        City {
            name: "Slowtown",
            country: "SL",
            coordinate: Coordinate::new(1.0, 1.0),
            delay: Duration::from_millis(300),
            category: Category::Snow,
        },
        City {
            name: "Fasttown",
            country: "FT",
            coordinate: Coordinate::new(2.0, 2.0),
            delay: Duration::ZERO,
            category: Category::Thunderstorm,
        },
    ]
}

struct DeniedSensor;

#[async_trait]
impl PositionSensor for DeniedSensor {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self, _options: &PositionOptions) -> Result<Coordinate> {
        Err(WeatherDashError::LocationPermissionDenied)
    }
}

struct FixedSensor(Coordinate);

#[async_trait]
impl PositionSensor for FixedSensor {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self, _options: &PositionOptions) -> Result<Coordinate> {
        Ok(self.0)
    }
}

struct TableGeocoder;

#[async_trait]
impl Geocoder for TableGeocoder {
    async fn lookup(&self, name: &str, _limit: u8) -> Result<Vec<GeocodingCandidate>> {
        Ok(cities()
            .into_iter()
            .filter(|city| city.name.eq_ignore_ascii_case(name))
            .map(|city| GeocodingCandidate {
                name: city.name.to_string(),
                country: Some(city.country.to_string()),
                state: None,
                coordinate: city.coordinate,
            })
            .collect())
    }
}

#[derive(Default)]
struct TableSource {
    failing_forecast: Vec<&'static str>,
    uv: Option<f64>,
}

impl TableSource {
    fn city(coordinate: Coordinate) -> Result<City> {
        cities()
            .into_iter()
            .find(|city| city.coordinate == coordinate)
            .ok_or_else(|| WeatherDashError::api("HTTP 404 city not found"))
    }
}

#[async_trait]
impl WeatherSource for TableSource {
    async fn current(&self, coordinate: Coordinate) -> Result<CurrentConditions> {
        let city = Self::city(coordinate)?;
        tokio::time::sleep(city.delay).await;
        Ok(CurrentConditions {
            place_name: city.name.to_string(),
            country: city.country.to_string(),
            coordinate: Some(coordinate),
            temperature: 24.6,
            feels_like: 25.0,
            humidity: 41.0,
            wind_speed: 10.0,
            wind_direction: 90.0,
            category: city.category,
            description: "broken clouds".to_string(),
            sunrise: DateTime::<Utc>::from_timestamp(1_699_990_000, 0),
            sunset: DateTime::<Utc>::from_timestamp(1_700_020_000, 0),
            observed_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
            utc_offset_seconds: 0,
        })
    }

    async fn forecast(&self, coordinate: Coordinate) -> Result<ForecastSeries> {
        let city = Self::city(coordinate)?;
        if self.failing_forecast.contains(&city.name) {
            return Err(WeatherDashError::api("HTTP 500 Internal Server Error"));
        }
        let points = [(0.2, Some(5.0)), (0.4, Some(3.0)), (0.6, None)]
            .into_iter()
            .enumerate()
            .map(|(i, (pop, rain))| ForecastPoint {
                timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000 + i as i64 * 10_800, 0)
                    .unwrap(),
                temperature: 20.0,
                pop,
                rain_3h: rain,
                snow_3h: None,
                category: Category::Rain,
            })
            .collect();
        Ok(ForecastSeries::new(points))
    }

    async fn air_quality(&self, _coordinate: Coordinate) -> Result<Option<AirQuality>> {
        Err(WeatherDashError::api("HTTP 503 Service Unavailable"))
    }

    async fn uv_index(&self, _coordinate: Coordinate) -> Result<f64> {
        self.uv
            .ok_or_else(|| WeatherDashError::api("HTTP 404 no uv data"))
    }
}

fn session_with(
    sensor: Arc<dyn PositionSensor>,
    source: TableSource,
    presenter: Arc<RecordingPresenter>,
) -> DashboardSession {
    let resolver = LocationResolver::new(
        sensor,
        Arc::new(TableGeocoder),
        PositionOptions {
            timeout: Duration::from_millis(200),
            ..PositionOptions::default()
        },
    );
    let fetcher = WeatherFetcher::new(Arc::new(source))
        .with_optional_timeout(Duration::from_millis(100));
    DashboardSession::new(
        resolver,
        fetcher,
        ViewModelBuilder::default(),
        presenter,
        "New York",
    )
}

#[tokio::test]
async fn test_denied_device_falls_back_to_default_city() {
    let presenter = Arc::new(RecordingPresenter::new());
    let session = session_with(Arc::new(DeniedSensor), TableSource::default(), presenter.clone());

    let outcome = session.load_initial().await.unwrap();
    let view = outcome.view().unwrap();
    assert_eq!(view.location_label, "New York, US");

    let snapshot = presenter.take_snapshot();
    assert_eq!(snapshot.notices.len(), 1);
    assert_eq!(snapshot.notices[0].level, NoticeLevel::Warning);
    assert_eq!(
        snapshot.notices[0].message,
        "Location access denied. Using default location."
    );
    assert_eq!(snapshot.view.as_ref(), Some(view));
}

#[tokio::test]
async fn test_device_fix_builds_full_view() {
    let presenter = Arc::new(RecordingPresenter::new());
    let session = session_with(
        Arc::new(FixedSensor(Coordinate::new(2.0, 2.0))),
        TableSource {
            uv: Some(7.0),
            ..Default::default()
        },
        presenter.clone(),
    );

    let view = session.locate().await.unwrap().view().cloned().unwrap();

    assert_eq!(view.location_label, "Fasttown, FT");
    assert_eq!(view.temperature, 25);
    assert_eq!(view.description, "Broken clouds");
    assert_eq!(view.icon, "thunderstorm");
    assert_eq!(view.wind_speed, 36);
    assert_eq!(view.humidity, 41);
    assert_eq!(view.precipitation_label, "0.8 cm");
    assert_eq!(view.rain_chance, 40);
    assert_eq!(view.feels_like_position, 50.0);
    assert_eq!(view.uv_label, "7");
    assert_eq!(view.hourly.len(), 3);
    assert_eq!(view.hourly[0].label, "Now");
    assert!(view.is_daytime);
    assert_eq!(view.theme, Some(BackgroundTheme::Stormy));
    assert!(presenter.take_snapshot().notices.is_empty());
}

#[tokio::test]
async fn test_missing_optional_data_is_absent() {
    let presenter = Arc::new(RecordingPresenter::new());
    let session = session_with(Arc::new(DeniedSensor), TableSource::default(), presenter);

    let view = session.change_city("Fasttown").await.unwrap().view().cloned().unwrap();
    assert_eq!(view.uv_index, None);
    assert_eq!(view.uv_tier, None);
}

#[tokio::test]
async fn test_stale_cycle_does_not_overwrite_newer_one() {
    let presenter = Arc::new(RecordingPresenter::new());
    let session = session_with(Arc::new(DeniedSensor), TableSource::default(), presenter);

    let (slow, fast) = tokio::join!(session.change_city("Slowtown"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.change_city("Fasttown").await
    });

    assert_eq!(slow.unwrap(), CycleOutcome::Superseded);
    assert!(matches!(fast.unwrap(), CycleOutcome::Applied(_)));

    let view = session.current_view().await.unwrap();
    assert_eq!(view.location_label, "Fasttown, FT");
    assert_eq!(session.current_coordinate().await, Some(Coordinate::new(2.0, 2.0)));
}

#[tokio::test]
async fn test_unknown_city_falls_back_with_notice() {
    let presenter = Arc::new(RecordingPresenter::new());
    let session = session_with(Arc::new(DeniedSensor), TableSource::default(), presenter.clone());

    let view = session.change_city("Atlantis").await.unwrap().view().cloned().unwrap();
    assert_eq!(view.location_label, "New York, US");

    let notices = presenter.take_snapshot().notices;
    assert_eq!(
        notices[0].message,
        "No city named 'Atlantis' was found. Using default location."
    );
}

#[tokio::test]
async fn test_required_failure_falls_back_then_reports_call() {
    let presenter = Arc::new(RecordingPresenter::new());
    let session = session_with(
        Arc::new(DeniedSensor),
        TableSource {
            failing_forecast: vec!["Fasttown", "New York"],
            ..Default::default()
        },
        presenter.clone(),
    );

    let err = session.change_city("Fasttown").await.unwrap_err();
    assert!(matches!(
        err,
        WeatherDashError::FetchFailed {
            call: RequiredCall::Forecast,
            ..
        }
    ));
    assert!(session.current_view().await.is_none());

    let notices = presenter.take_snapshot().notices;
    assert_eq!(notices.len(), 2);
    assert_eq!(
        notices[0].message,
        "Failed to fetch weather data. Please check your API key. Using default location."
    );
    assert_eq!(notices[1].level, NoticeLevel::Error);
    assert_eq!(
        notices[1].message,
        "Failed to fetch weather data. Please check your API key."
    );
}

#[tokio::test]
async fn test_fetch_failure_falls_back_with_warning() {
    let presenter = Arc::new(RecordingPresenter::new());
    let session = session_with(
        Arc::new(DeniedSensor),
        TableSource {
            failing_forecast: vec!["Fasttown"],
            ..Default::default()
        },
        presenter.clone(),
    );

    let outcome = session.change_city("Fasttown").await.unwrap();
    assert_eq!(outcome.view().unwrap().location_label, "New York, US");

    let snapshot = presenter.take_snapshot();
    assert_eq!(snapshot.notices.len(), 1);
    assert_eq!(snapshot.notices[0].level, NoticeLevel::Warning);
    assert_eq!(
        snapshot.notices[0].message,
        "Failed to fetch weather data. Please check your API key. Using default location."
    );
}

#[tokio::test]
async fn test_default_city_failure_is_reported_once() {
    let presenter = Arc::new(RecordingPresenter::new());
    let session = session_with(
        Arc::new(DeniedSensor),
        TableSource {
            failing_forecast: vec!["New York"],
            ..Default::default()
        },
        presenter.clone(),
    );

    let err = session.change_city("new york").await.unwrap_err();
    assert!(matches!(err, WeatherDashError::FetchFailed { .. }));

    let notices = presenter.take_snapshot().notices;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_refresh_keeps_current_location() {
    let presenter = Arc::new(RecordingPresenter::new());
    let session = session_with(Arc::new(DeniedSensor), TableSource::default(), presenter);

    session.change_city("Fasttown").await.unwrap();
    let view = session.refresh().await.unwrap().view().cloned().unwrap();
    assert_eq!(view.location_label, "Fasttown, FT");
}

async fn spawn_api() -> (String, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let presenter = Arc::new(RecordingPresenter::new());
    let session = Arc::new(session_with(
        Arc::new(DeniedSensor),
        TableSource::default(),
        presenter.clone(),
    ));
    let preferences = Arc::new(PreferenceStore::open(dir.path()).unwrap());

    let app = web::app(AppState {
        session,
        presenter,
        preferences,
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/api"), dir)
}

#[tokio::test]
async fn test_api_weather_and_city() {
    let (base, _dir) = spawn_api().await;
    let client = reqwest::Client::new();

    let dashboard: ApiDashboard = client
        .get(format!("{base}/weather"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(dashboard.applied);
    assert_eq!(dashboard.view.unwrap().location_label, "New York, US");
    assert_eq!(dashboard.notices.len(), 1);

    let response = client
        .post(format!("{base}/city"))
        .json(&HashMap::from([("name", "Fasttown")]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let dashboard: ApiDashboard = response.json().await.unwrap();
    assert_eq!(dashboard.view.unwrap().location_label, "Fasttown, FT");
    assert_eq!(dashboard.theme, Some(BackgroundTheme::Stormy));
    assert!(dashboard.notices.is_empty());

    let response = client
        .post(format!("{base}/city"))
        .json(&HashMap::from([("name", "  ")]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let error: ApiError = response.json().await.unwrap();
    assert_eq!(error.error, "Invalid input: Please enter a city name");
}

#[tokio::test]
async fn test_api_user_preferences() {
    let (base, _dir) = spawn_api().await;
    let client = reqwest::Client::new();

    let user: ApiUser = client
        .get(format!("{base}/user"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(user.name, "User");

    let user: ApiUser = client
        .put(format!("{base}/user"))
        .json(&HashMap::from([("name", " Ada ")]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(user.name, "Ada");

    let response = client
        .put(format!("{base}/user"))
        .json(&HashMap::from([("name", "")]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}
