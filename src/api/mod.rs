//! JSON HTTP adapter over a [`DashboardSession`]

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::WeatherDashError;
use crate::models::{BackgroundTheme, ViewModel};
use crate::preferences::PreferenceStore;
use crate::presentation::{Notice, RecordingPresenter};
use crate::session::{CycleOutcome, DashboardSession};

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<DashboardSession>,
    pub presenter: Arc<RecordingPresenter>,
    pub preferences: Arc<PreferenceStore>,
}

#[derive(Serialize, Deserialize)]
pub struct ApiDashboard {
    /// False when a newer request replaced this one before it finished
    pub applied: bool,
    pub view: Option<ViewModel>,
    pub theme: Option<BackgroundTheme>,
    pub notices: Vec<Notice>,
}

#[derive(Serialize, Deserialize)]
pub struct ApiCity {
    pub name: String,
}

#[derive(Serialize, Deserialize)]
pub struct ApiUser {
    pub name: String,
}

#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

pub struct ApiFailure(WeatherDashError);

impl From<WeatherDashError> for ApiFailure {
    fn from(e: WeatherDashError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WeatherDashError::Validation { .. } => StatusCode::BAD_REQUEST,
            WeatherDashError::CityNotFound { .. } => StatusCode::NOT_FOUND,
            WeatherDashError::Config { .. }
            | WeatherDashError::Preferences { .. }
            | WeatherDashError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        let body = ApiError {
            error: self.0.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiFailure>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather", get(get_weather))
        .route("/refresh", post(refresh))
        .route("/city", post(change_city))
        .route("/locate", post(locate))
        .route("/user", get(get_user).put(put_user))
        .with_state(state)
}

fn dashboard(state: &AppState, applied: bool) -> ApiDashboard {
    let snapshot = state.presenter.take_snapshot();
    ApiDashboard {
        applied,
        view: snapshot.view,
        theme: snapshot.theme,
        notices: snapshot.notices,
    }
}

fn outcome(state: &AppState, result: crate::Result<CycleOutcome>) -> ApiResult<ApiDashboard> {
    let applied = matches!(result?, CycleOutcome::Applied(_));
    Ok(Json(dashboard(state, applied)))
}

async fn get_weather(State(state): State<AppState>) -> ApiResult<ApiDashboard> {
    if state.session.current_view().await.is_none() {
        let result = state.session.load_initial().await;
        return outcome(&state, result);
    }
    Ok(Json(dashboard(&state, true)))
}

async fn refresh(State(state): State<AppState>) -> ApiResult<ApiDashboard> {
    let result = state.session.refresh().await;
    outcome(&state, result)
}

async fn change_city(
    State(state): State<AppState>,
    Json(payload): Json<ApiCity>,
) -> ApiResult<ApiDashboard> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(WeatherDashError::validation("Please enter a city name").into());
    }
    let result = state.session.change_city(name).await;
    outcome(&state, result)
}

async fn locate(State(state): State<AppState>) -> ApiResult<ApiDashboard> {
    let result = state.session.locate().await;
    outcome(&state, result)
}

async fn get_user(State(state): State<AppState>) -> ApiResult<ApiUser> {
    let name = state.preferences.display_name().await?;
    Ok(Json(ApiUser { name }))
}

async fn put_user(
    State(state): State<AppState>,
    Json(payload): Json<ApiUser>,
) -> ApiResult<ApiUser> {
    let name = state.preferences.set_display_name(&payload.name).await?;
    Ok(Json(ApiUser { name }))
}
