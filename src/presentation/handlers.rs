// HTTP request handlers
use crate::application::live_view::{LiveSnapshot, LiveViewError};
use crate::application::log_view::{LogRequest, LogTable, LogViewError};
use crate::application::preferences::{PreferencesError, PreferencesView};
use crate::domain::telemetry::Channel;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Deserialize)]
pub struct SeriesRequest {
    pub series: Vec<Channel>,
}

#[derive(Deserialize)]
pub struct CapacityRequest {
    pub capacity: usize,
}

#[derive(Deserialize)]
pub struct MuteRequest {
    pub muted: bool,
}

#[derive(Deserialize)]
pub struct RateRequest {
    pub rate_ms: u64,
}

#[derive(Serialize)]
pub struct VideoResponse {
    pub url: String,
}

/// Error in the same `{error, data}` envelope the rover backend uses
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": true, "data": self.message }))).into_response()
    }
}

impl From<LiveViewError> for ApiError {
    fn from(e: LiveViewError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: e.to_string(),
        }
    }
}

impl From<PreferencesError> for ApiError {
    fn from(e: PreferencesError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: e.to_string(),
        }
    }
}

impl From<LogViewError> for ApiError {
    fn from(e: LogViewError) -> Self {
        let status = match e {
            LogViewError::Fetch(_) => StatusCode::BAD_GATEWAY,
            LogViewError::InvalidTime(_) | LogViewError::ZeroLimit => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Chart series, imagery card and feed location
pub async fn live_snapshot(State(state): State<Arc<AppState>>) -> Json<LiveSnapshot> {
    Json(state.live_view.snapshot())
}

pub async fn select_series(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SeriesRequest>,
) -> Json<Vec<Channel>> {
    state.live_view.select_series(request.series);
    Json(state.live_view.selected_series())
}

pub async fn set_capacity(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CapacityRequest>,
) -> Result<StatusCode, ApiError> {
    state.live_view.set_capacity(request.capacity)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_preferences(State(state): State<Arc<AppState>>) -> Json<PreferencesView> {
    Json(state.preferences.view())
}

pub async fn toggle_mute(State(state): State<Arc<AppState>>) -> Json<PreferencesView> {
    state.preferences.toggle_mute();
    Json(state.preferences.view())
}

pub async fn set_mute(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MuteRequest>,
) -> Json<PreferencesView> {
    state.preferences.set_muted(request.muted);
    Json(state.preferences.view())
}

pub async fn set_rate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RateRequest>,
) -> Result<Json<PreferencesView>, ApiError> {
    state
        .preferences
        .set_poll_rate(Duration::from_millis(request.rate_ms))?;
    Ok(Json(state.preferences.view()))
}

/// Raw log table; fetched from the backend on every request
pub async fn logs(
    Query(request): Query<LogRequest>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<LogTable>, ApiError> {
    match state.log_view.refresh(&request).await {
        Ok(table) => Ok(Json(table)),
        Err(e) => {
            tracing::warn!(error = %e, "log refresh failed");
            Err(e.into())
        }
    }
}

pub async fn video(State(state): State<Arc<AppState>>) -> Json<VideoResponse> {
    Json(VideoResponse {
        url: state.live_view.video_url(),
    })
}
