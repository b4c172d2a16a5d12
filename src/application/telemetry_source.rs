// Source trait for rover telemetry access
use crate::domain::telemetry::{EnviroSample, ImagerySnapshot, LogRow};
use async_trait::async_trait;
use chrono::NaiveTime;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend reported an error: {0}")]
    Server(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Time-of-day window and row limit for the raw log table.
#[derive(Debug, Clone, PartialEq)]
pub struct LogQuery {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub limit: u32,
}

impl LogQuery {
    pub const TIME_FORMAT: &'static str = "%H:%M";
}

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Enviro rows with id strictly greater than `start`, oldest first
    async fn fetch_enviro(&self, start: i64) -> Result<Vec<EnviroSample>, TelemetryError>;

    /// Latest imagery row; `None` when the backend has nothing to report
    async fn fetch_imagery(&self) -> Result<Option<ImagerySnapshot>, TelemetryError>;

    /// Combined rows for the log table
    async fn fetch_logs(&self, query: &LogQuery) -> Result<Vec<LogRow>, TelemetryError>;

    /// Location of the camera stream; never fetched by this service
    fn video_url(&self) -> Url;
}
