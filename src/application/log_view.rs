// Log view - on-demand raw log table over /data/all
use crate::application::telemetry_source::{LogQuery, TelemetryError, TelemetrySource};
use crate::domain::telemetry::{Channel, LogRow};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LogRequest {
    pub start: Option<String>,
    pub end: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum LogViewError {
    #[error("invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),

    #[error("limit must be at least 1")]
    ZeroLimit,

    #[error(transparent)]
    Fetch(#[from] TelemetryError),
}

#[derive(Debug, Serialize)]
pub struct LogTable {
    pub start: String,
    pub end: String,
    pub limit: u32,
    pub rows: Vec<LogTableRow>,
}

/// One rendered table row. Empty strings stand in for absent values.
#[derive(Debug, Serialize, PartialEq)]
pub struct LogTableRow {
    pub id: i64,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub light: Option<f64>,
    pub oxidised: Option<f64>,
    pub reduced: Option<f64>,
    pub ammonia: Option<f64>,
    pub valve_state: String,
    pub aruco_id: Option<i64>,
    pub aruco_position: String,
    pub pressure_gauge: Option<f64>,
    pub timestamp: String,
}

impl From<LogRow> for LogTableRow {
    fn from(row: LogRow) -> Self {
        let valve_state = match row.valve_open {
            Some(true) => "Open",
            Some(false) => "Closed",
            None => "",
        };
        let aruco_position = match row.aruco_id {
            Some(_) => format!("({}, {})", display(row.aruco_x), display(row.aruco_y)),
            None => String::new(),
        };
        let reading = |channel: Channel| row.readings[channel.index()];

        Self {
            id: row.id,
            temperature: reading(Channel::Temperature),
            pressure: reading(Channel::Pressure),
            humidity: reading(Channel::Humidity),
            light: reading(Channel::Light),
            oxidised: reading(Channel::Oxidised),
            reduced: reading(Channel::Reduced),
            ammonia: reading(Channel::Ammonia),
            valve_state: valve_state.to_string(),
            aruco_id: row.aruco_id,
            aruco_position,
            pressure_gauge: row.pressure_gauge,
            timestamp: row.timestamp.map(|t| t.to_rfc3339()).unwrap_or_default(),
        }
    }
}

fn display(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[derive(Clone)]
pub struct LogView {
    source: Arc<dyn TelemetrySource>,
    default_limit: u32,
}

impl LogView {
    pub fn new(source: Arc<dyn TelemetrySource>, default_limit: u32) -> Self {
        Self {
            source,
            default_limit,
        }
    }

    pub async fn refresh(&self, request: &LogRequest) -> Result<LogTable, LogViewError> {
        let now = chrono::Local::now().time();
        let query = self.resolve(request, now)?;
        let rows = self.source.fetch_logs(&query).await?;
        tracing::debug!(rows = rows.len(), limit = query.limit, "log table refreshed");

        Ok(LogTable {
            start: query.start.format(LogQuery::TIME_FORMAT).to_string(),
            end: query.end.format(LogQuery::TIME_FORMAT).to_string(),
            limit: query.limit,
            rows: rows.into_iter().map(LogTableRow::from).collect(),
        })
    }

    /// Fills unset fields: both times default to `now` (minute precision).
    pub fn resolve(&self, request: &LogRequest, now: NaiveTime) -> Result<LogQuery, LogViewError> {
        let now = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        let limit = request.limit.unwrap_or(self.default_limit);
        if limit == 0 {
            return Err(LogViewError::ZeroLimit);
        }

        Ok(LogQuery {
            start: parse_time(request.start.as_deref())?.unwrap_or(now),
            end: parse_time(request.end.as_deref())?.unwrap_or(now),
            limit,
        })
    }
}

fn parse_time(value: Option<&str>) -> Result<Option<NaiveTime>, LogViewError> {
    match value {
        None => Ok(None),
        Some(raw) => NaiveTime::parse_from_str(raw, LogQuery::TIME_FORMAT)
            .map(Some)
            .map_err(|_| LogViewError::InvalidTime(raw.to_string())),
    }
}
