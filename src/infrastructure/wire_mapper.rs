// Mapper from backend JSON rows to domain types
use crate::application::telemetry_source::TelemetryError;
use crate::domain::telemetry::{ArucoPosition, EnviroSample, ImagerySnapshot, LogRow};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

/// `{ "error": bool, "data": ... }` wrapper used by every backend endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub error: bool,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Row payload, or the diagnostic as a [`TelemetryError::Server`].
    pub fn into_data(self) -> Result<Value, TelemetryError> {
        if self.error {
            let diagnostic = match self.data {
                Value::String(message) => message,
                other => other.to_string(),
            };
            return Err(TelemetryError::Server(diagnostic));
        }
        Ok(self.data)
    }
}

const ENVIRO_COLUMNS: usize = 8;
const LOG_COLUMNS: usize = 14;

pub fn enviro_rows(data: Value) -> Result<Vec<EnviroSample>, TelemetryError> {
    rows(data, "enviro")?
        .iter()
        .map(|cells| {
            let row = Row::new(cells, "enviro", ENVIRO_COLUMNS)?;
            Ok(EnviroSample::new(row.id(0)?, row.readings(1)?))
        })
        .collect()
}

/// `[ts, valve, aruco_id, x, y, gauge]`, or with `z` before the gauge.
pub fn imagery_row(data: Value) -> Result<Option<ImagerySnapshot>, TelemetryError> {
    let cells = match data {
        Value::Null => return Ok(None),
        Value::Array(cells) => cells,
        other => return Err(malformed("imagery", format!("expected row, got {other}"))),
    };
    let row = Row::new(&cells, "imagery", 6)?;
    let (z, gauge) = match cells.len() {
        6 => (None, row.float(5)?),
        7 => (row.float(5)?, row.float(6)?),
        n => return Err(malformed("imagery", format!("unexpected column count {n}"))),
    };

    Ok(Some(ImagerySnapshot {
        timestamp: row.timestamp(0)?,
        valve_open: row.boolean(1)?,
        aruco_id: row.int(2)?,
        aruco_position: ArucoPosition {
            x: row.float(3)?,
            y: row.float(4)?,
            z,
        },
        pressure_gauge: gauge,
    }))
}

pub fn log_rows(data: Value) -> Result<Vec<LogRow>, TelemetryError> {
    rows(data, "log")?
        .iter()
        .map(|cells| {
            let row = Row::new(cells, "log", LOG_COLUMNS)?;
            Ok(LogRow {
                id: row.id(0)?,
                readings: row.readings(1)?,
                valve_open: row.boolean(8)?,
                aruco_id: row.int(9)?,
                aruco_x: row.float(10)?,
                aruco_y: row.float(11)?,
                pressure_gauge: row.float(12)?,
                timestamp: row.timestamp(13)?,
            })
        })
        .collect()
}

fn rows(data: Value, kind: &'static str) -> Result<Vec<Vec<Value>>, TelemetryError> {
    serde_json::from_value(data).map_err(|e| malformed(kind, e.to_string()))
}

fn malformed(kind: &str, detail: impl std::fmt::Display) -> TelemetryError {
    TelemetryError::Malformed(format!("{kind} row: {detail}"))
}

struct Row<'a> {
    cells: &'a [Value],
    kind: &'static str,
}

impl<'a> Row<'a> {
    fn new(cells: &'a [Value], kind: &'static str, min_columns: usize) -> Result<Self, TelemetryError> {
        if cells.len() < min_columns {
            return Err(malformed(
                kind,
                format!("expected {min_columns} columns, got {}", cells.len()),
            ));
        }
        Ok(Self { cells, kind })
    }

    fn id(&self, idx: usize) -> Result<i64, TelemetryError> {
        self.int(idx)?
            .ok_or_else(|| malformed(self.kind, format!("column {idx}: missing id")))
    }

    fn int(&self, idx: usize) -> Result<Option<i64>, TelemetryError> {
        match &self.cells[idx] {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.bad(idx, "integer")),
            _ => Err(self.bad(idx, "integer")),
        }
    }

    fn float(&self, idx: usize) -> Result<Option<f64>, TelemetryError> {
        match &self.cells[idx] {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            _ => Err(self.bad(idx, "number")),
        }
    }

    fn boolean(&self, idx: usize) -> Result<Option<bool>, TelemetryError> {
        match &self.cells[idx] {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(*b)),
            Value::Number(n) if n.as_i64() == Some(0) => Ok(Some(false)),
            Value::Number(n) if n.as_i64() == Some(1) => Ok(Some(true)),
            _ => Err(self.bad(idx, "boolean")),
        }
    }

    fn readings(&self, first: usize) -> Result<[Option<f64>; 7], TelemetryError> {
        let mut readings = [None; 7];
        for (offset, reading) in readings.iter_mut().enumerate() {
            *reading = self.float(first + offset)?;
        }
        Ok(readings)
    }

    /// Accepts RFC 3339, the RFC 2822 form Flask emits, or epoch seconds.
    fn timestamp(&self, idx: usize) -> Result<Option<DateTime<Utc>>, TelemetryError> {
        match &self.cells[idx] {
            Value::Null => Ok(None),
            Value::String(raw) => DateTime::parse_from_rfc3339(raw)
                .or_else(|_| DateTime::parse_from_rfc2822(raw))
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|_| self.bad(idx, "timestamp")),
            Value::Number(n) => {
                let secs = n.as_f64().ok_or_else(|| self.bad(idx, "timestamp"))?;
                let millis = (secs * 1000.0).round() as i64;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .map(Some)
                    .ok_or_else(|| self.bad(idx, "timestamp"))
            }
            _ => Err(self.bad(idx, "timestamp")),
        }
    }

    fn bad(&self, idx: usize, expected: &str) -> TelemetryError {
        malformed(
            self.kind,
            format!("column {idx}: expected {expected}, got {}", self.cells[idx]),
        )
    }
}
