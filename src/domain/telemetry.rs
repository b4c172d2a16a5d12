// Telemetry data domain models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Environmental channels reported by the enviro board, in wire and display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Temperature,
    Pressure,
    Humidity,
    Light,
    Oxidised,
    Reduced,
    Ammonia,
}

impl Channel {
    pub const ALL: [Channel; 7] = [
        Channel::Temperature,
        Channel::Pressure,
        Channel::Humidity,
        Channel::Light,
        Channel::Oxidised,
        Channel::Reduced,
        Channel::Ammonia,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Serialized name, as used in config and the API.
    pub fn key(self) -> &'static str {
        match self {
            Channel::Temperature => "temperature",
            Channel::Pressure => "pressure",
            Channel::Humidity => "humidity",
            Channel::Light => "light",
            Channel::Oxidised => "oxidised",
            Channel::Reduced => "reduced",
            Channel::Ammonia => "ammonia",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Temperature => "Temperature",
            Channel::Pressure => "Pressure",
            Channel::Humidity => "Humidity",
            Channel::Light => "Light",
            Channel::Oxidised => "Oxidised",
            Channel::Reduced => "Reduced",
            Channel::Ammonia => "Ammonia",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Channel::Temperature | Channel::Ammonia => "rgba(255, 99, 132, 1)",
            Channel::Pressure => "rgba(54, 162, 235, 1)",
            Channel::Humidity => "rgba(255, 206, 86, 1)",
            Channel::Light => "rgba(75, 192, 192, 1)",
            Channel::Oxidised => "rgba(153, 102, 255, 1)",
            Channel::Reduced => "rgba(255, 159, 64, 1)",
        }
    }
}

/// One row from `/data/enviro`. Readings are indexed by [`Channel::index`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnviroSample {
    pub id: i64,
    pub readings: [Option<f64>; 7],
}

impl EnviroSample {
    pub fn new(id: i64, readings: [Option<f64>; 7]) -> Self {
        Self { id, readings }
    }

    pub fn reading(&self, channel: Channel) -> Option<f64> {
        self.readings[channel.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArucoPosition {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

/// Latest imaging/manipulator state from `/data/imagery`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagerySnapshot {
    pub timestamp: Option<DateTime<Utc>>,
    pub valve_open: Option<bool>,
    pub aruco_id: Option<i64>,
    pub aruco_position: ArucoPosition,
    pub pressure_gauge: Option<f64>,
}

/// Combined row from `/data/all`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub id: i64,
    pub readings: [Option<f64>; 7],
    pub valve_open: Option<bool>,
    pub aruco_id: Option<i64>,
    pub aruco_x: Option<f64>,
    pub aruco_y: Option<f64>,
    pub pressure_gauge: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub id: i64,
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn new(id: i64, value: Option<f64>) -> Self {
        Self { id, value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    pub channel: Channel,
    pub label: &'static str,
    pub color: &'static str,
    pub points: Vec<SeriesPoint>,
}

impl SeriesData {
    pub fn new(channel: Channel, points: Vec<SeriesPoint>) -> Self {
        Self {
            channel,
            label: channel.label(),
            color: channel.color(),
            points,
        }
    }
}
