//! Motion sensor reading types.
//!
//! Accelerations are in g, rotation rates in rad/s. Timestamps travel with
//! each reading but the pipeline only consumes the three components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which sensor produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Linear acceleration (accelerometer)
    Acceleration,
    /// Angular velocity (gyroscope)
    RotationRate,
}

impl SensorKind {
    pub fn name(self) -> &'static str {
        match self {
            SensorKind::Acceleration => "accelerometer",
            SensorKind::RotationRate => "gyroscope",
        }
    }
}

/// A timestamped three-axis reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// When the reading was taken
    pub timestamp: DateTime<Utc>,
    /// Source sensor
    pub kind: SensorKind,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SensorReading {
    /// An accelerometer reading taken now.
    pub fn acceleration(x: f64, y: f64, z: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: SensorKind::Acceleration,
            x,
            y,
            z,
        }
    }

    /// A gyroscope reading taken now.
    pub fn rotation_rate(x: f64, y: f64, z: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: SensorKind::RotationRate,
            x,
            y,
            z,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
