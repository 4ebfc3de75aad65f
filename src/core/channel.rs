//! The fixed set of scalar channels fed to the feature extractor.
//!
//! Channel order is part of the classifier input contract: the feature
//! vector is laid out channel by channel in exactly this order.

use serde::{Deserialize, Serialize};

/// Number of channels tracked by the pipeline.
pub const CHANNEL_COUNT: usize = 7;

/// A single scalar time series derived from the motion sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    AccelX,
    AccelY,
    AccelZ,
    /// Euclidean norm of the acceleration vector
    AccelNorm,
    GyroX,
    GyroY,
    GyroZ,
}

impl Channel {
    /// All channels in feature-vector order.
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::AccelX,
        Channel::AccelY,
        Channel::AccelZ,
        Channel::AccelNorm,
        Channel::GyroX,
        Channel::GyroY,
        Channel::GyroZ,
    ];

    /// Position of this channel in the feature vector layout.
    pub fn index(self) -> usize {
        match self {
            Channel::AccelX => 0,
            Channel::AccelY => 1,
            Channel::AccelZ => 2,
            Channel::AccelNorm => 3,
            Channel::GyroX => 4,
            Channel::GyroY => 5,
            Channel::GyroZ => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::AccelX => "accel_x",
            Channel::AccelY => "accel_y",
            Channel::AccelZ => "accel_z",
            Channel::AccelNorm => "accel_norm",
            Channel::GyroX => "gyro_x",
            Channel::GyroY => "gyro_y",
            Channel::GyroZ => "gyro_z",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
