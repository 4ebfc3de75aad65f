//! Feature computation from channel windows.
//!
//! Every channel window is reduced to four statistics, which are then
//! concatenated in [`Channel::ALL`] order:
//!
//! ```text
//! [ accel_x: last, mean, std, median | accel_y: ... | ... | gyro_z: ... ]
//! ```
//!
//! The resulting 28-element layout is exactly what the classifier was
//! trained on. Reordering it produces wrong predictions without any error.

use crate::core::buffer::ChannelBuffers;
use crate::core::channel::{Channel, CHANNEL_COUNT};
use serde::{Deserialize, Serialize};

/// Number of statistics emitted per channel.
pub const FEATURES_PER_CHANNEL: usize = 4;

/// Length of the classifier input vector.
pub const FEATURE_VECTOR_LEN: usize = FEATURES_PER_CHANNEL * CHANNEL_COUNT;

/// Statistics for a single channel window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelFeatures {
    /// Newest sample in the window
    pub last: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation (divides by n)
    pub std_dev: f64,
    /// Element at index `n / 2` of the sorted window
    pub median: f64,
}

impl ChannelFeatures {
    /// Statistics in feature-vector order.
    pub fn to_array(self) -> [f64; FEATURES_PER_CHANNEL] {
        [self.last, self.mean, self.std_dev, self.median]
    }
}

/// The ordered classifier input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_VECTOR_LEN]);

impl FeatureVector {
    pub fn from_array(values: [f64; FEATURE_VECTOR_LEN]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// The four statistics belonging to `channel`.
    pub fn channel(&self, channel: Channel) -> ChannelFeatures {
        let start = channel.index() * FEATURES_PER_CHANNEL;
        let slice = &self.0[start..start + FEATURES_PER_CHANNEL];
        ChannelFeatures {
            last: slice[0],
            mean: slice[1],
            std_dev: slice[2],
            median: slice[3],
        }
    }

    /// Feature values keyed by `<channel>_<statistic>`, in vector order.
    pub fn named(&self) -> Vec<(String, f64)> {
        Channel::ALL
            .iter()
            .flat_map(|&channel| {
                let stats = self.channel(channel).to_array();
                ["last", "mean", "std", "median"]
                    .into_iter()
                    .zip(stats)
                    .map(move |(stat, value)| (format!("{}_{stat}", channel.name()), value))
            })
            .collect()
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// Compute the statistics of a single channel window.
///
/// Windows shorter than the configured size still produce values, but the
/// pipeline only calls this on full windows. An empty window yields zeros.
pub fn compute_channel_features(window: &[f64]) -> ChannelFeatures {
    let Some(&last) = window.last() else {
        return ChannelFeatures::default();
    };

    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n;

    ChannelFeatures {
        last,
        mean,
        std_dev: variance.sqrt(),
        median: upper_median(window),
    }
}

/// Element at index `len / 2` of the ascending-sorted window.
///
/// For even lengths this is the upper of the two middle values, not their
/// average.
fn upper_median(window: &[f64]) -> f64 {
    let mut sorted = window.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted[sorted.len() / 2]
}

/// Build the feature vector from the current channel windows.
pub fn compute_features(buffers: &ChannelBuffers) -> FeatureVector {
    let mut values = [0.0; FEATURE_VECTOR_LEN];

    for (channel, buffer) in buffers.iter() {
        let window = buffer.snapshot();
        let start = channel.index() * FEATURES_PER_CHANNEL;
        values[start..start + FEATURES_PER_CHANNEL]
            .copy_from_slice(&compute_channel_features(&window).to_array());
    }

    FeatureVector(values)
}
