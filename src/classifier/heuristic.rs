//! Rule-based fallback classifier.
//!
//! Scores each activity by its distance to a hand-tuned prototype in a
//! small descriptor space derived from the feature vector, then softmaxes
//! the scores. Deterministic and dependency-free, so the pipeline works
//! end to end without a trained network.

use crate::classifier::{softmax, Classifier, ClassifierError};
use crate::core::channel::Channel;
use crate::core::features::FeatureVector;
use crate::core::labels::{ActivityLabel, ClassProbabilities};

/// Compact summary of a feature vector used for prototype matching.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Descriptor {
    /// Std of the acceleration norm (g)
    motion: f64,
    /// Mean std of the three rotation axes (rad/s)
    rotation: f64,
    /// Share of gravity on the z axis (0 = upright, 1 = lying flat)
    posture: f64,
    /// Mean minus median of the acceleration norm
    skew: f64,
}

impl Descriptor {
    fn from_features(features: &FeatureVector) -> Self {
        let norm = features.channel(Channel::AccelNorm);
        let z = features.channel(Channel::AccelZ);

        let rotation = [Channel::GyroX, Channel::GyroY, Channel::GyroZ]
            .iter()
            .map(|&c| features.channel(c).std_dev)
            .sum::<f64>()
            / 3.0;

        let posture = if norm.mean > 1e-9 {
            (z.mean.abs() / norm.mean).min(1.0)
        } else {
            0.0
        };

        Self {
            motion: norm.std_dev,
            rotation,
            posture,
            skew: norm.mean - norm.median,
        }
    }

    fn distance_sq(&self, other: &Descriptor) -> f64 {
        let d_motion = (self.motion - other.motion) / MOTION_SCALE;
        let d_rotation = (self.rotation - other.rotation) / ROTATION_SCALE;
        let d_posture = (self.posture - other.posture) / POSTURE_SCALE;
        let d_skew = (self.skew - other.skew) / SKEW_SCALE;
        d_motion * d_motion + d_rotation * d_rotation + d_posture * d_posture + d_skew * d_skew
    }
}

const MOTION_SCALE: f64 = 0.1;
const ROTATION_SCALE: f64 = 0.5;
const POSTURE_SCALE: f64 = 0.3;
const SKEW_SCALE: f64 = 0.05;

fn prototype(label: ActivityLabel) -> Descriptor {
    let (motion, rotation, posture, skew) = match label {
        ActivityLabel::Sitting => (0.02, 0.05, 0.9, 0.0),
        ActivityLabel::Standing => (0.02, 0.05, 0.1, 0.0),
        ActivityLabel::Walking => (0.25, 0.75, 0.2, -0.015),
        ActivityLabel::Upstairs => (0.15, 0.45, 0.2, -0.03),
        ActivityLabel::Downstairs => (0.4, 1.0, 0.2, 0.0),
        ActivityLabel::Jogging => (0.75, 1.9, 0.2, 0.0),
    };
    Descriptor {
        motion,
        rotation,
        posture,
        skew,
    }
}

/// Nearest-prototype classifier with softmax output.
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    temperature: f64,
}

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self { temperature: 2.0 }
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for HeuristicClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<ClassProbabilities, ClassifierError> {
        if !features.is_finite() {
            return Err(ClassifierError::NonFinite);
        }

        let descriptor = Descriptor::from_features(features);
        let scores: Vec<f64> = ActivityLabel::ALL
            .iter()
            .map(|&label| -descriptor.distance_sq(&prototype(label)) / self.temperature)
            .collect();

        tracing::trace!(?descriptor, "heuristic descriptor");

        Ok(ActivityLabel::ALL
            .iter()
            .zip(softmax(&scores))
            .map(|(label, p)| (label.code().to_string(), p))
            .collect())
    }
}
