//! Activity classifiers.
//!
//! The trained model is a black box behind the [`Classifier`] trait: it maps
//! the 28-element feature vector to a probability per activity code. Two
//! implementations ship with the crate:
//!
//! - [`HeuristicClassifier`]: deterministic scoring over motion energy and
//!   posture, used when no model file is configured
//! - [`DenseModel`]: a feed-forward network loaded from a JSON weights file
//!
//! `Option<C>` is also a classifier; `None` models a network that failed to
//! load and fails every prediction.

pub mod dense;
pub mod heuristic;
pub mod worker;

pub use dense::{Activation, DenseLayer, DenseModel};
pub use heuristic::HeuristicClassifier;
pub use worker::InferenceWorker;

use crate::core::features::FeatureVector;
use crate::core::labels::ClassProbabilities;

/// Maps a feature vector to activity probabilities.
pub trait Classifier: Send {
    fn predict(&self, features: &FeatureVector) -> Result<ClassProbabilities, ClassifierError>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn predict(&self, features: &FeatureVector) -> Result<ClassProbabilities, ClassifierError> {
        (**self).predict(features)
    }
}

impl<C: Classifier> Classifier for Option<C> {
    fn predict(&self, features: &FeatureVector) -> Result<ClassProbabilities, ClassifierError> {
        match self {
            Some(classifier) => classifier.predict(features),
            None => Err(ClassifierError::ModelUnavailable(
                "no model loaded".to_string(),
            )),
        }
    }
}

/// Errors raised while loading a model or running inference.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// The model could not be constructed or is not loaded
    ModelUnavailable(String),
    /// The input vector has the wrong length
    InvalidInput { expected: usize, actual: usize },
    /// The input or output contains NaN or infinity
    NonFinite,
    /// Reading a model file failed
    Io(String),
    /// A model file could not be parsed
    Parse(String),
    /// Model layers do not chain together
    Shape(String),
}

impl std::fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierError::ModelUnavailable(e) => write!(f, "Model unavailable: {e}"),
            ClassifierError::InvalidInput { expected, actual } => {
                write!(f, "Invalid input: expected {expected} features, got {actual}")
            }
            ClassifierError::NonFinite => write!(f, "Non-finite value in model input or output"),
            ClassifierError::Io(e) => write!(f, "IO error: {e}"),
            ClassifierError::Parse(e) => write!(f, "Parse error: {e}"),
            ClassifierError::Shape(e) => write!(f, "Shape error: {e}"),
        }
    }
}

impl std::error::Error for ClassifierError {}

/// Normalize raw scores into probabilities.
pub(crate) fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|&s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|&e| e / total).collect()
}
