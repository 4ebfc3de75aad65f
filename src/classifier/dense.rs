//! Feed-forward network loaded from a JSON weights file.
//!
//! File format:
//!
//! ```json
//! {
//!   "labels": ["dws", "ups", "sit", "std", "wlk", "jog"],
//!   "layers": [
//!     { "weights": [[...28 values...], ...], "bias": [...], "activation": "relu" },
//!     { "weights": [[...], ...], "bias": [...6 values...], "activation": "softmax" }
//!   ]
//! }
//! ```
//!
//! `weights` is row-major `[outputs][inputs]`. The network output is always
//! softmax-normalized so it can be read as probabilities, whatever the last
//! layer's activation.

use crate::classifier::{softmax, Classifier, ClassifierError};
use crate::core::features::{FeatureVector, FEATURE_VECTOR_LEN};
use crate::core::labels::{ActivityLabel, ClassProbabilities};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layer activation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Relu,
    Softmax,
}

/// A fully-connected layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default = "default_activation")]
    pub activation: Activation,
}

fn default_activation() -> Activation {
    Activation::Linear
}

impl DenseLayer {
    fn input_len(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    fn output_len(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        let z: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();

        match self.activation {
            Activation::Linear => z,
            Activation::Relu => z.into_iter().map(|v| v.max(0.0)).collect(),
            Activation::Softmax => softmax(&z),
        }
    }
}

/// A dense network mapping the feature vector to activity probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseModel {
    labels: Vec<String>,
    layers: Vec<DenseLayer>,
}

impl DenseModel {
    /// Build a model, validating that layers chain from the feature vector
    /// to one output per label.
    pub fn new(labels: Vec<String>, layers: Vec<DenseLayer>) -> Result<Self, ClassifierError> {
        let model = Self { labels, layers };
        model.validate()?;
        Ok(model)
    }

    /// Load a model from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ClassifierError::Io(e.to_string()))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let model: DenseModel =
            serde_json::from_str(json).map_err(|e| ClassifierError::Parse(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn validate(&self) -> Result<(), ClassifierError> {
        if self.layers.is_empty() {
            return Err(ClassifierError::Shape("model has no layers".to_string()));
        }

        for (i, code) in self.labels.iter().enumerate() {
            if ActivityLabel::from_code(code).is_none() {
                return Err(ClassifierError::Shape(format!("unknown label code: {code}")));
            }
            if self.labels[..i].contains(code) {
                return Err(ClassifierError::Shape(format!("duplicate label code: {code}")));
            }
        }

        let mut expected_inputs = FEATURE_VECTOR_LEN;
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.output_len() == 0 {
                return Err(ClassifierError::Shape(format!("layer {i} has no outputs")));
            }
            if layer.bias.len() != layer.output_len() {
                return Err(ClassifierError::Shape(format!(
                    "layer {i}: {} weight rows but {} biases",
                    layer.output_len(),
                    layer.bias.len()
                )));
            }
            if let Some(row) = layer.weights.iter().find(|row| row.len() != expected_inputs) {
                return Err(ClassifierError::Shape(format!(
                    "layer {i}: expected {expected_inputs} inputs, found row of {}",
                    row.len()
                )));
            }
            expected_inputs = layer.output_len();
        }

        if expected_inputs != self.labels.len() {
            return Err(ClassifierError::Shape(format!(
                "model produces {expected_inputs} outputs for {} labels",
                self.labels.len()
            )));
        }

        Ok(())
    }
}

impl Classifier for DenseModel {
    fn predict(&self, features: &FeatureVector) -> Result<ClassProbabilities, ClassifierError> {
        let input = features.as_slice();
        if input.len() != FEATURE_VECTOR_LEN {
            return Err(ClassifierError::InvalidInput {
                expected: FEATURE_VECTOR_LEN,
                actual: input.len(),
            });
        }
        if !features.is_finite() {
            return Err(ClassifierError::NonFinite);
        }

        let mut activations = input.to_vec();
        for layer in &self.layers {
            activations = layer.forward(&activations);
        }

        let needs_softmax = self
            .layers
            .last()
            .map(|l| l.activation != Activation::Softmax)
            .unwrap_or(true);
        if needs_softmax {
            activations = softmax(&activations);
        }

        if activations.iter().any(|p| !p.is_finite()) {
            return Err(ClassifierError::NonFinite);
        }

        Ok(self.labels.iter().cloned().zip(activations).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::channel::Channel;
    use crate::core::labels::select_label;

    fn codes() -> Vec<String> {
        ActivityLabel::ALL.iter().map(|l| l.code().to_string()).collect()
    }

    /// Single linear layer where each label looks at one input feature.
    fn one_hot_model() -> DenseModel {
        let weights = (0..6)
            .map(|i| {
                let mut row = vec![0.0; FEATURE_VECTOR_LEN];
                row[i] = 10.0;
                row
            })
            .collect();
        DenseModel::new(
            codes(),
            vec![DenseLayer {
                weights,
                bias: vec![0.0; 6],
                activation: Activation::Linear,
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_prediction_is_normalized() {
        let model = one_hot_model();
        let mut values = [0.0; FEATURE_VECTOR_LEN];
        values[4] = 1.0; // feeds the "wlk" row
        let probabilities = model.predict(&FeatureVector::from_array(values)).unwrap();

        let total: f64 = probabilities.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(select_label(&probabilities), Some(ActivityLabel::Walking));
    }

    #[test]
    fn test_hidden_relu_layer() {
        let json = serde_json::json!({
            "labels": ["sit", "jog"],
            "layers": [
                {
                    "weights": [vec![1.0; FEATURE_VECTOR_LEN], vec![-1.0; FEATURE_VECTOR_LEN]],
                    "bias": [0.0, 0.0],
                    "activation": "relu"
                },
                {
                    "weights": [[-5.0, 0.0], [5.0, 0.0]],
                    "bias": [0.0, 0.0],
                    "activation": "softmax"
                }
            ]
        })
        .to_string();
        let model = DenseModel::from_json(&json).unwrap();
        assert_eq!(model.layer_count(), 2);

        let mut values = [0.0; FEATURE_VECTOR_LEN];
        values[Channel::AccelNorm.index() * 4 + 2] = 1.0;
        let probabilities = model.predict(&FeatureVector::from_array(values)).unwrap();
        assert_eq!(select_label(&probabilities), Some(ActivityLabel::Jogging));
    }

    #[test]
    fn test_rejects_wrong_input_width() {
        let json = serde_json::json!({
            "labels": ["sit"],
            "layers": [{ "weights": [[1.0, 2.0]], "bias": [0.0] }]
        })
        .to_string();
        assert!(matches!(
            DenseModel::from_json(&json),
            Err(ClassifierError::Shape(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_labels() {
        let labels = ["wlk", "wlk", "wlk", "wlk", "wlk", "jog"];
        let json = serde_json::json!({
            "labels": labels,
            "layers": [{
                "weights": vec![vec![0.0; FEATURE_VECTOR_LEN]; labels.len()],
                "bias": vec![0.0; labels.len()]
            }]
        })
        .to_string();
        match DenseModel::from_json(&json) {
            Err(ClassifierError::Shape(message)) => assert!(message.contains("duplicate")),
            other => panic!("expected shape error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_label_count_mismatch() {
        let json = serde_json::json!({
            "labels": ["sit", "std", "wlk"],
            "layers": [{ "weights": [vec![0.0; FEATURE_VECTOR_LEN]], "bias": [0.0] }]
        })
        .to_string();
        assert!(matches!(
            DenseModel::from_json(&json),
            Err(ClassifierError::Shape(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_label() {
        let json = serde_json::json!({
            "labels": ["swim"],
            "layers": [{ "weights": [vec![0.0; FEATURE_VECTOR_LEN]], "bias": [0.0] }]
        })
        .to_string();
        assert!(matches!(
            DenseModel::from_json(&json),
            Err(ClassifierError::Shape(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            DenseModel::from_json("{ not json"),
            Err(ClassifierError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("activity-detector-missing-model.json");
        assert!(matches!(DenseModel::load(&path), Err(ClassifierError::Io(_))));
    }
}
