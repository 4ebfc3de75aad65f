//! Machine-readable activity snapshots.
//!
//! A snapshot is the JSON form of a published state, tagged with the
//! producer that emitted it and optionally the feature values behind it.

use crate::core::features::FeatureVector;
use crate::core::labels::ActivityLabel;
use crate::core::state::ActivityState;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The current snapshot format version.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "activity-detector";

/// Producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotProducer {
    pub name: String,
    pub version: String,
    /// Unique instance identifier (UUID)
    pub instance_id: String,
}

/// Probability of one activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelProbability {
    pub code: String,
    pub name: String,
    pub probability: Option<f64>,
}

/// A published state ready for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub snapshot_version: String,
    /// When the state was published (RFC3339)
    pub observed_at_utc: String,
    /// When this snapshot was built (RFC3339)
    pub computed_at_utc: String,
    pub producer: SnapshotProducer,
    /// Publication sequence number
    pub sequence: u64,
    /// Display label, or "Unknown"
    pub label: String,
    /// Label code of the selected activity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_code: Option<String>,
    /// One entry per known activity, in model output order
    pub probabilities: Vec<LabelProbability>,
    /// Values of the features behind this prediction, keyed by
    /// `<channel>_<statistic>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<(String, f64)>>,
}

/// Builds snapshots stamped with a per-process instance id.
pub struct SnapshotBuilder {
    instance_id: Uuid,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
        }
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn build(&self, state: &ActivityState) -> ActivitySnapshot {
        let computed_at = Utc::now();

        let probabilities = ActivityLabel::ALL
            .iter()
            .map(|label| LabelProbability {
                code: label.code().to_string(),
                name: label.display_name().to_string(),
                probability: state.probability(*label),
            })
            .collect();

        ActivitySnapshot {
            snapshot_version: SNAPSHOT_VERSION.to_string(),
            observed_at_utc: state.updated_at.unwrap_or(computed_at).to_rfc3339(),
            computed_at_utc: computed_at.to_rfc3339(),
            producer: SnapshotProducer {
                name: PRODUCER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                instance_id: self.instance_id.to_string(),
            },
            sequence: state.sequence,
            label: state.label.clone(),
            activity_code: state.activity.map(|a| a.code().to_string()),
            probabilities,
            features: state.features.as_ref().map(FeatureVector::named),
        }
    }

    /// Build and serialize a snapshot as a single JSON line.
    pub fn build_json(&self, state: &ActivityState) -> String {
        let snapshot = self.build(state);
        serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
