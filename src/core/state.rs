//! Published activity state.
//!
//! The pipeline is the only writer. Readers either take the latest state
//! through [`StateHandle::latest`] or subscribe to receive every new state
//! as it is published.

use crate::core::features::FeatureVector;
use crate::core::labels::{select_label, ActivityLabel, ClassProbabilities, UNKNOWN_LABEL};
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Lifecycle phase of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    /// No prediction has been published yet
    WarmingUp,
    /// At least one full-window prediction has been published
    Ready,
}

/// The most recently published classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityState {
    /// Display label, or "Unknown"
    pub label: String,
    /// Resolved activity, if a label could be selected
    pub activity: Option<ActivityLabel>,
    /// Probabilities keyed by label code, as returned by the classifier
    pub probabilities: ClassProbabilities,
    /// Number of states published so far (0 for the initial sentinel)
    pub sequence: u64,
    /// When this state was published
    pub updated_at: Option<DateTime<Utc>>,
    /// The feature vector the probabilities were computed from
    #[serde(skip)]
    pub features: Option<FeatureVector>,
}

impl ActivityState {
    /// The sentinel state used before the first prediction.
    pub fn unknown() -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            activity: None,
            probabilities: ClassProbabilities::new(),
            sequence: 0,
            updated_at: None,
            features: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.activity.is_none()
    }

    /// Probability of a single activity, if the classifier reported it.
    pub fn probability(&self, label: ActivityLabel) -> Option<f64> {
        self.probabilities.get(label.code()).copied()
    }
}

impl Default for ActivityState {
    fn default() -> Self {
        Self::unknown()
    }
}

#[derive(Debug)]
struct Published {
    state: ActivityState,
    phase: PipelinePhase,
    subscribers: Vec<Sender<ActivityState>>,
}

/// Shared, cloneable handle to the published state.
#[derive(Debug, Clone)]
pub struct StateHandle {
    inner: Arc<Mutex<Published>>,
}

impl StateHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Published {
                state: ActivityState::unknown(),
                phase: PipelinePhase::WarmingUp,
                subscribers: Vec::new(),
            })),
        }
    }

    /// A copy of the current state.
    pub fn latest(&self) -> ActivityState {
        self.lock().state.clone()
    }

    pub fn phase(&self) -> PipelinePhase {
        self.lock().phase
    }

    /// Receive every state published from now on.
    pub fn subscribe(&self) -> Receiver<ActivityState> {
        let (tx, rx) = unbounded();
        self.lock().subscribers.push(tx);
        rx
    }

    /// Replace the state with a new prediction and notify subscribers.
    ///
    /// Returns the new state and whether this publication moved the
    /// pipeline from warming up to ready.
    pub(crate) fn publish(
        &self,
        probabilities: ClassProbabilities,
        features: FeatureVector,
    ) -> (ActivityState, bool) {
        let activity = select_label(&probabilities);
        let mut published = self.lock();

        let state = ActivityState {
            label: activity
                .map(|a| a.display_name().to_string())
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            activity,
            probabilities,
            sequence: published.state.sequence + 1,
            updated_at: Some(Utc::now()),
            features: Some(features),
        };

        let became_ready = published.phase == PipelinePhase::WarmingUp;
        published.phase = PipelinePhase::Ready;
        published.state = state.clone();

        // Drop subscribers whose receivers are gone
        published
            .subscribers
            .retain(|tx| tx.send(state.clone()).is_ok());

        (state, became_ready)
    }

    fn lock(&self) -> MutexGuard<'_, Published> {
        // Poisoning is ignored: fields are only ever assigned whole values.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}
