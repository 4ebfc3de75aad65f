//! Streaming activity classification.
//!
//! Every reading from either sensor is appended to the channel buffers.
//! Once all seven buffers hold a full window, each further reading triggers
//! feature extraction and a prediction, so the prediction cadence follows
//! the combined sensor rate.
//!
//! ```text
//! reading ──▶ ChannelBuffers ──(all full?)──▶ compute_features ──▶ Classifier
//!                                                                     │
//!                                             StateHandle ◀── publish ┘
//! ```
//!
//! A failed prediction never touches the published state.

use crate::classifier::{Classifier, ClassifierError, InferenceWorker};
use crate::collector::types::{SensorKind, SensorReading};
use crate::core::buffer::ChannelBuffers;
use crate::core::features::{compute_features, FeatureVector};
use crate::core::state::{ActivityState, PipelinePhase, StateHandle};
use crate::stats::{create_shared_stats, SharedPipelineStats};
use std::sync::{Arc, Mutex};

/// What happened to a single ingested reading.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Not every channel holds a full window yet
    WarmingUp,
    /// A new state was published
    Published(ActivityState),
    /// The classifier failed; the previous state is kept
    Suppressed(ClassifierError),
    /// Features were handed to the background inference worker
    Queued,
}

/// Errors raised when building a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    InvalidWindowSize(usize),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::InvalidWindowSize(size) => {
                write!(f, "Invalid window size: {size} (must be at least 1)")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

enum Inference<C> {
    Inline(C),
    Worker(InferenceWorker),
}

/// Owns the channel windows and drives classification.
pub struct ActivityPipeline<C> {
    buffers: ChannelBuffers,
    inference: Inference<C>,
    state: StateHandle,
    stats: SharedPipelineStats,
    last_features: Option<FeatureVector>,
}

/// A pipeline shared between threads feeding readings independently.
pub type SharedPipeline<C> = Arc<Mutex<ActivityPipeline<C>>>;

impl<C: Classifier> ActivityPipeline<C> {
    /// Create a pipeline that classifies on the ingesting thread.
    pub fn new(window_size: usize, classifier: C) -> Result<Self, PipelineError> {
        Self::build(
            window_size,
            Inference::Inline(classifier),
            StateHandle::new(),
            create_shared_stats(),
        )
    }

    /// Create a pipeline whose classifier runs on a background thread.
    ///
    /// Ingestion never waits for inference: if the model is still busy when
    /// the next window is ready, the pending window is replaced.
    pub fn decoupled(window_size: usize, classifier: C) -> Result<Self, PipelineError>
    where
        C: 'static,
    {
        // Checked before the worker thread is spawned, not only in `build`.
        if window_size == 0 {
            return Err(PipelineError::InvalidWindowSize(window_size));
        }
        let state = StateHandle::new();
        let stats = create_shared_stats();
        let worker = InferenceWorker::spawn(classifier, state.clone(), stats.clone());
        Self::build(window_size, Inference::Worker(worker), state, stats)
    }

    fn build(
        window_size: usize,
        inference: Inference<C>,
        state: StateHandle,
        stats: SharedPipelineStats,
    ) -> Result<Self, PipelineError> {
        if window_size == 0 {
            return Err(PipelineError::InvalidWindowSize(window_size));
        }
        Ok(Self {
            buffers: ChannelBuffers::new(window_size),
            inference,
            state,
            stats,
            last_features: None,
        })
    }

    /// Process one sensor reading to completion.
    pub fn ingest(&mut self, reading: &SensorReading) -> IngestOutcome {
        match reading.kind {
            SensorKind::Acceleration => {
                self.buffers.push_acceleration(reading.x, reading.y, reading.z);
                self.stats.record_acceleration();
            }
            SensorKind::RotationRate => {
                self.buffers.push_rotation(reading.x, reading.y, reading.z);
                self.stats.record_rotation();
            }
        }

        self.classify_if_ready()
    }

    /// Append an accelerometer sample (g).
    pub fn push_acceleration(&mut self, x: f64, y: f64, z: f64) -> IngestOutcome {
        self.ingest(&SensorReading::acceleration(x, y, z))
    }

    /// Append a gyroscope sample (rad/s).
    pub fn push_rotation(&mut self, x: f64, y: f64, z: f64) -> IngestOutcome {
        self.ingest(&SensorReading::rotation_rate(x, y, z))
    }

    fn classify_if_ready(&mut self) -> IngestOutcome {
        if !self.buffers.all_full() {
            return IngestOutcome::WarmingUp;
        }

        debug_assert!(
            self.buffers
                .iter()
                .all(|(_, buffer)| buffer.len() == self.buffers.window_size()),
            "features extracted from a partial window"
        );
        // Extreme readings can still yield non-finite statistics; classifiers
        // reject those and the failure is suppressed below.
        let features = compute_features(&self.buffers);
        self.stats.record_extraction();
        self.last_features = Some(features);

        match &self.inference {
            Inference::Inline(classifier) => match classifier.predict(&features) {
                Ok(probabilities) => {
                    let (state, became_ready) = self.state.publish(probabilities, features);
                    self.stats.record_prediction();
                    if became_ready {
                        tracing::info!(label = %state.label, "pipeline ready");
                    }
                    tracing::debug!(label = %state.label, seq = state.sequence, "published");
                    IngestOutcome::Published(state)
                }
                Err(e) => {
                    self.stats.record_classifier_failure();
                    tracing::warn!("classification failed, keeping previous state: {e}");
                    IngestOutcome::Suppressed(e)
                }
            },
            Inference::Worker(worker) => {
                worker.submit(features);
                IngestOutcome::Queued
            }
        }
    }

    /// The most recently published state.
    pub fn state(&self) -> ActivityState {
        self.state.latest()
    }

    pub fn phase(&self) -> PipelinePhase {
        self.state.phase()
    }

    /// Handle for observers of published states.
    pub fn state_handle(&self) -> StateHandle {
        self.state.clone()
    }

    pub fn stats(&self) -> SharedPipelineStats {
        self.stats.clone()
    }

    /// The feature vector behind the latest extraction.
    pub fn last_features(&self) -> Option<&FeatureVector> {
        self.last_features.as_ref()
    }

    pub fn buffers(&self) -> &ChannelBuffers {
        &self.buffers
    }

    pub fn window_size(&self) -> usize {
        self.buffers.window_size()
    }

    /// Wrap the pipeline in a mutex so every append-check-predict-publish
    /// sequence runs under one lock.
    pub fn into_shared(self) -> SharedPipeline<C> {
        Arc::new(Mutex::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::HeuristicClassifier;
    use crate::core::channel::Channel;
    use crate::core::labels::{ActivityLabel, ClassProbabilities};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Always answers "wlk", unless told to fail.
    struct Scripted {
        fail: Arc<AtomicBool>,
    }

    impl Classifier for Scripted {
        fn predict(&self, _: &FeatureVector) -> Result<ClassProbabilities, ClassifierError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClassifierError::ModelUnavailable("scripted failure".into()));
            }
            Ok([("sit", 0.1), ("wlk", 0.7), ("jog", 0.2)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect())
        }
    }

    fn scripted() -> (Scripted, Arc<AtomicBool>) {
        let fail = Arc::new(AtomicBool::new(false));
        (Scripted { fail: fail.clone() }, fail)
    }

    #[test]
    fn test_rejects_zero_window() {
        let (classifier, _) = scripted();
        assert_eq!(
            ActivityPipeline::new(0, classifier).err(),
            Some(PipelineError::InvalidWindowSize(0))
        );
        assert_eq!(
            ActivityPipeline::decoupled(0, HeuristicClassifier::new()).err(),
            Some(PipelineError::InvalidWindowSize(0))
        );
    }

    #[test]
    fn test_end_to_end_transition_and_features() {
        let (classifier, _) = scripted();
        let mut pipeline = ActivityPipeline::new(150, classifier).unwrap();
        let mut transitions = 0;
        let mut published_at = None;

        for i in 0..150 {
            for (step, outcome) in [
                pipeline.push_acceleration(1.0, 0.0, 0.0),
                pipeline.push_rotation(0.0, 0.0, 0.0),
            ]
            .into_iter()
            .enumerate()
            {
                if let IngestOutcome::Published(_) = outcome {
                    transitions += 1;
                    published_at.get_or_insert((i, step));
                }
            }
        }

        assert_eq!(transitions, 1);
        assert_eq!(published_at, Some((149, 1)));
        assert_eq!(pipeline.phase(), PipelinePhase::Ready);
        assert_eq!(pipeline.state().label, "Walking");

        let features = pipeline.last_features().unwrap();
        assert_eq!(features.len(), 28);
        assert_eq!(features.as_slice()[0..4], [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(features.channel(Channel::AccelNorm).to_array(), [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(features.channel(Channel::GyroZ).to_array(), [0.0; 4]);
        assert_eq!(pipeline.state().features.as_ref(), Some(features));
    }

    #[test]
    fn test_every_reading_predicts_once_full() {
        let (classifier, _) = scripted();
        let mut pipeline = ActivityPipeline::new(3, classifier).unwrap();
        for _ in 0..3 {
            pipeline.push_acceleration(0.0, 0.0, 1.0);
            pipeline.push_rotation(0.0, 0.0, 0.0);
        }

        let before = pipeline.state().sequence;
        for _ in 0..4 {
            assert!(matches!(
                pipeline.push_acceleration(0.0, 0.0, 1.0),
                IngestOutcome::Published(_)
            ));
        }
        assert!(matches!(
            pipeline.push_rotation(0.0, 0.0, 0.0),
            IngestOutcome::Published(_)
        ));
        assert_eq!(pipeline.state().sequence, before + 5);
    }

    #[test]
    fn test_single_sensor_never_ready() {
        let (classifier, _) = scripted();
        let mut pipeline = ActivityPipeline::new(10, classifier).unwrap();
        for _ in 0..100 {
            assert_eq!(
                pipeline.push_acceleration(0.0, 0.0, 1.0),
                IngestOutcome::WarmingUp
            );
        }
        assert_eq!(pipeline.phase(), PipelinePhase::WarmingUp);
        assert_eq!(pipeline.state().label, "Unknown");
        assert!(pipeline.last_features().is_none());
    }

    #[test]
    fn test_classifier_failure_keeps_state() {
        let (classifier, fail) = scripted();
        let mut pipeline = ActivityPipeline::new(5, classifier).unwrap();
        for _ in 0..5 {
            pipeline.push_acceleration(0.0, 1.0, 0.0);
            pipeline.push_rotation(0.0, 0.0, 0.0);
        }
        let good = pipeline.state();
        assert_eq!(good.activity, Some(ActivityLabel::Walking));

        fail.store(true, Ordering::SeqCst);
        let outcome = pipeline.push_acceleration(0.0, 1.0, 0.0);
        assert!(matches!(outcome, IngestOutcome::Suppressed(_)));
        assert_eq!(pipeline.state(), good);
        assert_eq!(pipeline.phase(), PipelinePhase::Ready);
        assert_eq!(pipeline.stats().stats().classifier_failures, 1);

        fail.store(false, Ordering::SeqCst);
        assert!(matches!(
            pipeline.push_rotation(0.0, 0.0, 0.0),
            IngestOutcome::Published(_)
        ));
    }

    #[test]
    fn test_extreme_readings_are_suppressed_not_fatal() {
        let mut pipeline =
            ActivityPipeline::new(3, HeuristicClassifier::new()).unwrap();
        for _ in 0..3 {
            pipeline.push_acceleration(f64::MAX, 0.0, 0.0);
            pipeline.push_rotation(0.0, 0.0, 0.0);
        }
        let features = pipeline.last_features().unwrap();
        assert!(!features.is_finite());
        assert!(pipeline.state().is_unknown());
        assert_eq!(pipeline.stats().stats().classifier_failures, 1);

        assert!(matches!(
            pipeline.push_acceleration(f64::NAN, 0.0, 0.0),
            IngestOutcome::Suppressed(ClassifierError::NonFinite)
        ));

        // Ordinary readings evict the bad samples and prediction resumes.
        for _ in 0..3 {
            pipeline.push_acceleration(0.0, 0.1, 0.99);
            pipeline.push_rotation(0.0, 0.0, 0.0);
        }
        assert_eq!(pipeline.phase(), PipelinePhase::Ready);
        assert_eq!(pipeline.state().activity, Some(ActivityLabel::Sitting));
    }

    #[test]
    fn test_failure_before_ready_stays_unknown() {
        let mut pipeline =
            ActivityPipeline::new(2, None::<HeuristicClassifier>).unwrap();
        for _ in 0..4 {
            pipeline.push_acceleration(0.0, 0.0, 1.0);
            pipeline.push_rotation(0.0, 0.0, 0.0);
        }
        assert_eq!(pipeline.state(), ActivityState::unknown());
        assert_eq!(pipeline.phase(), PipelinePhase::WarmingUp);
    }

    #[test]
    fn test_decoupled_pipeline_publishes() {
        let (classifier, _) = scripted();
        let mut pipeline = ActivityPipeline::decoupled(4, classifier).unwrap();
        let updates = pipeline.state_handle().subscribe();

        let mut queued = 0;
        for _ in 0..6 {
            if pipeline.push_acceleration(0.0, 0.0, 1.0) == IngestOutcome::Queued {
                queued += 1;
            }
            if pipeline.push_rotation(0.0, 0.0, 0.0) == IngestOutcome::Queued {
                queued += 1;
            }
        }
        assert_eq!(queued, 5);

        let state = updates
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("worker should publish");
        assert_eq!(state.label, "Walking");
    }
}
