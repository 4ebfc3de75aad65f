//! Background inference decoupled from sensor ingestion.
//!
//! Feature vectors travel through a single-slot queue. If the worker has not
//! picked up the pending vector by the time a new one arrives, the stale one
//! is discarded so the worker always classifies the freshest window and a
//! slow model never backs up ingestion.

use crate::classifier::Classifier;
use crate::core::features::FeatureVector;
use crate::core::state::StateHandle;
use crate::stats::SharedPipelineStats;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::thread::{self, JoinHandle};

/// Owns a classifier on a dedicated thread and publishes its results.
pub struct InferenceWorker {
    slot_tx: Option<Sender<FeatureVector>>,
    slot_rx: Receiver<FeatureVector>,
    handle: Option<JoinHandle<()>>,
    stats: SharedPipelineStats,
}

impl InferenceWorker {
    /// Start the worker thread.
    pub fn spawn<C>(classifier: C, state: StateHandle, stats: SharedPipelineStats) -> Self
    where
        C: Classifier + 'static,
    {
        let (slot_tx, slot_rx) = bounded::<FeatureVector>(1);
        let worker_rx = slot_rx.clone();
        let worker_stats = stats.clone();

        let handle = thread::Builder::new()
            .name("activity-inference".to_string())
            .spawn(move || {
                tracing::debug!("inference worker started");
                for features in worker_rx.iter() {
                    match classifier.predict(&features) {
                        Ok(probabilities) => {
                            let (state, became_ready) = state.publish(probabilities, features);
                            worker_stats.record_prediction();
                            if became_ready {
                                tracing::info!(label = %state.label, "pipeline ready");
                            }
                            tracing::debug!(label = %state.label, seq = state.sequence, "published");
                        }
                        Err(e) => {
                            worker_stats.record_classifier_failure();
                            tracing::warn!("classification failed, keeping previous state: {e}");
                        }
                    }
                }
                tracing::debug!("inference worker stopped");
            })
            .ok();

        if handle.is_none() {
            tracing::error!("could not spawn inference worker thread");
        }

        Self {
            slot_tx: Some(slot_tx),
            slot_rx,
            handle,
            stats,
        }
    }

    /// Hand a feature vector to the worker, replacing any pending one.
    pub fn submit(&self, features: FeatureVector) {
        let Some(tx) = &self.slot_tx else {
            return;
        };

        let mut pending = features;
        loop {
            match tx.try_send(pending) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    // Evict the stale vector; the worker may have taken it meanwhile.
                    if self.slot_rx.try_recv().is_ok() {
                        self.stats.record_dropped_request();
                    }
                    pending = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for InferenceWorker {
    fn drop(&mut self) {
        // Closing the sender ends the worker loop once the slot is drained.
        self.slot_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifierError;
    use crate::core::features::FEATURE_VECTOR_LEN;
    use crate::core::labels::ClassProbabilities;
    use crate::stats::PipelineStats;
    use std::sync::Arc;
    use std::time::Duration;

    struct Echo;

    impl Classifier for Echo {
        fn predict(&self, features: &FeatureVector) -> Result<ClassProbabilities, ClassifierError> {
            let code = if features.as_slice()[0] > 0.5 { "jog" } else { "sit" };
            Ok([(code.to_string(), 1.0)].into_iter().collect())
        }
    }

    struct Slow;

    impl Classifier for Slow {
        fn predict(&self, _: &FeatureVector) -> Result<ClassProbabilities, ClassifierError> {
            thread::sleep(Duration::from_millis(50));
            Ok([("wlk".to_string(), 1.0)].into_iter().collect())
        }
    }

    #[test]
    fn test_worker_publishes() {
        let state = StateHandle::new();
        let rx = state.subscribe();
        let worker = InferenceWorker::spawn(Echo, state.clone(), Arc::new(PipelineStats::new()));

        let mut values = [0.0; FEATURE_VECTOR_LEN];
        values[0] = 1.0;
        worker.submit(FeatureVector::from_array(values));

        let published = rx.recv_timeout(Duration::from_secs(5)).expect("no state published");
        assert_eq!(published.label, "Jogging");
        assert_eq!(state.latest().label, "Jogging");
    }

    #[test]
    fn test_submit_never_blocks_on_slow_model() {
        let state = StateHandle::new();
        let stats = Arc::new(PipelineStats::new());
        let worker = InferenceWorker::spawn(Slow, state.clone(), stats.clone());

        let start = std::time::Instant::now();
        for _ in 0..100 {
            worker.submit(FeatureVector::from_array([0.0; FEATURE_VECTOR_LEN]));
        }
        assert!(start.elapsed() < Duration::from_secs(2));

        drop(worker);
        let stats = stats.stats();
        assert!(stats.dropped_requests > 0);
        assert!(stats.predictions_published < 100);
        assert_eq!(stats.predictions_published + stats.dropped_requests, 100);
    }

    /// Reports the first feature value as the walking probability.
    struct SlowEcho;

    impl Classifier for SlowEcho {
        fn predict(&self, features: &FeatureVector) -> Result<ClassProbabilities, ClassifierError> {
            thread::sleep(Duration::from_millis(10));
            Ok([("wlk".to_string(), features.as_slice()[0])].into_iter().collect())
        }
    }

    #[test]
    fn test_published_state_carries_its_own_features() {
        let state = StateHandle::new();
        let rx = state.subscribe();
        let worker = InferenceWorker::spawn(SlowEcho, state.clone(), Arc::new(PipelineStats::new()));

        for i in 1..=20 {
            let mut values = [0.0; FEATURE_VECTOR_LEN];
            values[0] = i as f64 / 100.0;
            worker.submit(FeatureVector::from_array(values));
        }
        drop(worker);

        let published: Vec<_> = rx.try_iter().collect();
        assert!(!published.is_empty());
        for update in published {
            let features = update.features.expect("published state has features");
            assert_eq!(update.probabilities["wlk"], features.as_slice()[0]);
        }
    }
}
