//! Processing statistics for a detection session.
//!
//! Counters are atomics so the ingestion loop and the inference worker can
//! update them without sharing a lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Live counters for the current session.
#[derive(Debug)]
pub struct PipelineStats {
    /// Accelerometer readings ingested
    acceleration_readings: AtomicU64,
    /// Gyroscope readings ingested
    rotation_readings: AtomicU64,
    /// Feature vectors extracted from full windows
    feature_extractions: AtomicU64,
    /// States published after a successful prediction
    predictions_published: AtomicU64,
    /// Predictions suppressed because the classifier failed
    classifier_failures: AtomicU64,
    /// Pending inference requests replaced by a newer one
    dropped_requests: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self {
            acceleration_readings: AtomicU64::new(0),
            rotation_readings: AtomicU64::new(0),
            feature_extractions: AtomicU64::new(0),
            predictions_published: AtomicU64::new(0),
            classifier_failures: AtomicU64::new(0),
            dropped_requests: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn record_acceleration(&self) {
        self.acceleration_readings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rotation(&self) {
        self.rotation_readings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_extraction(&self) {
        self.feature_extractions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prediction(&self) {
        self.predictions_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_classifier_failure(&self) {
        self.classifier_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_request(&self) {
        self.dropped_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            acceleration_readings: self.acceleration_readings.load(Ordering::Relaxed),
            rotation_readings: self.rotation_readings.load(Ordering::Relaxed),
            feature_extractions: self.feature_extractions.load(Ordering::Relaxed),
            predictions_published: self.predictions_published.load(Ordering::Relaxed),
            classifier_failures: self.classifier_failures.load(Ordering::Relaxed),
            dropped_requests: self.dropped_requests.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Accelerometer readings: {}\n\
             - Gyroscope readings: {}\n\
             - Feature vectors extracted: {}\n\
             - Predictions published: {}\n\
             - Classifier failures: {}\n\
             - Inference requests dropped: {}\n\
             - Session duration: {} seconds",
            stats.acceleration_readings,
            stats.rotation_readings,
            stats.feature_extractions,
            stats.predictions_published,
            stats.classifier_failures,
            stats.dropped_requests,
            stats.session_duration_secs
        )
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub acceleration_readings: u64,
    pub rotation_readings: u64,
    pub feature_extractions: u64,
    pub predictions_published: u64,
    pub classifier_failures: u64,
    pub dropped_requests: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared statistics.
pub type SharedPipelineStats = Arc<PipelineStats>;

pub fn create_shared_stats() -> SharedPipelineStats {
    Arc::new(PipelineStats::new())
}
