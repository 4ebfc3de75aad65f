//! Activity Detector - streaming human activity recognition from motion sensors.
//!
//! This library turns a live stream of accelerometer and gyroscope readings
//! into a continuously updated activity label (walking, jogging, sitting,
//! standing, upstairs, downstairs).
//!
//! # Pipeline
//!
//! - **Windows**: seven channels (three acceleration axes, the acceleration
//!   norm, three rotation axes) each keep the most recent `W` samples
//! - **Features**: once every window is full, each reading produces a
//!   28-value vector (last, mean, std, median per channel)
//! - **Classification**: a [`Classifier`] maps the vector to probabilities
//! - **State**: the most probable activity is published; ties and failures
//!   never overwrite a good state with garbage
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Activity Detector                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  Collector  │──▶│   Windows   │──▶│  Features   │        │
//! │  │ (synthetic) │   │  (W = 150)  │   │  (28 vals)  │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │                                              │              │
//! │                                              ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐        │
//! │  │    State    │◀────── publish ─────│ Classifier  │        │
//! │  │   Handle    │                     │             │        │
//! │  └─────────────┘                     └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use activity_detector::{ActivityPipeline, HeuristicClassifier, SensorReading};
//!
//! let mut pipeline = ActivityPipeline::new(150, HeuristicClassifier::new())?;
//!
//! // Feed readings as they arrive from either sensor
//! pipeline.ingest(&SensorReading::acceleration(0.0, 0.1, 0.99));
//! pipeline.ingest(&SensorReading::rotation_rate(0.0, 0.0, 0.0));
//!
//! println!("{}", pipeline.state().label);
//! # Ok::<(), activity_detector::PipelineError>(())
//! ```

pub mod classifier;
pub mod collector;
pub mod config;
pub mod core;
pub mod stats;

// Re-export key types at crate root for convenience
pub use classifier::{Classifier, ClassifierError, DenseModel, HeuristicClassifier, InferenceWorker};
pub use collector::{
    CollectorError, ReadingSource, ReplayCollector, SensorKind, SensorReading, SyntheticCollector,
};
pub use config::{Config, InferenceMode, SourceConfig};
pub use crate::core::{
    compute_features, ActivityLabel, ActivityPipeline, ActivitySnapshot, ActivityState,
    ClassProbabilities, FeatureVector, IngestOutcome, PipelineError, PipelinePhase,
    SnapshotBuilder, StateHandle,
};
pub use stats::{PipelineStats, SharedPipelineStats, StatsSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
