//! Core functionality for the activity detector.
//!
//! This module contains:
//! - Rolling per-channel sample windows
//! - Feature extraction over full windows
//! - The streaming classification pipeline and its published state
//! - Snapshot building for JSON output

pub mod buffer;
pub mod channel;
pub mod features;
pub mod labels;
pub mod pipeline;
pub mod snapshot;
pub mod state;

// Re-export commonly used types
pub use buffer::{ChannelBuffers, SampleBuffer, DEFAULT_WINDOW_SIZE};
pub use channel::{Channel, CHANNEL_COUNT};
pub use features::{
    compute_channel_features, compute_features, ChannelFeatures, FeatureVector,
    FEATURES_PER_CHANNEL, FEATURE_VECTOR_LEN,
};
pub use labels::{select_label, ActivityLabel, ClassProbabilities, UNKNOWN_LABEL};
pub use pipeline::{ActivityPipeline, IngestOutcome, PipelineError, SharedPipeline};
pub use snapshot::{ActivitySnapshot, SnapshotBuilder, PRODUCER_NAME, SNAPSHOT_VERSION};
pub use state::{ActivityState, PipelinePhase, StateHandle};
