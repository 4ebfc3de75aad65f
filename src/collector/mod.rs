//! Sensor reading sources.
//!
//! A source pushes [`SensorReading`]s into a channel from its own threads.
//! The consumer drains the receiver on a single thread, so every reading is
//! processed to completion before the next one.

pub mod replay;
pub mod synthetic;
pub mod types;

// Re-export commonly used types
pub use replay::{read_recording, ReplayCollector};
pub use synthetic::{MotionProfile, SyntheticCollector, SyntheticConfig};
pub use types::{SensorKind, SensorReading};

use crossbeam_channel::Receiver;

/// Capacity of the reading channel shared by collector threads.
pub const READING_CHANNEL_CAPACITY: usize = 10_000;

/// Common interface of reading sources.
pub trait ReadingSource {
    /// Start producing readings.
    fn start(&mut self) -> Result<(), CollectorError>;

    /// Stop producing readings.
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Receiver delivering readings in arrival order.
    fn receiver(&self) -> &Receiver<SensorReading>;
}

/// Errors that can occur while collecting readings.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
    /// No sensor is enabled
    NoSources,
    IoError(String),
    /// A recorded line could not be parsed
    ParseError { line: usize, message: String },
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "Collector is already running"),
            CollectorError::NoSources => write!(f, "No sensor source enabled"),
            CollectorError::IoError(e) => write!(f, "IO error: {e}"),
            CollectorError::ParseError { line, message } => {
                write!(f, "Parse error on line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for CollectorError {}
