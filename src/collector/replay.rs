//! Replay of recorded readings.
//!
//! A recording is a JSON Lines file with one [`SensorReading`] per line.
//! Blank lines are skipped. When pacing is enabled the replay thread sleeps
//! for the gap between consecutive timestamps, otherwise readings are pushed
//! as fast as the consumer drains them.

use crate::collector::types::SensorReading;
use crate::collector::{CollectorError, ReadingSource, READING_CHANNEL_CAPACITY};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Longest pause honored between two paced readings.
const MAX_PACING_GAP: std::time::Duration = std::time::Duration::from_secs(2);

/// Read every reading from a JSON Lines recording.
pub fn read_recording(path: &Path) -> Result<Vec<SensorReading>, CollectorError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| CollectorError::IoError(e.to_string()))?;
    parse_recording(&content)
}

/// Parse JSON Lines content into readings. Line numbers in errors are 1-based.
pub fn parse_recording(content: &str) -> Result<Vec<SensorReading>, CollectorError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| CollectorError::ParseError {
                line: i + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Feeds a recording into a channel from a background thread.
///
/// The receiver disconnects once the whole recording has been sent, which
/// is how consumers detect the end of a replay.
pub struct ReplayCollector {
    path: PathBuf,
    realtime: bool,
    sender: Option<Sender<SensorReading>>,
    receiver: Receiver<SensorReading>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReplayCollector {
    pub fn new(path: impl Into<PathBuf>, realtime: bool) -> Self {
        let (sender, receiver) = bounded(READING_CHANNEL_CAPACITY);
        Self {
            path: path.into(),
            realtime,
            sender: Some(sender),
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }
}

impl ReadingSource for ReplayCollector {
    fn start(&mut self) -> Result<(), CollectorError> {
        let Some(sender) = self.sender.take() else {
            return Err(CollectorError::AlreadyRunning);
        };

        let readings = read_recording(&self.path)?;
        tracing::info!(
            path = %self.path.display(),
            readings = readings.len(),
            realtime = self.realtime,
            "replaying recording"
        );

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let realtime = self.realtime;

        let handle = thread::Builder::new()
            .name("replay".to_string())
            .spawn(move || {
                let mut previous: Option<DateTime<Utc>> = None;
                for reading in readings {
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                    if realtime {
                        if let Some(prev) = previous {
                            let gap = (reading.timestamp - prev)
                                .to_std()
                                .unwrap_or_default()
                                .min(MAX_PACING_GAP);
                            thread::sleep(gap);
                        }
                        previous = Some(reading.timestamp);
                    }
                    if sender.send(reading).is_err() {
                        break;
                    }
                }
                running.store(false, Ordering::SeqCst);
                tracing::debug!("replay finished");
            })
            .map_err(|e| CollectorError::IoError(e.to_string()))?;

        self.thread = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Unblock a sender waiting on a full channel.
        while self.receiver.try_recv().is_ok() {}
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn receiver(&self) -> &Receiver<SensorReading> {
        &self.receiver
    }
}

impl Drop for ReplayCollector {
    fn drop(&mut self) {
        self.stop();
    }
}
