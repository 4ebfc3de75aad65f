//! Synthetic IMU source.
//!
//! Produces accelerometer and gyroscope readings shaped like a chosen
//! activity, one producer thread per enabled sensor, each on its own
//! fixed-rate schedule. Useful for demos and for exercising the pipeline
//! without hardware.

use crate::collector::types::{SensorKind, SensorReading};
use crate::collector::{CollectorError, ReadingSource, READING_CHANNEL_CAPACITY};
use crate::config::SourceConfig;
use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Motion pattern generated by the synthetic source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionProfile {
    Sitting,
    Standing,
    Walking,
    Jogging,
    Upstairs,
    Downstairs,
}

/// Gait parameters: step frequency (Hz), vertical amplitude (g), rotation
/// amplitude (rad/s).
struct Gait {
    step_hz: f64,
    bounce: f64,
    sway: f64,
}

impl MotionProfile {
    pub const ALL: [MotionProfile; 6] = [
        MotionProfile::Sitting,
        MotionProfile::Standing,
        MotionProfile::Walking,
        MotionProfile::Jogging,
        MotionProfile::Upstairs,
        MotionProfile::Downstairs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MotionProfile::Sitting => "sitting",
            MotionProfile::Standing => "standing",
            MotionProfile::Walking => "walking",
            MotionProfile::Jogging => "jogging",
            MotionProfile::Upstairs => "upstairs",
            MotionProfile::Downstairs => "downstairs",
        }
    }

    fn gait(self) -> Option<Gait> {
        let (step_hz, bounce, sway) = match self {
            MotionProfile::Sitting | MotionProfile::Standing => return None,
            MotionProfile::Walking => (1.9, 0.35, 1.4),
            MotionProfile::Jogging => (2.8, 1.1, 3.5),
            MotionProfile::Upstairs => (1.4, 0.2, 0.8),
            MotionProfile::Downstairs => (2.0, 0.5, 1.7),
        };
        Some(Gait {
            step_hz,
            bounce,
            sway,
        })
    }

    /// Acceleration (g) at time `t` seconds.
    pub fn acceleration(self, t: f64) -> [f64; 3] {
        let tremor = 0.004 * (2.0 * PI * 7.3 * t).sin();
        match self {
            MotionProfile::Sitting => [tremor, 0.1, 0.995],
            MotionProfile::Standing => [tremor, 0.995, 0.1],
            _ => {
                let Some(gait) = self.gait() else {
                    return [0.0, 0.0, 1.0];
                };
                let step = 2.0 * PI * gait.step_hz * t;
                // Stairs add a heel-strike harmonic; direction sets its sign.
                let harmonic = match self {
                    MotionProfile::Upstairs => -0.08 * (2.0 * step).sin(),
                    MotionProfile::Downstairs => 0.12 * (2.0 * step).sin(),
                    _ => 0.0,
                };
                [
                    0.1 * (step / 2.0).sin() + tremor,
                    1.0 + gait.bounce * step.sin() + harmonic,
                    0.2 + 0.05 * step.cos(),
                ]
            }
        }
    }

    /// Rotation rate (rad/s) at time `t` seconds.
    pub fn rotation_rate(self, t: f64) -> [f64; 3] {
        match self.gait() {
            None => {
                let drift = 0.01 * (2.0 * PI * 0.4 * t).sin();
                [drift, -drift, 0.0]
            }
            Some(gait) => {
                let step = 2.0 * PI * gait.step_hz * t;
                [
                    gait.sway * step.cos(),
                    gait.sway * step.sin(),
                    0.2 * gait.sway * (step / 2.0).sin(),
                ]
            }
        }
    }
}

impl std::str::FromStr for MotionProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| format!("unknown motion profile: {s}"))
    }
}

/// Configuration of the synthetic source.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub sources: SourceConfig,
    /// Readings per second, per sensor
    pub sample_rate_hz: f64,
    pub profile: MotionProfile,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            sources: SourceConfig::default(),
            sample_rate_hz: 50.0,
            profile: MotionProfile::Walking,
        }
    }
}

/// Emits synthetic readings from background threads.
pub struct SyntheticCollector {
    config: SyntheticConfig,
    sender: Sender<SensorReading>,
    receiver: Receiver<SensorReading>,
    running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl SyntheticCollector {
    pub fn new(config: SyntheticConfig) -> Self {
        let (sender, receiver) = bounded(READING_CHANNEL_CAPACITY);
        Self {
            config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            threads: Vec::new(),
        }
    }

    fn spawn_sensor(&mut self, kind: SensorKind) {
        let sender = self.sender.clone();
        let running = self.running.clone();
        let profile = self.config.profile;
        let rate = self.config.sample_rate_hz.max(1.0);
        let interval = Duration::from_secs_f64(1.0 / rate);

        let spawned = thread::Builder::new()
            .name(format!("synthetic-{}", kind.name()))
            .spawn(move || {
                let start = Instant::now();
                let mut n: u64 = 0;

                while running.load(Ordering::SeqCst) {
                    let t = n as f64 / rate;
                    let [x, y, z] = match kind {
                        SensorKind::Acceleration => profile.acceleration(t),
                        SensorKind::RotationRate => profile.rotation_rate(t),
                    };
                    let reading = SensorReading {
                        timestamp: Utc::now(),
                        kind,
                        x,
                        y,
                        z,
                    };

                    match sender.try_send(reading) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            tracing::trace!(sensor = kind.name(), "reading channel full, dropping sample");
                        }
                        Err(TrySendError::Disconnected(_)) => break,
                    }

                    n += 1;
                    // Schedule against the start time so sleep jitter does not accumulate.
                    let next = start + interval.mul_f64(n as f64);
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    }
                }
            });

        match spawned {
            Ok(handle) => self.threads.push(handle),
            Err(e) => tracing::error!(sensor = kind.name(), "could not spawn sensor thread: {e}"),
        }
    }
}

impl ReadingSource for SyntheticCollector {
    fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        if !self.config.sources.any_enabled() {
            return Err(CollectorError::NoSources);
        }

        self.running.store(true, Ordering::SeqCst);
        if self.config.sources.accelerometer {
            self.spawn_sensor(SensorKind::Acceleration);
        }
        if self.config.sources.gyroscope {
            self.spawn_sensor(SensorKind::RotationRate);
        }

        tracing::info!(
            profile = self.config.profile.name(),
            rate_hz = self.config.sample_rate_hz,
            "synthetic sensors started"
        );
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        for handle in self.threads.drain(..) {
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

impl Drop for SyntheticCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm_std(profile: MotionProfile) -> f64 {
        let norms: Vec<f64> = (0..150)
            .map(|i| {
                let [x, y, z] = profile.acceleration(i as f64 / 50.0);
                (x * x + y * y + z * z).sqrt()
            })
            .collect();
        let mean = norms.iter().sum::<f64>() / norms.len() as f64;
        (norms.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / norms.len() as f64).sqrt()
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!("Walking".parse::<MotionProfile>(), Ok(MotionProfile::Walking));
        assert_eq!(" jogging ".parse::<MotionProfile>(), Ok(MotionProfile::Jogging));
        assert!("swimming".parse::<MotionProfile>().is_err());
    }

    #[test]
    fn test_stationary_profiles_are_calm() {
        assert!(norm_std(MotionProfile::Sitting) < 0.01);
        assert!(norm_std(MotionProfile::Standing) < 0.01);
    }

    #[test]
    fn test_jogging_is_more_vigorous_than_walking() {
        let walking = norm_std(MotionProfile::Walking);
        let jogging = norm_std(MotionProfile::Jogging);
        assert!(walking > 0.1);
        assert!(jogging > walking);
    }

    #[test]
    fn test_collector_emits_both_sensors() {
        let mut collector = SyntheticCollector::new(SyntheticConfig {
            sample_rate_hz: 200.0,
            ..SyntheticConfig::default()
        });
        collector.start().unwrap();
        assert!(collector.is_running());
        assert!(matches!(collector.start(), Err(CollectorError::AlreadyRunning)));

        let mut seen_accel = false;
        let mut seen_gyro = false;
        let deadline = Instant::now() + Duration::from_secs(5);
        while !(seen_accel && seen_gyro) && Instant::now() < deadline {
            if let Ok(reading) = collector.receiver().recv_timeout(Duration::from_millis(100)) {
                match reading.kind {
                    SensorKind::Acceleration => seen_accel = true,
                    SensorKind::RotationRate => seen_gyro = true,
                }
            }
        }
        collector.stop();

        assert!(seen_accel && seen_gyro);
        assert!(!collector.is_running());
    }

    #[test]
    fn test_no_sources_rejected() {
        let mut collector = SyntheticCollector::new(SyntheticConfig {
            sources: SourceConfig {
                accelerometer: false,
                gyroscope: false,
            },
            ..SyntheticConfig::default()
        });
        assert!(matches!(collector.start(), Err(CollectorError::NoSources)));
    }
}
