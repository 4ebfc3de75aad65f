//! Activity Detector CLI
//!
//! Streams motion sensor readings through the activity pipeline.

use activity_detector::{
    classifier::{Classifier, DenseModel, HeuristicClassifier},
    collector::{MotionProfile, ReadingSource, ReplayCollector, SyntheticCollector, SyntheticConfig},
    config::{Config, InferenceMode, SourceConfig},
    core::{ActivityLabel, ActivityPipeline, ActivityState, SnapshotBuilder},
    VERSION,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Classifier chosen at startup. `None` means a model was requested but
/// could not be loaded, so every prediction fails and the label stays
/// "Unknown".
type SessionClassifier = Option<Box<dyn Classifier>>;

type SessionPipeline = ActivityPipeline<SessionClassifier>;

#[derive(Parser)]
#[command(name = "activity-detector")]
#[command(version = VERSION)]
#[command(about = "Streaming activity recognition from motion sensors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a live (synthetic) sensor stream
    Start {
        /// Sensors to read (accelerometer, gyroscope, or all)
        #[arg(long)]
        sources: Option<String>,

        /// Motion pattern to synthesize
        #[arg(long, default_value = "walking")]
        profile: MotionProfile,

        /// Readings per second, per sensor
        #[arg(long)]
        rate_hz: Option<f64>,

        /// Samples per channel window
        #[arg(long)]
        window_size: Option<usize>,

        /// Dense model weights (JSON)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Run inference on a background thread
        #[arg(long)]
        decoupled: bool,

        /// Print one JSON snapshot per published state
        #[arg(long)]
        json: bool,

        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Classify a recorded JSON Lines stream
    Replay {
        /// Recording to replay
        input: PathBuf,

        /// Honor the recorded timestamps instead of replaying at full speed
        #[arg(long)]
        realtime: bool,

        /// Samples per channel window
        #[arg(long)]
        window_size: Option<usize>,

        /// Dense model weights (JSON)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Print one JSON snapshot per published state
        #[arg(long)]
        json: bool,
    },

    /// Show configuration
    Config,

    /// List activity labels and their codes
    Labels,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            sources,
            profile,
            rate_hz,
            window_size,
            model,
            decoupled,
            json,
            duration,
        } => {
            let mut config = load_config()?;
            if let Some(sources) = sources {
                config.sources = SourceConfig::from_csv(&sources);
            }
            if let Some(rate) = rate_hz {
                config.sample_rate_hz = rate;
            }
            if let Some(size) = window_size {
                config.window_size = size;
            }
            if model.is_some() {
                config.model_path = model;
            }
            if decoupled {
                config.inference = InferenceMode::Decoupled;
            }
            config.validate()?;
            cmd_start(&config, profile, json, duration.map(Duration::from_secs))
        }
        Commands::Replay {
            input,
            realtime,
            window_size,
            model,
            json,
        } => {
            let mut config = load_config()?;
            if let Some(size) = window_size {
                config.window_size = size;
            }
            if model.is_some() {
                config.model_path = model;
            }
            config.validate()?;
            cmd_replay(&config, &input, realtime, json)
        }
        Commands::Config => cmd_config(),
        Commands::Labels => {
            cmd_labels();
            Ok(())
        }
    }
}

fn load_config() -> Result<Config> {
    Config::load().with_context(|| format!("loading {}", Config::config_path().display()))
}

fn cmd_start(
    config: &Config,
    profile: MotionProfile,
    json: bool,
    duration: Option<Duration>,
) -> Result<()> {
    eprintln!("Activity Detector v{VERSION}");
    eprintln!("  Accelerometer: {}", enabled(config.sources.accelerometer));
    eprintln!("  Gyroscope: {}", enabled(config.sources.gyroscope));
    eprintln!("  Profile: {}", profile.name());
    eprintln!("  Rate: {} Hz per sensor", config.sample_rate_hz);
    eprintln!("  Window: {} samples", config.window_size);
    eprintln!("Press Ctrl+C to stop");

    let mut collector = SyntheticCollector::new(SyntheticConfig {
        sources: config.sources,
        sample_rate_hz: config.sample_rate_hz,
        profile,
    });
    let mut pipeline = build_pipeline(config, config.inference)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    collector.start()?;
    let deadline = duration.map(|d| Instant::now() + d);
    run_session(&mut collector, &mut pipeline, &running, deadline, json);
    collector.stop();

    eprintln!();
    eprintln!("{}", pipeline.stats().summary());
    Ok(())
}

fn cmd_replay(config: &Config, input: &Path, realtime: bool, json: bool) -> Result<()> {
    let mut collector = ReplayCollector::new(input, realtime);
    let mut pipeline = build_pipeline(config, InferenceMode::Inline)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    collector
        .start()
        .with_context(|| format!("replaying {}", input.display()))?;
    run_session(&mut collector, &mut pipeline, &running, None, json);
    collector.stop();

    eprintln!();
    eprintln!("Final label: {}", pipeline.state().label);
    eprintln!("{}", pipeline.stats().summary());
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = load_config()?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_labels() {
    println!("{:<6} {}", "CODE", "ACTIVITY");
    for label in ActivityLabel::ALL {
        println!("{:<6} {}", label.code(), label.display_name());
    }
}

/// Pick the classifier: the dense model when one is configured, the
/// heuristic otherwise.
fn build_classifier(model_path: Option<&Path>) -> SessionClassifier {
    match model_path {
        None => Some(Box::new(HeuristicClassifier::new()) as Box<dyn Classifier>),
        Some(path) => match DenseModel::load(path) {
            Ok(model) => {
                tracing::info!(
                    path = %path.display(),
                    layers = model.layer_count(),
                    "loaded dense model"
                );
                Some(Box::new(model) as Box<dyn Classifier>)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "model unavailable, label will stay Unknown: {e}");
                None
            }
        },
    }
}

fn build_pipeline(config: &Config, mode: InferenceMode) -> Result<SessionPipeline> {
    let classifier = build_classifier(config.model_path.as_deref());
    let pipeline = match mode {
        InferenceMode::Inline => ActivityPipeline::new(config.window_size, classifier)?,
        InferenceMode::Decoupled => ActivityPipeline::decoupled(config.window_size, classifier)?,
    };
    Ok(pipeline)
}

/// Feed readings until the source runs dry, Ctrl+C, or the deadline.
fn run_session(
    source: &mut dyn ReadingSource,
    pipeline: &mut SessionPipeline,
    running: &AtomicBool,
    deadline: Option<Instant>,
    json: bool,
) {
    let snapshots = SnapshotBuilder::new();
    tracing::debug!(instance_id = %snapshots.instance_id(), "session started");

    let updates = pipeline.state_handle().subscribe();
    let receiver = source.receiver().clone();
    let mut last_label: Option<String> = None;

    while running.load(Ordering::SeqCst) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }

        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(reading) => {
                pipeline.ingest(&reading);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                drain_updates(&updates, &snapshots, json, &mut last_label);
                break;
            }
        }

        drain_updates(&updates, &snapshots, json, &mut last_label);
    }
}

fn drain_updates(
    updates: &Receiver<ActivityState>,
    snapshots: &SnapshotBuilder,
    json: bool,
    last_label: &mut Option<String>,
) {
    for state in updates.try_iter() {
        if json {
            println!("{}", snapshots.build_json(&state));
        } else if last_label.as_deref() != Some(state.label.as_str()) {
            let confidence = state
                .activity
                .and_then(|a| state.probability(a))
                .map(|p| format!(" ({:.0}%)", p * 100.0))
                .unwrap_or_default();
            let at = state.updated_at.unwrap_or_else(chrono::Utc::now);
            println!("[{}] {}{}", at.format("%H:%M:%S"), state.label, confidence);
            *last_label = Some(state.label);
        }
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

/// Set up Ctrl+C handler.
fn install_ctrlc_handler(running: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")
}
