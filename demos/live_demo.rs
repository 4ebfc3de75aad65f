//! Cycles the synthetic source through every motion profile and prints the
//! label as it changes.
//!
//! Run with: `cargo run --example live_demo`

use activity_detector::collector::{
    MotionProfile, ReadingSource, SyntheticCollector, SyntheticConfig,
};
use activity_detector::{ActivityPipeline, HeuristicClassifier};
use std::time::{Duration, Instant};

const SECONDS_PER_PROFILE: u64 = 6;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("activity_detector=info")
        .init();

    let mut pipeline = ActivityPipeline::new(150, HeuristicClassifier::new())?;
    let updates = pipeline.state_handle().subscribe();

    for profile in MotionProfile::ALL {
        println!("--- {} ---", profile.name());
        let mut collector = SyntheticCollector::new(SyntheticConfig {
            profile,
            ..SyntheticConfig::default()
        });
        collector.start()?;

        let deadline = Instant::now() + Duration::from_secs(SECONDS_PER_PROFILE);
        let mut last_label = String::new();
        while Instant::now() < deadline {
            if let Ok(reading) = collector.receiver().recv_timeout(Duration::from_millis(100)) {
                pipeline.ingest(&reading);
            }
            for state in updates.try_iter() {
                if state.label != last_label {
                    println!("  {}", state.label);
                    last_label = state.label;
                }
            }
        }

        collector.stop();
    }

    println!();
    println!("{}", pipeline.stats().summary());
    Ok(())
}
