//! demo - end-to-end synthetic run for the steering kernel
//!
//! Feeds a sweeping synthetic blue target through the controller, records
//! every actuator payload in memory and prints the command transitions.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::time::Duration;

use steering_kernel::config::StrategySettings;
use steering_kernel::controller;
use steering_kernel::ingest::SyntheticPattern;
use steering_kernel::{
    CommandDispatcher, FrameSource, RecordingTransport, SteeringController, StrategyRegistry,
    SyntheticConfig, SyntheticSource, WireFormat,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Duration in seconds for synthetic frames.
    #[arg(long, default_value_t = 4)]
    seconds: u64,
    /// Frames per second for the synthetic source.
    #[arg(long, default_value_t = 30)]
    fps: u32,
    /// Steering strategy: centroid or brightness.
    #[arg(long, default_value = "centroid")]
    strategy: String,
    /// Wire format for actuator payloads: word or letter.
    #[arg(long, default_value = "word")]
    wire_format: WireFormat,
    /// Sample every Nth row and column.
    #[arg(long, default_value_t = 1)]
    downsample: u32,
    /// Frames per full sweep of the target across the frame.
    #[arg(long, default_value_t = 60)]
    sweep_period: u64,
    /// Pace frames in real time instead of running as fast as possible.
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }

    stage("select strategy");
    let settings = StrategySettings {
        name: args.strategy.trim().to_lowercase(),
        downsample: args.downsample.max(1),
        ..StrategySettings::default()
    };
    let mut registry = StrategyRegistry::builtin(&settings)?;
    let strategy = registry.take_default()?;
    eprintln!("demo: strategy={} wire_format={:?}", strategy.name(), args.wire_format);

    stage("start controller");
    let transport = RecordingTransport::new();
    let dispatcher = CommandDispatcher::spawn(transport.clone(), args.wire_format, 16)?;
    let handle = controller::spawn(SteeringController::new(strategy, dispatcher))?;

    stage("generate synthetic frames");
    let mut source = SyntheticSource::new(SyntheticConfig {
        url: "stub://demo".to_string(),
        pattern: SyntheticPattern::Sweep {
            period: args.sweep_period,
        },
        ..SyntheticConfig::default()
    });
    source.connect()?;

    let total_frames = args.seconds.saturating_mul(args.fps as u64);
    let frame_interval = Duration::from_millis(1000 / args.fps as u64);
    for _ in 0..total_frames {
        handle.submit_frame(source.next_frame()?)?;
        if args.realtime {
            std::thread::sleep(frame_interval);
        }
    }

    stage("teardown");
    let report = handle.stop()?;

    println!("frames analyzed:  {}", report.stats.frames_analyzed);
    println!("frames skipped:   {}", report.stats.frames_skipped);
    println!("transitions:      {}", report.stats.transitions);
    if let Some(avg) = report.average_processing {
        println!("avg processing:   {:?}", avg);
    }
    println!(
        "dispatch:         sent={} failed={} coalesced={}",
        report.dispatch.sent, report.dispatch.failed, report.dispatch.coalesced
    );
    println!("payloads:");
    for payload in transport.payloads() {
        println!("  {}", payload);
    }

    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}
