//! steerd - steering daemon
//!
//! This daemon:
//! 1. Pulls frames from the configured source at the target rate
//! 2. Hands each frame to the analysis worker, which decides a command
//! 3. Forwards command transitions to the actuator off the analysis thread
//! 4. Stops the vehicle on shutdown (Ctrl-C) before exiting

use anyhow::Result;
use std::sync::mpsc::{self, TryRecvError};
use std::time::{Duration, Instant};

use steering_kernel::config::SteerdConfig;
use steering_kernel::controller;
use steering_kernel::ingest::open_source;
use steering_kernel::{
    CommandDispatcher, LogTransport, SteeringController, StrategyRegistry, Transport,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = SteerdConfig::load()?;

    let mut registry = StrategyRegistry::builtin(&cfg.strategy)?;
    log::info!("strategies available: {}", registry.list().join(", "));
    let mut strategy = registry.take_default()?;
    strategy.warm_up()?;

    let transport = build_transport(&cfg)?;
    let dispatcher = CommandDispatcher::spawn(
        transport,
        cfg.actuator.wire_format,
        cfg.actuator.queue_capacity,
    )?
    .with_drain_timeout(cfg.actuator.drain_timeout);
    let controller = SteeringController::new(strategy, dispatcher)
        .with_timing_log(cfg.timing_log_every);
    let handle = controller::spawn(controller)?;

    let mut source = open_source(&cfg.source)?;
    source.connect()?;

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })?;

    log::info!(
        "steerd running. source={} actuator={} strategy={}",
        cfg.source.url,
        cfg.actuator.url,
        cfg.strategy.name
    );

    let frame_interval = Duration::from_millis(1000 / cfg.source.target_fps as u64);
    let mut last_health_log = Instant::now();

    loop {
        match rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => {
                log::info!("shutdown signal received, stopping vehicle...");
                break;
            }
            Err(TryRecvError::Empty) => {}
        }

        let started = Instant::now();
        match source.next_frame() {
            Ok(frame) => handle.submit_frame(frame)?,
            Err(e) => log::warn!("frame source error: {}", e),
        }

        if last_health_log.elapsed() >= cfg.timing_log_every {
            let stats = source.stats();
            log::info!(
                "source health={} frames={} source={}",
                source.is_healthy(),
                stats.frames_captured,
                stats.source
            );
            last_health_log = Instant::now();
        }

        if let Some(remaining) = frame_interval.checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    let report = handle.stop()?;
    log::info!(
        "steerd stopped. frames analyzed={} skipped={} transitions={} sent={} failed={} coalesced={}",
        report.stats.frames_analyzed,
        report.stats.frames_skipped,
        report.stats.transitions,
        report.dispatch.sent,
        report.dispatch.failed,
        report.dispatch.coalesced
    );
    Ok(())
}

fn build_transport(cfg: &SteerdConfig) -> Result<Box<dyn Transport>> {
    if cfg.actuator.is_stub() {
        return Ok(Box::new(LogTransport::new(cfg.actuator.url.clone())));
    }
    #[cfg(feature = "transport-http")]
    {
        let transport =
            steering_kernel::HttpTransport::new(&cfg.actuator.url, cfg.actuator.timeout)?;
        if cfg.actuator.timeout.is_none() {
            log::warn!("actuator sends have no timeout; a stalled actuator delays later commands");
        }
        Ok(Box::new(transport))
    }
    #[cfg(not(feature = "transport-http"))]
    {
        Err(anyhow::anyhow!(
            "actuator '{}' requires the transport-http feature",
            cfg.actuator.url
        ))
    }
}
