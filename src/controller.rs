//! Analysis worker.
//!
//! `SteeringController` holds the current command and is its only writer.
//! Each analyzed frame reads the current command (as the decider's `prev` and
//! as the dispatcher's transition baseline) and then overwrites it exactly
//! once.
//!
//! `spawn` moves a controller onto a dedicated thread. Frames and lifecycle
//! events (pause, resume, stop) reach it through one rendezvous channel, so
//! the producer is held until the worker has taken the frame and lifecycle
//! events are serialized with frame analysis.

use anyhow::{anyhow, Context, Result};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::dispatch::{CommandDispatcher, DispatchOutcome, DispatchStats};
use crate::frame::RawFrame;
use crate::metrics::FrameTimer;
use crate::steer::{Evidence, SteeringStrategy};
use crate::Command;

/// What happened to one delivered frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameOutcome {
    Decided {
        prev: Command,
        command: Command,
        evidence: Evidence,
        dispatch: DispatchOutcome,
    },
    /// Malformed frame; current command unchanged.
    Skipped,
    /// Controller paused; frame released unanalyzed.
    Paused,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerStats {
    pub frames_analyzed: u64,
    pub frames_skipped: u64,
    pub frames_paused: u64,
    pub transitions: u64,
    pub fail_safe_stops: u64,
}

/// Final numbers returned when a controller shuts down.
#[derive(Clone, Copy, Debug)]
pub struct ControllerReport {
    pub stats: ControllerStats,
    pub dispatch: DispatchStats,
    pub last_command: Command,
    pub average_processing: Option<Duration>,
}

pub struct SteeringController {
    strategy: Box<dyn SteeringStrategy>,
    dispatcher: CommandDispatcher,
    current: Command,
    paused: bool,
    timer: FrameTimer,
    stats: ControllerStats,
    timing_log_every: Option<Duration>,
    last_timing_log: Instant,
}

impl SteeringController {
    pub fn new(strategy: Box<dyn SteeringStrategy>, dispatcher: CommandDispatcher) -> Self {
        Self {
            strategy,
            dispatcher,
            current: Command::Stop,
            paused: false,
            timer: FrameTimer::new(),
            stats: ControllerStats::default(),
            timing_log_every: None,
            last_timing_log: Instant::now(),
        }
    }

    /// Log timing and dispatch counters at most once per `every`.
    pub fn with_timing_log(mut self, every: Duration) -> Self {
        self.timing_log_every = Some(every);
        self
    }

    pub fn current(&self) -> Command {
        self.current
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn stats(&self) -> ControllerStats {
        self.stats
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    /// Analyze one frame and release it.
    ///
    /// The frame is dropped before the dispatch hand-off, whatever the
    /// outcome, so the producer can reuse its buffer.
    pub fn analyze(&mut self, frame: RawFrame) -> FrameOutcome {
        if self.paused {
            drop(frame);
            self.stats.frames_paused += 1;
            return FrameOutcome::Paused;
        }

        let started = self.timer.start();
        let prev = self.current;
        let result = self.strategy.steer(&frame.view(), prev);
        drop(frame);
        self.timer.finish(started);

        let steering = match result {
            Ok(steering) => steering,
            Err(e) => {
                self.stats.frames_skipped += 1;
                log::warn!("frame skipped: {:#}", e);
                return FrameOutcome::Skipped;
            }
        };

        let dispatch = self.dispatcher.on_decision(steering.command, prev);
        self.current = steering.command;
        self.stats.frames_analyzed += 1;
        if steering.command != prev {
            self.stats.transitions += 1;
        }
        log::trace!("cmd {} -> {} {:?}", prev, steering.command, steering.evidence);
        self.maybe_log_timing();

        FrameOutcome::Decided {
            prev,
            command: steering.command,
            evidence: steering.evidence,
            dispatch,
        }
    }

    /// Stop the vehicle and ignore frames until `resume`.
    pub fn pause(&mut self) {
        self.fail_safe_stop();
        self.paused = true;
        log::info!("controller paused");
    }

    pub fn resume(&mut self) {
        self.paused = false;
        log::info!("controller resumed");
    }

    /// Dispatch a final `Stop`, drain the dispatcher and report.
    pub fn shutdown(mut self) -> ControllerReport {
        self.fail_safe_stop();
        let average_processing = self.timer.average_processing();
        if let Some(avg) = average_processing {
            log::info!(
                "average frame processing {:?} over {} frames",
                avg,
                self.timer.frames()
            );
        }
        let stats = self.stats;
        let last_command = self.current;
        let dispatch = self.dispatcher.shutdown();
        ControllerReport {
            stats,
            dispatch,
            last_command,
            average_processing,
        }
    }

    fn fail_safe_stop(&mut self) {
        self.dispatcher.fail_safe_stop();
        self.stats.fail_safe_stops += 1;
        self.current = Command::Stop;
    }

    fn maybe_log_timing(&mut self) {
        let Some(every) = self.timing_log_every else {
            return;
        };
        if self.last_timing_log.elapsed() < every {
            return;
        }
        let dispatch = self.dispatcher.stats();
        log::info!(
            "frames={} skipped={} avg_processing={:?} avg_interval={:?} dispatch sent={} failed={} coalesced={}",
            self.timer.frames(),
            self.stats.frames_skipped,
            self.timer.average_processing().unwrap_or_default(),
            self.timer.average_interval().unwrap_or_default(),
            dispatch.sent,
            dispatch.failed,
            dispatch.coalesced
        );
        self.last_timing_log = Instant::now();
    }
}

// ----------------------------------------------------------------------------
// Worker thread
// ----------------------------------------------------------------------------

enum ControlMessage {
    Frame(RawFrame),
    Pause,
    Resume,
    Stop,
}

/// Handle to a controller running on its own thread.
///
/// Dropping the handle stops the worker the same way `stop` does.
pub struct ControllerHandle {
    tx: Option<SyncSender<ControlMessage>>,
    join: Option<JoinHandle<ControllerReport>>,
}

/// Move `controller` onto a dedicated analysis thread.
pub fn spawn(controller: SteeringController) -> Result<ControllerHandle> {
    let (tx, rx) = mpsc::sync_channel(0);
    let join = std::thread::Builder::new()
        .name("analysis".to_string())
        .spawn(move || run_worker(controller, rx))
        .context("spawn analysis thread")?;
    Ok(ControllerHandle {
        tx: Some(tx),
        join: Some(join),
    })
}

fn run_worker(mut controller: SteeringController, rx: Receiver<ControlMessage>) -> ControllerReport {
    log::info!(
        "analysis worker running with strategy {}",
        controller.strategy_name()
    );
    for message in rx {
        match message {
            ControlMessage::Frame(frame) => {
                controller.analyze(frame);
            }
            ControlMessage::Pause => controller.pause(),
            ControlMessage::Resume => controller.resume(),
            ControlMessage::Stop => break,
        }
    }
    controller.shutdown()
}

impl ControllerHandle {
    /// Hand a frame to the worker. Blocks until the worker takes it.
    pub fn submit_frame(&self, frame: RawFrame) -> Result<()> {
        self.send(ControlMessage::Frame(frame))
    }

    pub fn pause(&self) -> Result<()> {
        self.send(ControlMessage::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(ControlMessage::Resume)
    }

    /// Stop the worker: dispatch a fail-safe `Stop`, drain the dispatcher,
    /// and return the final report.
    pub fn stop(mut self) -> Result<ControllerReport> {
        self.finish()
    }

    fn send(&self, message: ControlMessage) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| anyhow!("controller already stopped"))?;
        tx.send(message)
            .map_err(|_| anyhow!("analysis worker has exited"))
    }

    fn finish(&mut self) -> Result<ControllerReport> {
        if let Some(tx) = self.tx.take() {
            // The worker also shuts down when the channel closes, so a failed
            // send only means it already has.
            let _ = tx.send(ControlMessage::Stop);
        }
        let join = self
            .join
            .take()
            .ok_or_else(|| anyhow!("controller already stopped"))?;
        join.join()
            .map_err(|_| anyhow!("analysis worker panicked"))
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            if let Err(e) = self.finish() {
                log::error!("controller teardown failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{RecordingTransport, WireFormat};
    use crate::frame::Rgba;
    use crate::steer::CentroidHysteresis;

    const BLUE: Rgba = Rgba::new(10, 90, 220, 255);
    const GREY: Rgba = Rgba::new(120, 120, 120, 255);

    fn controller(transport: &RecordingTransport) -> SteeringController {
        let dispatcher =
            CommandDispatcher::spawn(transport.clone(), WireFormat::Word, 16).unwrap();
        SteeringController::new(Box::new(CentroidHysteresis::new()), dispatcher)
    }

    /// 100x100 frame with a full-width blue band over `rows`.
    fn band(rows: std::ops::Range<u32>) -> RawFrame {
        let mut frame = RawFrame::filled(100, 100, GREY);
        for row in rows {
            for col in 0..100 {
                frame.set_pixel(row, col, BLUE).unwrap();
            }
        }
        frame
    }

    #[test]
    fn analyze_updates_current_once_per_frame() {
        let transport = RecordingTransport::new();
        let mut ctl = controller(&transport);

        // Bottom band: offset -44, stopped vehicle turns left.
        let outcome = ctl.analyze(band(90..100));
        assert!(matches!(
            outcome,
            FrameOutcome::Decided {
                prev: Command::Stop,
                command: Command::Left,
                dispatch: DispatchOutcome::Queued,
                ..
            }
        ));
        assert_eq!(ctl.current(), Command::Left);

        // Same frame again: no transition, nothing queued.
        let outcome = ctl.analyze(band(90..100));
        assert!(matches!(
            outcome,
            FrameOutcome::Decided {
                dispatch: DispatchOutcome::Unchanged,
                ..
            }
        ));
        assert_eq!(ctl.stats().frames_analyzed, 2);
        assert_eq!(ctl.stats().transitions, 1);
    }

    #[test]
    fn malformed_frame_is_skipped_without_state_change() {
        let transport = RecordingTransport::new();
        let mut ctl = controller(&transport);
        ctl.analyze(band(90..100));

        let truncated = RawFrame::new(vec![0u8; 40], 100, 100);
        assert_eq!(ctl.analyze(truncated), FrameOutcome::Skipped);
        assert_eq!(ctl.current(), Command::Left);
        assert_eq!(ctl.stats().frames_skipped, 1);
    }

    #[test]
    fn pause_stops_vehicle_and_ignores_frames() {
        let transport = RecordingTransport::new();
        let mut ctl = controller(&transport);
        ctl.analyze(band(90..100));

        ctl.pause();
        assert_eq!(ctl.current(), Command::Stop);
        assert_eq!(ctl.analyze(band(90..100)), FrameOutcome::Paused);

        ctl.resume();
        // Current was reset to Stop, so turning left again is a transition.
        assert!(matches!(
            ctl.analyze(band(90..100)),
            FrameOutcome::Decided {
                dispatch: DispatchOutcome::Queued,
                ..
            }
        ));
        ctl.shutdown();

        let moves: Vec<String> = transport
            .payloads()
            .iter()
            .map(|p| p.split(' ').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            moves,
            vec![
                "/Car?move=left",
                "/Car?move=stop",
                "/Car?move=left",
                "/Car?move=stop"
            ]
        );
    }

    #[test]
    fn pause_returns_promptly_while_actuator_is_stuck() {
        let transport = RecordingTransport::new().with_latency(Duration::from_millis(500));
        let dispatcher =
            CommandDispatcher::spawn(transport.clone(), WireFormat::Word, 1).unwrap();
        let mut ctl = SteeringController::new(Box::new(CentroidHysteresis::new()), dispatcher);

        ctl.analyze(band(90..100));
        std::thread::sleep(Duration::from_millis(20));
        ctl.analyze(RawFrame::filled(100, 100, BLUE));

        let started = Instant::now();
        ctl.pause();
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(ctl.current(), Command::Stop);

        let report = ctl.shutdown();
        let payloads = transport.payloads();
        assert!(payloads[0].starts_with("/Car?move=left &"));
        assert!(payloads
            .last()
            .is_some_and(|p| p.starts_with("/Car?move=stop &")));
        assert_eq!(report.dispatch.failed, 0);
    }

    #[test]
    fn frames_are_released_after_analysis() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let released = Arc::new(AtomicUsize::new(0));
        let transport = RecordingTransport::new();
        let mut ctl = controller(&transport);
        for _ in 0..3 {
            let counter = released.clone();
            let frame = band(0..10).with_release(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            ctl.analyze(frame);
        }
        assert_eq!(released.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn worker_teardown_sends_final_stop() {
        let transport = RecordingTransport::new();
        let handle = spawn(controller(&transport)).unwrap();

        handle.submit_frame(band(90..100)).unwrap();
        let report = handle.stop().unwrap();

        assert_eq!(report.stats.frames_analyzed, 1);
        assert_eq!(report.last_command, Command::Stop);
        assert_eq!(report.dispatch.sent, 2);
        let payloads = transport.payloads();
        assert!(payloads[0].starts_with("/Car?move=left &"));
        assert!(payloads[1].starts_with("/Car?move=stop &"));
    }

    #[test]
    fn dropping_handle_also_stops_vehicle() {
        let transport = RecordingTransport::new();
        {
            let handle = spawn(controller(&transport)).unwrap();
            handle.submit_frame(band(0..10)).unwrap();
        }
        let payloads = transport.payloads();
        assert!(payloads
            .last()
            .is_some_and(|p| p.starts_with("/Car?move=stop &")));
    }
}
