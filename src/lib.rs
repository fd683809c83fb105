//! Steering Kernel
//!
//! This crate implements the frame-to-command control loop of a
//! color-tracking vehicle.
//!
//! # Architecture
//!
//! Each camera frame flows through three stages:
//!
//! 1. **Measure**: scan the RGBA frame for target pixels and reduce them to a
//!    centroid (`detect`).
//! 2. **Decide**: map the centroid and the previous command to a new command
//!    through a hysteretic threshold ladder (`steer`).
//! 3. **Dispatch**: forward command *transitions* to the actuator through a
//!    bounded, in-order queue drained off the analysis thread (`dispatch`).
//!
//! The controller (`controller`) owns the current command and is its only
//! writer. Lifecycle events reach it as messages, and every pause or stop
//! dispatches a fail-safe `Stop`.
//!
//! # Module Structure
//!
//! - `frame`: RGBA frame adapter (RawFrame, FrameView)
//! - `detect`: Target predicate, centroid extractor, brightness split
//! - `steer`: Decision ladder, strategies, registry
//! - `dispatch`: Dispatch requests, transports, dispatcher
//! - `controller`: Analysis worker and its handle
//! - `ingest`: Frame sources for the daemon, demo and tests
//! - `metrics`: Frame timing
//! - `config`: Daemon configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod config;
pub mod controller;
pub mod detect;
pub mod dispatch;
pub mod frame;
pub mod ingest;
pub mod metrics;
pub mod steer;

pub use controller::{
    ControllerHandle, ControllerReport, ControllerStats, FrameOutcome, SteeringController,
};
pub use detect::{BlueDominant, BrightnessSplit, Centroid, CentroidExtractor, TargetPredicate};
pub use dispatch::{
    CommandDispatcher, DispatchOutcome, DispatchRequest, DispatchStats, LogTransport,
    RecordingTransport, Transport, TransportError, WireFormat,
};
#[cfg(feature = "transport-http")]
pub use dispatch::HttpTransport;
pub use frame::{FrameError, FrameView, RawFrame, Rgba};
pub use ingest::{FrameSource, SyntheticConfig, SyntheticSource};
pub use metrics::FrameTimer;
pub use steer::{decide, Steering, SteeringStrategy, StrategyRegistry};

/// Steering command sent to the actuator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    #[default]
    Stop,
    Forward,
    Left,
    Right,
}

impl Command {
    /// Lowercase word used on the wire: `stop`, `forward`, `left`, `right`.
    pub fn as_word(self) -> &'static str {
        match self {
            Command::Stop => "stop",
            Command::Forward => "forward",
            Command::Left => "left",
            Command::Right => "right",
        }
    }

    /// Single-letter code used by the compact wire format.
    pub fn as_letter(self) -> char {
        match self {
            Command::Stop => 's',
            Command::Forward => 'f',
            Command::Left => 'l',
            Command::Right => 'r',
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_word())
    }
}

/// Milliseconds since the Unix epoch, 0 if the clock is before it.
pub fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_wire_spellings() {
        assert_eq!(Command::Forward.as_word(), "forward");
        assert_eq!(Command::Right.as_letter(), 'r');
        assert_eq!(Command::default(), Command::Stop);
        assert_eq!(Command::Left.to_string(), "left");
    }

    #[test]
    fn command_serde_is_lowercase() {
        let json = serde_json::to_string(&Command::Left).unwrap();
        assert_eq!(json, "\"left\"");
        let back: Command = serde_json::from_str("\"forward\"").unwrap();
        assert_eq!(back, Command::Forward);
    }
}
