use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{now_epoch_ms, Command};

/// Spelling of the command inside the actuator payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// `stop`, `forward`, `left`, `right`.
    #[default]
    Word,
    /// `s`, `f`, `l`, `r`.
    Letter,
}

impl FromStr for WireFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" => Ok(WireFormat::Word),
            "letter" => Ok(WireFormat::Letter),
            other => Err(anyhow!(
                "unknown wire format '{}'; expected 'word' or 'letter'",
                other
            )),
        }
    }
}

/// One command queued for transmission.
///
/// The timestamp is captured when the request is created, i.e. at decision
/// time, not when the consumer gets around to sending it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchRequest {
    pub command: Command,
    pub timestamp_ms: u64,
}

impl DispatchRequest {
    pub fn new(command: Command) -> Self {
        Self::at(command, now_epoch_ms())
    }

    pub fn at(command: Command, timestamp_ms: u64) -> Self {
        Self {
            command,
            timestamp_ms,
        }
    }

    /// Actuator payload: `/Car?move=<command> &<timestamp-ms>`.
    ///
    /// The space before `&` is part of the actuator's wire contract.
    pub fn payload(&self, format: WireFormat) -> String {
        match format {
            WireFormat::Word => {
                format!("/Car?move={} &{}", self.command.as_word(), self.timestamp_ms)
            }
            WireFormat::Letter => {
                format!("/Car?move={} &{}", self.command.as_letter(), self.timestamp_ms)
            }
        }
    }
}
