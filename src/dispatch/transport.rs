use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

/// Failure of a single actuator send. Never retried.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("actuator request failed: {0}")]
    Request(String),
    #[error("actuator answered with status {0}")]
    Status(u16),
}

/// Outbound link to the actuator.
///
/// `send` may block for as long as the network takes; it is only ever called
/// from the dispatcher's consumer thread.
pub trait Transport: Send {
    fn send(&mut self, payload: &str) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, payload: &str) -> Result<(), TransportError> {
        (**self).send(payload)
    }
}

/// Transport that only logs payloads. Used for `stub://` actuators.
#[derive(Clone, Debug, Default)]
pub struct LogTransport {
    target: String,
}

impl LogTransport {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl Transport for LogTransport {
    fn send(&mut self, payload: &str) -> Result<(), TransportError> {
        log::info!("actuator {} <- {}", self.target, payload);
        Ok(())
    }
}

/// In-memory transport that records every payload it is asked to send.
///
/// Clones share the same record, so a test keeps one clone and hands the
/// other to the dispatcher.
#[derive(Clone, Debug, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<String>>>,
    latency: Option<Duration>,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every send, simulating a slow actuator link.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Record attempts but report every send as failed.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Payloads seen so far, in send order.
    pub fn payloads(&self) -> Vec<String> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, payload: &str) -> Result<(), TransportError> {
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        self.sent
            .lock()
            .map_err(|_| TransportError::Request("recording lock poisoned".to_string()))?
            .push(payload.to_string());
        if self.fail {
            return Err(TransportError::Request("simulated failure".to_string()));
        }
        Ok(())
    }
}
