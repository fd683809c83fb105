//! Command dispatch to the actuator.
//!
//! The analysis worker hands `DispatchRequest`s to a bounded queue without
//! waiting on the transport; when the queue is full the newest decision
//! replaces the newest queued one. A single consumer thread drains the queue
//! in submission order and performs the (possibly slow) transport send. Transport failures are
//! logged and counted, never retried and never reported back to the worker.

mod dispatcher;
#[cfg(feature = "transport-http")]
mod http;
mod request;
mod transport;

pub use dispatcher::{
    CommandDispatcher, DispatchOutcome, DispatchStats, DEFAULT_DRAIN_TIMEOUT,
    DEFAULT_QUEUE_CAPACITY,
};
#[cfg(feature = "transport-http")]
pub use http::HttpTransport;
pub use request::{DispatchRequest, WireFormat};
pub use transport::{LogTransport, RecordingTransport, Transport, TransportError};
