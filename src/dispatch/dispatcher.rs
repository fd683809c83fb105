use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};

use super::request::{DispatchRequest, WireFormat};
use super::transport::Transport;
use crate::Command;

pub const DEFAULT_QUEUE_CAPACITY: usize = 16;
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of handing a decision to the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Command unchanged; nothing to send.
    Unchanged,
    /// Request appended to the queue.
    Queued,
    /// Queue full; the newest queued request was replaced by this decision.
    Coalesced,
    /// Dispatcher closed; request discarded.
    Dropped,
}

/// Dispatcher counters.
///
/// Once the queue has drained, `queued == sent + failed + coalesced`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub queued: u64,
    /// Queued requests superseded by a newer decision before being sent.
    pub coalesced: u64,
    /// Requests refused because the dispatcher was closed.
    pub dropped: u64,
    pub sent: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    queued: AtomicU64,
    coalesced: AtomicU64,
    dropped: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            queued: self.queued.load(Ordering::SeqCst),
            coalesced: self.coalesced.load(Ordering::SeqCst),
            dropped: self.dropped.load(Ordering::SeqCst),
            sent: self.sent.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

#[derive(Default)]
struct Queue {
    pending: VecDeque<DispatchRequest>,
    /// Command most recently taken by the consumer.
    last_taken: Option<Command>,
    closed: bool,
    finished: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    /// Signalled on every queue change and when the consumer exits.
    changed: Condvar,
    counters: Counters,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Forwards command transitions to the actuator off the analysis thread.
///
/// Requests go through a bounded queue to a single consumer thread, so the
/// actuator sees them in the order they were decided. Neither the per-frame
/// path (`on_decision`) nor the lifecycle path (`fail_safe_stop`) waits on the
/// transport:
/// - a decision arriving at a full queue replaces the newest queued request,
///   so the latest decision always reaches the actuator;
/// - a fail-safe `Stop` discards everything pending and goes out next.
pub struct CommandDispatcher {
    shared: Arc<Shared>,
    capacity: usize,
    drain_timeout: Duration,
    join: Option<JoinHandle<()>>,
}

impl CommandDispatcher {
    /// Start the consumer thread.
    pub fn spawn<T>(transport: T, format: WireFormat, capacity: usize) -> Result<Self>
    where
        T: Transport + 'static,
    {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue::default()),
            changed: Condvar::new(),
            counters: Counters::default(),
        });
        let consumer = shared.clone();
        let join = std::thread::Builder::new()
            .name("dispatch".to_string())
            .spawn(move || run_consumer(consumer, transport, format))
            .context("spawn dispatch thread")?;
        Ok(Self {
            shared,
            capacity: capacity.max(1),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            join: Some(join),
        })
    }

    /// How long `shutdown` waits for queued requests to go out before it
    /// abandons the consumer thread.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Queue `new` if it differs from `prev`. Never waits on the transport.
    pub fn on_decision(&self, new: Command, prev: Command) -> DispatchOutcome {
        if new == prev {
            return DispatchOutcome::Unchanged;
        }
        log::debug!("command {} -> {}", prev, new);
        let counters = &self.shared.counters;
        let mut queue = self.shared.lock();
        if queue.closed {
            counters.dropped.fetch_add(1, Ordering::SeqCst);
            log::error!("dispatcher closed, dropping {}", new);
            return DispatchOutcome::Dropped;
        }
        if queue.pending.len() < self.capacity {
            queue.pending.push_back(DispatchRequest::new(new));
            counters.queued.fetch_add(1, Ordering::SeqCst);
            self.shared.changed.notify_all();
            return DispatchOutcome::Queued;
        }

        if let Some(superseded) = queue.pending.pop_back() {
            counters.coalesced.fetch_add(1, Ordering::SeqCst);
            log::warn!(
                "dispatch queue full, {} superseded by {}",
                superseded.command,
                new
            );
        }
        // Skip the push when the actuator is already headed for `new`, so no
        // command is sent twice in a row.
        let baseline = queue
            .pending
            .back()
            .map(|request| request.command)
            .or(queue.last_taken);
        if baseline != Some(new) {
            queue.pending.push_back(DispatchRequest::new(new));
            counters.queued.fetch_add(1, Ordering::SeqCst);
            self.shared.changed.notify_all();
        }
        DispatchOutcome::Coalesced
    }

    /// Queue a `Stop` regardless of the last decision, ahead of anything
    /// still pending. Never waits on the transport.
    pub fn fail_safe_stop(&self) -> DispatchOutcome {
        let counters = &self.shared.counters;
        let mut queue = self.shared.lock();
        if queue.closed {
            counters.dropped.fetch_add(1, Ordering::SeqCst);
            log::error!("fail-safe stop dropped: dispatcher closed");
            return DispatchOutcome::Dropped;
        }
        let discarded = queue.pending.len() as u64;
        queue.pending.clear();
        queue.pending.push_back(DispatchRequest::new(Command::Stop));
        counters.coalesced.fetch_add(discarded, Ordering::SeqCst);
        counters.queued.fetch_add(1, Ordering::SeqCst);
        self.shared.changed.notify_all();
        log::info!("fail-safe stop queued ({} pending discarded)", discarded);
        DispatchOutcome::Queued
    }

    pub fn stats(&self) -> DispatchStats {
        self.shared.counters.snapshot()
    }

    /// Close the queue, give queued requests up to the drain timeout to go
    /// out, and join the consumer.
    pub fn shutdown(mut self) -> DispatchStats {
        self.close();
        self.shared.counters.snapshot()
    }

    fn close(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        let queue = {
            let mut queue = self.shared.lock();
            queue.closed = true;
            self.shared.changed.notify_all();
            self.shared
                .changed
                .wait_timeout_while(queue, self.drain_timeout, |queue| !queue.finished)
                .map(|(queue, _)| queue)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0)
        };
        if !queue.finished {
            log::warn!(
                "actuator still busy after {:?}; abandoning {} pending request(s)",
                self.drain_timeout,
                queue.pending.len()
            );
            // The consumer exits on its own once the blocked send returns.
            return;
        }
        drop(queue);
        if join.join().is_err() {
            log::error!("dispatch thread panicked");
        }
    }
}

impl Drop for CommandDispatcher {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_consumer<T: Transport>(shared: Arc<Shared>, mut transport: T, format: WireFormat) {
    let counters = &shared.counters;
    while let Some(request) = next_request(&shared) {
        let payload = request.payload(format);
        match transport.send(&payload) {
            Ok(()) => {
                counters.sent.fetch_add(1, Ordering::SeqCst);
                log::debug!("sent {}", payload);
            }
            Err(err) => {
                counters.failed.fetch_add(1, Ordering::SeqCst);
                log::warn!("actuator send failed for {}: {}", request.command, err);
            }
        }
    }
    shared.lock().finished = true;
    shared.changed.notify_all();
    log::debug!("dispatch queue closed");
}

/// Block until a request is pending or the queue is closed and empty.
fn next_request(shared: &Shared) -> Option<DispatchRequest> {
    let mut queue = shared.lock();
    loop {
        if let Some(request) = queue.pending.pop_front() {
            queue.last_taken = Some(request.command);
            return Some(request);
        }
        if queue.closed {
            return None;
        }
        queue = shared
            .changed
            .wait(queue)
            .unwrap_or_else(PoisonError::into_inner);
    }
}
