//! Frame timing diagnostics.
//!
//! Purely observational: nothing in the decision path reads these values.

use std::time::{Duration, Instant};

/// Running per-frame processing and inter-frame interval averages.
#[derive(Clone, Debug, Default)]
pub struct FrameTimer {
    frames: u64,
    total_processing: Duration,
    last_processing: Option<Duration>,
    intervals: u64,
    total_interval: Duration,
    last_arrival: Option<Instant>,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a frame arrival and return the instant processing started.
    pub fn start(&mut self) -> Instant {
        let now = Instant::now();
        if let Some(prev) = self.last_arrival.replace(now) {
            self.intervals += 1;
            self.total_interval += now.duration_since(prev);
        }
        now
    }

    /// Record the processing time of a frame started at `started`.
    pub fn finish(&mut self, started: Instant) -> Duration {
        let elapsed = started.elapsed();
        self.record(elapsed);
        elapsed
    }

    pub fn record(&mut self, processing: Duration) {
        self.frames += 1;
        self.total_processing += processing;
        self.last_processing = Some(processing);
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_processing(&self) -> Option<Duration> {
        self.last_processing
    }

    pub fn average_processing(&self) -> Option<Duration> {
        average(self.total_processing, self.frames)
    }

    pub fn average_interval(&self) -> Option<Duration> {
        average(self.total_interval, self.intervals)
    }
}

fn average(total: Duration, count: u64) -> Option<Duration> {
    if count == 0 {
        return None;
    }
    Some(Duration::from_nanos((total.as_nanos() / count as u128) as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_timer_has_no_average() {
        let timer = FrameTimer::new();
        assert_eq!(timer.frames(), 0);
        assert!(timer.average_processing().is_none());
        assert!(timer.average_interval().is_none());
    }

    #[test]
    fn averages_recorded_durations() {
        let mut timer = FrameTimer::new();
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));

        assert_eq!(timer.frames(), 2);
        assert_eq!(timer.average_processing(), Some(Duration::from_millis(15)));
        assert_eq!(timer.last_processing(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn intervals_start_with_second_frame() {
        let mut timer = FrameTimer::new();
        let first = timer.start();
        timer.finish(first);
        assert!(timer.average_interval().is_none());

        std::thread::sleep(Duration::from_millis(5));
        let second = timer.start();
        timer.finish(second);
        assert!(timer.average_interval().unwrap() >= Duration::from_millis(5));
    }
}
