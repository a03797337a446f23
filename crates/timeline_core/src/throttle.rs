use std::time::{Duration, Instant};

pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_millis(100);

/// Trailing-edge, latest-wins rate limiter.
///
/// The first value offered while no window is open starts a window of
/// `interval`. Later offers inside the window replace the pending value. When
/// the window closes, `poll` hands out the latest value exactly once. Time is
/// passed in by the caller so the limiter stays deterministic.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    window_end: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_end: None,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn offer(&mut self, value: T, now: Instant) {
        if self.window_end.is_none() {
            self.window_end = Some(now + self.interval);
        }
        self.pending = Some(value);
    }

    /// When the open window closes, if one is open.
    pub fn deadline(&self) -> Option<Instant> {
        self.window_end
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.window_end {
            Some(end) if now >= end => {
                self.window_end = None;
                self.pending.take()
            }
            _ => None,
        }
    }
}
