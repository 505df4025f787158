//! Reconnect pacing for the RPC control plane.

use std::time::{Duration, Instant};

pub const RECONNECT_INTERVAL_START: Duration = Duration::from_secs(1);
pub const RECONNECT_INTERVAL_MAX: Duration = Duration::from_secs(120);

/// Doubling backoff: the first attempt runs immediately, each attempt
/// pushes the next deadline out by an interval that doubles up to the
/// 120 s ceiling. The interval is never rewound, so a node that keeps
/// flapping backs off progressively harder for the life of the
/// process.
#[derive(Debug)]
pub struct ReconnectBackoff {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconnectBackoff {
    pub fn new() -> Self {
        Self {
            interval: RECONNECT_INTERVAL_START,
            deadline: None,
        }
    }

    /// True when the next attempt may run.
    pub fn ready(&self, now: Instant) -> bool {
        match self.deadline {
            None => true,
            Some(deadline) => now >= deadline,
        }
    }

    /// Mark an attempt as started at `now`, scheduling the following
    /// attempt after the current interval and doubling the interval.
    pub fn record_attempt(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
        self.interval = (self.interval * 2).min(RECONNECT_INTERVAL_MAX);
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
