//! Bounded polling with exponential backoff.
//!
//! Backends tend to settle asynchronously (a stream reports `Opening` for a
//! while, a volume write is only visible after the next state change). This
//! primitive polls a probe until it succeeds, fails, or a deadline passes.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// First sleep between probes.
    pub initial: Duration,
    /// Upper bound for the sleep between probes.
    pub max_interval: Duration,
    /// Give up once this much time has passed since the first probe.
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn new(initial: Duration, timeout: Duration) -> Self {
        let initial = initial.max(Duration::from_millis(1));
        Self {
            initial,
            max_interval: initial.saturating_mul(16).min(Duration::from_millis(100)).max(initial),
            timeout,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    Ready(T),
    TimedOut { elapsed: Duration },
}

/// Call `probe` until it yields `Some`, returns an error, or `policy.timeout` passes.
///
/// The probe receives the time elapsed since the first attempt. It is always
/// called at least once, and once more right at the deadline.
pub fn retry_with_backoff<T>(
    policy: &RetryPolicy,
    mut probe: impl FnMut(Duration) -> Result<Option<T>>,
) -> Result<Outcome<T>> {
    let start = Instant::now();
    let mut interval = policy.initial;

    loop {
        let elapsed = start.elapsed();
        if let Some(v) = probe(elapsed)? {
            return Ok(Outcome::Ready(v));
        }
        if elapsed >= policy.timeout {
            return Ok(Outcome::TimedOut { elapsed });
        }

        let remaining = policy.timeout - elapsed;
        thread::sleep(interval.min(remaining));
        interval = interval.saturating_mul(2).min(policy.max_interval);
    }
}
