//! Bounded retry with exponential backoff.
//!
//! Attempt `1..=max_attempts`; after the `k`-th failure (if attempts remain)
//! sleep `initial_delay * 2^(k-1)` and try again. No jitter, no per-attempt
//! timeout: a hung collaborator hangs the loop.

use std::time::Duration;

use crate::error::SyncError;

/// Blocks the current thread between attempts.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

/// Real wall-clock sleeping.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Attempt budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` attempts starting at a one-second delay.
    /// A zero budget is treated as a single attempt.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_secs(1),
        }
    }

    /// Delay slept before retry `k` (1-based): `initial_delay * 2^(k-1)`.
    pub fn delay_before_retry(&self, k: u32) -> Duration {
        let shift = k.saturating_sub(1).min(31);
        self.initial_delay.saturating_mul(1u32 << shift)
    }

    /// Every delay the policy can sleep, in order (`max_attempts - 1` entries).
    pub fn delays(&self) -> Vec<Duration> {
        (1..self.max_attempts)
            .map(|k| self.delay_before_retry(k))
            .collect()
    }
}

/// Runs operations under a [`RetryPolicy`].
pub struct Retrier<'a> {
    policy: RetryPolicy,
    sleeper: &'a dyn Sleeper,
}

impl<'a> Retrier<'a> {
    pub fn new(policy: RetryPolicy, sleeper: &'a dyn Sleeper) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// `what` names the operation in log lines and in
    /// [`SyncError::RetriesExhausted`].
    pub fn run<T>(
        &self,
        what: &str,
        mut op: impl FnMut() -> Result<T, SyncError>,
    ) -> Result<T, SyncError> {
        let max = self.policy.max_attempts;
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max => {
                    let delay = self.policy.delay_before_retry(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = max,
                        delay_secs = delay.as_secs_f64(),
                        error = %err,
                        "{what} failed, retrying"
                    );
                    self.sleeper.sleep(delay);
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(attempts = max, error = %err, "{what} failed, giving up");
                    return Err(SyncError::RetriesExhausted {
                        what: what.to_string(),
                        attempts: max,
                        source: Box::new(err),
                    });
                }
            }
        }
    }
}
