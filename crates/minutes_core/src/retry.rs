//! Bounded exponential backoff for quota-limited store calls.
//!
//! # Responsibility
//! - Re-run an operation while the store reports transient quota failures.
//! - Fail fast on anything that is not a quota signal.
//!
//! # Invariants
//! - The operation runs at most `max_attempts` times.
//! - After failed attempt `n` the policy waits `time_unit * 2^n` before the
//!   next attempt; the final attempt is never followed by a wait, so the
//!   default three attempts wait 2 + 4 units and stay under 14.
//! - Exhausting every attempt yields `StoreError::Overloaded`.
//! - Waiting blocks the calling thread; there is no cancellation.

use crate::store::{StoreError, StoreResult};
use log::{error, info, warn};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TIME_UNIT: Duration = Duration::from_secs(1);

// Keeps `1 << attempt` inside u32 for absurd attempt counts.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Blocking wait primitive used between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Retry configuration shared by every store-facing component.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    time_unit: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl Debug for RetryPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("time_unit", &self.time_unit)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_TIME_UNIT)
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, time_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            time_unit,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Replaces the wait primitive.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait applied after failed attempt `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(MAX_BACKOFF_EXPONENT);
        self.time_unit.saturating_mul(factor)
    }

    /// Runs `operation` until it succeeds, fails fatally, or attempts run out.
    ///
    /// `label` names the operation in log events only.
    ///
    /// # Errors
    /// - Returns the first non-transient error unchanged.
    /// - Returns `StoreError::Overloaded` after `max_attempts` transient failures.
    pub fn execute<T, F>(&self, label: &str, mut operation: F) -> StoreResult<T>
    where
        F: FnMut() -> StoreResult<T>,
    {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match operation() {
                Ok(value) => {
                    if attempt > 1 {
                        info!(
                            "event=store_retry module=retry status=recovered operation={label} attempt={attempt}"
                        );
                    }
                    return Ok(value);
                }
                Err(err) if err.is_transient() => {
                    last_error = err.to_string();
                    if attempt == self.max_attempts {
                        break;
                    }
                    let delay = self.backoff_for(attempt);
                    warn!(
                        "event=store_retry module=retry status=retry operation={label} attempt={attempt} max_attempts={} delay_ms={} error_code={}",
                        self.max_attempts,
                        delay.as_millis(),
                        err.code()
                    );
                    self.sleeper.sleep(delay);
                }
                Err(err) => {
                    error!(
                        "event=store_retry module=retry status=error operation={label} attempt={attempt} error_code={} error={}",
                        err.code(),
                        err
                    );
                    return Err(err);
                }
            }
        }

        error!(
            "event=store_retry module=retry status=error operation={label} attempts={} error_code=service_overloaded",
            self.max_attempts
        );
        Err(StoreError::Overloaded {
            attempts: self.max_attempts,
            last_error,
        })
    }
}
