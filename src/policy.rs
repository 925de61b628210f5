//! Backoff policies used by the breaker cooldown and the retry delay.

use std::time::Duration;

/// Computes how long to wait before the next attempt.
pub trait BackoffPolicy: Send + Sync + 'static {
    /// Returns the delay for the given zero-based attempt index.
    fn delay(&self, attempt: u32) -> Duration;
}

/// Doubles the delay on every attempt: `base * 2^attempt`.
///
/// Saturates at [`Duration::MAX`] instead of overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    base: Duration,
}

impl ExponentialBackoff {
    /// Creates a new exponential policy starting at `base`.
    pub fn new(base: Duration) -> Self {
        Self { base }
    }

    /// The delay returned for attempt zero.
    pub fn base(&self) -> Duration {
        self.base
    }
}

impl Default for ExponentialBackoff {
    /// Two seconds, doubling. With a breaker this gives `2^(excess+1)` seconds.
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let factor = match 1u32.checked_shl(attempt) {
            Some(f) => f,
            None => return Duration::MAX,
        };

        self.base.checked_mul(factor).unwrap_or(Duration::MAX)
    }
}

/// Waits the same amount of time before every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBackoff {
    delay: Duration,
}

impl ConstantBackoff {
    /// Creates a new constant policy.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl BackoffPolicy for ConstantBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

impl<P: BackoffPolicy + ?Sized> BackoffPolicy for Box<P> {
    fn delay(&self, attempt: u32) -> Duration {
        (**self).delay(attempt)
    }
}
