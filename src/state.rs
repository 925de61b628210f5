//! Circuit breaker bookkeeping.

use std::time::Duration;

use tokio::time::Instant;

use crate::policy::BackoffPolicy;

/// Observable condition of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Calls pass through to the wrapped circuit.
    Closed = 0,

    /// Calls are short-circuited until the backoff window elapses.
    Open = 1,
}

/// Failure counter and time of the last attempt for one breaker.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BreakerState {
    pub(crate) consecutive_failures: u32,
    pub(crate) last_attempt: Instant,
}

impl BreakerState {
    pub(crate) fn new() -> Self {
        Self {
            consecutive_failures: 0,
            last_attempt: Instant::now(),
        }
    }

    /// Time before which calls must be rejected, if the failure count has
    /// reached `threshold`.
    pub(crate) fn retry_at<P>(&self, threshold: u32, backoff: &P) -> Option<Instant>
    where
        P: BackoffPolicy + ?Sized,
    {
        let excess = self.consecutive_failures.checked_sub(threshold)?;
        let cooldown = backoff.delay(excess);

        // Saturate far in the future rather than overflow.
        Some(
            self.last_attempt
                .checked_add(cooldown)
                .unwrap_or_else(|| far_future(self.last_attempt)),
        )
    }

    /// Current condition as seen at `now`.
    pub(crate) fn state_at<P>(&self, threshold: u32, backoff: &P, now: Instant) -> State
    where
        P: BackoffPolicy + ?Sized,
    {
        match self.retry_at(threshold, backoff) {
            Some(retry_at) if now <= retry_at => State::Open,
            _ => State::Closed,
        }
    }

    /// Records the outcome of an attempt made at `now`.
    ///
    /// Returns the failure count before the update.
    pub(crate) fn record(&mut self, success: bool, now: Instant) -> u32 {
        let previous = self.consecutive_failures;
        self.last_attempt = now;

        if success {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }

        previous
    }
}

fn far_future(from: Instant) -> Instant {
    // Roughly thirty years.
    from + Duration::from_secs(86_400 * 365 * 30)
}
