//! Consecutive-failure circuit breaker with exponential cooldown.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::circuit::Circuit;
use crate::config::BreakerBuilder;
use crate::error::{CircuitError, CircuitResult};
use crate::hook::HookRegistry;
use crate::policy::{BackoffPolicy, ExponentialBackoff};
use crate::state::{BreakerState, State};

/// Short-circuits calls to a failing circuit.
///
/// Once the wrapped circuit has failed `failure_threshold` times in a row,
/// calls are rejected with [`CircuitError::ServiceUnreachable`] until the
/// cooldown computed by the backoff policy has elapsed since the last
/// attempt. Each further failure lengthens the cooldown; one success resets
/// the count.
///
/// The admission check and the state update are separate critical sections
/// and no lock is held while the wrapped circuit runs. Concurrent callers
/// may therefore all pass the check while the breaker is about to trip.
pub struct CircuitBreaker<C> {
    inner: C,
    failure_threshold: u32,
    backoff: Box<dyn BackoffPolicy>,
    state: RwLock<BreakerState>,
    hooks: Arc<HookRegistry>,
}

impl CircuitBreaker<()> {
    /// Creates a builder for customizing a circuit breaker.
    pub fn builder() -> BreakerBuilder {
        BreakerBuilder::new()
    }
}

impl<C> CircuitBreaker<C>
where
    C: Circuit,
{
    /// Wraps `inner` with the default `2^(excess+1)` seconds cooldown.
    pub fn new(inner: C, failure_threshold: u32) -> Self {
        Self::from_parts(
            inner,
            failure_threshold,
            Box::new(ExponentialBackoff::default()),
            Arc::new(HookRegistry::new()),
        )
    }

    pub(crate) fn from_parts(
        inner: C,
        failure_threshold: u32,
        backoff: Box<dyn BackoffPolicy>,
        hooks: Arc<HookRegistry>,
    ) -> Self {
        Self {
            inner,
            failure_threshold,
            backoff,
            state: RwLock::new(BreakerState::new()),
            hooks,
        }
    }

    /// Gets the current state of the circuit breaker.
    pub fn state(&self) -> State {
        self.state
            .read()
            .state_at(self.failure_threshold, &*self.backoff, Instant::now())
    }

    /// Number of failures since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.state.read().consecutive_failures
    }

    /// The configured failure threshold.
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// The hooks fired by this breaker.
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Returns the wrapped circuit.
    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    fn admit(&self) -> Result<(), CircuitError> {
        let retry_at = self
            .state
            .read()
            .retry_at(self.failure_threshold, &*self.backoff);

        match retry_at {
            Some(retry_at) if Instant::now() <= retry_at => {
                debug!(
                    retry_in_ms = retry_at.saturating_duration_since(Instant::now()).as_millis() as u64,
                    "circuit breaker open, rejecting call"
                );
                self.hooks.fire_reject();
                Err(CircuitError::ServiceUnreachable)
            }
            _ => Ok(()),
        }
    }

    fn record(&self, success: bool) {
        let previous = self.state.write().record(success, Instant::now());

        if success {
            self.hooks.fire_success();
            if previous >= self.failure_threshold && previous > 0 {
                debug!(previous_failures = previous, "circuit breaker closed");
                self.hooks.fire_close();
            }
            return;
        }

        self.hooks.fire_failure();
        let failures = previous.saturating_add(1);
        if failures >= self.failure_threshold {
            let excess = failures - self.failure_threshold;
            warn!(
                consecutive_failures = failures,
                cooldown_ms = self.backoff.delay(excess).as_millis() as u64,
                "circuit breaker open"
            );
            // A zero threshold is open from the start; report it on the
            // first failure.
            if failures == self.failure_threshold.max(1) {
                self.hooks.fire_open();
            }
        }
    }
}

#[async_trait]
impl<C> Circuit for CircuitBreaker<C>
where
    C: Circuit,
{
    async fn call(&self, cancel: &CancellationToken) -> CircuitResult {
        self.admit()?;

        let result = self.inner.call(cancel).await;
        self.record(result.is_ok());

        result
    }
}

impl<C> std::fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("failure_threshold", &self.failure_threshold)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}
