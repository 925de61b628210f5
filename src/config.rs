//! Builders for decorators with more than one knob.

use std::sync::Arc;
use std::time::Duration;

use crate::breaker::CircuitBreaker;
use crate::circuit::Circuit;
use crate::error::ConfigError;
use crate::hook::HookRegistry;
use crate::policy::{BackoffPolicy, ConstantBackoff, ExponentialBackoff};
use crate::retry::Retry;
use crate::throttle::Throttle;

/// Builder for creating circuit breakers with custom configurations.
pub struct BreakerBuilder {
    failure_threshold: u32,
    backoff: Box<dyn BackoffPolicy>,
    hook_registry: Arc<HookRegistry>,
}

impl Default for BreakerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            backoff: Box::new(ExponentialBackoff::default()),
            hook_registry: Arc::new(HookRegistry::new()),
        }
    }

    /// Sets the number of consecutive failures after which calls are rejected.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Sets the cooldown policy. It is queried with the number of failures
    /// beyond the threshold.
    pub fn backoff<P: BackoffPolicy>(mut self, policy: P) -> Self {
        self.backoff = Box::new(policy);
        self
    }

    /// Sets a hook registry for the circuit breaker.
    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hook_registry = Arc::new(hooks);
        self
    }

    /// Builds a circuit breaker around `inner`.
    pub fn build<C: Circuit>(self, inner: C) -> CircuitBreaker<C> {
        CircuitBreaker::from_parts(inner, self.failure_threshold, self.backoff, self.hook_registry)
    }
}

/// Builder for [`Retry`].
pub struct RetryBuilder {
    attempts: u32,
    backoff: Box<dyn BackoffPolicy>,
}

impl Default for RetryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryBuilder {
    /// Three retries, one second apart.
    pub fn new() -> Self {
        Self {
            attempts: 3,
            backoff: Box::new(ConstantBackoff::new(Duration::from_secs(1))),
        }
    }

    /// Sets the number of additional attempts after the first call.
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Waits `delay` between every attempt.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.backoff = Box::new(ConstantBackoff::new(delay));
        self
    }

    /// Uses a custom policy for the wait between attempts.
    pub fn backoff<P: BackoffPolicy>(mut self, policy: P) -> Self {
        self.backoff = Box::new(policy);
        self
    }

    /// Builds a retry around `effector`.
    pub fn build<E: Circuit>(self, effector: E) -> Retry<E> {
        Retry::from_parts(effector, self.attempts, self.backoff)
    }
}

/// Builder for [`Throttle`].
#[derive(Debug, Clone, Copy)]
pub struct ThrottleBuilder {
    max: u32,
    refill: u32,
    period: Duration,
}

impl Default for ThrottleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ThrottleBuilder {
    /// A bucket of ten tokens refilled by one every second.
    pub fn new() -> Self {
        Self {
            max: 10,
            refill: 1,
            period: Duration::from_secs(1),
        }
    }

    /// Sets the bucket capacity, which is also the initial token count.
    pub fn max(mut self, max: u32) -> Self {
        self.max = max;
        self
    }

    /// Sets the number of tokens added every period.
    pub fn refill(mut self, refill: u32) -> Self {
        self.refill = refill;
        self
    }

    /// Sets the refill period.
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Validates the settings and builds a throttle around `effector`.
    pub fn build<E>(self, effector: E) -> Result<Throttle<E>, ConfigError>
    where
        E: Circuit + 'static,
    {
        Throttle::new(effector, self.max, self.refill, self.period)
    }
}
