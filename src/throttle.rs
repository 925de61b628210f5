//! Token-bucket admission control.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::circuit::Circuit;
use crate::config::ThrottleBuilder;
use crate::error::{CircuitError, CircuitResult, ConfigError};

/// Capped permit counter shared between callers and the refill task.
#[derive(Debug)]
pub(crate) struct TokenBucket {
    tokens: AtomicU32,
    max: u32,
    refill: u32,
}

impl TokenBucket {
    /// A full bucket.
    pub(crate) fn new(max: u32, refill: u32) -> Self {
        Self {
            tokens: AtomicU32::new(max),
            max,
            refill,
        }
    }

    /// Takes one token. Returns false if the bucket is empty.
    pub(crate) fn try_take(&self) -> bool {
        self.tokens
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| t.checked_sub(1))
            .is_ok()
    }

    /// Adds one refill's worth of tokens, capped at `max`. Returns the new count.
    pub(crate) fn refill(&self) -> u32 {
        let (max, refill) = (self.max, self.refill);
        let previous = self
            .tokens
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| {
                Some(t.saturating_add(refill).min(max))
            })
            .unwrap_or(max);

        previous.saturating_add(refill).min(max)
    }

    pub(crate) fn available(&self) -> u32 {
        self.tokens.load(Ordering::Acquire)
    }
}

/// Rejects calls with [`CircuitError::TooManyCalls`] once the bucket is empty.
///
/// The bucket starts with `max` tokens and each admitted call takes one.
/// A background task, started on the first call, adds `refill` tokens every
/// `period` up to `max`. The task belongs to the throttle and stops when the
/// throttle is dropped, whatever happens to the token of the call that
/// started it.
pub struct Throttle<E> {
    effector: E,
    bucket: Arc<TokenBucket>,
    period: Duration,
    shutdown: CancellationToken,
    refill_task: OnceCell<JoinHandle<()>>,
}

impl Throttle<()> {
    /// Creates a builder for customizing the throttle.
    pub fn builder() -> ThrottleBuilder {
        ThrottleBuilder::new()
    }
}

impl<E> Throttle<E>
where
    E: Circuit + 'static,
{
    /// Wraps `effector` with a bucket of `max` tokens refilled by `refill`
    /// every `period`.
    pub fn new(effector: E, max: u32, refill: u32, period: Duration) -> Result<Self, ConfigError> {
        if max == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }

        Ok(Self {
            effector,
            bucket: Arc::new(TokenBucket::new(max, refill)),
            period,
            shutdown: CancellationToken::new(),
            refill_task: OnceCell::new(),
        })
    }

    /// Tokens currently in the bucket.
    pub fn available_tokens(&self) -> u32 {
        self.bucket.available()
    }

    /// Whether the refill task has been started.
    pub fn is_refilling(&self) -> bool {
        self.refill_task
            .get()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    fn ensure_refilling(&self) {
        self.refill_task.get_or_init(|| {
            tokio::spawn(refill_loop(
                Arc::clone(&self.bucket),
                self.period,
                self.shutdown.clone(),
            ))
        });
    }
}

async fn refill_loop(bucket: Arc<TokenBucket>, period: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    trace!(period_ms = period.as_millis() as u64, "throttle refill task started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let tokens = bucket.refill();
                trace!(tokens, "throttle refilled");
            }
        }
    }

    trace!("throttle refill task stopped");
}

#[async_trait]
impl<E> Circuit for Throttle<E>
where
    E: Circuit + 'static,
{
    async fn call(&self, cancel: &CancellationToken) -> CircuitResult {
        if cancel.is_cancelled() {
            return Err(CircuitError::Cancelled);
        }

        self.ensure_refilling();

        if !self.bucket.try_take() {
            debug!("throttle exhausted, rejecting call");
            return Err(CircuitError::TooManyCalls);
        }

        self.effector.call(cancel).await
    }
}

impl<E> Drop for Throttle<E> {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.refill_task.get() {
            handle.abort();
        }
    }
}

impl<E> std::fmt::Debug for Throttle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle")
            .field("bucket", &self.bucket)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}
