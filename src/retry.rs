//! Bounded retry with a cancellable wait between attempts.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::circuit::Circuit;
use crate::config::RetryBuilder;
use crate::error::{CircuitError, CircuitResult};
use crate::policy::{BackoffPolicy, ConstantBackoff};

/// Re-invokes a failing effector.
///
/// The effector runs at most `attempts + 1` times. The first success is
/// returned as is; if every attempt fails, the failure of the last attempt
/// is returned. If the cancellation signal fires while waiting between
/// attempts, [`CircuitError::Cancelled`] is returned and the remaining
/// attempts are abandoned.
///
/// No state is kept between calls.
pub struct Retry<E> {
    effector: E,
    attempts: u32,
    backoff: Box<dyn BackoffPolicy>,
}

impl Retry<()> {
    /// Creates a builder for customizing the retry.
    pub fn builder() -> RetryBuilder {
        RetryBuilder::new()
    }
}

impl<E> Retry<E>
where
    E: Circuit,
{
    /// Retries up to `attempts` extra times, waiting `delay` in between.
    pub fn new(effector: E, attempts: u32, delay: Duration) -> Self {
        Self::from_parts(effector, attempts, Box::new(ConstantBackoff::new(delay)))
    }

    pub(crate) fn from_parts(effector: E, attempts: u32, backoff: Box<dyn BackoffPolicy>) -> Self {
        Self {
            effector,
            attempts,
            backoff,
        }
    }

    /// Number of additional attempts after the first call.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[async_trait]
impl<E> Circuit for Retry<E>
where
    E: Circuit,
{
    async fn call(&self, cancel: &CancellationToken) -> CircuitResult {
        let mut retry = 0u32;

        loop {
            let err = match self.effector.call(cancel).await {
                Ok(response) => return Ok(response),
                Err(err) if retry >= self.attempts => return Err(err),
                Err(err) => err,
            };

            let delay = self.backoff.delay(retry);
            retry += 1;

            warn!(
                attempt = retry,
                retry_in_ms = delay.as_millis() as u64,
                error = %err,
                "attempt failed; retrying"
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(CircuitError::Cancelled),
            }
        }
    }
}

impl<E> std::fmt::Debug for Retry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retry")
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}
