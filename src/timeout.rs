//! Races a blocking operation against cancellation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::circuit::Circuit;
use crate::error::{CircuitError, CircuitResult};

/// A slow operation that takes an argument and knows nothing about
/// cancellation.
///
/// Implemented for every `Fn(String) -> CircuitResult`.
pub trait SlowFunction: Send + Sync + 'static {
    /// Runs the operation to completion.
    fn invoke(&self, arg: String) -> CircuitResult;
}

impl<F> SlowFunction for F
where
    F: Fn(String) -> CircuitResult + Send + Sync + 'static,
{
    fn invoke(&self, arg: String) -> CircuitResult {
        self(arg)
    }
}

/// Makes a [`SlowFunction`] cancellation-aware.
///
/// Each call runs the function on the blocking thread pool and waits for
/// whichever comes first: its result, the cancellation signal, or the
/// optional deadline. When the function loses the race it is abandoned, not
/// killed. It keeps running in the background and its result is discarded.
pub struct Timeout<F> {
    f: Arc<F>,
    deadline: Option<Duration>,
}

impl<F> Clone for Timeout<F> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
            deadline: self.deadline,
        }
    }
}

impl<F> Timeout<F>
where
    F: SlowFunction,
{
    /// Wraps `f`. Without a deadline only the cancellation signal ends the race.
    pub fn new(f: F) -> Self {
        Self {
            f: Arc::new(f),
            deadline: None,
        }
    }

    /// Also gives up after `deadline`, measured from the start of each call.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Runs the slow function with `arg`, returning
    /// [`CircuitError::Cancelled`] if it does not finish in time.
    pub async fn call(&self, cancel: &CancellationToken, arg: impl Into<String>) -> CircuitResult {
        let f = Arc::clone(&self.f);
        let arg = arg.into();
        let handle = tokio::task::spawn_blocking(move || f.invoke(arg));

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            joined = handle => match joined {
                Ok(result) => result,
                // The slow function panicked.
                Err(err) => Err(CircuitError::operation(err)),
            },
            _ = cancel.cancelled() => {
                debug!("slow function abandoned: cancelled");
                Err(CircuitError::Cancelled)
            }
            _ = deadline => {
                debug!(deadline_ms = self.deadline.unwrap_or_default().as_millis() as u64, "slow function abandoned: deadline elapsed");
                Err(CircuitError::Cancelled)
            }
        }
    }

    /// Fixes the argument, turning this timeout into a [`Circuit`].
    pub fn bind(self, arg: impl Into<String>) -> TimeoutCircuit<F> {
        TimeoutCircuit {
            timeout: self,
            arg: arg.into(),
        }
    }
}

/// A [`Timeout`] with a fixed argument. Created with [`Timeout::bind`].
pub struct TimeoutCircuit<F> {
    timeout: Timeout<F>,
    arg: String,
}

#[async_trait]
impl<F> Circuit for TimeoutCircuit<F>
where
    F: SlowFunction,
{
    async fn call(&self, cancel: &CancellationToken) -> CircuitResult {
        self.timeout.call(cancel, self.arg.clone()).await
    }
}
