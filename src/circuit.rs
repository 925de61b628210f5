//! The `Circuit` contract shared by every decorator.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::breaker::CircuitBreaker;
use crate::debounce_first::DebounceFirst;
use crate::debounce_last::DebounceLast;
use crate::error::{CircuitResult, ConfigError};
use crate::retry::Retry;
use crate::throttle::Throttle;

/// A cancellable operation that yields a string payload or a failure.
///
/// Every decorator in this crate consumes a `Circuit` and is itself a
/// `Circuit`, so decorators nest in any order.
#[async_trait]
pub trait Circuit: Send + Sync {
    /// Invokes the operation. Implementations should return promptly once
    /// `cancel` fires.
    async fn call(&self, cancel: &CancellationToken) -> CircuitResult;
}

#[async_trait]
impl<C> Circuit for Arc<C>
where
    C: Circuit + ?Sized,
{
    async fn call(&self, cancel: &CancellationToken) -> CircuitResult {
        (**self).call(cancel).await
    }
}

#[async_trait]
impl<C> Circuit for Box<C>
where
    C: Circuit + ?Sized,
{
    async fn call(&self, cancel: &CancellationToken) -> CircuitResult {
        (**self).call(cancel).await
    }
}

/// A circuit backed by a closure. Created with [`circuit_fn`].
pub struct FnCircuit<F> {
    f: F,
}

/// Adapts a closure into a [`Circuit`].
///
/// The closure receives its own clone of the cancellation token and must
/// return a future that owns everything it uses.
///
/// ```rust
/// use stability_rs::{circuit_fn, Circuit};
/// use tokio_util::sync::CancellationToken;
///
/// # tokio_test::block_on(async {
/// let hello = circuit_fn(|_cancel| async { Ok("hello".to_string()) });
/// let out = hello.call(&CancellationToken::new()).await;
/// assert_eq!(out.unwrap(), "hello");
/// # });
/// ```
pub fn circuit_fn<F, Fut>(f: F) -> FnCircuit<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = CircuitResult> + Send + 'static,
{
    FnCircuit { f }
}

#[async_trait]
impl<F, Fut> Circuit for FnCircuit<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = CircuitResult> + Send + 'static,
{
    async fn call(&self, cancel: &CancellationToken) -> CircuitResult {
        (self.f)(cancel.clone()).await
    }
}

/// Fluent nesting of decorators around a circuit.
///
/// Each method wraps `self`; the last decorator applied is the outermost.
pub trait CircuitExt: Circuit + Sized {
    /// Wraps this circuit in a [`CircuitBreaker`].
    fn with_breaker(self, failure_threshold: u32) -> CircuitBreaker<Self> {
        CircuitBreaker::new(self, failure_threshold)
    }

    /// Wraps this circuit in a [`Retry`] with a constant delay.
    fn with_retry(self, attempts: u32, delay: Duration) -> Retry<Self> {
        Retry::new(self, attempts, delay)
    }

    /// Wraps this circuit in a token-bucket [`Throttle`].
    fn with_throttle(
        self,
        max: u32,
        refill: u32,
        period: Duration,
    ) -> Result<Throttle<Self>, ConfigError>
    where
        Self: 'static,
    {
        Throttle::new(self, max, refill, period)
    }

    /// Wraps this circuit in a leading-edge [`DebounceFirst`].
    fn debounce_first(self, window: Duration) -> DebounceFirst<Self> {
        DebounceFirst::new(self, window)
    }

    /// Wraps this circuit in a trailing-edge [`DebounceLast`].
    fn debounce_last(self, window: Duration) -> Result<DebounceLast<Self>, ConfigError>
    where
        Self: 'static,
    {
        DebounceLast::new(self, window)
    }

    /// Erases the concrete type of this circuit.
    fn boxed(self) -> Box<dyn Circuit>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<C: Circuit> CircuitExt for C {}
