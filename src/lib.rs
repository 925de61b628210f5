//! # stability-rs
//!
//! Composable stability decorators for remote or slow operations.
//!
//! Every decorator wraps a [`Circuit`], a cancellable operation returning a
//! string payload or a [`CircuitError`], and is itself a `Circuit`. Stack
//! them in whatever order the call site needs; the call flows from the
//! outermost decorator to the innermost operation.
//!
//! - [`CircuitBreaker`]: rejects calls for an exponentially growing cooldown
//!   after too many consecutive failures.
//! - [`Retry`]: re-invokes a failing operation a bounded number of times.
//! - [`Timeout`]: races a blocking function against cancellation.
//! - [`Throttle`]: token-bucket admission control with periodic refill.
//! - [`DebounceFirst`]: performs the first call of a window and replays it.
//! - [`DebounceLast`]: fires once after a burst of calls goes quiet.
//!
//! Cancellation is signalled with a [`CancellationToken`]; no decorator
//! blocks past it.
//!
//! ## Basic Usage
//!
//! ```rust
//! use std::time::Duration;
//! use stability_rs::{circuit_fn, Circuit, CircuitError, CircuitExt};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let fetch = circuit_fn(|_cancel| async { Ok("pong".to_string()) });
//!
//! let pipeline = fetch
//!     .with_retry(3, Duration::from_millis(100))
//!     .with_breaker(5);
//!
//! match pipeline.call(&CancellationToken::new()).await {
//!     Ok(body) => println!("got {}", body),
//!     Err(CircuitError::ServiceUnreachable) => println!("breaker open"),
//!     Err(err) => println!("failed: {}", err),
//! }
//! # }
//! ```
//!
//! ## Logging
//!
//! Decorators emit [`tracing`] events: breaker trips and retry attempts at
//! `warn`, rejections and debounce firings at `debug`, background task
//! lifecycle at `trace`. Install a subscriber to see them.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod breaker;
mod circuit;
mod config;
mod debounce_first;
mod debounce_last;
mod error;
mod hook;
mod policy;
pub mod prelude;
mod retry;
mod state;
mod throttle;
mod timeout;

// Re-exports
pub use breaker::CircuitBreaker;
pub use circuit::{circuit_fn, Circuit, Circuit as Effector, CircuitExt, FnCircuit};
pub use config::{BreakerBuilder, RetryBuilder, ThrottleBuilder};
pub use debounce_first::DebounceFirst;
pub use debounce_last::DebounceLast;
pub use error::{CircuitError, CircuitResult, ConfigError};
pub use hook::HookRegistry;
pub use policy::{BackoffPolicy, ConstantBackoff, ExponentialBackoff};
pub use retry::Retry;
pub use state::State;
pub use throttle::Throttle;
pub use timeout::{SlowFunction, Timeout, TimeoutCircuit};
pub use tokio_util::sync::CancellationToken;
