//! Re-exports the types needed to build and call a decorator pipeline.
//!
//! # Example
//! ```rust,no_run
//! use stability_rs::prelude::*;
//! ```

pub use crate::circuit::{circuit_fn, Circuit, CircuitExt};
pub use crate::error::{CircuitError, CircuitResult};
pub use crate::timeout::Timeout;
pub use tokio_util::sync::CancellationToken;
