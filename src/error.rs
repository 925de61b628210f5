//! Error types for the stability decorators.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Outcome of a single circuit invocation.
pub type CircuitResult = Result<String, CircuitError>;

/// Failure returned by a circuit or by one of the decorators wrapping it.
///
/// The type is cheap to clone so that debounced outcomes can be handed to
/// every caller that reads them.
#[derive(Debug, Clone)]
pub enum CircuitError {
    /// The circuit breaker is open and the wrapped operation was not invoked.
    ServiceUnreachable,

    /// The throttle has no tokens left and the wrapped operation was not invoked.
    TooManyCalls,

    /// The cancellation signal fired before the operation completed.
    Cancelled,

    /// The wrapped operation failed. Decorators pass this through unchanged.
    Operation(Arc<dyn Error + Send + Sync + 'static>),
}

impl CircuitError {
    /// Wraps an arbitrary error as an operation failure.
    pub fn operation<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        CircuitError::Operation(Arc::new(err))
    }

    /// Returns true if this failure came from the cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CircuitError::Cancelled)
    }

    /// Returns true if this failure was produced by the wrapped operation.
    pub fn is_operation(&self) -> bool {
        matches!(self, CircuitError::Operation(_))
    }
}

impl Display for CircuitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CircuitError::ServiceUnreachable => write!(f, "service unreachable"),
            CircuitError::TooManyCalls => write!(f, "too many calls"),
            CircuitError::Cancelled => write!(f, "operation cancelled"),
            CircuitError::Operation(e) => write!(f, "operation error: {}", e),
        }
    }
}

impl Error for CircuitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CircuitError::Operation(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Rejected construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A throttle was configured with a bucket capacity of zero.
    ZeroCapacity,

    /// A throttle was configured with a zero refill period.
    ZeroPeriod,

    /// A trailing-edge debounce was configured with a zero window.
    ZeroWindow,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroCapacity => write!(f, "throttle capacity must be greater than zero"),
            ConfigError::ZeroPeriod => write!(f, "throttle refill period must be non-zero"),
            ConfigError::ZeroWindow => write!(f, "debounce window must be non-zero"),
        }
    }
}

impl Error for ConfigError {}
