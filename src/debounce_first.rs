//! Leading-edge debounce.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::circuit::Circuit;
use crate::error::CircuitResult;

struct DebounceFirstState {
    threshold: Option<Instant>,
    cached: CircuitResult,
}

/// Performs the first call of a window and replays its outcome for the rest.
///
/// A call made before the window of the previous real invocation has
/// elapsed returns that invocation's cached result or failure without
/// touching the wrapped circuit. The window is measured from the end of the
/// real invocation and is not extended by replayed calls.
///
/// Calls are serialized: a caller arriving while the real invocation is in
/// flight waits for it and then receives its outcome.
pub struct DebounceFirst<C> {
    circuit: C,
    window: Duration,
    state: Mutex<DebounceFirstState>,
}

impl<C> DebounceFirst<C>
where
    C: Circuit,
{
    /// Wraps `circuit` with a window of `window`.
    pub fn new(circuit: C, window: Duration) -> Self {
        Self {
            circuit,
            window,
            state: Mutex::new(DebounceFirstState {
                threshold: None,
                cached: Ok(String::new()),
            }),
        }
    }

    /// The configured window.
    pub fn window(&self) -> Duration {
        self.window
    }
}

#[async_trait]
impl<C> Circuit for DebounceFirst<C>
where
    C: Circuit,
{
    async fn call(&self, cancel: &CancellationToken) -> CircuitResult {
        let mut state = self.state.lock().await;

        if let Some(threshold) = state.threshold {
            if Instant::now() < threshold {
                trace!("debounced, replaying cached outcome");
                return state.cached.clone();
            }
        }

        let result = self.circuit.call(cancel).await;
        state.cached = result.clone();
        state.threshold = Some(Instant::now() + self.window);

        result
    }
}

impl<C> std::fmt::Debug for DebounceFirst<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebounceFirst")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
