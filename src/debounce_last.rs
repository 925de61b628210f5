//! Trailing-edge debounce driven by a background timer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::circuit::Circuit;
use crate::error::{CircuitError, CircuitResult, ConfigError};

/// Shortest interval at which the timer checks for a quiet window.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Fraction of the window between two timer checks.
const POLLS_PER_WINDOW: u32 = 10;

struct DebounceLastState {
    threshold: Instant,
    cached: CircuitResult,
    // Whether a timer task is alive. Set by the call that spawns it, cleared
    // by the task on exit.
    running: bool,
}

struct Shared<C> {
    circuit: C,
    window: Duration,
    state: Mutex<DebounceLastState>,
}

/// Collapses a burst of calls into one deferred invocation.
///
/// Every call pushes the firing time to `now + window` and returns the most
/// recently cached outcome immediately; before the first invocation that is
/// an empty successful payload. A background task, spawned by the first
/// call of a burst, invokes the wrapped circuit once no call has arrived for
/// `window` and caches what it returns. A panic in the wrapped circuit is
/// cached as a [`CircuitError::Operation`] failure.
///
/// The task receives the cancellation token of the call that spawned it. If
/// that token fires first, [`CircuitError::Cancelled`] is cached instead and
/// the task exits. Dropping the `DebounceLast` stops the task as well.
pub struct DebounceLast<C> {
    shared: Arc<Shared<C>>,
    shutdown: CancellationToken,
}

impl<C> DebounceLast<C>
where
    C: Circuit + 'static,
{
    /// Wraps `circuit`, firing once calls have been quiet for `window`.
    pub fn new(circuit: C, window: Duration) -> Result<Self, ConfigError> {
        if window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }

        Ok(Self {
            shared: Arc::new(Shared {
                circuit,
                window,
                state: Mutex::new(DebounceLastState {
                    threshold: Instant::now(),
                    cached: Ok(String::new()),
                    running: false,
                }),
            }),
            shutdown: CancellationToken::new(),
        })
    }

    /// The configured window.
    pub fn window(&self) -> Duration {
        self.shared.window
    }

    /// Whether an invocation is scheduled or in flight.
    pub fn is_pending(&self) -> bool {
        self.shared.state.lock().running
    }
}

#[async_trait]
impl<C> Circuit for DebounceLast<C>
where
    C: Circuit + 'static,
{
    async fn call(&self, cancel: &CancellationToken) -> CircuitResult {
        let (spawn, cached) = {
            let mut state = self.shared.state.lock();
            state.threshold = Instant::now() + self.shared.window;
            let spawn = !state.running;
            state.running = true;
            (spawn, state.cached.clone())
        };

        if spawn {
            tokio::spawn(fire_when_quiet(
                Arc::clone(&self.shared),
                cancel.clone(),
                self.shutdown.clone(),
            ));
        }

        cached
    }
}

impl<C> Drop for DebounceLast<C> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn poll_interval(window: Duration) -> Duration {
    (window / POLLS_PER_WINDOW).max(MIN_POLL_INTERVAL)
}

async fn fire_when_quiet<C>(shared: Arc<Shared<C>>, cancel: CancellationToken, shutdown: CancellationToken)
where
    C: Circuit + 'static,
{
    let poll = poll_interval(shared.window);
    let mut ticker = tokio::time::interval_at(Instant::now() + poll, poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    trace!(poll_ms = poll.as_millis() as u64, "debounce timer started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                trace!("debounce timer stopped: owner dropped");
                return;
            }
            _ = cancel.cancelled() => {
                let mut state = shared.state.lock();
                state.cached = Err(CircuitError::Cancelled);
                state.running = false;
                trace!("debounce timer stopped: cancelled");
                return;
            }
            _ = ticker.tick() => {
                let fired_for = {
                    let state = shared.state.lock();
                    if Instant::now() <= state.threshold {
                        continue;
                    }
                    state.threshold
                };

                debug!("debounce window elapsed, invoking circuit");
                let invocation = {
                    let shared = Arc::clone(&shared);
                    let cancel = cancel.clone();
                    tokio::spawn(async move { shared.circuit.call(&cancel).await })
                };
                let result = match invocation.await {
                    Ok(result) => result,
                    // The wrapped circuit panicked.
                    Err(err) => {
                        warn!(error = %err, "debounced circuit panicked");
                        Err(CircuitError::operation(err))
                    }
                };

                let mut state = shared.state.lock();
                state.cached = result;

                // Calls arrived during the invocation; they get their own
                // trailing call.
                if state.threshold > fired_for {
                    continue;
                }

                state.running = false;
                trace!("debounce timer stopped: fired");
                return;
            }
        }
    }
}

impl<C> std::fmt::Debug for DebounceLast<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebounceLast")
            .field("window", &self.shared.window)
            .finish_non_exhaustive()
    }
}
