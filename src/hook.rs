//! Hook registry for circuit breaker events.

use parking_lot::RwLock;
use std::sync::Arc;

type HookFn = Arc<dyn Fn() + Send + Sync + 'static>;

/// Callbacks fired by a [`CircuitBreaker`](crate::CircuitBreaker).
///
/// Hooks run after the breaker has released its state lock, so they may
/// inspect the breaker freely.
pub struct HookRegistry {
    on_open: RwLock<Option<HookFn>>,
    on_close: RwLock<Option<HookFn>>,
    on_reject: RwLock<Option<HookFn>>,
    on_success: RwLock<Option<HookFn>>,
    on_failure: RwLock<Option<HookFn>>,
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry").finish_non_exhaustive()
    }
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self {
            on_open: RwLock::new(None),
            on_close: RwLock::new(None),
            on_reject: RwLock::new(None),
            on_success: RwLock::new(None),
            on_failure: RwLock::new(None),
        }
    }

    /// Sets the hook to call when the failure count reaches the threshold,
    /// or on the first failure when the threshold is zero.
    pub fn set_on_open<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.on_open.write() = Some(Arc::new(f));
    }

    /// Sets the hook to call when a success resets a tripped breaker.
    pub fn set_on_close<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.on_close.write() = Some(Arc::new(f));
    }

    /// Sets the hook to call when a call is short-circuited.
    pub fn set_on_reject<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.on_reject.write() = Some(Arc::new(f));
    }

    /// Sets the hook to call when the wrapped circuit succeeds.
    pub fn set_on_success<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.on_success.write() = Some(Arc::new(f));
    }

    /// Sets the hook to call when the wrapped circuit fails.
    pub fn set_on_failure<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.on_failure.write() = Some(Arc::new(f));
    }

    pub(crate) fn fire_open(&self) {
        Self::fire(&self.on_open);
    }

    pub(crate) fn fire_close(&self) {
        Self::fire(&self.on_close);
    }

    pub(crate) fn fire_reject(&self) {
        Self::fire(&self.on_reject);
    }

    pub(crate) fn fire_success(&self) {
        Self::fire(&self.on_success);
    }

    pub(crate) fn fire_failure(&self) {
        Self::fire(&self.on_failure);
    }

    fn fire(slot: &RwLock<Option<HookFn>>) {
        // Clone out so the hook may re-register itself without deadlocking.
        let hook = slot.read().clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}
