mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{always_fail, always_ok, count, scripted};
use stability_rs::{circuit_fn, Circuit, CircuitExt, ConfigError, DebounceFirst, DebounceLast};
use tokio::time::{advance, sleep, Instant};
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

const WINDOW: Duration = Duration::from_millis(100);

#[tokio::test(start_paused = true)]
async fn test_debounce_first_replays_within_window() {
    let (inner, calls) = scripted(always_ok);
    let debounced = DebounceFirst::new(inner, Duration::from_secs(1));
    let cancel = CancellationToken::new();

    assert_eq!(assert_ok!(debounced.call(&cancel).await), "call 0");

    advance(Duration::from_millis(500)).await;
    assert_eq!(assert_ok!(debounced.call(&cancel).await), "call 0");
    advance(Duration::from_millis(499)).await;
    assert_eq!(assert_ok!(debounced.call(&cancel).await), "call 0");
    assert_eq!(count(&calls), 1);

    // Replayed calls do not extend the window
    advance(Duration::from_millis(1)).await;
    assert_eq!(assert_ok!(debounced.call(&cancel).await), "call 1");
    assert_eq!(count(&calls), 2);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_first_caches_failures() {
    let (inner, calls) = scripted(always_fail);
    let debounced = inner.debounce_first(Duration::from_secs(1));
    let cancel = CancellationToken::new();

    let first = assert_err!(debounced.call(&cancel).await);
    let second = assert_err!(debounced.call(&cancel).await);

    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(count(&calls), 1);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_first_concurrent_callers_share_one_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let slow = circuit_fn(move |_cancel| {
        let counter = Arc::clone(&counter);
        async move {
            sleep(Duration::from_millis(50)).await;
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(format!("call {}", n))
        }
    });
    let debounced = DebounceFirst::new(slow, Duration::from_secs(1));
    let cancel = CancellationToken::new();

    let results = futures::future::join_all((0..5).map(|_| debounced.call(&cancel))).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    for result in results {
        assert_eq!(assert_ok!(result), "call 0");
    }
}

#[tokio::test(start_paused = true)]
async fn test_debounce_last_collapses_burst() {
    let fired_at = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&fired_at);
    let inner = circuit_fn(move |_cancel| {
        let log = Arc::clone(&log);
        async move {
            let mut log = log.lock().unwrap();
            log.push(Instant::now());
            Ok(format!("call {}", log.len() - 1))
        }
    });
    let debounced = DebounceLast::new(inner, WINDOW).unwrap();
    let cancel = CancellationToken::new();

    // Nothing cached yet: every call in the burst sees the empty outcome
    assert_eq!(assert_ok!(debounced.call(&cancel).await), "");
    sleep(Duration::from_millis(50)).await;
    assert_eq!(assert_ok!(debounced.call(&cancel).await), "");
    sleep(Duration::from_millis(40)).await;
    assert_eq!(assert_ok!(debounced.call(&cancel).await), "");
    let last_call = Instant::now();
    assert!(debounced.is_pending());

    sleep(Duration::from_millis(300)).await;

    let fired = fired_at.lock().unwrap().clone();
    assert_eq!(fired.len(), 1);
    let delay = fired[0] - last_call;
    assert!(delay >= WINDOW, "fired {:?} after the last call", delay);
    assert!(delay <= WINDOW + Duration::from_millis(20), "fired {:?} after the last call", delay);
    assert!(!debounced.is_pending());

    // The next burst sees the outcome of the previous one
    assert_eq!(assert_ok!(debounced.call(&cancel).await), "call 0");
    sleep(Duration::from_millis(300)).await;
    assert_eq!(fired_at.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_last_cancellation_caches_error() {
    let (inner, calls) = scripted(always_ok);
    let debounced = DebounceLast::new(inner, WINDOW).unwrap();

    let cancel = CancellationToken::new();
    assert_ok!(debounced.call(&cancel).await);
    cancel.cancel();
    sleep(Duration::from_millis(1)).await;
    assert!(!debounced.is_pending());

    // A fresh token starts a new timer and still sees the cancellation
    let err = assert_err!(debounced.call(&CancellationToken::new()).await);
    assert!(err.is_cancelled());
    assert_eq!(count(&calls), 0);

    sleep(Duration::from_millis(300)).await;
    assert_eq!(count(&calls), 1);
    assert_eq!(assert_ok!(debounced.call(&CancellationToken::new()).await), "call 0");
}

#[tokio::test(start_paused = true)]
async fn test_debounce_last_calls_during_invocation_get_trailing_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let slow = circuit_fn(move |_cancel| {
        let counter = Arc::clone(&counter);
        async move {
            sleep(Duration::from_millis(200)).await;
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(format!("call {}", n))
        }
    });
    let debounced = DebounceLast::new(slow, WINDOW).unwrap();
    let cancel = CancellationToken::new();

    assert_ok!(debounced.call(&cancel).await);

    // The window has elapsed and the slow invocation is in flight
    sleep(Duration::from_millis(150)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(debounced.is_pending());
    assert_eq!(assert_ok!(debounced.call(&cancel).await), "");

    sleep(Duration::from_millis(800)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!debounced.is_pending());
    assert_eq!(assert_ok!(debounced.call(&cancel).await), "call 1");
}

fn panic_first(n: usize) -> stability_rs::CircuitResult {
    if n == 0 {
        panic!("inner circuit blew up");
    }
    always_ok(n)
}

#[tokio::test(start_paused = true)]
async fn test_debounce_last_recovers_from_panicking_circuit() {
    let (inner, calls) = scripted(panic_first);
    let debounced = DebounceLast::new(inner, WINDOW).unwrap();

    assert_ok!(debounced.call(&CancellationToken::new()).await);
    sleep(Duration::from_millis(300)).await;
    assert_eq!(count(&calls), 1);
    assert!(!debounced.is_pending());

    // The panic is cached as an operation failure and a new burst fires
    let err = assert_err!(debounced.call(&CancellationToken::new()).await);
    assert!(err.is_operation());
    sleep(Duration::from_millis(300)).await;
    assert_eq!(count(&calls), 2);
    assert_eq!(assert_ok!(debounced.call(&CancellationToken::new()).await), "call 1");
}

#[tokio::test(start_paused = true)]
async fn test_debounce_last_stops_when_dropped() {
    let (inner, calls) = scripted(always_ok);
    let debounced = DebounceLast::new(inner, WINDOW).unwrap();

    assert_ok!(debounced.call(&CancellationToken::new()).await);
    drop(debounced);

    sleep(Duration::from_millis(300)).await;
    assert_eq!(count(&calls), 0);
}

#[tokio::test]
async fn test_debounce_last_rejects_zero_window() {
    let (inner, _) = scripted(always_ok);
    let err = DebounceLast::new(inner, Duration::ZERO).unwrap_err();

    assert_eq!(err, ConfigError::ZeroWindow);
}
