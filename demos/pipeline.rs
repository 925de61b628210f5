//! Resilience Pipeline Example
//!
//! Stacks every decorator around a simulated remote call:
//! throttle -> breaker -> retry -> timeout -> slow service,
//! then shows both debounce flavors on a cheap lookup.

use stability_rs::prelude::*;
use stability_rs::{CircuitBreaker, DebounceFirst, DebounceLast, Retry, Throttle};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("stability_rs=debug")
        .init();

    // A blocking call that gets slower every time
    let slow_calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&slow_calls);
    let remote = Timeout::new(move |query: String| -> CircuitResult {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(40 * u64::from(n)));
        Ok(format!("{} -> result #{}", query, n))
    })
    .deadline(Duration::from_millis(150))
    .bind("select 1");

    let retried = Retry::new(remote, 2, Duration::from_millis(50));
    let guarded = CircuitBreaker::new(retried, 2);
    let pipeline = Throttle::new(guarded, 5, 1, Duration::from_millis(500)).expect("valid throttle");

    let cancel = CancellationToken::new();
    for i in 1..=8 {
        match pipeline.call(&cancel).await {
            Ok(body) => println!("call {}: {}", i, body),
            Err(err) => println!("call {}: {}", i, err),
        }
    }

    // Debounce: leading edge answers immediately, trailing edge after a quiet spell
    let lookups = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&lookups);
    let lookup = Arc::new(circuit_fn(move |_cancel| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move { Ok(format!("lookup #{}", n)) }
    }));

    let first = DebounceFirst::new(Arc::clone(&lookup), Duration::from_millis(200));
    let last = DebounceLast::new(Arc::clone(&lookup), Duration::from_millis(200)).expect("valid window");

    for _ in 0..5 {
        let leading = first.call(&cancel).await;
        let trailing = last.call(&cancel).await;
        println!("leading: {:?}, trailing: {:?}", leading, trailing);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    tokio::time::sleep(Duration::from_millis(400)).await;
    println!("after quiet period, trailing: {:?}", last.call(&cancel).await);
    println!("lookup ran {} times", lookups.load(Ordering::SeqCst));
}
