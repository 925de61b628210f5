//! Circuit Breaker Example
//!
//! This example demonstrates:
//! 1. Wrapping a flaky service in a circuit breaker
//! 2. Using hooks for monitoring breaker events
//! 3. Watching the cooldown grow while the service stays down

use stability_rs::{
    circuit_fn, Circuit, CircuitBreaker, CircuitError, ExponentialBackoff, HookRegistry,
};
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// Custom error type that implements Error trait
#[derive(Debug)]
struct ServiceError(String);

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service error: {}", self.0)
    }
}

impl Error for ServiceError {}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("stability_rs=debug")
        .init();

    println!("=== Circuit Breaker Example ===\n");

    let hooks = HookRegistry::new();
    hooks.set_on_open(|| println!("Circuit OPENED after too many failures"));
    hooks.set_on_close(|| println!("Circuit CLOSED after successful recovery"));
    hooks.set_on_reject(|| println!("Call rejected while the circuit is open"));

    // Calls 4 through 8 fail, everything else succeeds
    let counter = Arc::new(AtomicU32::new(0));
    let service_counter = Arc::clone(&counter);
    let service = circuit_fn(move |_cancel| {
        let n = service_counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if (4..=8).contains(&n) {
                Err(CircuitError::operation(ServiceError(
                    "temporarily unavailable".to_string(),
                )))
            } else {
                Ok(format!("response #{}", n))
            }
        }
    });

    let breaker = CircuitBreaker::builder()
        .failure_threshold(3)
        .backoff(ExponentialBackoff::new(Duration::from_millis(200)))
        .hooks(hooks)
        .build(service);

    let cancel = CancellationToken::new();
    for attempt in 1..=20 {
        match breaker.call(&cancel).await {
            Ok(body) => println!("Attempt {}: {}", attempt, body),
            Err(CircuitError::ServiceUnreachable) => println!("Attempt {}: short-circuited", attempt),
            Err(err) => println!("Attempt {}: {}", attempt, err),
        }

        println!(
            "  state: {:?}, consecutive failures: {}",
            breaker.state(),
            breaker.consecutive_failures()
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
    }

    println!("\nService was called {} times", counter.load(Ordering::SeqCst));
}
