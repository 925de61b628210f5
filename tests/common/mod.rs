#![allow(dead_code)]

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use stability_rs::{circuit_fn, Circuit, CircuitError, CircuitResult};

// Custom error type that implements Error trait
#[derive(Debug)]
pub struct TestError(pub String);

impl TestError {
    pub fn new(msg: &str) -> Self {
        TestError(msg.to_string())
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Test error: {}", self.0)
    }
}

impl Error for TestError {}

pub fn fail(msg: &str) -> CircuitResult {
    Err(CircuitError::operation(TestError::new(msg)))
}

/// A circuit whose outcome depends on how many times it has been called.
/// The returned counter tracks invocations.
pub fn scripted(outcome: fn(usize) -> CircuitResult) -> (impl Circuit + 'static, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let circuit = circuit_fn(move |_cancel| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        let result = outcome(n);
        async move { result }
    });

    (circuit, calls)
}

pub fn always_ok(n: usize) -> CircuitResult {
    Ok(format!("call {}", n))
}

pub fn always_fail(n: usize) -> CircuitResult {
    fail(&format!("failure {}", n))
}

pub fn count(calls: &Arc<AtomicUsize>) -> usize {
    calls.load(Ordering::SeqCst)
}
