use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stability_rs::{circuit_fn, Circuit, CircuitBreaker, CircuitExt, Throttle};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build runtime")
}

fn bench_breaker_closed(c: &mut Criterion) {
    let rt = runtime();
    let breaker = CircuitBreaker::new(circuit_fn(|_cancel| async { Ok(String::new()) }), 5);
    let cancel = CancellationToken::new();

    c.bench_function("breaker_closed_success", |b| {
        b.to_async(&rt).iter(|| async { black_box(breaker.call(&cancel).await) });
    });
}

fn bench_breaker_open(c: &mut Criterion) {
    let rt = runtime();
    let cancel = CancellationToken::new();
    let failing = circuit_fn(|_cancel| async {
        Err(stability_rs::CircuitError::TooManyCalls)
    });
    let breaker = CircuitBreaker::builder()
        .failure_threshold(1)
        .build(failing);

    // Trip once; the cooldown outlasts the benchmark
    rt.block_on(async {
        let _ = breaker.call(&cancel).await;
    });

    c.bench_function("breaker_open_rejection", |b| {
        b.to_async(&rt).iter(|| async { black_box(breaker.call(&cancel).await) });
    });
}

fn bench_throttle_admission(c: &mut Criterion) {
    let rt = runtime();
    let cancel = CancellationToken::new();
    let throttle = rt.block_on(async {
        Throttle::new(
            circuit_fn(|_cancel| async { Ok(String::new()) }),
            u32::MAX,
            u32::MAX,
            Duration::from_millis(10),
        )
        .expect("valid throttle")
    });

    c.bench_function("throttle_admission", |b| {
        b.to_async(&rt).iter(|| async { black_box(throttle.call(&cancel).await) });
    });
}

fn bench_pipeline_concurrent(c: &mut Criterion) {
    let rt = runtime();
    let pipeline: Arc<Box<dyn Circuit>> = Arc::new(
        circuit_fn(|_cancel| async { Ok(String::new()) })
            .with_retry(3, Duration::from_millis(1))
            .with_breaker(100)
            .boxed(),
    );

    const TASK_COUNT: usize = 4;
    const ITERATIONS_PER_TASK: usize = 1000;

    c.bench_function("pipeline_concurrent", |b| {
        b.to_async(&rt).iter(|| {
            let pipeline = Arc::clone(&pipeline);
            async move {
                let handles: Vec<_> = (0..TASK_COUNT)
                    .map(|_| {
                        let pipeline = Arc::clone(&pipeline);
                        tokio::spawn(async move {
                            let cancel = CancellationToken::new();
                            for _ in 0..ITERATIONS_PER_TASK {
                                let _ = black_box(pipeline.call(&cancel).await);
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.await.unwrap();
                }
            }
        });
    });
}

criterion_group!(
    benches,
    bench_breaker_closed,
    bench_breaker_open,
    bench_throttle_admission,
    bench_pipeline_concurrent
);
criterion_main!(benches);
