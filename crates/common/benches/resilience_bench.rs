//! Retry engine benchmarks
//!
//! Run with: `cargo bench --bench resilience_bench -p altoro-common
//! --features runtime`

use std::fmt;
use std::time::Duration;

use altoro_common::error::{ErrorClassification, FailureKind};
use altoro_common::resilience::RetryPolicy;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::runtime::Builder as RuntimeBuilder;

#[derive(Debug)]
struct Never;

impl fmt::Display for Never {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("never")
    }
}

impl ErrorClassification for Never {
    fn failure_kind(&self) -> FailureKind {
        FailureKind::Fatal
    }
}

fn bench_delay_computation(c: &mut Criterion) {
    let mut group = c.benchmark_group("retry_delay");
    let policy = RetryPolicy::builder()
        .max_attempts(10)
        .base_delay(Duration::from_millis(500))
        .backoff_factor(2.0)
        .jitter(Duration::from_millis(100))
        .build()
        .expect("valid benchmark policy");
    let mut rng = StdRng::seed_from_u64(42);

    for attempt in [1_u32, 4, 10] {
        group.bench_with_input(BenchmarkId::from_parameter(attempt), &attempt, |b, &attempt| {
            b.iter(|| black_box(policy.delay_for_attempt(black_box(attempt), &mut rng)));
        });
    }
    group.finish();
}

fn bench_execute_success_path(c: &mut Criterion) {
    let runtime =
        RuntimeBuilder::new_current_thread().enable_time().build().expect("tokio runtime");
    let policy = RetryPolicy::default();

    c.bench_function("retry_execute_first_try", |b| {
        b.iter(|| {
            let result =
                runtime.block_on(policy.execute(|| async { Ok::<_, Never>(black_box(1_u32)) }));
            black_box(result.is_ok())
        });
    });
}

criterion_group!(benches, bench_delay_computation, bench_execute_success_path);
criterion_main!(benches);
