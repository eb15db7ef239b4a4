//! Criterion micro-benchmarks for dispatcher submission and drain.

use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use keel_dispatch::{Dispatcher, DispatcherConfig};

/// Benchmark: submit 1000 trivial tasks and shut down, measuring
/// channel handoff plus drain.
fn bench_dispatch_submit_drain(c: &mut Criterion) {
    c.bench_function("dispatch_submit_drain_1000", |b| {
        b.iter(|| {
            let counter = Arc::new(AtomicU64::new(0));
            let mut dispatcher = Dispatcher::spawn(DispatcherConfig::default(), |_| {}).unwrap();
            for _ in 0..1000 {
                let counter = Arc::clone(&counter);
                dispatcher
                    .submit(move || {
                        counter.fetch_add(1, Ordering::Relaxed);
                        Ok(())
                    })
                    .unwrap();
            }
            black_box(dispatcher.shutdown());
        });
    });
}

/// Benchmark: submission cost alone, against a long-lived dispatcher.
fn bench_dispatch_submit(c: &mut Criterion) {
    let dispatcher = Dispatcher::spawn(DispatcherConfig::default(), |_| {}).unwrap();
    c.bench_function("dispatch_submit", |b| {
        b.iter(|| black_box(dispatcher.submit(|| Ok(())).unwrap()));
    });
}

criterion_group!(benches, bench_dispatch_submit_drain, bench_dispatch_submit);
criterion_main!(benches);
