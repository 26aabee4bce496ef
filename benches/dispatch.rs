//! Event dispatch benchmarks.
//!
//! Measures handler fan-out and the dispatch task under event bursts:
//! - Handlers per event: 1, 4, 16
//! - Burst sizes: 100, 1000
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::json;
use tokio::runtime::Runtime;
use tokio::sync::Notify;

use cdp_pilot::protocol::names;
use cdp_pilot::{Event, EventDispatcher};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const HANDLER_COUNTS: &[usize] = &[1, 4, 16];
const BURST_SIZES: &[u64] = &[100, 1000];

fn request_event(n: u64) -> Event {
    Event::new(
        names::REQUEST_WILL_BE_SENT,
        json!({
            "requestId": n.to_string(),
            "request": { "method": "GET", "url": format!("https://example.com/{n}") },
        }),
    )
}

// ============================================================================
// Benchmark: Handler Fan-out
// ============================================================================

fn bench_fan_out(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let event = request_event(1);

    let mut group = c.benchmark_group("fan_out");

    for &count in HANDLER_COUNTS {
        let dispatcher = EventDispatcher::new();
        let hits = Arc::new(AtomicU64::new(0));

        for _ in 0..count {
            let hits = Arc::clone(&hits);
            dispatcher.register(names::REQUEST_WILL_BE_SENT, move |event: &Event| {
                black_box(event.parse());
                hits.fetch_add(1, Ordering::Relaxed);
            });
        }

        group.bench_with_input(BenchmarkId::new("handlers", count), &count, |b, _| {
            b.to_async(&rt).iter(|| dispatcher.dispatch(&event));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Dispatch Task Throughput
// ============================================================================

fn bench_burst(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");

    let mut group = c.benchmark_group("burst");

    for &size in BURST_SIZES {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("events", size), &size, |b, &size| {
            b.to_async(&rt).iter(|| async move {
                let dispatcher = Arc::new(EventDispatcher::new());
                let seen = Arc::new(AtomicU64::new(0));
                let done = Arc::new(Notify::new());

                {
                    let seen = Arc::clone(&seen);
                    let done = Arc::clone(&done);
                    dispatcher.register_all(move |_: &Event| {
                        if seen.fetch_add(1, Ordering::Relaxed) + 1 == size {
                            done.notify_one();
                        }
                    });
                }

                let (sink, task) = dispatcher.start();
                for n in 0..size {
                    let _ = sink.send(request_event(n));
                }

                done.notified().await;
                task.abort();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fan_out, bench_burst);
criterion_main!(benches);
