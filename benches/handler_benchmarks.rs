//! Benchmarks for the ingestion and query handlers.
//!
//! Runs against a SQLite-backed test environment, so numbers reflect the
//! handler and pool overhead rather than a networked database.

use std::{hint::black_box, time::Duration};

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use rowgate_core::EventRow;
use rowgate_testing::{http, EventBuilder, TestEnv};
use tokio::runtime::Runtime;

/// Payload decoding without touching the database.
fn bench_payload_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload");

    for len in [8, 256, 4096] {
        let payload = EventBuilder::new("x".repeat(len), 42).build();
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(BenchmarkId::new("from_payload", len), &payload, |b, payload| {
            b.iter(|| EventRow::from_payload(black_box(payload)));
        });
    }

    group.finish();
}

/// Full ingestion path through the router.
fn bench_ingestion(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let env = rt.block_on(TestEnv::new()).unwrap();

    let mut group = c.benchmark_group("ingestion");
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Elements(1));

    group.bench_function("post_event", |b| {
        b.to_async(&rt).iter_batched(
            || (env.router(), EventBuilder::new("bench", 1).build()),
            |(app, payload)| async move {
                black_box(http::post(app, "/api/events", payload).await.unwrap());
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

/// Query latency as the table grows.
fn bench_query(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("query");

    for rows in [0, 100, 1000] {
        let env = rt.block_on(async {
            let env = TestEnv::new().await.unwrap();
            for i in 0..rows {
                env.insert_raw(&format!("row-{i}"), i).await.unwrap();
            }
            env
        });

        group.throughput(Throughput::Elements(rows.max(1) as u64));
        group.bench_with_input(BenchmarkId::new("get_records", rows), &env, |b, env| {
            b.to_async(&rt).iter(|| async {
                black_box(http::get(env.router(), "/api/records").await.unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_payload_parsing, bench_ingestion, bench_query);
criterion_main!(benches);
