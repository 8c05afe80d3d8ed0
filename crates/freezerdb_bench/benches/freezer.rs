//! Freezer operation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use freezerdb_bench::receipt_batch;
use freezerdb_core::{Compression, Config, Freezer, MemoryLayout};
use std::sync::Arc;
use tempfile::TempDir;

fn in_memory(compression: Compression) -> Freezer {
    let config = Config::default()
        .compression(compression)
        .max_segment_size(4 * 1024 * 1024);
    Freezer::open_with_layout(Arc::new(MemoryLayout::new()), config, Arc::new(compression)).unwrap()
}

/// Benchmark single receipt appends per codec.
fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    for compression in [Compression::None, Compression::Lz4] {
        for size in [256, 1024, 4096] {
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(
                BenchmarkId::new(compression.to_string(), size),
                &size,
                |b, &size| {
                    let freezer = in_memory(compression);
                    let record = receipt_batch(1, size, 1).remove(0);

                    b.iter(|| {
                        let sequence = freezer.append_receipt(black_box(&record)).unwrap();
                        black_box(sequence);
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark batch appends.
fn bench_append_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("append_batch");

    for batch_size in [10, 100, 1000] {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch_size,
            |b, &batch_size| {
                let freezer = in_memory(Compression::Lz4);
                let batch = receipt_batch(batch_size, 512, 2);

                b.iter(|| {
                    let head = freezer.append_receipts(black_box(&batch)).unwrap();
                    black_box(head);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark durable appends to a directory.
fn bench_append_dir(c: &mut Criterion) {
    let mut group = c.benchmark_group("append_dir");
    group.sample_size(20); // fsync is slow

    for sync in [false, true] {
        let name = if sync { "sync" } else { "flush" };
        group.bench_function(name, |b| {
            let temp_dir = TempDir::new().unwrap();
            let config = Config::default().sync_on_append(sync);
            let freezer = Freezer::open_with_config(&temp_dir.path().join("ancient"), config).unwrap();
            let record = receipt_batch(1, 1024, 3).remove(0);

            b.iter(|| {
                freezer.append_receipt(black_box(&record)).unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark point lookups.
fn bench_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("fetch");

    let record_count = 10_000u64;
    for compression in [Compression::None, Compression::Lz4] {
        group.bench_function(compression.to_string(), |b| {
            let freezer = in_memory(compression);
            freezer
                .append_receipts(&receipt_batch(record_count as usize, 512, 4))
                .unwrap();

            let mut i = 0u64;
            b.iter(|| {
                // Pseudo-random order across segments
                let sequence = (i * 7919) % record_count;
                let receipt = freezer.fetch_receipt(black_box(sequence)).unwrap();
                i += 1;
                black_box(receipt);
            });
        });
    }

    group.finish();
}

/// Benchmark range fetches.
fn bench_fetch_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("fetch_range");

    let freezer = in_memory(Compression::Lz4);
    freezer.append_receipts(&receipt_batch(10_000, 512, 5)).unwrap();

    for len in [10u64, 100, 1000] {
        group.throughput(Throughput::Elements(len));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| {
                let count = freezer
                    .fetch_range(black_box(1000), black_box(1000 + len))
                    .map(Result::unwrap)
                    .count();
                black_box(count);
            });
        });
    }

    group.finish();
}

/// Benchmark opening a freezer, with and without an index rebuild.
fn bench_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("open");
    group.sample_size(10);

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ancient");
    {
        let config = Config::default()
            .sync_on_append(false)
            .max_segment_size(1024 * 1024);
        let freezer = Freezer::open_with_config(&path, config).unwrap();
        freezer.append_receipts(&receipt_batch(10_000, 512, 6)).unwrap();
    }

    group.bench_function("stored_index", |b| {
        b.iter(|| {
            let freezer = Freezer::open_read_only(&path).unwrap();
            black_box(freezer.head());
        });
    });

    group.bench_function("rebuild", |b| {
        let freezer = Freezer::open(&path).unwrap();
        b.iter(|| {
            black_box(freezer.rebuild_index().unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_append,
    bench_append_batch,
    bench_append_dir,
    bench_fetch,
    bench_fetch_range,
    bench_open,
);

criterion_main!(benches);
