use criterion::{BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use threadseq::Sequencer;

pub fn bench_run_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_sync");
    let sequencer = Sequencer::new().unwrap();

    group.throughput(Throughput::Elements(1));
    group.bench_function("round_trip", |b| {
        b.iter(|| black_box(sequencer.run_sync(|| black_box(1_u64)).unwrap()));
    });

    let nested = Arc::new(Sequencer::new().unwrap());
    group.bench_function("inline_x100", |b| {
        b.iter(|| {
            let inner = nested.clone();
            nested
                .run_sync(move || {
                    for i in 0..100_u64 {
                        black_box(inner.run_sync(move || i).unwrap());
                    }
                })
                .unwrap()
        });
    });

    group.finish();
}

pub fn bench_run_async(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_async");

    for capacity in [16, 256, 4_096] {
        let sequencer = Sequencer::with_capacity(capacity).unwrap();
        let counter = Arc::new(AtomicU64::new(0));

        group.throughput(Throughput::Elements(1_000));
        group.bench_with_input(
            BenchmarkId::new("enqueue_1k_then_flush", capacity),
            &capacity,
            |b, _| {
                b.iter(|| {
                    for _ in 0..1_000 {
                        let counter = counter.clone();
                        sequencer
                            .run_async(move || {
                                counter.fetch_add(1, Ordering::Relaxed);
                            })
                            .unwrap();
                    }
                    black_box(sequencer.submit(|| ()).unwrap().wait());
                });
            },
        );
    }

    group.finish();
}

pub fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");

    for producers in [2, 8] {
        let sequencer = Arc::new(Sequencer::with_capacity(1_024).unwrap());

        group.throughput(Throughput::Elements(producers as u64 * 500));
        group.bench_with_input(
            BenchmarkId::new("mixed_producers", producers),
            &producers,
            |b, &n| {
                b.iter(|| {
                    let handles: Vec<_> = (0..n)
                        .map(|p| {
                            let sequencer = sequencer.clone();
                            thread::spawn(move || {
                                for i in 0..500_u64 {
                                    if p % 2 == 0 {
                                        black_box(sequencer.run_sync(move || i).unwrap());
                                    } else {
                                        sequencer
                                            .run_async(move || {
                                                black_box(i);
                                            })
                                            .unwrap();
                                    }
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    bench_run_sync(c);
    bench_run_async(c);
    bench_contended(c);
}
