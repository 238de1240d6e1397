//! Benchmarks for list operations.
//!
//! Compares the lock-free AuList against crossbeam-queue's SegQueue, the
//! closest unbounded MPSC-capable queue.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use crossbeam_queue::SegQueue;
use std::sync::Arc;
use std::thread;
use tether_list::{AtomicLink, AuList, BoxedStorage, DhdlList, DoubleLink, Storage};

fn atomic_storage(n: usize) -> (BoxedStorage<AtomicLink>, Vec<u32>) {
    let mut storage = BoxedStorage::with_capacity(n);
    let keys = (0..n)
        .map(|_| storage.try_insert(AtomicLink::new()).unwrap())
        .collect();
    (storage, keys)
}

// ============================================================================
// Single-thread round trip
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");

    group.bench_function("au_list/fifo_remq", |b| {
        let (storage, keys) = atomic_storage(1);
        let list: AuList = AuList::new();
        b.iter(|| {
            list.fifo(&storage, black_box(keys[0]));
            black_box(list.remq(&storage))
        });
    });

    group.bench_function("dhdl_list/fifo_remq", |b| {
        let mut storage: BoxedStorage<DoubleLink> = BoxedStorage::with_capacity(1);
        let key = storage.try_insert(DoubleLink::new()).unwrap();
        let mut list: DhdlList = DhdlList::new();
        b.iter(|| {
            list.fifo(&mut storage, black_box(key));
            black_box(list.remq(&mut storage))
        });
    });

    group.bench_function("crossbeam_seg/push_pop", |b| {
        let q = SegQueue::<u32>::new();
        b.iter(|| {
            q.push(black_box(0));
            black_box(q.pop())
        });
    });

    group.finish();
}

// ============================================================================
// Batch consumption
// ============================================================================

fn bench_batch_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_drain");

    for batch in [16usize, 256, 4096] {
        group.throughput(Throughput::Elements(batch as u64));

        group.bench_with_input(BenchmarkId::new("au_list/drain", batch), &batch, |b, &n| {
            let (storage, keys) = atomic_storage(n + 1);
            let sentinel = keys[n];
            let list: AuList = AuList::new();
            b.iter(|| {
                for &key in &keys[..n] {
                    list.fifo(&storage, key);
                }
                for key in list.drain(&storage, sentinel) {
                    black_box(key);
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("au_list/remq", batch), &batch, |b, &n| {
            let (storage, keys) = atomic_storage(n);
            let list: AuList = AuList::new();
            b.iter(|| {
                for &key in &keys {
                    list.fifo(&storage, key);
                }
                while let Some(key) = list.remq(&storage) {
                    black_box(key);
                }
            });
        });

        group.bench_with_input(
            BenchmarkId::new("crossbeam_seg", batch),
            &batch,
            |b, &n| {
                let q = SegQueue::<u32>::new();
                b.iter(|| {
                    for i in 0..n {
                        q.push(i as u32);
                    }
                    while let Some(v) = q.pop() {
                        black_box(v);
                    }
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Multi-producer throughput
// ============================================================================

fn bench_mpsc_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpsc_throughput");

    const RECORDS_PER_PRODUCER: usize = 25_000;

    for num_producers in [1, 2, 4, 8] {
        let total = RECORDS_PER_PRODUCER * num_producers;
        group.throughput(Throughput::Elements(total as u64));

        group.bench_with_input(
            BenchmarkId::new("au_list", num_producers),
            &num_producers,
            |b, &n| {
                let (storage, keys) = atomic_storage(total + 1);
                let sentinel = keys[total];
                let storage = Arc::new(storage);
                let keys = Arc::new(keys);

                b.iter(|| {
                    let list = Arc::new(AuList::<u32>::new());

                    let handles: Vec<_> = (0..n)
                        .map(|p| {
                            let (storage, keys, list) =
                                (Arc::clone(&storage), Arc::clone(&keys), Arc::clone(&list));
                            thread::spawn(move || {
                                let start = p * RECORDS_PER_PRODUCER;
                                for &key in &keys[start..start + RECORDS_PER_PRODUCER] {
                                    list.fifo(&*storage, key);
                                }
                            })
                        })
                        .collect();

                    let mut count = 0;
                    while count < total {
                        for key in list.drain(&*storage, sentinel) {
                            black_box(key);
                            count += 1;
                        }
                        std::hint::spin_loop();
                    }

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("crossbeam_seg", num_producers),
            &num_producers,
            |b, &n| {
                b.iter(|| {
                    let q = Arc::new(SegQueue::<u64>::new());

                    let handles: Vec<_> = (0..n)
                        .map(|_| {
                            let q = Arc::clone(&q);
                            thread::spawn(move || {
                                for i in 0..RECORDS_PER_PRODUCER {
                                    q.push(i as u64);
                                }
                            })
                        })
                        .collect();

                    let mut count = 0;
                    while count < total {
                        match q.pop() {
                            Some(v) => {
                                black_box(v);
                                count += 1;
                            }
                            None => std::hint::spin_loop(),
                        }
                    }

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_round_trip,
    bench_batch_drain,
    bench_mpsc_throughput,
);

criterion_main!(benches);
