//! Criterion benchmark for the ring buffer
//!
//! Run with: cargo bench

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use intring::{RingBuffer, Value};

const CAPACITY: usize = 65_536;

fn bench_write_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");
    group.throughput(Throughput::Elements(1));

    group.bench_function("write", |b| {
        let rb = RingBuffer::new(CAPACITY).unwrap();
        let mut i: Value = 0;
        b.iter(|| {
            if rb.write(black_box(i)).is_err() {
                let _ = rb.read();
                let _ = rb.write(black_box(i));
            }
            i = i.wrapping_add(1);
        });
    });

    group.bench_function("read", |b| {
        let rb = RingBuffer::new(CAPACITY).unwrap();
        // Pre-fill
        for i in 0..(CAPACITY / 2) as Value {
            rb.write(i).unwrap();
        }
        b.iter(|| {
            if let Ok(v) = rb.read() {
                let _ = rb.write(black_box(v));
            }
        });
    });

    group.bench_function("write_read_cycle", |b| {
        let rb = RingBuffer::new(CAPACITY).unwrap();
        let mut i: Value = 0;
        b.iter(|| {
            let _ = rb.write(black_box(i));
            let _ = black_box(rb.read());
            i = i.wrapping_add(1);
        });
    });

    group.bench_function("len", |b| {
        let rb = RingBuffer::new(CAPACITY).unwrap();
        b.iter(|| black_box(rb.len()));
    });

    group.finish();
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain");

    for size in [100usize, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("drain_{}", size), |b| {
            let rb = RingBuffer::new(*size).unwrap();
            b.iter_batched(
                || {
                    for i in 0..*size {
                        let _ = rb.write(i as Value);
                    }
                },
                |_| black_box(rb.drain()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");
    const OPS: usize = 10_000;
    group.throughput(Throughput::Elements((OPS * 2) as u64));

    group.bench_function("1p_1c", |b| {
        b.iter(|| {
            let rb = Arc::new(RingBuffer::new(1_024).unwrap());
            let producer = {
                let rb = Arc::clone(&rb);
                thread::spawn(move || {
                    for i in 0..OPS as Value {
                        while rb.write(i).is_err() {
                            thread::yield_now();
                        }
                    }
                })
            };
            let mut got = 0;
            while got < OPS {
                if rb.read().is_ok() {
                    got += 1;
                } else {
                    thread::yield_now();
                }
            }
            producer.join().unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_write_read, bench_drain, bench_contended);
criterion_main!(benches);
