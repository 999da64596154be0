//! # Arena Benchmark
//!
//! Measures the cost of filling a stage arena and resetting it.
//!
//! Run with: cargo bench --package mannequin_core --bench arena_benchmark

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mannequin_core::Arena;

#[derive(Clone, Copy, Default)]
struct Slot {
    body: u16,
    head: u16,
    scale: f32,
}

fn bench_fill_and_reset(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_fill_reset");

    for capacity in [16usize, 64, 256] {
        let mut arena: Arena<Slot> = Arena::new(capacity);

        group.bench_with_input(BenchmarkId::new("fill", capacity), &capacity, |b, &cap| {
            b.iter(|| {
                for i in 0..cap {
                    let _ = arena.alloc(black_box(Slot {
                        body: (i % 64) as u16,
                        head: (i % 32) as u16,
                        scale: 1.0,
                    }));
                }
                arena.reset();
            });
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut arena: Arena<Slot> = Arena::new(64);
    let handles: Vec<_> = (0..64).filter_map(|_| arena.alloc(Slot::default())).collect();

    c.bench_function("arena_lookup_64", |b| {
        b.iter(|| {
            let mut total = 0.0f32;
            for handle in &handles {
                if let Some(slot) = arena.get(black_box(*handle)) {
                    total += slot.scale + f32::from(slot.body) + f32::from(slot.head);
                }
            }
            total
        });
    });
}

criterion_group!(benches, bench_fill_and_reset, bench_lookup);
criterion_main!(benches);
