// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Benchmarks comparing sparse-set storage against a plain HashMap
//!
//! These benchmarks measure:
//! - Insert/remove/get performance
//! - Bulk iteration throughput over dense vs scattered layouts

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sim_engine::ecs::{Component, Entity, SparseSetStorage};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct Particle {
    x: f64,
    y: f64,
    z: f64,
}

impl Component for Particle {}

fn particle(i: usize) -> Particle {
    Particle {
        x: i as f64,
        y: i as f64 * 2.0,
        z: i as f64 * 3.0,
    }
}

/// Benchmark: Insert N entities into storage
fn bench_storage_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("storage_insert");

    for entity_count in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*entity_count as u64));

        group.bench_with_input(
            BenchmarkId::new("SparseSet", entity_count),
            entity_count,
            |b, &count| {
                b.iter(|| {
                    let mut storage = SparseSetStorage::<Particle>::new();
                    for i in 0..count {
                        storage.set(Entity::new(i as u32, 0), particle(i));
                    }
                    black_box(storage);
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("HashMap", entity_count),
            entity_count,
            |b, &count| {
                b.iter(|| {
                    let mut storage = HashMap::<Entity, Particle>::new();
                    for i in 0..count {
                        storage.insert(Entity::new(i as u32, 0), particle(i));
                    }
                    black_box(storage);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: Iterate all component values
fn bench_storage_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("storage_iterate");
    let count = 10000;
    group.throughput(Throughput::Elements(count as u64));

    let mut sparse = SparseSetStorage::<Particle>::new();
    let mut map = HashMap::<Entity, Particle>::new();
    for i in 0..count {
        sparse.set(Entity::new(i as u32, 0), particle(i));
        map.insert(Entity::new(i as u32, 0), particle(i));
    }

    group.bench_function("SparseSet_dense", |b| {
        b.iter(|| {
            let sum: f64 = sparse.values().iter().map(|p| p.x + p.y + p.z).sum();
            black_box(sum);
        });
    });

    group.bench_function("HashMap", |b| {
        b.iter(|| {
            let sum: f64 = map.values().map(|p| p.x + p.y + p.z).sum();
            black_box(sum);
        });
    });

    group.finish();
}

/// Benchmark: Remove half the entities, interleaved
fn bench_storage_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("storage_remove");
    let count = 10000;
    group.throughput(Throughput::Elements((count / 2) as u64));

    group.bench_function("SparseSet_swap_remove", |b| {
        b.iter_batched(
            || {
                let mut storage = SparseSetStorage::<Particle>::new();
                for i in 0..count {
                    storage.set(Entity::new(i as u32, 0), particle(i));
                }
                storage
            },
            |mut storage| {
                for i in (0..count).step_by(2) {
                    storage.remove(Entity::new(i as u32, 0));
                }
                black_box(storage);
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function("HashMap", |b| {
        b.iter_batched(
            || {
                let mut storage = HashMap::<Entity, Particle>::new();
                for i in 0..count {
                    storage.insert(Entity::new(i as u32, 0), particle(i));
                }
                storage
            },
            |mut storage| {
                for i in (0..count).step_by(2) {
                    storage.remove(&Entity::new(i as u32, 0));
                }
                black_box(storage);
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_storage_insert,
    bench_storage_iterate,
    bench_storage_remove
);
criterion_main!(benches);
