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
//! Benchmarks for job scheduling overhead and parallel_for scaling

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sim_engine::jobs::{parallel_for, JobSystem};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Benchmark: schedule-and-wait round trips
fn bench_schedule_wait(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_wait");
    let jobs = JobSystem::start(4);

    for batch in [1usize, 16, 256].iter() {
        group.throughput(Throughput::Elements(*batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), batch, |b, &batch| {
            b.iter(|| {
                let handles: Vec<_> = (0..batch)
                    .map(|i| {
                        jobs.schedule(move || {
                            black_box(i);
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.wait();
                }
            });
        });
    }

    group.finish();
}

/// Benchmark: parallel_for against an inline loop
fn bench_parallel_for(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_for");
    let jobs = JobSystem::start(4);

    for count in [1000usize, 100_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(
            BenchmarkId::new("parallel", count),
            count,
            |b, &count| {
                let sum = AtomicUsize::new(0);
                b.iter(|| {
                    parallel_for(&jobs, count, |index| {
                        sum.fetch_add(index, Ordering::Relaxed);
                    });
                });
                black_box(sum.load(Ordering::Relaxed));
            },
        );

        group.bench_with_input(BenchmarkId::new("inline", count), count, |b, &count| {
            b.iter(|| {
                let mut sum = 0usize;
                for index in 0..count {
                    sum = sum.wrapping_add(black_box(index));
                }
                black_box(sum);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_schedule_wait, bench_parallel_for);
criterion_main!(benches);
