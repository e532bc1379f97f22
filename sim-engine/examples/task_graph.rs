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
//! Job system and task graph example
//!
//! Models one frame of simulation work as a DAG: input sampling feeds
//! two independent mid-frame passes, which join into a final pass, while
//! a parallel_for crunches bulk data on the side.

use sim_engine::jobs::{parallel_for, JobSystem, TaskGraph};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn main() {
    env_logger::init();

    println!("=== Sim Engine: Task Graph Example ===\n");

    let jobs = JobSystem::start(0);
    println!("Started job system with {} workers", jobs.worker_count());

    // --- Dependency chaining with schedule_after ---
    println!("\nChained jobs:");
    let first = jobs.schedule(|| println!("  [1] simulate"));
    let second = jobs.schedule_after(&first, || println!("  [2] collide (after simulate)"));
    let third = jobs.schedule_after(&second, || println!("  [3] resolve (after collide)"));
    third.wait();

    // --- A frame expressed as a one-shot DAG ---
    println!("\nFrame graph:");
    let mut graph = TaskGraph::new();

    let input = graph
        .add_task(|| println!("  [input] sample devices"), &[])
        .expect("no dependencies to validate");
    let animation = graph
        .add_task(|| println!("  [animation] advance rigs"), &[input])
        .expect("input exists");
    let particles = graph
        .add_task(|| println!("  [particles] step emitters"), &[input])
        .expect("input exists");
    graph
        .add_task(
            || println!("  [visibility] build draw set"),
            &[animation, particles],
        )
        .expect("both passes exist");

    let frame = graph.execute(&jobs);
    frame.wait();
    println!("  frame graph complete: {}", frame.is_done());

    // --- Bulk data parallelism ---
    println!("\nparallel_for over 1,000,000 indices:");
    let checksum = Arc::new(AtomicUsize::new(0));
    parallel_for(&jobs, 1_000_000, |index| {
        checksum.fetch_add(index % 7, Ordering::Relaxed);
    });
    println!("  checksum = {}", checksum.load(Ordering::Relaxed));

    let mut jobs = jobs;
    jobs.stop();
    println!("\nJob system stopped.");
}
