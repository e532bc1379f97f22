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
//! Data-parallel index loops
//!
//! [`parallel_for`] partitions an index range into contiguous chunks and
//! schedules one job per chunk, blocking the caller until every chunk
//! has run. Chunks are sized to amortize scheduling overhead against
//! per-index work; small ranges skip the pool entirely and run inline.

use crate::jobs::handle::{Counter, JobHandle};
use crate::jobs::queue::Job;
use crate::jobs::JobSystem;

/// Ranges at or below this length run inline on the calling thread.
const INLINE_THRESHOLD: usize = 64;

/// Chunks per worker; more than one so an uneven chunk cannot leave
/// workers idle for the whole tail of the loop.
const CHUNKS_PER_WORKER: usize = 4;

/// Invoke `body` for every index in `[0, count)`, in parallel
///
/// Every index is visited exactly once and no index is visited
/// concurrently by two chunks; `body` sees disjoint contiguous
/// sub-ranges. Execution order across chunks is unspecified. The call
/// returns only after all chunks have completed, so `body` may borrow
/// from the caller's stack.
///
/// `count == 0` invokes the body zero times and returns immediately.
///
/// # Example
///
/// ```
/// use sim_engine::jobs::{parallel_for, JobSystem};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let jobs = JobSystem::start(4);
/// let sum = AtomicUsize::new(0);
///
/// parallel_for(&jobs, 1000, |index| {
///     sum.fetch_add(index, Ordering::Relaxed);
/// });
///
/// assert_eq!(sum.load(Ordering::Relaxed), 999 * 1000 / 2);
/// ```
pub fn parallel_for<F>(jobs: &JobSystem, count: usize, body: F)
where
    F: Fn(usize) + Send + Sync,
{
    if count == 0 {
        return;
    }

    let workers = jobs.worker_count();
    if count <= INLINE_THRESHOLD || workers <= 1 {
        for index in 0..count {
            body(index);
        }
        return;
    }

    let target_chunks = workers * CHUNKS_PER_WORKER;
    let chunk_len = (count + target_chunks - 1) / target_chunks;
    let chunk_count = (count + chunk_len - 1) / chunk_len;

    let body_ref: &(dyn Fn(usize) + Send + Sync) = &body;
    // Safety: the chunk jobs cannot outlive `body` — this function blocks
    // on the chunk counter below, and the counter only reaches zero after
    // every chunk has returned.
    let body_ref: &'static (dyn Fn(usize) + Send + Sync) =
        unsafe { std::mem::transmute(body_ref) };

    let counter = Counter::new(chunk_count);
    let queue = jobs.queue();

    for chunk in 0..chunk_count {
        let start = chunk * chunk_len;
        let end = usize::min(start + chunk_len, count);

        queue.submit(Job {
            work: Box::new(move || {
                for index in start..end {
                    body_ref(index);
                }
            }),
            counter: counter.clone(),
        });
    }

    JobHandle::from_counter(counter).wait();
}
