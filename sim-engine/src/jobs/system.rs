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
//! Worker-thread pool with handle-based completion
//!
//! The [`JobSystem`] owns a fixed set of worker threads pulling from a
//! shared queue. Work is submitted as closures from any thread —
//! including from inside a running job — and every submission returns a
//! [`JobHandle`] for waiting or dependency chaining.
//!
//! The job system is an explicitly constructed value owned by the
//! application root and passed to whatever needs it; there is no
//! process-wide singleton, so tests can run isolated pools.

use crate::jobs::handle::{Counter, JobHandle};
use crate::jobs::queue::{Job, JobQueue, Message};
use crossbeam::channel::Receiver;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

/// A pool of worker threads executing jobs with dependency ordering
///
/// # Example
///
/// ```
/// use sim_engine::jobs::JobSystem;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let mut jobs = JobSystem::start(2);
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// let first = {
///     let counter = Arc::clone(&counter);
///     jobs.schedule(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     })
/// };
/// let second = {
///     let counter = Arc::clone(&counter);
///     jobs.schedule_after(&first, move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     })
/// };
///
/// second.wait();
/// assert_eq!(counter.load(Ordering::SeqCst), 2);
/// jobs.stop();
/// ```
pub struct JobSystem {
    queue: JobQueue,
    workers: Vec<Worker>,
}

struct Worker {
    handle: Option<thread::JoinHandle<()>>,
}

impl JobSystem {
    /// Start the pool with the given number of worker threads
    ///
    /// `worker_count == 0` selects a default from the machine's available
    /// parallelism.
    pub fn start(worker_count: usize) -> Self {
        let count = if worker_count == 0 {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            worker_count
        };

        let (queue, receiver) = JobQueue::new();
        let workers = (0..count)
            .map(|id| Worker::spawn(id, receiver.clone(), queue.clone()))
            .collect();

        log::debug!("job system started with {count} workers");
        JobSystem { queue, workers }
    }

    /// Get the number of worker threads
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Check whether the pool has running workers
    pub fn is_running(&self) -> bool {
        !self.workers.is_empty()
    }

    /// Submit one unit of work
    ///
    /// Safe to call concurrently from multiple producers. The returned
    /// handle is done once the work has run.
    pub fn schedule<F>(&self, work: F) -> JobHandle
    where
        F: FnOnce() + Send + 'static,
    {
        schedule_on(&self.queue, Box::new(work))
    }

    /// Submit work that becomes eligible only once `dependency` is done
    ///
    /// When the dependency has already completed the work is enqueued
    /// immediately; otherwise it parks on the dependency's counter and is
    /// released the moment the counter reaches zero. This is the
    /// dependency primitive the task graph builds on.
    pub fn schedule_after<F>(&self, dependency: &JobHandle, work: F) -> JobHandle
    where
        F: FnOnce() + Send + 'static,
    {
        schedule_after_on(&self.queue, dependency, Box::new(work))
    }

    /// Block the calling thread until `handle` is done
    ///
    /// Returns immediately for handles that are already done. Call this
    /// from threads outside the pool; waiting from inside a job idles a
    /// worker and is a caller contract violation.
    pub fn wait(&self, handle: &JobHandle) {
        handle.wait();
    }

    /// Get a cloneable submission handle
    ///
    /// Dispatchers keep working from inside running jobs, which is how
    /// nested scheduling reaches the pool without borrowing the
    /// [`JobSystem`] itself.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            queue: self.queue.clone(),
        }
    }

    pub(crate) fn queue(&self) -> &JobQueue {
        &self.queue
    }

    /// Stop the pool: drain, then join
    ///
    /// Deliberate drain policy: `stop` first waits for every submitted
    /// job to finish — dependents released during the drain included —
    /// and only then shuts the workers down. This makes `stop` a reliable
    /// shutdown barrier; the cost is that a dependent parked on a handle
    /// that never completes will hang the drain, which is the caller's
    /// bug (a leaked counter), not a recoverable condition.
    ///
    /// Idempotent, and also invoked on drop.
    pub fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        log::debug!("job system draining {} workers before stop", self.workers.len());
        self.queue.wait_idle();
        self.queue.shutdown(self.workers.len());
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
        self.workers.clear();
        log::debug!("job system stopped");
    }
}

impl Drop for JobSystem {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A cloneable handle for submitting jobs from any thread
///
/// Obtained from [`JobSystem::dispatcher`]; useful for nested scheduling
/// from inside running jobs where the pool itself cannot be borrowed.
#[derive(Clone)]
pub struct Dispatcher {
    queue: JobQueue,
}

impl Dispatcher {
    /// Submit one unit of work
    pub fn schedule<F>(&self, work: F) -> JobHandle
    where
        F: FnOnce() + Send + 'static,
    {
        schedule_on(&self.queue, Box::new(work))
    }

    /// Submit work that becomes eligible only once `dependency` is done
    pub fn schedule_after<F>(&self, dependency: &JobHandle, work: F) -> JobHandle
    where
        F: FnOnce() + Send + 'static,
    {
        schedule_after_on(&self.queue, dependency, Box::new(work))
    }
}

fn schedule_on(queue: &JobQueue, work: Box<dyn FnOnce() + Send>) -> JobHandle {
    let counter = Counter::new(1);
    queue.submit(Job {
        work,
        counter: counter.clone(),
    });
    JobHandle::from_counter(counter)
}

fn schedule_after_on(
    queue: &JobQueue,
    dependency: &JobHandle,
    work: Box<dyn FnOnce() + Send>,
) -> JobHandle {
    let counter = Counter::new(1);
    let job = Job {
        work,
        counter: counter.clone(),
    };

    match dependency.counter() {
        None => queue.submit(job),
        Some(dep) => {
            queue.track();
            if let Some(job) = dep.park_dependent(job) {
                queue.dispatch(job);
            }
        }
    }

    JobHandle::from_counter(counter)
}

impl Worker {
    fn spawn(id: usize, receiver: Receiver<Message>, queue: JobQueue) -> Worker {
        let handle = thread::Builder::new()
            .name(format!("sim-worker-{id}"))
            .spawn(move || {
                while let Ok(message) = receiver.recv() {
                    match message {
                        Message::Job(job) => run_job(job, &queue),
                        Message::Shutdown => break,
                    }
                }
            })
            .expect("failed to spawn worker thread");

        Worker {
            handle: Some(handle),
        }
    }
}

fn run_job(job: Job, queue: &JobQueue) {
    let Job { work, counter } = job;

    // A panicking job must still signal completion, or every waiter and
    // dependent deadlocks behind a counter that can never reach zero.
    if catch_unwind(AssertUnwindSafe(work)).is_err() {
        log::error!("job panicked on worker '{}'", thread::current().name().unwrap_or("?"));
    }

    for dependent in counter.complete() {
        queue.dispatch(dependent);
    }
    queue.finish_one();
}
