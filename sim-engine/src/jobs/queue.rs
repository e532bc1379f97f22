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
//! Shared job queue internals
//!
//! One unbounded MPMC channel feeds every worker; submission is safe
//! from any thread, including workers themselves. Alongside the channel
//! runs an in-flight gauge counting every job that has been submitted
//! but not yet finished — parked dependents included — which is what
//! lets `stop` drain the pool deterministically.

use crate::jobs::handle::Counter;
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// One schedulable unit of work plus the completion counter it reports to.
pub(crate) struct Job {
    pub(crate) work: Box<dyn FnOnce() + Send>,
    pub(crate) counter: Arc<Counter>,
}

impl Job {
    #[cfg(test)]
    pub(crate) fn noop() -> Job {
        Job {
            work: Box::new(|| {}),
            counter: Counter::new(1),
        }
    }
}

pub(crate) enum Message {
    Job(Job),
    Shutdown,
}

/// Gauge of submitted-but-unfinished jobs with a blocking zero-wait.
struct InFlight {
    count: Mutex<usize>,
    condvar: Condvar,
}

impl InFlight {
    fn new() -> Self {
        InFlight {
            count: Mutex::new(0),
            condvar: Condvar::new(),
        }
    }

    fn increment(&self) {
        *self.count.lock() += 1;
    }

    fn decrement(&self) {
        let mut count = self.count.lock();
        debug_assert!(*count > 0, "in-flight gauge decremented below zero");
        *count -= 1;
        if *count == 0 {
            self.condvar.notify_all();
        }
    }

    fn wait_zero(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.condvar.wait(&mut count);
        }
    }
}

/// Cloneable producer side of the worker queue.
#[derive(Clone)]
pub(crate) struct JobQueue {
    sender: Sender<Message>,
    in_flight: Arc<InFlight>,
}

impl JobQueue {
    pub(crate) fn new() -> (JobQueue, Receiver<Message>) {
        let (sender, receiver) = unbounded();
        let queue = JobQueue {
            sender,
            in_flight: Arc::new(InFlight::new()),
        };
        (queue, receiver)
    }

    /// Track and enqueue a new job.
    pub(crate) fn submit(&self, job: Job) {
        self.track();
        self.dispatch(job);
    }

    /// Start tracking a job that will be dispatched later (a dependent
    /// parked on an unfinished counter).
    pub(crate) fn track(&self) {
        self.in_flight.increment();
    }

    /// Enqueue an already-tracked job.
    pub(crate) fn dispatch(&self, job: Job) {
        if self.sender.send(Message::Job(job)).is_err() {
            // The workers are gone; the job can never run. Scheduling
            // after stop is a caller contract violation.
            log::warn!("job submitted after the job system stopped; it will never run");
            self.in_flight.decrement();
        }
    }

    /// Mark one tracked job as finished.
    pub(crate) fn finish_one(&self) {
        self.in_flight.decrement();
    }

    /// Block until every tracked job has finished.
    pub(crate) fn wait_idle(&self) {
        self.in_flight.wait_zero();
    }

    /// Tell `workers` worker threads to exit once they reach the sentinel.
    pub(crate) fn shutdown(&self, workers: usize) {
        for _ in 0..workers {
            let _ = self.sender.send(Message::Shutdown);
        }
    }
}
