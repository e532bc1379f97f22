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
//! Job completion handles
//!
//! A [`JobHandle`] is a lightweight reference to a shared completion
//! counter. The counter starts at the number of outstanding jobs and is
//! decremented exactly once per completed job; the handle is done iff
//! the counter is zero or absent. Besides waking blocked waiters,
//! reaching zero releases any dependent jobs parked on the counter —
//! this is the primitive `schedule_after` and the task graph build on.

use crate::jobs::queue::Job;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared completion state behind a [`JobHandle`].
pub(crate) struct Counter {
    pending: AtomicUsize,
    /// Jobs parked until the counter reaches zero. The mutex doubles as
    /// the condvar lock for blocking waiters.
    dependents: Mutex<Vec<Job>>,
    condvar: Condvar,
}

impl Counter {
    /// New counter expecting `pending` completions.
    pub(crate) fn new(pending: usize) -> Arc<Counter> {
        Arc::new(Counter {
            pending: AtomicUsize::new(pending),
            dependents: Mutex::new(Vec::new()),
            condvar: Condvar::new(),
        })
    }

    pub(crate) fn is_done(&self) -> bool {
        self.pending.load(Ordering::Acquire) == 0
    }

    /// Record one completed job. When the counter reaches zero, blocked
    /// waiters are woken and any parked dependents are returned so the
    /// caller can feed them to the queue.
    pub(crate) fn complete(&self) -> Vec<Job> {
        let previous = self.pending.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous >= 1, "completion counter decremented below zero");

        if previous != 1 {
            return Vec::new();
        }

        let mut dependents = self.dependents.lock();
        let released = std::mem::take(&mut *dependents);
        self.condvar.notify_all();
        released
    }

    /// Park a job until the counter reaches zero. Returns the job back
    /// when the counter is already done, in which case the caller must
    /// dispatch it immediately.
    pub(crate) fn park_dependent(&self, job: Job) -> Option<Job> {
        let mut dependents = self.dependents.lock();
        // Checked under the lock so a concurrent `complete` either sees
        // the parked job or we see the zero it just published.
        if self.pending.load(Ordering::Acquire) == 0 {
            return Some(job);
        }
        dependents.push(job);
        None
    }

    /// Block until the counter reaches zero. Correct under spurious
    /// wakeups: the predicate is rechecked on every wake.
    pub(crate) fn wait(&self) {
        let mut guard = self.dependents.lock();
        while self.pending.load(Ordering::Acquire) > 0 {
            self.condvar.wait(&mut guard);
        }
    }
}

/// Lightweight reference to a shared completion counter
///
/// Cheap to clone and pass around. A handle with no counter is already
/// done; [`JobHandle::default`] produces one, which is convenient as the
/// dependency of work with no predecessor.
#[derive(Clone, Default)]
pub struct JobHandle {
    counter: Option<Arc<Counter>>,
}

impl JobHandle {
    /// A handle that is already done
    pub fn done() -> Self {
        JobHandle { counter: None }
    }

    pub(crate) fn from_counter(counter: Arc<Counter>) -> Self {
        JobHandle {
            counter: Some(counter),
        }
    }

    pub(crate) fn counter(&self) -> Option<&Arc<Counter>> {
        self.counter.as_ref()
    }

    /// Check whether every job behind this handle has completed
    pub fn is_done(&self) -> bool {
        self.counter.as_ref().map_or(true, |c| c.is_done())
    }

    /// Block the calling thread until the handle is done
    ///
    /// Returns immediately when the handle is already done. Blocking on a
    /// handle whose jobs can never complete (for example after the pool
    /// was stopped underneath it) is a caller bug and will block forever.
    pub fn wait(&self) {
        if let Some(counter) = &self.counter {
            counter.wait();
        }
    }
}
