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
//! Dependency-ordered job graphs
//!
//! A [`TaskGraph`] is a single-use DAG: build it by adding tasks whose
//! dependencies refer to previously added nodes, execute it once, and
//! discard it. Dependencies can only point backwards, so the graph is
//! acyclic by construction; invalid indices are rejected at
//! [`add_task`](TaskGraph::add_task) time rather than corrupting the
//! graph.

use crate::jobs::handle::{Counter, JobHandle};
use crate::jobs::queue::{Job, JobQueue};
use crate::jobs::JobSystem;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Configuration errors raised while building a task graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A dependency index did not refer to a previously added node.
    #[error("task dependency {dependency} does not refer to a previously added node ({nodes} nodes added so far)")]
    InvalidDependency {
        /// The offending dependency index.
        dependency: usize,
        /// Number of nodes in the graph when the error was raised.
        nodes: usize,
    },
}

struct TaskNode {
    work: Box<dyn FnOnce() + Send>,
    dependencies: Vec<usize>,
}

/// A one-shot DAG of jobs with explicit dependency edges
///
/// # Example
///
/// ```
/// use sim_engine::jobs::{JobSystem, TaskGraph};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let jobs = JobSystem::start(2);
/// let total = Arc::new(AtomicUsize::new(0));
///
/// let mut graph = TaskGraph::new();
/// let load = {
///     let total = Arc::clone(&total);
///     graph.add_task(move || { total.fetch_add(1, Ordering::SeqCst); }, &[]).unwrap()
/// };
/// let process = {
///     let total = Arc::clone(&total);
///     graph.add_task(move || { total.fetch_add(1, Ordering::SeqCst); }, &[load]).unwrap()
/// };
/// let _finish = {
///     let total = Arc::clone(&total);
///     graph.add_task(move || { total.fetch_add(1, Ordering::SeqCst); }, &[process]).unwrap()
/// };
///
/// graph.execute(&jobs).wait();
/// assert_eq!(total.load(Ordering::SeqCst), 3);
/// ```
pub struct TaskGraph {
    nodes: Vec<TaskNode>,
}

/// Per-node execution state shared by the in-flight graph.
struct NodeEntry {
    /// Taken exactly once when the node becomes eligible and runs.
    work: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    /// Dependencies still outstanding; the node is submitted when this
    /// reaches zero.
    remaining: AtomicUsize,
    /// Nodes to notify when this one completes.
    dependents: Vec<usize>,
}

struct GraphState {
    entries: Vec<NodeEntry>,
    /// One decrement per node; done means the whole graph ran.
    counter: Arc<Counter>,
}

impl TaskGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        TaskGraph { nodes: Vec::new() }
    }

    /// Get the number of added tasks
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no tasks
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Register a task and its predecessors, returning the node index
    ///
    /// Every dependency must be the index of a previously added node; a
    /// forward or out-of-range reference fails here, before the graph can
    /// be executed.
    pub fn add_task<F>(&mut self, work: F, dependencies: &[usize]) -> Result<usize, GraphError>
    where
        F: FnOnce() + Send + 'static,
    {
        for &dependency in dependencies {
            if dependency >= self.nodes.len() {
                return Err(GraphError::InvalidDependency {
                    dependency,
                    nodes: self.nodes.len(),
                });
            }
        }

        self.nodes.push(TaskNode {
            work: Box::new(work),
            dependencies: dependencies.to_vec(),
        });
        Ok(self.nodes.len() - 1)
    }

    /// Submit the whole graph, consuming it
    ///
    /// Nodes without dependencies are eligible immediately and may run in
    /// parallel; every other node is submitted the moment its last
    /// dependency completes. The returned handle is done once every node
    /// has run. An empty graph returns an already-done handle.
    pub fn execute(self, jobs: &JobSystem) -> JobHandle {
        let node_count = self.nodes.len();
        if node_count == 0 {
            return JobHandle::done();
        }

        let counter = Counter::new(node_count);

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); node_count];
        for (index, node) in self.nodes.iter().enumerate() {
            for &dependency in &node.dependencies {
                dependents[dependency].push(index);
            }
        }

        let mut roots = Vec::new();
        let entries: Vec<NodeEntry> = self
            .nodes
            .into_iter()
            .zip(dependents)
            .enumerate()
            .map(|(index, (node, dependents))| {
                if node.dependencies.is_empty() {
                    roots.push(index);
                }
                NodeEntry {
                    work: Mutex::new(Some(node.work)),
                    remaining: AtomicUsize::new(node.dependencies.len()),
                    dependents,
                }
            })
            .collect();

        let state = Arc::new(GraphState {
            entries,
            counter: counter.clone(),
        });

        let queue = jobs.queue().clone();
        for index in roots {
            submit_node(&state, &queue, index);
        }

        JobHandle::from_counter(counter)
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Submit one eligible node. Completing it decrements each dependent's
/// remaining count and submits the ones that reach zero, so the release
/// chain runs entirely on worker threads (nested scheduling).
fn submit_node(state: &Arc<GraphState>, queue: &JobQueue, index: usize) {
    let node_state = Arc::clone(state);
    let node_queue = queue.clone();

    let work = Box::new(move || {
        if let Some(work) = node_state.entries[index].work.lock().take() {
            work();
        }

        for &dependent in &node_state.entries[index].dependents {
            if node_state.entries[dependent].remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                submit_node(&node_state, &node_queue, dependent);
            }
        }
    });

    queue.submit(Job {
        work,
        counter: state.counter.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_add_task_returns_sequential_indices() {
        let mut graph = TaskGraph::new();
        assert_eq!(graph.add_task(|| {}, &[]), Ok(0));
        assert_eq!(graph.add_task(|| {}, &[0]), Ok(1));
        assert_eq!(graph.add_task(|| {}, &[0, 1]), Ok(2));
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_forward_reference_fails_fast() {
        let mut graph = TaskGraph::new();
        let error = graph.add_task(|| {}, &[0]).unwrap_err();
        assert_eq!(
            error,
            GraphError::InvalidDependency {
                dependency: 0,
                nodes: 0
            }
        );

        graph.add_task(|| {}, &[]).unwrap();
        assert!(graph.add_task(|| {}, &[5]).is_err());
        // The failed adds did not grow the graph.
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_empty_graph_is_done_immediately() {
        let jobs = JobSystem::start(1);
        let handle = TaskGraph::new().execute(&jobs);
        assert!(handle.is_done());
        handle.wait();
    }

    #[test]
    fn test_dependency_never_starts_before_predecessor() {
        let jobs = JobSystem::start(4);
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut graph = TaskGraph::new();
        let slow = {
            let order = Arc::clone(&order);
            graph
                .add_task(
                    move || {
                        std::thread::sleep(Duration::from_millis(20));
                        order.lock().push("slow");
                    },
                    &[],
                )
                .unwrap()
        };
        {
            let order = Arc::clone(&order);
            graph
                .add_task(move || order.lock().push("after"), &[slow])
                .unwrap();
        }

        graph.execute(&jobs).wait();
        assert_eq!(*order.lock(), vec!["slow", "after"]);
    }

    #[test]
    fn test_diamond_dependencies() {
        let jobs = JobSystem::start(4);
        let sum = Arc::new(AtomicUsize::new(0));

        // a -> (b, c) -> d; d must observe both branches.
        let mut graph = TaskGraph::new();
        let a = {
            let sum = Arc::clone(&sum);
            graph.add_task(move || { sum.fetch_add(1, Ordering::SeqCst); }, &[]).unwrap()
        };
        let b = {
            let sum = Arc::clone(&sum);
            graph.add_task(move || { sum.fetch_add(10, Ordering::SeqCst); }, &[a]).unwrap()
        };
        let c = {
            let sum = Arc::clone(&sum);
            graph.add_task(move || { sum.fetch_add(100, Ordering::SeqCst); }, &[a]).unwrap()
        };
        let observed = Arc::new(AtomicUsize::new(0));
        {
            let sum = Arc::clone(&sum);
            let observed = Arc::clone(&observed);
            graph
                .add_task(
                    move || {
                        observed.store(sum.load(Ordering::SeqCst), Ordering::SeqCst);
                    },
                    &[b, c],
                )
                .unwrap();
        }

        graph.execute(&jobs).wait();
        assert_eq!(observed.load(Ordering::SeqCst), 111);
    }

    #[test]
    fn test_independent_roots_all_run() {
        let jobs = JobSystem::start(4);
        let count = Arc::new(AtomicUsize::new(0));

        let mut graph = TaskGraph::new();
        for _ in 0..16 {
            let count = Arc::clone(&count);
            graph
                .add_task(move || { count.fetch_add(1, Ordering::SeqCst); }, &[])
                .unwrap();
        }

        let handle = graph.execute(&jobs);
        handle.wait();
        assert!(handle.is_done());
        assert_eq!(count.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn test_duplicate_dependencies_are_consistent() {
        let jobs = JobSystem::start(2);
        let count = Arc::new(AtomicUsize::new(0));

        let mut graph = TaskGraph::new();
        let root = graph.add_task(|| {}, &[]).unwrap();
        {
            let count = Arc::clone(&count);
            graph
                .add_task(move || { count.fetch_add(1, Ordering::SeqCst); }, &[root, root])
                .unwrap();
        }

        graph.execute(&jobs).wait();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_chain_runs_in_order() {
        let jobs = JobSystem::start(4);
        let trace = Arc::new(Mutex::new(Vec::new()));

        let mut graph = TaskGraph::new();
        let mut previous = None;
        for step in 0..8 {
            let trace = Arc::clone(&trace);
            let dependencies: Vec<usize> = previous.into_iter().collect();
            previous = Some(
                graph
                    .add_task(move || trace.lock().push(step), &dependencies)
                    .unwrap(),
            );
        }

        graph.execute(&jobs).wait();
        assert_eq!(*trace.lock(), (0..8).collect::<Vec<_>>());
    }
}
