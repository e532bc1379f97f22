//! Parallel job scheduling
//!
//! This module provides the concurrency engine:
//! - A worker-thread pool executing closures with handle-based
//!   completion signaling and dependency chaining
//! - One-shot task graphs with explicit predecessor lists
//! - A chunked data-parallel loop primitive

mod graph;
pub(crate) mod handle;
mod parallel;
pub(crate) mod queue;
mod system;

pub use graph::{GraphError, TaskGraph};
pub use handle::JobHandle;
pub use parallel::parallel_for;
pub use system::{Dispatcher, JobSystem};
