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
//! # Sim Engine
//!
//! A data-oriented ECS (Entity Component System) simulation core paired
//! with a parallel job-scheduling layer, built to drive per-frame work
//! in real-time applications.
//!
//! ## Features
//!
//! - **Generational entities**: stale handles fail liveness checks even
//!   after their id is recycled
//! - **Sparse-set storage**: O(1) insert/remove/lookup with dense,
//!   cache-linear component iteration
//! - **Deferred mutation**: structural changes recorded into command
//!   buffers and played back between ticks, so iteration stays valid
//!   while systems run
//! - **Job system**: a worker-thread pool with completion handles,
//!   dependency chaining, one-shot task graphs, and a chunked
//!   `parallel_for`
//! - **Staged scheduling**: systems declaring disjoint read/write sets
//!   execute concurrently; everything else serializes safely
//!
//! ## Example
//!
//! ```rust
//! use sim_engine::ecs::{CommandBuffer, Component, Scheduler, System, World, WorldCell};
//!
//! #[derive(Debug, Clone, Copy)]
//! struct Position { x: f32, y: f32 }
//! impl Component for Position {}
//!
//! struct Drift;
//! impl System for Drift {
//!     fn run(&mut self, world: WorldCell<'_>, _commands: &mut CommandBuffer, dt: f32) {
//!         if let Some(storage) = world.storage_mut::<Position>() {
//!             for position in storage.values_mut() {
//!                 position.x += dt;
//!             }
//!         }
//!     }
//! }
//!
//! let mut world = World::new();
//! world.register::<Position>();
//! let entity = world.create_entity();
//! world.set_component(entity, Position { x: 0.0, y: 0.0 });
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.add_system(Drift);
//! scheduler.tick(&mut world, 1.0 / 60.0);
//! ```

#![warn(missing_docs)]

/// Entity Component System implementation
pub mod ecs;

/// Worker-thread job scheduling
pub mod jobs;

pub use ecs::{Entity, World};
pub use jobs::JobSystem;
