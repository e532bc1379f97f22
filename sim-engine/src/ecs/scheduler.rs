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
//! System scheduling with staged parallel execution
//!
//! The scheduler runs every registered system once per tick. The
//! baseline [`tick`](Scheduler::tick) replays systems sequentially in
//! registration order; [`tick_parallel`](Scheduler::tick_parallel)
//! partitions systems into stages using their declared access sets and
//! dispatches each stage's systems as jobs.
//!
//! Stages execute sequentially and systems within a stage never conflict,
//! so two systems only run concurrently when their declared reads and
//! writes are disjoint. Systems are grouped in registration order and a
//! conflicting system always lands in a later stage than the system it
//! conflicts with, which keeps write-then-read orderings implied by
//! registration intact.
//!
//! Each system records structural changes into its own command buffer;
//! after the last stage the buffers play back in registration order, so
//! playback is deterministic regardless of which worker ran which
//! system, and no system is running while the world is restructured.

use crate::ecs::{CommandBuffer, System, World};
use crate::jobs::handle::{Counter, JobHandle};
use crate::jobs::queue::Job;
use crate::jobs::JobSystem;

struct Registered {
    system: Box<dyn System>,
    /// Access sampled at registration; the partition relies on it being
    /// stable for the system's lifetime.
    access: crate::ecs::Access,
    commands: CommandBuffer,
}

/// Runs registered systems once per tick, sequentially or staged
///
/// # Examples
///
/// ```
/// use sim_engine::ecs::{CommandBuffer, Scheduler, System, World, WorldCell};
///
/// struct MySystem;
/// impl System for MySystem {
///     fn run(&mut self, _world: WorldCell<'_>, _commands: &mut CommandBuffer, _dt: f32) {}
/// }
///
/// let mut scheduler = Scheduler::new();
/// scheduler.add_system(MySystem);
///
/// let mut world = World::new();
/// scheduler.tick(&mut world, 1.0 / 60.0);
/// ```
pub struct Scheduler {
    systems: Vec<Registered>,
    /// Conflict-free groups of system indices, in execution order.
    stages: Vec<Vec<usize>>,
}

impl Scheduler {
    /// Create a new empty scheduler
    pub fn new() -> Self {
        Scheduler {
            systems: Vec::new(),
            stages: Vec::new(),
        }
    }

    /// Register a system
    ///
    /// Systems run in registration order under [`tick`](Scheduler::tick).
    /// For parallel execution the system joins the newest stage when its
    /// declared access does not conflict with any system already there;
    /// otherwise it opens a new stage. Access is sampled once, here.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        let index = self.systems.len();
        let access = system.access();

        let joins_last = self.stages.last().map_or(false, |stage| {
            stage
                .iter()
                .all(|&other| !access.conflicts_with(&self.systems[other].access))
        });

        if joins_last {
            self.stages.last_mut().unwrap().push(index);
        } else {
            self.stages.push(vec![index]);
        }

        log::trace!(
            "system '{}' registered in stage {}",
            system.name(),
            self.stages.len() - 1
        );

        self.systems.push(Registered {
            system: Box::new(system),
            access,
            commands: CommandBuffer::new(),
        });
    }

    /// Get the number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Get the number of execution stages
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Remove all registered systems
    pub fn clear(&mut self) {
        self.systems.clear();
        self.stages.clear();
    }

    /// Run one tick sequentially
    ///
    /// Every system runs once in registration order with the same `dt`;
    /// afterwards the accumulated command buffers play back in the same
    /// order.
    pub fn tick(&mut self, world: &mut World, dt: f32) {
        for registered in &mut self.systems {
            registered
                .system
                .run(world.cell(), &mut registered.commands, dt);
        }
        self.apply_commands(world);
    }

    /// Run one tick with stage-parallel system execution
    ///
    /// Stages execute in order with a synchronization barrier between
    /// them; within a stage every system is dispatched to the job system
    /// and the scheduler blocks until the stage handle completes.
    /// Single-system stages (and single-worker pools) run inline.
    /// Command playback happens once, after the last stage, with no
    /// system concurrently running.
    pub fn tick_parallel(&mut self, world: &mut World, jobs: &JobSystem, dt: f32) {
        let systems = self.systems.as_mut_ptr();

        for stage in &self.stages {
            if stage.len() == 1 || jobs.worker_count() <= 1 {
                for &index in stage {
                    let registered = &mut self.systems[index];
                    registered
                        .system
                        .run(world.cell(), &mut registered.commands, dt);
                }
                continue;
            }

            let counter = Counter::new(stage.len());
            let queue = jobs.queue();

            for &index in stage {
                // Stage indices are distinct, so each task gets exclusive
                // access to its slot; the world pointer is shared and the
                // stage's disjoint access sets make that sound. Both
                // pointers stay valid because we block on the stage
                // counter before this loop iteration ends.
                let task = SystemTask {
                    entry: unsafe { systems.add(index) },
                    world: &*world,
                    dt,
                };
                queue.submit(Job {
                    work: Box::new(move || task.run()),
                    counter: counter.clone(),
                });
            }

            JobHandle::from_counter(counter).wait();
        }

        self.apply_commands(world);
    }

    /// Play back every system's commands in registration order.
    fn apply_commands(&mut self, world: &mut World) {
        for registered in &mut self.systems {
            registered.commands.playback(world);
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// One system dispatch within a parallel stage.
struct SystemTask {
    entry: *mut Registered,
    world: *const World,
    dt: f32,
}

// The raw pointers reference distinct system slots and a world whose
// concurrent access is partitioned by declared read/write sets.
unsafe impl Send for SystemTask {}

impl SystemTask {
    fn run(self) {
        let registered = unsafe { &mut *self.entry };
        let world = unsafe { &*self.world };
        registered
            .system
            .run(world.cell(), &mut registered.commands, self.dt);
    }
}
