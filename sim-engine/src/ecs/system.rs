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
//! System execution contract
//!
//! Systems contain the logic that operates on entities and components.
//! Each system runs once per tick, reading and writing component storage
//! through a [`WorldCell`] and recording structural changes into a
//! [`CommandBuffer`] for deferred playback.
//!
//! Systems that want to run concurrently declare the component types
//! they read and write via [`Access`]; the scheduler only co-schedules
//! systems whose declared sets cannot conflict. A system that declares
//! nothing gets exclusive access and simply serializes.

use crate::ecs::{CommandBuffer, ComponentTypeId, WorldCell};

/// Declared component access for scheduling
///
/// Two systems conflict when either writes a type the other reads or
/// writes. Conflicting systems never share a stage; non-conflicting
/// systems may execute on worker threads simultaneously.
///
/// The default is [`Access::exclusive`], which conflicts with
/// everything — the safe choice for systems that have not audited their
/// storage usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    reads: Vec<ComponentTypeId>,
    writes: Vec<ComponentTypeId>,
    exclusive: bool,
}

impl Access {
    /// Create an empty access set that conflicts with nothing
    pub fn new() -> Self {
        Access {
            reads: Vec::new(),
            writes: Vec::new(),
            exclusive: false,
        }
    }

    /// Create an access set that conflicts with every other system
    pub fn exclusive() -> Self {
        Access {
            reads: Vec::new(),
            writes: Vec::new(),
            exclusive: true,
        }
    }

    /// Declare read access to a component type
    pub fn read(mut self, id: ComponentTypeId) -> Self {
        if !self.reads.contains(&id) {
            self.reads.push(id);
        }
        self
    }

    /// Declare write access to a component type
    pub fn write(mut self, id: ComponentTypeId) -> Self {
        if !self.writes.contains(&id) {
            self.writes.push(id);
        }
        self
    }

    /// Check whether this set is exclusive
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Check whether two access sets cannot safely run concurrently
    ///
    /// Conflicts on W∩W, W∩R, and R∩W; reads never conflict with reads.
    pub fn conflicts_with(&self, other: &Access) -> bool {
        if self.exclusive || other.exclusive {
            return true;
        }

        self.writes
            .iter()
            .any(|id| other.writes.contains(id) || other.reads.contains(id))
            || other.writes.iter().any(|id| self.reads.contains(id))
    }
}

impl Default for Access {
    fn default() -> Self {
        Self::exclusive()
    }
}

/// Trait for systems that operate on the ECS world
///
/// Systems should keep per-frame state out of `self` where possible and
/// operate purely on component data for maximum parallelization
/// potential. Structural changes (create/destroy entity, add/remove
/// component) must go through the command buffer, never through storage
/// directly, so iteration elsewhere in the tick stays valid.
pub trait System: Send + Sync {
    /// Execute the system for one tick
    fn run(&mut self, world: WorldCell<'_>, commands: &mut CommandBuffer, dt: f32);

    /// Declared component access, used for stage partitioning
    ///
    /// Defaults to exclusive: undeclared systems run alone.
    fn access(&self) -> Access {
        Access::exclusive()
    }

    /// Get the name of this system for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
