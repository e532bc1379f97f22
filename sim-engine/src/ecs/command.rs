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
//! Deferred structural mutation
//!
//! Systems iterate live component storage and must not reshape it while
//! iteration is in flight. Structural changes — entity creation and
//! destruction, component add and remove — are therefore recorded into a
//! [`CommandBuffer`] during system execution and played back at a
//! synchronization point when no system is running.
//!
//! Commands execute strictly in enqueue order. A command that targets an
//! entity destroyed earlier in the same playback is a safe no-op: the
//! typed helpers gate on liveness, so enqueue order is the only ordering
//! contract callers need to reason about.

use crate::ecs::{Component, Entity, World};

type Command = Box<dyn FnOnce(&mut World) + Send>;

/// Ordered log of deferred world mutations
///
/// Operations have no side effect at enqueue time; [`playback`]
/// (CommandBuffer::playback) applies them in enqueue order exactly once
/// and leaves the buffer empty, ready for reuse next tick.
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Create a new empty command buffer
    pub fn new() -> Self {
        CommandBuffer {
            commands: Vec::new(),
        }
    }

    /// Enqueue an arbitrary deferred operation
    pub fn push<F>(&mut self, command: F)
    where
        F: FnOnce(&mut World) + Send + 'static,
    {
        self.commands.push(Box::new(command));
    }

    /// Enqueue creation of a new entity
    pub fn create_entity(&mut self) {
        self.push(|world| {
            world.create_entity();
        });
    }

    /// Enqueue creation of a new entity followed by a setup closure
    ///
    /// The closure receives the freshly created entity, which is the only
    /// way deferred spawns can attach components to it.
    pub fn create_entity_with<F>(&mut self, setup: F)
    where
        F: FnOnce(Entity, &mut World) + Send + 'static,
    {
        self.push(move |world| {
            let entity = world.create_entity();
            setup(entity, world);
        });
    }

    /// Enqueue destruction of an entity
    ///
    /// A no-op at playback time if the entity is already dead.
    pub fn destroy_entity(&mut self, entity: Entity) {
        self.push(move |world| {
            world.destroy_entity(entity);
        });
    }

    /// Enqueue setting a component on an entity
    ///
    /// A no-op at playback time if the entity is no longer alive.
    pub fn set_component<T: Component>(&mut self, entity: Entity, value: T) {
        self.push(move |world| {
            world.set_component(entity, value);
        });
    }

    /// Enqueue removing a component from an entity
    ///
    /// A no-op at playback time if the entity or component is absent.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) {
        self.push(move |world| {
            world.remove_component::<T>(entity);
        });
    }

    /// Move all commands from `other` onto the end of this buffer
    ///
    /// Used to merge per-system buffers in a defined order so playback
    /// stays deterministic when systems recorded on different threads.
    pub fn append(&mut self, other: &mut CommandBuffer) {
        self.commands.append(&mut other.commands);
    }

    /// Get the number of pending commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if no commands are pending
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop all pending commands without executing them
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Execute every pending command in enqueue order, then clear
    ///
    /// The buffer is emptied unconditionally: draining hands each command
    /// out before it runs, so even a panicking command cannot leave stale
    /// entries behind for the next tick.
    pub fn playback(&mut self, world: &mut World) {
        for command in self.commands.drain(..) {
            command(world);
        }
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Score(i32);
    impl Component for Score {}

    #[test]
    fn test_enqueue_has_no_side_effect() {
        let mut world = World::new();
        let entity = world.create_entity();

        let mut commands = CommandBuffer::new();
        commands.set_component(entity, Score(1));

        assert_eq!(world.get_component::<Score>(entity), None);
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn test_playback_applies_in_enqueue_order() {
        let mut world = World::new();
        let entity = world.create_entity();

        let mut commands = CommandBuffer::new();
        commands.set_component(entity, Score(1));
        commands.set_component(entity, Score(2));
        commands.playback(&mut world);

        assert_eq!(world.get_component::<Score>(entity), Some(&Score(2)));
        assert!(commands.is_empty());
    }

    #[test]
    fn test_command_after_destroy_is_noop() {
        let mut world = World::new();
        let entity = world.create_entity();

        let mut commands = CommandBuffer::new();
        commands.destroy_entity(entity);
        commands.set_component(entity, Score(5));
        commands.playback(&mut world);

        assert!(!world.is_alive(entity));
        assert_eq!(world.get_component::<Score>(entity), None);
    }

    #[test]
    fn test_create_entity_with_setup() {
        let mut world = World::new();

        let mut commands = CommandBuffer::new();
        commands.create_entity_with(|entity, world| {
            world.set_component(entity, Score(7));
        });
        commands.playback(&mut world);

        assert_eq!(world.entity_count(), 1);
        let storage = world.storage::<Score>().unwrap();
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.values()[0], Score(7));
    }

    #[test]
    fn test_remove_component_command() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.set_component(entity, Score(3));

        let mut commands = CommandBuffer::new();
        commands.remove_component::<Score>(entity);
        commands.playback(&mut world);

        assert_eq!(world.get_component::<Score>(entity), None);
        assert!(world.is_alive(entity));
    }

    #[test]
    fn test_append_preserves_order() {
        let mut world = World::new();
        let entity = world.create_entity();

        let mut first = CommandBuffer::new();
        let mut second = CommandBuffer::new();
        first.set_component(entity, Score(1));
        second.set_component(entity, Score(2));

        let mut merged = CommandBuffer::new();
        merged.append(&mut first);
        merged.append(&mut second);
        assert!(first.is_empty());
        assert_eq!(merged.len(), 2);

        merged.playback(&mut world);
        assert_eq!(world.get_component::<Score>(entity), Some(&Score(2)));
    }

    #[test]
    fn test_playback_clears_for_reuse() {
        let mut world = World::new();
        let mut commands = CommandBuffer::new();

        commands.create_entity();
        commands.playback(&mut world);
        commands.playback(&mut world);

        assert_eq!(world.entity_count(), 1);
    }
}
