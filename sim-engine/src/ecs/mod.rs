//! Entity Component System core
//!
//! This module provides the foundational ECS architecture:
//! - Entity identity with generational liveness tracking
//! - Dense sparse-set component storage
//! - Deferred structural mutation through command buffers
//! - System execution with sequential and stage-parallel scheduling

mod command;
mod entity;
mod registry;
mod scheduler;
mod storage;
mod system;
mod world;

pub use command::CommandBuffer;
pub use entity::{Entity, EntityId, EntityManager};
pub use registry::{ComponentRegistry, ComponentTypeId};
pub use scheduler::Scheduler;
pub use storage::{Component, SparseSetStorage};
pub use system::{Access, System};
pub use world::{World, WorldCell};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_creation() {
        let world = World::new();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_entity_creation() {
        let mut world = World::new();
        let entity = world.create_entity();
        assert_eq!(world.entity_count(), 1);
        assert!(world.is_alive(entity));
    }
}
