//! World management
//!
//! The World is the central container for all ECS data: the entity
//! manager, the component registry, and one sparse-set storage per
//! registered component type.
//!
//! Access comes in two flavors. The `&mut self` API is for exclusive,
//! single-threaded use — setup code, command playback, anything between
//! ticks. [`World::cell`] returns a shared [`WorldCell`] handle for
//! system execution: component storage is not internally synchronized,
//! and the scheduler's disjoint read/write staging is what prevents data
//! races, not locks inside storage.

use crate::ecs::{
    Component, ComponentRegistry, ComponentTypeId, Entity, EntityManager, SparseSetStorage,
};
use std::any::Any;
use std::cell::UnsafeCell;

/// Type-erased storage operations the world needs across all component
/// types, chiefly removing a destroyed entity from every storage.
trait AnyStorage: Send + Sync {
    fn remove_entity(&mut self, entity: Entity);
    fn clear(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyStorage for SparseSetStorage<T> {
    fn remove_entity(&mut self, entity: Entity) {
        self.remove(entity);
    }

    fn clear(&mut self) {
        SparseSetStorage::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct WorldData {
    entities: EntityManager,
    registry: ComponentRegistry,
    /// One storage per registered component type, indexed by type id.
    storages: Vec<Box<dyn AnyStorage>>,
}

impl WorldData {
    fn storage<T: Component>(&self) -> Option<&SparseSetStorage<T>> {
        let id = self.registry.lookup::<T>()?;
        self.storages[id.index()]
            .as_any()
            .downcast_ref::<SparseSetStorage<T>>()
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut SparseSetStorage<T>> {
        let id = self.registry.lookup::<T>()?;
        self.storages[id.index()]
            .as_any_mut()
            .downcast_mut::<SparseSetStorage<T>>()
    }
}

/// The main ECS world container
///
/// World manages entity lifecycles and serves as the central access
/// point for all ECS operations.
///
/// # Example
///
/// ```
/// use sim_engine::ecs::{Component, World};
///
/// #[derive(Debug, PartialEq)]
/// struct Health(u32);
/// impl Component for Health {}
///
/// let mut world = World::new();
/// let entity = world.create_entity();
/// world.set_component(entity, Health(100));
///
/// assert_eq!(world.get_component::<Health>(entity), Some(&Health(100)));
/// ```
pub struct World {
    inner: UnsafeCell<WorldData>,
}

// Shared access during a tick goes through WorldCell, whose mutable
// storage accessors require the scheduler's disjoint-access staging.
// Outside a tick the &mut methods give ordinary exclusive access.
unsafe impl Sync for World {}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        World {
            inner: UnsafeCell::new(WorldData {
                entities: EntityManager::new(),
                registry: ComponentRegistry::new(),
                storages: Vec::new(),
            }),
        }
    }

    fn data(&self) -> &WorldData {
        unsafe { &*self.inner.get() }
    }

    /// Register a component type, creating its storage
    ///
    /// Idempotent; returns the stable type id either way. Registration
    /// requires exclusive world access, which rules out the concurrent
    /// first-use race at compile time.
    pub fn register<T: Component>(&mut self) -> ComponentTypeId {
        let data = self.inner.get_mut();
        let id = data.registry.get_id::<T>();
        if id.index() == data.storages.len() {
            data.storages.push(Box::new(SparseSetStorage::<T>::new()));
        }
        id
    }

    /// Look up the type id for a registered component type
    pub fn component_id<T: Component>(&self) -> Option<ComponentTypeId> {
        self.data().registry.lookup::<T>()
    }

    /// Create a new entity
    pub fn create_entity(&mut self) -> Entity {
        self.inner.get_mut().entities.create()
    }

    /// Destroy an entity and remove its components from every storage
    ///
    /// Returns `false` (and does nothing) if the entity is already dead.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        let data = self.inner.get_mut();
        if !data.entities.destroy(entity) {
            return false;
        }
        for storage in &mut data.storages {
            storage.remove_entity(entity);
        }
        true
    }

    /// Check if an entity is alive
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.data().entities.is_alive(entity)
    }

    /// Get the number of alive entities
    pub fn entity_count(&self) -> usize {
        self.data().entities.alive_count()
    }

    /// Set a component on a living entity
    ///
    /// Registers the component type on first use. Returns `false` (and
    /// stores nothing) if the entity is not alive, which is what makes
    /// deferred set commands safe no-ops after a destroy.
    pub fn set_component<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.register::<T>();
        let data = self.inner.get_mut();
        data.storage_mut::<T>()
            .expect("storage exists after registration")
            .set(entity, value);
        true
    }

    /// Get a reference to an entity's component
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.data().storage::<T>()?.get(entity)
    }

    /// Get a mutable reference to an entity's component
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.inner.get_mut().storage_mut::<T>()?.get_mut(entity)
    }

    /// Remove and return an entity's component
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.inner.get_mut().storage_mut::<T>()?.remove(entity)
    }

    /// Get the storage for a component type
    pub fn storage<T: Component>(&self) -> Option<&SparseSetStorage<T>> {
        self.data().storage::<T>()
    }

    /// Get the storage for a component type mutably
    pub fn storage_mut<T: Component>(&mut self) -> Option<&mut SparseSetStorage<T>> {
        self.inner.get_mut().storage_mut::<T>()
    }

    /// Destroy all entities and components, keeping registrations
    pub fn clear(&mut self) {
        let data = self.inner.get_mut();
        data.entities.clear();
        for storage in &mut data.storages {
            storage.clear();
        }
    }

    /// Get a shared handle for system execution
    ///
    /// The cell grants storage access without exclusive ownership of the
    /// world so independent systems can run concurrently. Mutable storage
    /// access through the cell is only sound while the scheduler's
    /// staging guarantees no conflicting access — see [`WorldCell`].
    pub fn cell(&self) -> WorldCell<'_> {
        WorldCell { inner: &self.inner }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// A non-owning handle granting systems access to world data
///
/// Systems receive a `WorldCell` instead of `&mut World` so that
/// non-conflicting systems can execute on worker threads at the same
/// time. The handle does not enforce aliasing at compile time; the
/// scheduler only places systems with disjoint declared access in the
/// same stage, and that staging is the data-race guarantee. Structural
/// mutation is not available here at all — it goes through a
/// [`CommandBuffer`](crate::ecs::CommandBuffer).
#[derive(Clone, Copy)]
pub struct WorldCell<'a> {
    inner: &'a UnsafeCell<WorldData>,
}

impl<'a> WorldCell<'a> {
    fn data(&self) -> &'a WorldData {
        unsafe { &*self.inner.get() }
    }

    /// Get the entity manager for liveness checks
    pub fn entities(&self) -> &'a EntityManager {
        &self.data().entities
    }

    /// Check if an entity is alive
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.data().entities.is_alive(entity)
    }

    /// Look up the type id for a registered component type
    pub fn component_id<T: Component>(&self) -> Option<ComponentTypeId> {
        self.data().registry.lookup::<T>()
    }

    /// Get the storage for a component type
    ///
    /// Valid for systems that declared read access to the type.
    pub fn storage<T: Component>(&self) -> Option<&'a SparseSetStorage<T>> {
        self.data().storage::<T>()
    }

    /// Get the storage for a component type mutably
    ///
    /// Valid for systems that declared write access to the type. No other
    /// system in the same stage can touch the type, so the reference is
    /// exclusive for the duration of the stage; holding it across a
    /// stage boundary, or calling this for an undeclared type, is a
    /// caller contract violation with undefined behavior.
    pub fn storage_mut<T: Component>(&self) -> Option<&'a mut SparseSetStorage<T>> {
        unsafe { &mut *self.inner.get() }.storage_mut::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Tag;
    impl Component for Tag {}

    #[test]
    fn test_entity_lifecycle() {
        let mut world = World::new();

        let e1 = world.create_entity();
        let e2 = world.create_entity();
        assert_eq!(world.entity_count(), 2);
        assert!(world.is_alive(e1));

        world.destroy_entity(e1);
        assert_eq!(world.entity_count(), 1);
        assert!(!world.is_alive(e1));
        assert!(world.is_alive(e2));
    }

    #[test]
    fn test_destroy_removes_all_components() {
        let mut world = World::new();
        let entity = world.create_entity();

        world.set_component(entity, Position { x: 1.0, y: 2.0 });
        world.set_component(entity, Tag);

        assert!(world.destroy_entity(entity));
        assert_eq!(world.storage::<Position>().unwrap().len(), 0);
        assert_eq!(world.storage::<Tag>().unwrap().len(), 0);
    }

    #[test]
    fn test_set_component_on_dead_entity_is_noop() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.destroy_entity(entity);

        assert!(!world.set_component(entity, Tag));
        assert!(world.storage::<Tag>().map_or(true, |s| s.is_empty()));
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut world = World::new();
        let first = world.register::<Position>();
        let second = world.register::<Position>();
        let other = world.register::<Tag>();

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_component_roundtrip() {
        let mut world = World::new();
        let entity = world.create_entity();

        world.set_component(entity, Position { x: 3.0, y: 4.0 });
        assert_eq!(
            world.get_component::<Position>(entity),
            Some(&Position { x: 3.0, y: 4.0 })
        );

        if let Some(position) = world.get_component_mut::<Position>(entity) {
            position.x = 30.0;
        }
        assert_eq!(world.get_component::<Position>(entity).unwrap().x, 30.0);

        let removed = world.remove_component::<Position>(entity);
        assert_eq!(removed, Some(Position { x: 30.0, y: 4.0 }));
        assert_eq!(world.get_component::<Position>(entity), None);
    }

    #[test]
    fn test_cell_reads_storage() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.set_component(entity, Position { x: 1.0, y: 1.0 });

        let cell = world.cell();
        assert!(cell.is_alive(entity));
        assert_eq!(cell.storage::<Position>().unwrap().len(), 1);
        assert_eq!(cell.component_id::<Position>(), world.component_id::<Position>());
    }

    #[test]
    fn test_cell_writes_storage() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.set_component(entity, Position { x: 1.0, y: 1.0 });

        {
            let cell = world.cell();
            let storage = cell.storage_mut::<Position>().unwrap();
            storage.get_mut(entity).unwrap().x = 9.0;
        }

        assert_eq!(world.get_component::<Position>(entity).unwrap().x, 9.0);
    }

    #[test]
    fn test_clear_keeps_registrations() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.set_component(entity, Tag);

        world.clear();
        assert_eq!(world.entity_count(), 0);
        assert!(world.component_id::<Tag>().is_some());
        assert_eq!(world.storage::<Tag>().unwrap().len(), 0);
    }
}
