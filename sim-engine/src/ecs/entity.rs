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
//! Entity identity and lifecycle management
//!
//! Entities are lightweight generational handles that tie components
//! together. The [`EntityManager`] allocates and recycles ids; a recycled
//! id carries a bumped generation so handles to the destroyed entity go
//! stale without any per-handle bookkeeping.

use std::fmt;

/// Unique identifier for an entity
///
/// The raw value doubles as an index into dense allocation tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(u32);

impl EntityId {
    /// Create a new EntityId from a raw u32 value
    pub fn new(id: u32) -> Self {
        EntityId(id)
    }

    /// Get the raw u32 value
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Get the id as a table index
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Entity handle with generational index support for safe references
///
/// Two entities are equal iff both the id and the generation match, so a
/// handle held across a destroy compares unequal to any later reuse of
/// the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    id: EntityId,
    generation: u32,
}

impl Entity {
    /// Create a new entity with the given ID and generation
    pub fn new(id: u32, generation: u32) -> Self {
        Entity {
            id: EntityId::new(id),
            generation,
        }
    }

    /// Get the entity ID
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Get the generation number
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}, gen: {})", self.id.0, self.generation)
    }
}

/// Allocates and recycles entity identities
///
/// The manager keeps one generation counter per allocated id plus a free
/// list of recyclable ids. An entity is alive iff its generation equals
/// the currently recorded generation for its id; destroying an entity
/// bumps the stored generation, which invalidates every outstanding
/// handle at once.
pub struct EntityManager {
    generations: Vec<u32>,
    free: Vec<u32>,
}

impl EntityManager {
    /// Create a new empty entity manager
    pub fn new() -> Self {
        EntityManager {
            generations: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Allocate a new entity
    ///
    /// Reuses a previously destroyed id when one is available; the reused
    /// id carries the generation that was bumped at destroy time, so old
    /// handles to it remain stale.
    pub fn create(&mut self) -> Entity {
        if let Some(id) = self.free.pop() {
            return Entity::new(id, self.generations[id as usize]);
        }

        let id = self.generations.len() as u32;
        self.generations.push(0);
        Entity::new(id, 0)
    }

    /// Destroy an entity, invalidating all outstanding handles to it
    ///
    /// Returns `false` (and does nothing) when the entity is already dead
    /// or its id was never allocated. Stale handles are not an error.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        let index = entity.id().index();
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free.push(entity.id().raw());
        true
    }

    /// Check if an entity is alive
    ///
    /// True iff the id is within the allocated range and the stored
    /// generation equals the handle's generation. Out-of-range ids simply
    /// report not-alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.generations
            .get(entity.id().index())
            .map(|generation| *generation == entity.generation())
            .unwrap_or(false)
    }

    /// Get the number of currently alive entities
    pub fn alive_count(&self) -> usize {
        self.generations.len() - self.free.len()
    }

    /// Get the number of ids ever allocated (alive or recyclable)
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }

    /// Destroy all entities and forget all allocated ids
    pub fn clear(&mut self) {
        self.generations.clear();
        self.free.clear();
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}
