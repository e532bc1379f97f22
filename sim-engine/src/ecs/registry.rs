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
//! Component type registration
//!
//! Each component type is assigned a small dense integer id on first
//! request. The ids index per-type storage arrays and feed system access
//! declarations. The mapping is append-only and stable for the lifetime
//! of the registry.

use crate::ecs::Component;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

/// Stable small integer identity for a component type
///
/// Ids are assigned densely from zero in first-registration order and
/// are never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentTypeId(u32);

impl ComponentTypeId {
    /// Get the raw u32 value
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Get the id as a storage-table index
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.0)
    }
}

/// Assigns dense ids to component types
///
/// Registration takes `&mut self`, so concurrent first-use is rejected by
/// the borrow checker rather than being a documented race: register
/// component types while you hold the world exclusively (setup code, or
/// between ticks), then hand out shared access.
pub struct ComponentRegistry {
    ids: HashMap<TypeId, ComponentTypeId>,
    names: Vec<&'static str>,
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        ComponentRegistry {
            ids: HashMap::new(),
            names: Vec::new(),
        }
    }

    /// Get the id for a component type, assigning one on first request
    ///
    /// Idempotent per type: every call for the same `T` returns the same
    /// id for the lifetime of the registry.
    pub fn get_id<T: Component>(&mut self) -> ComponentTypeId {
        let key = TypeId::of::<T>();
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }

        let id = ComponentTypeId(self.names.len() as u32);
        self.ids.insert(key, id);
        self.names.push(std::any::type_name::<T>());
        id
    }

    /// Look up the id for a component type without registering it
    pub fn lookup<T: Component>(&self) -> Option<ComponentTypeId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Get the registered type name for an id, for diagnostics
    pub fn type_name(&self, id: ComponentTypeId) -> Option<&'static str> {
        self.names.get(id.index()).copied()
    }

    /// Get the number of registered component types
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no component types have been registered
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
