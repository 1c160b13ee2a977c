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
//! Component storage and management
//!
//! Components are data containers that can be attached to entities.
//! The world keeps one [`DenseStorage`] per component type behind the
//! type-erased [`ErasedStorage`] interface, which lets it drop every
//! component of a destroyed entity and apply buffered inserts without
//! knowing the concrete type.

use crate::ecs::Entity;
use std::any::Any;
use std::collections::HashMap;

/// Trait that all components must implement
///
/// Components should be plain data structures without behavior.
pub trait Component: 'static + Send + Sync {}

/// Short, human-readable name of a component type
///
/// Strips the module path, so `anomaloid_engine::ecs::components::Mass`
/// becomes `Mass`. Used in log messages and error values.
pub fn component_name<C: Component>() -> &'static str {
    let full = std::any::type_name::<C>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Storage interface for components
pub trait ComponentStorage: Send + Sync {
    /// The component type this storage manages
    type Component: Component;

    /// Insert a component for the given entity
    fn insert(&mut self, entity: Entity, component: Self::Component);

    /// Remove a component for the given entity
    fn remove(&mut self, entity: Entity) -> Option<Self::Component>;

    /// Get a reference to a component for the given entity
    fn get(&self, entity: Entity) -> Option<&Self::Component>;

    /// Get a mutable reference to a component for the given entity
    fn get_mut(&mut self, entity: Entity) -> Option<&mut Self::Component>;

    /// Check if an entity has this component
    fn contains(&self, entity: Entity) -> bool;

    /// Clear all components
    fn clear(&mut self);
}

/// Dense component storage
///
/// Components live contiguously in a `Vec`, with a sparse mapping from
/// entity to array index. Removal swaps the last element into the hole so
/// the array never has gaps.
///
/// # Example
///
/// ```
/// use anomaloid_engine::ecs::{Entity, ComponentStorage, DenseStorage};
/// use anomaloid_engine::ecs::components::Mass;
///
/// let mut storage = DenseStorage::<Mass>::new();
/// let entity = Entity::new(1, 0);
///
/// storage.insert(entity, Mass::new(7.0));
/// assert!(storage.contains(entity));
/// assert_eq!(storage.get(entity).unwrap().value(), 7.0);
/// ```
pub struct DenseStorage<T: Component> {
    /// Mapping from Entity to dense array index
    entity_to_index: HashMap<Entity, usize>,
    /// Mapping from dense array index back to Entity (for swap_remove)
    index_to_entity: Vec<Entity>,
    components: Vec<T>,
}

impl<T: Component> DenseStorage<T> {
    /// Create a new empty storage
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new storage with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        DenseStorage {
            entity_to_index: HashMap::with_capacity(capacity),
            index_to_entity: Vec::with_capacity(capacity),
            components: Vec::with_capacity(capacity),
        }
    }

    /// Get the number of components stored
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if the storage is empty
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Get all entities that have components in this storage
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.index_to_entity.iter().copied()
    }

    /// Get a reference to the dense component array
    pub fn components(&self) -> &[T] {
        &self.components
    }
}

impl<T: Component> Default for DenseStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentStorage for DenseStorage<T> {
    type Component = T;

    fn insert(&mut self, entity: Entity, component: Self::Component) {
        if let Some(&index) = self.entity_to_index.get(&entity) {
            // Entity already exists, update in place
            self.components[index] = component;
        } else {
            let new_index = self.components.len();
            self.components.push(component);
            self.entity_to_index.insert(entity, new_index);
            self.index_to_entity.push(entity);

            debug_assert_eq!(self.entity_to_index.len(), self.index_to_entity.len());
            debug_assert_eq!(self.entity_to_index.len(), self.components.len());
        }
    }

    fn remove(&mut self, entity: Entity) -> Option<Self::Component> {
        let index = self.entity_to_index.remove(&entity)?;

        let component = self.components.swap_remove(index);
        self.index_to_entity.swap_remove(index);
        if index < self.index_to_entity.len() {
            // Re-point the entity that was moved into the hole
            let moved = self.index_to_entity[index];
            self.entity_to_index.insert(moved, index);
        }

        debug_assert_eq!(self.entity_to_index.len(), self.index_to_entity.len());
        debug_assert_eq!(self.entity_to_index.len(), self.components.len());

        Some(component)
    }

    fn get(&self, entity: Entity) -> Option<&Self::Component> {
        let index = self.entity_to_index.get(&entity)?;
        Some(&self.components[*index])
    }

    fn get_mut(&mut self, entity: Entity) -> Option<&mut Self::Component> {
        let index = self.entity_to_index.get(&entity)?;
        Some(&mut self.components[*index])
    }

    fn contains(&self, entity: Entity) -> bool {
        self.entity_to_index.contains_key(&entity)
    }

    fn clear(&mut self) {
        self.entity_to_index.clear();
        self.index_to_entity.clear();
        self.components.clear();
    }
}

/// Type-erased view of a component storage
///
/// The world owns storages of many component types in one map and needs a
/// few operations that do not depend on the concrete type.
pub(crate) trait ErasedStorage: Send + Sync {
    fn contains_entity(&self, entity: Entity) -> bool;

    fn remove_entity(&mut self, entity: Entity) -> bool;

    /// Insert a boxed component recorded by a deferred write
    ///
    /// Returns false if the box does not hold this storage's component type.
    fn insert_boxed(&mut self, entity: Entity, value: Box<dyn Any + Send>) -> bool;

    fn clear_all(&mut self);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStorage for DenseStorage<T> {
    fn contains_entity(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn insert_boxed(&mut self, entity: Entity, value: Box<dyn Any + Send>) -> bool {
        match value.downcast::<T>() {
            Ok(component) => {
                self.insert(entity, *component);
                true
            }
            Err(_) => false,
        }
    }

    fn clear_all(&mut self) {
        self.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct TestComponent {
        x: f32,
        y: f32,
    }

    impl Component for TestComponent {}

    #[test]
    fn test_dense_storage_basic() {
        let mut storage = DenseStorage::<TestComponent>::new();
        let entity = Entity::new(1, 0);

        let comp = TestComponent { x: 10.0, y: 20.0 };
        storage.insert(entity, comp);

        assert!(storage.contains(entity));
        assert_eq!(storage.get(entity).unwrap().x, 10.0);
        assert_eq!(storage.get(entity).unwrap().y, 20.0);

        let removed = storage.remove(entity);
        assert_eq!(removed, Some(comp));
        assert!(!storage.contains(entity));
    }

    #[test]
    fn test_dense_storage_swap_remove_keeps_mapping() {
        let mut storage = DenseStorage::<TestComponent>::new();
        let e1 = Entity::new(1, 0);
        let e2 = Entity::new(2, 0);
        let e3 = Entity::new(3, 0);

        storage.insert(e1, TestComponent { x: 1.0, y: 2.0 });
        storage.insert(e2, TestComponent { x: 3.0, y: 4.0 });
        storage.insert(e3, TestComponent { x: 5.0, y: 6.0 });

        storage.remove(e1);
        assert_eq!(storage.len(), 2);
        assert!(!storage.contains(e1));
        assert_eq!(storage.get(e2).unwrap().x, 3.0);
        assert_eq!(storage.get(e3).unwrap().x, 5.0);

        storage.remove(e3);
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(e2).unwrap().x, 3.0);
    }

    #[test]
    fn test_dense_storage_update_in_place() {
        let mut storage = DenseStorage::<TestComponent>::new();
        let entity = Entity::new(1, 0);

        storage.insert(entity, TestComponent { x: 1.0, y: 2.0 });
        storage.insert(entity, TestComponent { x: 10.0, y: 20.0 });
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(entity).unwrap().x, 10.0);

        if let Some(comp) = storage.get_mut(entity) {
            comp.y = 200.0;
        }
        assert_eq!(storage.get(entity).unwrap().y, 200.0);
    }

    #[test]
    fn test_dense_storage_entity_generations() {
        let mut storage = DenseStorage::<TestComponent>::new();
        let e1_gen0 = Entity::new(1, 0);
        let e1_gen1 = Entity::new(1, 1);

        storage.insert(e1_gen0, TestComponent { x: 1.0, y: 2.0 });
        assert!(storage.contains(e1_gen0));
        assert!(!storage.contains(e1_gen1)); // Different generation

        storage.remove(e1_gen0);
        storage.insert(e1_gen1, TestComponent { x: 10.0, y: 20.0 });
        assert!(!storage.contains(e1_gen0));
        assert!(storage.contains(e1_gen1));
    }

    #[test]
    fn test_erased_insert_rejects_wrong_type() {
        let mut storage = DenseStorage::<TestComponent>::new();
        let entity = Entity::new(1, 0);

        assert!(!storage.insert_boxed(entity, Box::new(5_u32)));
        assert!(storage.is_empty());

        assert!(storage.insert_boxed(entity, Box::new(TestComponent { x: 1.0, y: 1.0 })));
        assert!(storage.contains_entity(entity));
        assert!(storage.remove_entity(entity));
        assert!(!storage.remove_entity(entity));
    }

    #[test]
    fn test_component_name_strips_path() {
        assert_eq!(component_name::<TestComponent>(), "TestComponent");
    }
}
