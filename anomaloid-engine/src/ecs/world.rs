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
//! World management
//!
//! The World is the central container for all ECS data. It manages entity
//! lifecycles, owns one storage per component type and one store per
//! relation type, and buffers structural writes while a deferred scope is
//! open.
//!
//! # Deferred scopes
//!
//! [`World::scope`] opens a scope and returns a guard that dereferences to
//! the world. While any scope is open:
//!
//! - entity creation reserves a slot, but the entity only becomes alive at
//!   commit;
//! - component inserts and removals, destruction, and relation writes are
//!   recorded in a command buffer;
//! - relation pairs recorded in the scope are visible to relation queries
//!   at once, so a later pass in the same scope can read what an earlier
//!   pass recorded, while the population itself stays a fixed snapshot.
//!
//! Scopes nest. Committing the outermost scope replays the buffer in
//! recording order. Dropping a guard without committing it, whether through
//! an early `?` return or a panic, discards every command recorded since
//! that scope opened.

use crate::ecs::command::{Command, CommandBuffer, CommandMark};
use crate::ecs::component::{component_name, Component, ComponentStorage, DenseStorage, ErasedStorage};
use crate::ecs::query::ComponentSet;
use crate::ecs::relation::{ErasedRelationStore, Relation, RelationStore};
use crate::ecs::Entity;
use crate::error::EcsError;
use log::{debug, error, trace, warn};
use std::any::TypeId;
use std::collections::{BTreeSet, HashMap};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    /// Created inside an open scope, alive once the scope commits
    Reserved,
    Alive,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    state: SlotState,
}

/// The main ECS world container
///
/// World manages entity lifecycles and serves as the central
/// access point for all ECS operations.
pub struct World {
    id: u64,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    alive_count: usize,
    max_entities: usize,
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
    relations: HashMap<TypeId, Box<dyn ErasedRelationStore>>,
    /// Relation pairs recorded in the open scope, not yet committed
    staged_relations: HashMap<TypeId, Box<dyn ErasedRelationStore>>,
    commands: CommandBuffer,
    defer_depth: usize,
    version: u64,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self::with_max_entities(u32::MAX as usize)
    }

    /// Create a world that refuses to allocate more than `max_entities` slots
    ///
    /// Creation fails with [`EcsError::AllocationFailure`] once every slot
    /// is in use. Destroyed slots are recycled and do not count.
    pub fn with_max_entities(max_entities: usize) -> Self {
        World {
            id: NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free_slots: Vec::new(),
            alive_count: 0,
            max_entities,
            storages: HashMap::new(),
            relations: HashMap::new(),
            staged_relations: HashMap::new(),
            commands: CommandBuffer::new(),
            defer_depth: 0,
            version: 0,
        }
    }

    /// Process-unique identifier of this world
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Counter bumped by every change that can alter query results
    ///
    /// Cached queries compare it against the version they were built at.
    pub fn structural_version(&self) -> u64 {
        self.version
    }

    // --- Entity lifecycle -------------------------------------------------

    /// Create a new entity with no components
    ///
    /// Inside a deferred scope the slot is reserved immediately (so
    /// components can be attached to the handle) but the entity is not
    /// alive until the scope commits.
    pub fn create_entity(&mut self) -> Result<Entity, EcsError> {
        let (index, generation) = match self.free_slots.pop() {
            Some(index) => (index, self.slots[index as usize].generation),
            None => {
                let requested = self.slots.len() + 1;
                if self.slots.len() >= self.max_entities {
                    error!("entity store exhausted at {} slots", self.slots.len());
                    return Err(EcsError::AllocationFailure { requested });
                }
                let index = u32::try_from(self.slots.len())
                    .map_err(|_| EcsError::AllocationFailure { requested })?;
                self.slots.push(Slot {
                    generation: 0,
                    state: SlotState::Free,
                });
                (index, 0)
            }
        };

        let entity = Entity::new(index, generation);
        if self.is_deferred() {
            self.slots[index as usize].state = SlotState::Reserved;
            self.commands.push(Command::Spawn(entity));
        } else {
            self.slots[index as usize].state = SlotState::Alive;
            self.alive_count += 1;
            self.version += 1;
        }
        trace!("created {}", entity);
        Ok(entity)
    }

    /// Destroy an entity together with its components and relations
    ///
    /// Deferred while a scope is open. Destroying an entity that is already
    /// gone is a no-op that returns false; destroying it twice inside one
    /// scope removes it once.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.is_handle_current(entity) {
            debug!("ignoring destroy: {}", EcsError::UseAfterDestroy(entity));
            return false;
        }
        if self.is_deferred() {
            self.commands.push(Command::Destroy(entity));
            true
        } else {
            self.apply_destroy(entity)
        }
    }

    /// Check if an entity is alive
    pub fn is_entity_alive(&self, entity: Entity) -> bool {
        self.slot_state(entity) == Some(SlotState::Alive)
    }

    /// Whether the handle refers to a live entity or one reserved in the
    /// open scope
    fn is_handle_current(&self, entity: Entity) -> bool {
        matches!(
            self.slot_state(entity),
            Some(SlotState::Alive) | Some(SlotState::Reserved)
        )
    }

    fn slot_state(&self, entity: Entity) -> Option<SlotState> {
        self.slots
            .get(entity.id().index())
            .filter(|slot| slot.generation == entity.generation())
            .map(|slot| slot.state)
    }

    /// Get the number of alive entities
    pub fn entity_count(&self) -> usize {
        self.alive_count
    }

    /// Iterate over all alive entities in slot order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            (slot.state == SlotState::Alive).then(|| Entity::new(index as u32, slot.generation))
        })
    }

    /// Destroy every entity and drop pending commands
    ///
    /// Existing handles become stale; slots are kept so they can never
    /// alias a future entity.
    pub fn clear(&mut self) {
        self.commands.take_all();
        self.staged_relations.clear();
        for storage in self.storages.values_mut() {
            storage.clear_all();
        }
        for store in self.relations.values_mut() {
            store.clear_all();
        }
        self.free_slots.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.state != SlotState::Free {
                slot.generation = slot.generation.wrapping_add(1);
                slot.state = SlotState::Free;
            }
            self.free_slots.push(index as u32);
        }
        self.free_slots.reverse();
        self.alive_count = 0;
        self.version += 1;
    }

    // --- Components -------------------------------------------------------

    /// Attach or overwrite a component
    ///
    /// Deferred while a scope is open. Fails with
    /// [`EcsError::UseAfterDestroy`] if the entity is gone.
    pub fn set<C: Component>(&mut self, entity: Entity, component: C) -> Result<(), EcsError> {
        if !self.is_handle_current(entity) {
            let err = EcsError::UseAfterDestroy(entity);
            warn!("cannot set {}: {}", component_name::<C>(), err);
            return Err(err);
        }
        self.ensure_storage::<C>();
        if self.is_deferred() {
            self.commands.push(Command::Insert {
                entity,
                component: TypeId::of::<C>(),
                name: component_name::<C>(),
                value: Box::new(component),
            });
        } else if let Some(storage) = self.storage_mut::<C>() {
            let added = !storage.contains(entity);
            storage.insert(entity, component);
            if added {
                self.version += 1;
            }
        }
        Ok(())
    }

    /// Detach a component, returning whether the entity had it
    ///
    /// Deferred while a scope is open.
    pub fn remove<C: Component>(&mut self, entity: Entity) -> Result<bool, EcsError> {
        if !self.is_handle_current(entity) {
            return Err(EcsError::UseAfterDestroy(entity));
        }
        let present = self.has::<C>(entity);
        if self.is_deferred() {
            self.commands.push(Command::Remove {
                entity,
                component: TypeId::of::<C>(),
            });
        } else if present {
            if let Some(storage) = self.storage_mut::<C>() {
                storage.remove(entity);
            }
            self.version += 1;
        }
        Ok(present)
    }

    /// Read a component
    ///
    /// Returns `None` both when the entity lacks the component and when the
    /// handle is stale.
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        if !self.is_handle_current(entity) {
            return None;
        }
        self.storage::<C>()?.get(entity)
    }

    /// Mutable access to an existing component value
    ///
    /// Writes through this reference are value updates, not structural
    /// changes, and take effect immediately even inside a scope.
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        if !self.is_handle_current(entity) {
            return None;
        }
        self.storage_mut::<C>()?.get_mut(entity)
    }

    /// Check whether an entity has a component
    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        self.get::<C>(entity).is_some()
    }

    pub(crate) fn has_component_id(&self, entity: Entity, component: TypeId) -> bool {
        self.is_handle_current(entity)
            && self
                .storages
                .get(&component)
                .map_or(false, |storage| storage.contains_entity(entity))
    }

    /// Typed access to the storage of one component type
    pub fn storage<C: Component>(&self) -> Option<&DenseStorage<C>> {
        self.storages
            .get(&TypeId::of::<C>())?
            .as_any()
            .downcast_ref::<DenseStorage<C>>()
    }

    fn storage_mut<C: Component>(&mut self) -> Option<&mut DenseStorage<C>> {
        self.storages
            .get_mut(&TypeId::of::<C>())?
            .as_any_mut()
            .downcast_mut::<DenseStorage<C>>()
    }

    fn ensure_storage<C: Component>(&mut self) {
        self.storages
            .entry(TypeId::of::<C>())
            .or_insert_with(|| Box::new(DenseStorage::<C>::new()));
    }

    // --- Relations --------------------------------------------------------

    /// Record that `a` relates to `b`
    ///
    /// For symmetric relations the pair is stored once and answers queries
    /// from both ends. Inside a scope the write is buffered, but the pair is
    /// visible to relation queries straight away.
    pub fn relate<R: Relation>(&mut self, a: Entity, b: Entity) -> Result<(), EcsError> {
        for end in [a, b] {
            if !self.is_handle_current(end) {
                let err = EcsError::UseAfterDestroy(end);
                warn!("cannot relate {} and {}: {}", a, b, err);
                return Err(err);
            }
        }
        let relation = TypeId::of::<R>();
        self.relations
            .entry(relation)
            .or_insert_with(|| Box::new(RelationStore::<R>::new()));

        if self.is_deferred() {
            self.commands.push(Command::Relate { relation, a, b });
            let staged = self
                .staged_relations
                .entry(relation)
                .or_insert_with(|| Box::new(RelationStore::<R>::new()));
            if staged.insert_pair(a, b) {
                self.version += 1;
            }
        } else if let Some(store) = self.relations.get_mut(&relation) {
            if store.insert_pair(a, b) {
                self.version += 1;
            }
        }
        Ok(())
    }

    /// Remove a relation pair, returning whether it was recorded
    ///
    /// Deferred while a scope is open; the pair stays visible until commit.
    pub fn unrelate<R: Relation>(&mut self, a: Entity, b: Entity) -> bool {
        let present = self.has_relation::<R>(a, b);
        let relation = TypeId::of::<R>();
        if self.is_deferred() {
            self.commands.push(Command::Unrelate { relation, a, b });
        } else if let Some(store) = self.relations.get_mut(&relation) {
            if store.remove_pair(a, b) {
                self.version += 1;
            }
        }
        present
    }

    /// Check whether `a` relates to `b`
    pub fn has_relation<R: Relation>(&self, a: Entity, b: Entity) -> bool {
        self.relation_stores::<R>().any(|store| store.contains(a, b))
    }

    /// Check whether `entity` takes part in any pair of relation `R`
    pub fn has_any_relation<R: Relation>(&self, entity: Entity) -> bool {
        self.has_relation_id(entity, TypeId::of::<R>())
    }

    pub(crate) fn has_relation_id(&self, entity: Entity, relation: TypeId) -> bool {
        [&self.relations, &self.staged_relations]
            .iter()
            .filter_map(|stores| stores.get(&relation))
            .any(|store| store.involves_entity(entity))
    }

    /// Entities `entity` is related to through `R`, in ascending order
    pub fn related<R: Relation>(&self, entity: Entity) -> Vec<Entity> {
        let partners: BTreeSet<Entity> = self
            .relation_stores::<R>()
            .flat_map(|store| store.partners(entity))
            .collect();
        partners.into_iter().collect()
    }

    /// Every pair of relation `R`, each listed once in canonical order
    pub fn relation_pairs<R: Relation>(&self) -> Vec<(Entity, Entity)> {
        let pairs: BTreeSet<(Entity, Entity)> = self
            .relation_stores::<R>()
            .flat_map(|store| store.pairs())
            .collect();
        pairs.into_iter().collect()
    }

    /// Number of distinct pairs of relation `R`
    pub fn relation_count<R: Relation>(&self) -> usize {
        self.relation_pairs::<R>().len()
    }

    /// Remove every pair of relation `R`
    ///
    /// Deferred while a scope is open.
    pub fn clear_relation<R: Relation>(&mut self) {
        let relation = TypeId::of::<R>();
        if self.is_deferred() {
            self.commands.push(Command::ClearRelation(relation));
        } else if let Some(store) = self.relations.get_mut(&relation) {
            if store.pair_count() > 0 {
                store.clear_all();
                self.version += 1;
            }
        }
    }

    /// Committed and staged stores for relation `R`
    fn relation_stores<R: Relation>(&self) -> impl Iterator<Item = &RelationStore<R>> {
        let relation = TypeId::of::<R>();
        [self.relations.get(&relation), self.staged_relations.get(&relation)]
            .into_iter()
            .flatten()
            .filter_map(|store| store.as_any().downcast_ref::<RelationStore<R>>())
    }

    // --- Iteration --------------------------------------------------------

    /// Iterate over alive entities holding every component in `Q`
    ///
    /// Yields cloned component values in slot order.
    pub fn iter_with<Q: ComponentSet>(&self) -> impl Iterator<Item = (Entity, Q)> + '_ {
        self.entities()
            .filter_map(move |entity| Q::fetch(self, entity).map(|item| (entity, item)))
    }

    /// Run `f` for every entity holding the components in `Q`
    ///
    /// The matching set is fixed when the call starts. The callback gets
    /// mutable access to the world, but it runs inside a deferred scope, so
    /// its structural writes are applied once iteration completes.
    pub fn for_each_with<Q, F>(&mut self, mut f: F)
    where
        Q: ComponentSet,
        F: FnMut(&mut World, Entity, Q),
    {
        let mut scope = self.scope();
        let matched: Vec<(Entity, Q)> = scope.iter_with::<Q>().collect();
        for (entity, item) in matched {
            f(&mut *scope, entity, item);
        }
        scope.commit();
    }

    // --- Deferred scopes --------------------------------------------------

    /// Check whether structural writes are currently buffered
    pub fn is_deferred(&self) -> bool {
        self.defer_depth > 0
    }

    /// Number of open scopes
    pub fn defer_depth(&self) -> usize {
        self.defer_depth
    }

    /// Number of buffered commands waiting for the outermost commit
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Open a deferred scope
    ///
    /// The returned guard dereferences to the world. Call
    /// [`DeferScope::commit`] to keep the buffered writes; dropping the guard
    /// any other way discards them.
    pub fn scope(&mut self) -> DeferScope<'_> {
        let mark = self.defer_begin();
        DeferScope {
            world: self,
            mark,
            finished: false,
        }
    }

    /// Run `f` inside a deferred scope
    ///
    /// Buffered writes are committed if `f` returns `Ok` and discarded if it
    /// returns `Err` or panics.
    pub fn deferred<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut World) -> Result<T, E>,
    {
        let mut scope = self.scope();
        let value = f(&mut *scope)?;
        scope.commit();
        Ok(value)
    }

    pub(crate) fn defer_begin(&mut self) -> CommandMark {
        self.defer_depth += 1;
        self.commands.mark()
    }

    pub(crate) fn defer_commit(&mut self) {
        self.defer_depth = self.defer_depth.saturating_sub(1);
        if self.defer_depth == 0 {
            self.flush();
        }
    }

    pub(crate) fn defer_discard(&mut self, mark: CommandMark) {
        self.defer_depth = self.defer_depth.saturating_sub(1);
        let dropped = self.commands.split_off(mark);
        for command in &dropped {
            if let Command::Spawn(entity) = command {
                self.release_reserved(*entity);
            }
        }
        self.rebuild_staged_relations();
        if self.defer_depth == 0 && !self.commands.is_empty() {
            // Cannot happen with well-nested guards; keep the buffer honest
            self.flush();
        }
    }

    fn release_reserved(&mut self, entity: Entity) {
        if let Some(slot) = self.slots.get_mut(entity.id().index()) {
            if slot.state == SlotState::Reserved && slot.generation == entity.generation() {
                slot.state = SlotState::Free;
                slot.generation = slot.generation.wrapping_add(1);
                self.free_slots.push(entity.id().raw());
            }
        }
    }

    fn rebuild_staged_relations(&mut self) {
        self.staged_relations.clear();
        for command in self.commands.iter() {
            if let Command::Relate { relation, a, b } = command {
                if !self.staged_relations.contains_key(relation) {
                    match self.relations.get(relation) {
                        Some(committed) => {
                            self.staged_relations.insert(*relation, committed.empty_clone());
                        }
                        None => continue,
                    }
                }
                if let Some(staged) = self.staged_relations.get_mut(relation) {
                    staged.insert_pair(*a, *b);
                }
            }
        }
        self.version += 1;
    }

    fn flush(&mut self) {
        let commands = self.commands.take_all();
        self.staged_relations.clear();
        if commands.is_empty() {
            return;
        }
        let count = commands.len();
        let mut changed = false;
        for command in commands {
            changed |= self.apply(command);
        }
        if changed {
            self.version += 1;
        }
        trace!("applied {} deferred commands", count);
    }

    /// Apply one buffered command, returning whether it changed anything
    fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Spawn(entity) => match self.slots.get_mut(entity.id().index()) {
                Some(slot)
                    if slot.state == SlotState::Reserved && slot.generation == entity.generation() =>
                {
                    slot.state = SlotState::Alive;
                    self.alive_count += 1;
                    true
                }
                _ => false,
            },
            Command::Insert {
                entity,
                component,
                name,
                value,
            } => {
                if !self.is_entity_alive(entity) {
                    debug!("dropping deferred {} write: {}", name, EcsError::UseAfterDestroy(entity));
                    return false;
                }
                match self.storages.get_mut(&component) {
                    Some(storage) => {
                        let added = !storage.contains_entity(entity);
                        storage.insert_boxed(entity, value) && added
                    }
                    None => false,
                }
            }
            Command::Remove { entity, component } => self
                .storages
                .get_mut(&component)
                .map_or(false, |storage| storage.remove_entity(entity)),
            Command::Destroy(entity) => self.apply_destroy(entity),
            Command::Relate { relation, a, b } => {
                if let Some(vanished) = [a, b].into_iter().find(|end| !self.is_entity_alive(*end)) {
                    debug!(
                        "dropping deferred relation {} - {}: {}",
                        a,
                        b,
                        EcsError::DanglingRelation { entity: vanished }
                    );
                    return false;
                }
                self.relations
                    .get_mut(&relation)
                    .map_or(false, |store| store.insert_pair(a, b))
            }
            Command::Unrelate { relation, a, b } => self
                .relations
                .get_mut(&relation)
                .map_or(false, |store| store.remove_pair(a, b)),
            Command::ClearRelation(relation) => match self.relations.get_mut(&relation) {
                Some(store) if store.pair_count() > 0 => {
                    store.clear_all();
                    true
                }
                _ => false,
            },
        }
    }

    fn apply_destroy(&mut self, entity: Entity) -> bool {
        let index = entity.id().index();
        let was_alive = match self.slots.get(index) {
            Some(slot) if slot.generation == entity.generation() => match slot.state {
                SlotState::Alive => true,
                SlotState::Reserved => false,
                SlotState::Free => return false,
            },
            _ => return false,
        };

        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        for store in self.relations.values_mut() {
            store.remove_entity(entity);
        }
        for store in self.staged_relations.values_mut() {
            store.remove_entity(entity);
        }

        let slot = &mut self.slots[index];
        slot.state = SlotState::Free;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(entity.id().raw());
        if was_alive {
            self.alive_count -= 1;
        }
        self.version += 1;
        trace!("destroyed {}", entity);
        true
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for an open deferred scope
///
/// Dereferences to the [`World`]. Structural writes made through the guard
/// are buffered until [`commit`](DeferScope::commit); if the guard is
/// dropped without committing, everything recorded since it opened is
/// discarded.
pub struct DeferScope<'w> {
    world: &'w mut World,
    mark: CommandMark,
    finished: bool,
}

impl DeferScope<'_> {
    /// Close the scope and keep its writes
    ///
    /// Writes are applied when the outermost scope commits.
    pub fn commit(mut self) {
        self.finished = true;
        self.world.defer_commit();
    }

    /// Close the scope and throw its writes away
    pub fn discard(mut self) {
        self.finished = true;
        self.world.defer_discard(self.mark);
    }
}

impl Deref for DeferScope<'_> {
    type Target = World;

    fn deref(&self) -> &World {
        &*self.world
    }
}

impl DerefMut for DeferScope<'_> {
    fn deref_mut(&mut self) -> &mut World {
        &mut *self.world
    }
}

impl Drop for DeferScope<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let dropped = self
                .world
                .pending_commands()
                .saturating_sub(self.mark.position());
            warn!("deferred scope closed without commit, discarding {} commands", dropped);
            self.world.defer_discard(self.mark);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Weight(f64);
    impl Component for Weight {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Tag;
    impl Component for Tag {}

    struct Near;
    impl Relation for Near {
        const SYMMETRIC: bool = true;
    }

    #[test]
    fn test_world_entity_lifecycle() {
        let mut world = World::new();

        let e1 = world.create_entity().unwrap();
        let e2 = world.create_entity().unwrap();

        assert_eq!(world.entity_count(), 2);
        assert!(world.is_entity_alive(e1));
        assert!(world.is_entity_alive(e2));

        assert!(world.destroy_entity(e1));
        assert_eq!(world.entity_count(), 1);
        assert!(!world.is_entity_alive(e1));
        assert!(world.is_entity_alive(e2));
    }

    #[test]
    fn test_recycled_slot_gets_new_generation() {
        let mut world = World::new();

        let e1 = world.create_entity().unwrap();
        world.set(e1, Weight(3.0)).unwrap();
        world.destroy_entity(e1);

        let e2 = world.create_entity().unwrap();
        assert_eq!(e2.id(), e1.id());
        assert_ne!(e2.generation(), e1.generation());

        // The stale handle must not see the new occupant
        world.set(e2, Weight(9.0)).unwrap();
        assert_eq!(world.get::<Weight>(e1), None);
        assert!(!world.is_entity_alive(e1));
        assert_eq!(world.set(e1, Weight(1.0)), Err(EcsError::UseAfterDestroy(e1)));
    }

    #[test]
    fn test_destroy_stale_handle_is_noop() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();
        assert!(world.destroy_entity(e));
        assert!(!world.destroy_entity(e));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_component_set_get_remove() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();

        assert!(!world.has::<Weight>(e));
        world.set(e, Weight(2.0)).unwrap();
        assert_eq!(world.get::<Weight>(e), Some(&Weight(2.0)));

        world.set(e, Weight(4.0)).unwrap();
        assert_eq!(world.get::<Weight>(e), Some(&Weight(4.0)));

        if let Some(weight) = world.get_mut::<Weight>(e) {
            weight.0 = 5.0;
        }
        assert_eq!(world.get::<Weight>(e), Some(&Weight(5.0)));

        assert_eq!(world.remove::<Weight>(e), Ok(true));
        assert_eq!(world.remove::<Weight>(e), Ok(false));
        assert!(!world.has::<Weight>(e));
    }

    #[test]
    fn test_destroy_drops_components_and_relations() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();
        let b = world.create_entity().unwrap();
        world.set(a, Weight(1.0)).unwrap();
        world.relate::<Near>(a, b).unwrap();

        world.destroy_entity(a);
        assert_eq!(world.storage::<Weight>().map(|s| s.len()), Some(0));
        assert!(world.related::<Near>(b).is_empty());
        assert_eq!(world.relation_count::<Near>(), 0);
    }

    #[test]
    fn test_allocation_failure() {
        let mut world = World::with_max_entities(2);
        let a = world.create_entity().unwrap();
        world.create_entity().unwrap();

        assert_eq!(
            world.create_entity(),
            Err(EcsError::AllocationFailure { requested: 3 })
        );

        // Recycled slots are still available
        world.destroy_entity(a);
        assert!(world.create_entity().is_ok());
    }

    #[test]
    fn test_deferred_writes_apply_on_commit() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();

        let mut scope = world.scope();
        let b = scope.create_entity().unwrap();
        scope.set(b, Weight(1.0)).unwrap();
        scope.destroy_entity(a);

        assert!(scope.is_entity_alive(a));
        assert!(!scope.is_entity_alive(b));
        assert_eq!(scope.entity_count(), 1);
        scope.commit();

        assert!(!world.is_entity_alive(a));
        assert!(world.is_entity_alive(b));
        assert_eq!(world.get::<Weight>(b), Some(&Weight(1.0)));
        assert_eq!(world.pending_commands(), 0);
    }

    #[test]
    fn test_dropped_scope_discards_everything() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();

        {
            let mut scope = world.scope();
            let b = scope.create_entity().unwrap();
            scope.set(b, Weight(1.0)).unwrap();
            scope.set(a, Tag).unwrap();
            scope.destroy_entity(a);
        }

        assert!(world.is_entity_alive(a));
        assert!(!world.has::<Tag>(a));
        assert_eq!(world.entity_count(), 1);
        assert!(!world.is_deferred());

        // The reserved slot went back to the free list with a new generation
        let c = world.create_entity().unwrap();
        assert_eq!(c.id().raw(), 1);
        assert_eq!(c.generation(), 1);
    }

    #[test]
    fn test_nested_discard_keeps_outer_writes() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();
        let b = world.create_entity().unwrap();

        let mut outer = world.scope();
        outer.destroy_entity(a);
        {
            let mut inner = outer.scope();
            inner.destroy_entity(b);
            inner.discard();
        }
        assert_eq!(outer.defer_depth(), 1);
        outer.commit();

        assert!(!world.is_entity_alive(a));
        assert!(world.is_entity_alive(b));
    }

    #[test]
    fn test_double_destroy_in_scope_removes_once() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();
        let b = world.create_entity().unwrap();

        let mut scope = world.scope();
        assert!(scope.destroy_entity(a));
        assert!(scope.destroy_entity(a));
        scope.commit();

        assert_eq!(world.entity_count(), 1);
        assert!(world.is_entity_alive(b));
    }

    #[test]
    fn test_staged_relations_visible_inside_scope() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();
        let b = world.create_entity().unwrap();

        let mut scope = world.scope();
        scope.relate::<Near>(a, b).unwrap();
        assert!(scope.has_relation::<Near>(b, a));
        assert_eq!(scope.related::<Near>(a), vec![b]);
        scope.clear_relation::<Near>();
        // Clearing is structural and waits for commit
        assert!(scope.has_relation::<Near>(a, b));
        scope.commit();

        assert!(!world.has_relation::<Near>(a, b));
    }

    #[test]
    fn test_discarded_relations_vanish() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();
        let b = world.create_entity().unwrap();

        let result: Result<(), EcsError> = world.deferred(|w| {
            w.relate::<Near>(a, b)?;
            Err(EcsError::DanglingRelation { entity: b })
        });
        assert!(result.is_err());
        assert!(!world.has_relation::<Near>(a, b));
        assert_eq!(world.relation_count::<Near>(), 0);
    }

    #[test]
    fn test_relation_to_destroyed_entity_is_dropped_at_commit() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();
        let b = world.create_entity().unwrap();

        let mut scope = world.scope();
        scope.destroy_entity(b);
        scope.relate::<Near>(a, b).unwrap();
        scope.commit();

        assert_eq!(world.relation_count::<Near>(), 0);
    }

    #[test]
    fn test_for_each_with_defers_mutation() {
        let mut world = World::new();
        for i in 0..4 {
            let e = world.create_entity().unwrap();
            world.set(e, Weight(i as f64)).unwrap();
        }

        let mut visited = 0;
        world.for_each_with::<(Weight,), _>(|w, entity, (weight,)| {
            visited += 1;
            // Creation and destruction are buffered; the live set is fixed
            let spawned = w.create_entity().unwrap();
            w.set(spawned, Tag).unwrap();
            if weight.0 < 2.0 {
                w.destroy_entity(entity);
            }
            assert_eq!(w.entity_count(), 4);
        });

        assert_eq!(visited, 4);
        assert_eq!(world.entity_count(), 6);
        assert_eq!(world.iter_with::<(Tag,)>().count(), 4);
        assert_eq!(world.iter_with::<(Weight,)>().count(), 2);
    }

    #[test]
    fn test_iteration_is_in_slot_order() {
        let mut world = World::new();
        let entities: Vec<Entity> = (0..5).map(|_| world.create_entity().unwrap()).collect();
        for e in &entities {
            world.set(*e, Tag).unwrap();
        }
        let seen: Vec<Entity> = world.iter_with::<(Tag,)>().map(|(e, _)| e).collect();
        assert_eq!(seen, entities);
    }

    #[test]
    fn test_world_clear() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();
        world.set(a, Weight(1.0)).unwrap();

        assert_eq!(world.entity_count(), 1);
        world.clear();
        assert_eq!(world.entity_count(), 0);
        assert!(!world.is_entity_alive(a));
        assert_eq!(world.get::<Weight>(a), None);

        let b = world.create_entity().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_version_tracks_structural_changes() {
        let mut world = World::new();
        let v0 = world.structural_version();
        let e = world.create_entity().unwrap();
        let v1 = world.structural_version();
        assert!(v1 > v0);

        world.set(e, Weight(1.0)).unwrap();
        let v2 = world.structural_version();
        assert!(v2 > v1);

        // Overwriting a value is not structural
        world.set(e, Weight(2.0)).unwrap();
        assert_eq!(world.structural_version(), v2);
    }
}
