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
//! Queries over the world
//!
//! [`ComponentSet`] names a tuple of component types to fetch together and
//! backs [`World::iter_with`] and [`World::for_each_with`].
//! [`CachedQuery`] stores the set of entities matching a filter and only
//! re-evaluates it after the world's structure changes.

use crate::ecs::component::{component_name, Component};
use crate::ecs::relation::Relation;
use crate::ecs::{Entity, World};
use std::any::TypeId;
use std::fmt;

/// A tuple of component types fetched together
///
/// Implemented for tuples of one to five `Component + Clone` types. Values
/// are cloned out of the world so the caller can mutate it while holding
/// them.
pub trait ComponentSet: Sized {
    /// Type ids of every component in the set
    fn component_ids() -> Vec<TypeId>;

    /// Clone the set out of the world, or `None` if any part is missing
    fn fetch(world: &World, entity: Entity) -> Option<Self>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component + Clone),+> ComponentSet for ($($name,)+) {
            fn component_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$name>()),+]
            }

            fn fetch(world: &World, entity: Entity) -> Option<Self> {
                Some(($(world.get::<$name>(entity)?.clone(),)+))
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);

/// Builder for a [`CachedQuery`]
///
/// # Example
///
/// ```
/// use anomaloid_engine::ecs::{QueryBuilder, World};
/// use anomaloid_engine::ecs::components::{Mass, Ship};
///
/// let mut world = World::new();
/// let rock = world.create_entity().unwrap();
/// world.set(rock, Mass::new(3.0)).unwrap();
/// let ship = world.create_entity().unwrap();
/// world.set(ship, Mass::new(1.0)).unwrap();
/// world.set(ship, Ship).unwrap();
///
/// let mut query = QueryBuilder::new().with::<Mass>().without::<Ship>().build();
/// assert_eq!(query.matches(&world), &[rock]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    with: Vec<(TypeId, &'static str)>,
    without: Vec<(TypeId, &'static str)>,
    relations: Vec<TypeId>,
}

impl QueryBuilder {
    /// Start an empty filter that matches every alive entity
    pub fn new() -> Self {
        Self::default()
    }

    /// Require component `C`
    pub fn with<C: Component>(mut self) -> Self {
        self.with.push((TypeId::of::<C>(), component_name::<C>()));
        self
    }

    /// Exclude entities holding component `C`
    pub fn without<C: Component>(mut self) -> Self {
        self.without.push((TypeId::of::<C>(), component_name::<C>()));
        self
    }

    /// Require at least one pair of relation `R`
    pub fn with_relation<R: Relation>(mut self) -> Self {
        self.relations.push(TypeId::of::<R>());
        self
    }

    /// Finish the filter
    pub fn build(self) -> CachedQuery {
        CachedQuery {
            filter: self,
            cached_at: None,
            matches: Vec::new(),
            evaluations: 0,
        }
    }

    fn accepts(&self, world: &World, entity: Entity) -> bool {
        self.with.iter().all(|(id, _)| world.has_component_id(entity, *id))
            && !self.without.iter().any(|(id, _)| world.has_component_id(entity, *id))
            && self.relations.iter().all(|id| world.has_relation_id(entity, *id))
    }
}

/// A filter whose matching entities are cached between runs
///
/// The cache is keyed on the world's identity and structural version, so
/// a query reused across ticks is only re-evaluated when entities,
/// components or relations actually changed.
pub struct CachedQuery {
    filter: QueryBuilder,
    cached_at: Option<(u64, u64)>,
    matches: Vec<Entity>,
    evaluations: usize,
}

impl CachedQuery {
    /// Matching entities in slot order
    pub fn matches(&mut self, world: &World) -> &[Entity] {
        if self.is_stale(world) {
            self.refresh(world);
        }
        &self.matches
    }

    /// Whether the next call to [`matches`](Self::matches) will re-evaluate
    pub fn is_stale(&self, world: &World) -> bool {
        self.cached_at != Some((world.id(), world.structural_version()))
    }

    /// Number of times the filter has been evaluated
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Drop the cached result
    pub fn invalidate(&mut self) {
        self.cached_at = None;
    }

    fn refresh(&mut self, world: &World) {
        let filter = &self.filter;
        self.matches = world
            .entities()
            .filter(|&entity| filter.accepts(world, entity))
            .collect();
        self.cached_at = Some((world.id(), world.structural_version()));
        self.evaluations += 1;
    }
}

impl fmt::Debug for CachedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let with: Vec<&str> = self.filter.with.iter().map(|(_, name)| *name).collect();
        let without: Vec<&str> = self.filter.without.iter().map(|(_, name)| *name).collect();
        f.debug_struct("CachedQuery")
            .field("with", &with)
            .field("without", &without)
            .field("relations", &self.filter.relations.len())
            .field("matches", &self.matches.len())
            .finish()
    }
}
