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
//! Pairwise relations between entities
//!
//! A relation is a typed fact linking two entities, such as "A collided
//! with B". Symmetric relations are stored once, under the canonical
//! `(min, max)` ordering of their ends, and answer queries from either
//! side. Asymmetric relations keep their `(source, target)` order.

use crate::ecs::Entity;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;

/// Marker trait for relation tags
///
/// # Example
///
/// ```
/// use anomaloid_engine::ecs::Relation;
///
/// struct Orbits;
/// impl Relation for Orbits {}
///
/// struct TouchingEdge;
/// impl Relation for TouchingEdge {
///     const SYMMETRIC: bool = true;
/// }
/// ```
pub trait Relation: 'static + Send + Sync {
    /// Whether `(a, b)` implies `(b, a)`
    const SYMMETRIC: bool = false;
}

/// Order a pair the way a relation of type `R` stores it
pub fn canonical_pair<R: Relation>(a: Entity, b: Entity) -> (Entity, Entity) {
    if R::SYMMETRIC && b < a {
        (b, a)
    } else {
        (a, b)
    }
}

/// Storage for all pairs of one relation type
///
/// Pairs are kept in a `BTreeSet` so iteration is ordered and repeatable.
/// An adjacency index answers "who is related to this entity" without a
/// scan.
pub struct RelationStore<R: Relation> {
    pairs: BTreeSet<(Entity, Entity)>,
    adjacency: BTreeMap<Entity, BTreeSet<Entity>>,
    _tag: PhantomData<fn() -> R>,
}

impl<R: Relation> RelationStore<R> {
    /// Create an empty store
    pub fn new() -> Self {
        RelationStore {
            pairs: BTreeSet::new(),
            adjacency: BTreeMap::new(),
            _tag: PhantomData,
        }
    }

    /// Record a pair
    ///
    /// Returns false if the pair (or its mirror, for symmetric relations)
    /// was already present.
    pub fn insert(&mut self, a: Entity, b: Entity) -> bool {
        let pair = canonical_pair::<R>(a, b);
        if !self.pairs.insert(pair) {
            return false;
        }
        self.adjacency.entry(pair.0).or_default().insert(pair.1);
        if R::SYMMETRIC {
            self.adjacency.entry(pair.1).or_default().insert(pair.0);
        }
        true
    }

    /// Remove a pair, returning whether it was present
    pub fn remove(&mut self, a: Entity, b: Entity) -> bool {
        let pair = canonical_pair::<R>(a, b);
        if !self.pairs.remove(&pair) {
            return false;
        }
        self.unlink(pair.0, pair.1);
        if R::SYMMETRIC {
            self.unlink(pair.1, pair.0);
        }
        true
    }

    fn unlink(&mut self, from: Entity, to: Entity) {
        if let Some(partners) = self.adjacency.get_mut(&from) {
            partners.remove(&to);
            if partners.is_empty() {
                self.adjacency.remove(&from);
            }
        }
    }

    /// Check whether `a` is related to `b`
    pub fn contains(&self, a: Entity, b: Entity) -> bool {
        self.pairs.contains(&canonical_pair::<R>(a, b))
    }

    /// Entities `entity` is related to, in ascending order
    ///
    /// For asymmetric relations this lists targets of `entity` only.
    pub fn partners(&self, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
        self.adjacency
            .get(&entity)
            .into_iter()
            .flat_map(|partners| partners.iter().copied())
    }

    /// Check whether `entity` takes part in at least one pair
    pub fn involves(&self, entity: Entity) -> bool {
        if self.adjacency.contains_key(&entity) {
            return true;
        }
        // Asymmetric targets are not indexed
        !R::SYMMETRIC && self.pairs.iter().any(|&(_, target)| target == entity)
    }

    /// All stored pairs in canonical order
    pub fn pairs(&self) -> impl Iterator<Item = (Entity, Entity)> + '_ {
        self.pairs.iter().copied()
    }

    /// Number of stored pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check whether the store holds no pairs
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Remove every pair involving `entity`, returning how many were dropped
    pub fn remove_entity(&mut self, entity: Entity) -> usize {
        let doomed: Vec<(Entity, Entity)> = self
            .pairs
            .iter()
            .copied()
            .filter(|&(a, b)| a == entity || b == entity)
            .collect();
        for &(a, b) in &doomed {
            self.remove(a, b);
        }
        doomed.len()
    }

    /// Remove all pairs
    pub fn clear(&mut self) {
        self.pairs.clear();
        self.adjacency.clear();
    }
}

impl<R: Relation> Default for RelationStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a relation store, used by the world
pub(crate) trait ErasedRelationStore: Send + Sync {
    fn insert_pair(&mut self, a: Entity, b: Entity) -> bool;

    fn remove_pair(&mut self, a: Entity, b: Entity) -> bool;

    fn involves_entity(&self, entity: Entity) -> bool;

    fn remove_entity(&mut self, entity: Entity) -> usize;

    fn clear_all(&mut self);

    fn pair_count(&self) -> usize;

    /// Fresh empty store of the same relation type
    fn empty_clone(&self) -> Box<dyn ErasedRelationStore>;

    fn as_any(&self) -> &dyn Any;
}

impl<R: Relation> ErasedRelationStore for RelationStore<R> {
    fn insert_pair(&mut self, a: Entity, b: Entity) -> bool {
        self.insert(a, b)
    }

    fn remove_pair(&mut self, a: Entity, b: Entity) -> bool {
        self.remove(a, b)
    }

    fn involves_entity(&self, entity: Entity) -> bool {
        self.involves(entity)
    }

    fn remove_entity(&mut self, entity: Entity) -> usize {
        RelationStore::remove_entity(self, entity)
    }

    fn clear_all(&mut self) {
        self.clear();
    }

    fn pair_count(&self) -> usize {
        self.len()
    }

    fn empty_clone(&self) -> Box<dyn ErasedRelationStore> {
        Box::new(RelationStore::<R>::new())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
