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
//! Entity Component System (ECS) core implementation
//!
//! This module provides the foundational ECS architecture including:
//! - Generational entity handles with slot reuse
//! - Dense component storage behind a type-erased registry
//! - Typed pairwise relations, symmetric or directed
//! - Deferred scopes that buffer structural writes
//! - Cached queries and a staged system scheduler

mod command;
mod component;
mod entity;
mod relation;
mod system;
mod world;

pub mod components;
pub mod query;
pub mod scheduler;

pub use component::{component_name, Component, ComponentStorage, DenseStorage};
pub use entity::{Entity, EntityId};
pub use query::{CachedQuery, ComponentSet, QueryBuilder};
pub use relation::{canonical_pair, Relation, RelationStore};
pub use scheduler::{stages, Scheduler, StageId, SystemRun};
pub use system::{System, SystemReport};
pub use world::{DeferScope, World};
