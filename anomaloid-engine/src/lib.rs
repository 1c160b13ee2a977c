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
//! # Anomaloid Engine
//!
//! An ECS (Entity Component System) collision engine for a field of
//! circular, mass-bearing bodies ("anomaloids") on a 2D plane. Overlapping
//! bodies are detected pairwise, recorded as relations, and resolved by
//! destroying the lighter body of each pair.
//!
//! ## Features
//!
//! - **ECS Architecture**: generational entities, dense component storage and
//!   typed relations
//! - **Deferred Scopes**: structural writes are buffered and land atomically
//! - **Broad-Phase Detection**: strict axis-aligned box overlap over all pairs
//! - **Mass Arbitration**: heavier body survives, deterministic tie-break
//! - **Configuration**: TOML settings with validation and seeded randomness
//!
//! ## Example
//!
//! ```rust
//! use anomaloid_engine::collision::{detect_collisions, resolve_collisions};
//! use anomaloid_engine::config::SpawnConfig;
//! use anomaloid_engine::ecs::components::{Mass, Position};
//! use anomaloid_engine::ecs::World;
//! use anomaloid_engine::random::SeededRandom;
//! use anomaloid_engine::spawner::Spawner;
//!
//! let mut world = World::new();
//! let mut rng = SeededRandom::from_seed(42);
//! let spawner = Spawner::new(SpawnConfig::default()).unwrap();
//!
//! let light = spawner.spawn(&mut world, &mut rng, Mass::new(5.0), Position::new(0.0, 0.0)).unwrap();
//! let heavy = spawner.spawn(&mut world, &mut rng, Mass::new(10.0), Position::new(30.0, 0.0)).unwrap();
//!
//! detect_collisions(&mut world).unwrap();
//! resolve_collisions(&mut world).unwrap();
//!
//! assert!(!world.is_entity_alive(light));
//! assert!(world.is_entity_alive(heavy));
//! ```

#![warn(missing_docs)]

/// Entity Component System implementation
pub mod ecs;

/// Collision detection and resolution passes
pub mod collision;

/// Simulation settings
pub mod config;

/// Error types
pub mod error;

/// Vectors and bounding boxes
pub mod geometry;

/// Logger setup
pub mod logging;

/// Random sampling
pub mod random;

/// Step driver
pub mod simulation;

/// Anomaloid creation
pub mod spawner;

pub use collision::CollidedWith;
pub use ecs::{Entity, World};
pub use error::{ConfigError, EcsError};
pub use simulation::{BodyView, Simulation, StepReport};
