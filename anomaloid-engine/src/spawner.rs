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
//! Anomaloid spawning
//!
//! An anomaloid is created with its `Mass` and `Position`, plus the
//! derived `Radius` and `BoundingBox` and a sampled `AnomalyMult`.
//! Batches draw masses from an exponential distribution and positions
//! uniformly from the configured region.

use crate::config::SpawnConfig;
use crate::ecs::components::{AnomalyMult, Mass, Position, Radius, Ship};
use crate::ecs::{Entity, World};
use crate::error::{ConfigError, EcsError};
use crate::geometry::derive_bounding_box;
use crate::random::RandomSource;
use log::{debug, info};

/// Creates anomaloids according to a [`SpawnConfig`]
///
/// # Examples
///
/// ```
/// use anomaloid_engine::config::SpawnConfig;
/// use anomaloid_engine::ecs::components::{Mass, Position, Radius};
/// use anomaloid_engine::ecs::World;
/// use anomaloid_engine::random::SeededRandom;
/// use anomaloid_engine::spawner::Spawner;
///
/// let spawner = Spawner::new(SpawnConfig::default()).unwrap();
/// let mut world = World::new();
/// let mut rng = SeededRandom::from_seed(1);
///
/// let rock = spawner.spawn(&mut world, &mut rng, Mass::new(3.0), Position::new(0.0, 0.0)).unwrap();
/// assert_eq!(world.get::<Radius>(rock).unwrap().value(), 15.0);
/// ```
#[derive(Debug, Clone)]
pub struct Spawner {
    config: SpawnConfig,
}

impl Spawner {
    /// Create a spawner, rejecting out-of-range settings
    pub fn new(config: SpawnConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Spawner { config })
    }

    /// The settings this spawner uses
    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    /// Create one anomaloid
    ///
    /// `Radius` is `mass * radius_scale`, the box is derived from position
    /// and radius, and `AnomalyMult` is drawn uniformly from the configured
    /// range.
    pub fn spawn<R>(&self, world: &mut World, rng: &mut R, mass: Mass, position: Position) -> Result<Entity, EcsError>
    where
        R: RandomSource + ?Sized,
    {
        let (low, high) = self.config.anomaly_range;
        let multiplier = AnomalyMult(rng.uniform_float(low, high));
        let entity = self.spawn_body(world, mass, position)?;
        world.set(entity, multiplier)?;
        debug!("spawned {} with mass {} at ({}, {})", entity, mass.value(), position.x(), position.y());
        Ok(entity)
    }

    /// Create a ship
    ///
    /// Ships get the same geometry as anomaloids but carry the [`Ship`]
    /// marker instead of an `AnomalyMult`.
    pub fn spawn_ship(&self, world: &mut World, mass: Mass, position: Position) -> Result<Entity, EcsError> {
        let entity = self.spawn_body(world, mass, position)?;
        world.set(entity, Ship)?;
        debug!("spawned ship {}", entity);
        Ok(entity)
    }

    fn spawn_body(&self, world: &mut World, mass: Mass, position: Position) -> Result<Entity, EcsError> {
        let radius = Radius::from_mass(mass, self.config.radius_scale);
        let entity = world.create_entity()?;
        world.set(entity, mass)?;
        world.set(entity, position)?;
        world.set(entity, radius)?;
        world.set(entity, derive_bounding_box(position, radius))?;
        Ok(entity)
    }

    /// Draw one mass from the configured distribution
    pub fn sample_mass<R>(&self, rng: &mut R) -> Mass
    where
        R: RandomSource + ?Sized,
    {
        let draw = saturate(rng.exponential(self.config.mass_rate));
        let raw = saturate(draw * self.config.mass_scale);
        let value = if self.config.whole_unit_masses {
            raw.trunc()
        } else {
            raw
        };
        Mass::new(value)
    }

    /// Create `count` anomaloids with sampled masses and positions
    ///
    /// The batch is created inside a deferred scope and lands all at once;
    /// if any creation fails, none of the batch survives.
    pub fn spawn_many<R>(&self, world: &mut World, rng: &mut R, count: usize) -> Result<Vec<Entity>, EcsError>
    where
        R: RandomSource + ?Sized,
    {
        let spawned = world.deferred(|world| {
            (0..count)
                .map(|_| {
                    let mass = self.sample_mass(rng);
                    let position = Position::from(rng.uniform_point(&self.config.region));
                    self.spawn(world, rng, mass, position)
                })
                .collect::<Result<Vec<Entity>, EcsError>>()
        })?;
        info!("spawned {} anomaloids", spawned.len());
        Ok(spawned)
    }
}

/// Clamp a draw into `[0, f64::MAX]`; NaN becomes zero
fn saturate(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, f64::MAX)
    }
}
