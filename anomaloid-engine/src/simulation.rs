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
//! Simulation driver
//!
//! [`Simulation`] owns the world, the system schedule, the spawner and the
//! random source. One [`step`](Simulation::step) refreshes bounding boxes,
//! then detects and resolves collisions inside a single deferred scope, so
//! the whole step's structural changes land together or not at all.

use crate::collision::{BoundsRefreshSystem, CollisionDetectionSystem, CollisionResolutionSystem};
use crate::config::{Config, SimulationConfig};
use crate::ecs::components::{AnomalyMult, Mass, Position, Radius};
use crate::ecs::{stages, Entity, Scheduler, SystemReport, SystemRun, World};
use crate::error::{ConfigError, EcsError};
use crate::random::{RandomSource, SeededRandom};
use crate::spawner::Spawner;
use log::info;

/// What one step did
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Step number, starting at 1
    pub step: u64,
    /// Live entities when the step started
    pub population_before: usize,
    /// Live entities after the step committed
    pub population_after: usize,
    /// Overlapping pairs recorded by detection
    pub collisions: usize,
    /// Entities removed by resolution
    pub destroyed: usize,
    /// Pairs skipped because one end was already condemned
    pub discarded: usize,
    /// Non-fatal integrity faults
    pub faults: Vec<EcsError>,
    /// Per-system reports in execution order
    pub runs: Vec<SystemRun>,
}

/// Read-only view of one anomaloid, as a renderer would draw it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyView {
    /// The anomaloid
    pub entity: Entity,
    /// Centre of the body
    pub position: Position,
    /// Drawn radius
    pub radius: Radius,
    /// Mass, shown as a label
    pub mass: Mass,
    /// Gameplay multiplier
    pub anomaly_mult: AnomalyMult,
}

/// An anomaloid field with its collision pipeline
pub struct Simulation {
    world: World,
    scheduler: Scheduler,
    spawner: Spawner,
    rng: Box<dyn RandomSource>,
    config: SimulationConfig,
    steps: u64,
}

impl Simulation {
    /// Build a simulation from validated settings
    ///
    /// The random source is seeded from `config.seed`, or from entropy if
    /// no seed is set.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        let rng = SeededRandom::new(config.seed);
        Self::with_random_source(config, Box::new(rng))
    }

    /// Build a simulation that draws from the given random source
    pub fn with_random_source(config: SimulationConfig, rng: Box<dyn RandomSource>) -> Result<Self, ConfigError> {
        config.validate()?;
        let spawner = Spawner::new(config.spawn.clone())?;

        let mut scheduler = Scheduler::new();
        if config.collision.refresh_bounds {
            scheduler.add_system(BoundsRefreshSystem::new(), stages::BOUNDS_REFRESH);
        }
        scheduler.add_system(CollisionDetectionSystem::new(), stages::DETECTION);
        scheduler.add_system(CollisionResolutionSystem::new(), stages::RESOLUTION);

        Ok(Simulation {
            world: World::new(),
            scheduler,
            spawner,
            rng,
            config,
            steps: 0,
        })
    }

    /// Spawn the configured number of anomaloids and settle initial overlaps
    ///
    /// Runs one step straight after spawning, so bodies born on top of each
    /// other are resolved before the first frame.
    pub fn populate(&mut self) -> Result<StepReport, EcsError> {
        self.spawner
            .spawn_many(&mut self.world, self.rng.as_mut(), self.config.spawn.count)?;
        self.step()
    }

    /// Create one anomaloid
    pub fn spawn_anomaloid(&mut self, mass: Mass, position: Position) -> Result<Entity, EcsError> {
        self.spawner.spawn(&mut self.world, self.rng.as_mut(), mass, position)
    }

    /// Create one ship
    pub fn spawn_ship(&mut self, mass: Mass, position: Position) -> Result<Entity, EcsError> {
        self.spawner.spawn_ship(&mut self.world, mass, position)
    }

    /// Run one detect-and-resolve cycle
    ///
    /// The population can only shrink. If a system fails, every structural
    /// change of the step is discarded and the error is returned.
    pub fn step(&mut self) -> Result<StepReport, EcsError> {
        let population_before = self.world.entity_count();

        // Box refreshes must be visible to detection, so they run unscoped
        let mut runs = self.scheduler.run_stages(&mut self.world, ..stages::DETECTION)?;
        let mut scope = self.world.scope();
        runs.extend(self.scheduler.run_stages(&mut *scope, stages::DETECTION..)?);
        scope.commit();

        let totals = runs.iter().fold(SystemReport::default(), |mut totals, run| {
            totals.merge(run.report.clone());
            totals
        });

        self.steps += 1;
        let report = StepReport {
            step: self.steps,
            population_before,
            population_after: self.world.entity_count(),
            collisions: runs
                .iter()
                .filter(|run| run.stage == stages::DETECTION)
                .map(|run| run.report.recorded)
                .sum(),
            destroyed: totals.destroyed,
            discarded: totals.discarded,
            faults: totals.faults,
            runs,
        };
        info!(
            "step {}: {} -> {} bodies, {} collisions, {} destroyed",
            report.step, report.population_before, report.population_after, report.collisions, report.destroyed
        );
        Ok(report)
    }

    /// Every anomaloid with the data a renderer needs, in slot order
    pub fn bodies(&self) -> impl Iterator<Item = BodyView> + '_ {
        self.world
            .iter_with::<(Position, Radius, Mass, AnomalyMult)>()
            .map(|(entity, (position, radius, mass, anomaly_mult))| BodyView {
                entity,
                position,
                radius,
                mass,
                anomaly_mult,
            })
    }

    /// Read access to the world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for moving bodies between steps
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The settings the simulation was built from
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Number of completed steps
    pub fn step_count(&self) -> u64 {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Ship;

    fn quiet_config() -> SimulationConfig {
        SimulationConfig::default().with_count(0).with_seed(5)
    }

    #[test]
    fn test_step_resolves_overlap() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let light = sim.spawn_anomaloid(Mass::new(5.0), Position::new(0.0, 0.0)).unwrap();
        let heavy = sim.spawn_anomaloid(Mass::new(10.0), Position::new(10.0, 0.0)).unwrap();

        let report = sim.step().unwrap();
        assert_eq!(report.step, 1);
        assert_eq!(report.collisions, 1);
        assert_eq!(report.destroyed, 1);
        assert_eq!(report.population_before, 2);
        assert_eq!(report.population_after, 1);
        assert!(!sim.world().is_entity_alive(light));
        assert!(sim.world().is_entity_alive(heavy));
        assert_eq!(report.runs.len(), 3);
    }

    #[test]
    fn test_step_totals_fold_every_run() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        sim.spawn_anomaloid(Mass::new(3.0), Position::new(0.0, 0.0)).unwrap();
        sim.spawn_anomaloid(Mass::new(7.0), Position::new(12.0, 0.0)).unwrap();
        sim.spawn_anomaloid(Mass::new(4.0), Position::new(300.0, 0.0)).unwrap();
        sim.spawn_anomaloid(Mass::new(9.0), Position::new(310.0, 0.0)).unwrap();

        let report = sim.step().unwrap();
        let destroyed: usize = report.runs.iter().map(|run| run.report.destroyed).sum();
        let discarded: usize = report.runs.iter().map(|run| run.report.discarded).sum();
        let faults: usize = report.runs.iter().map(|run| run.report.faults.len()).sum();
        assert_eq!(report.destroyed, destroyed);
        assert_eq!(report.destroyed, 2);
        assert_eq!(report.discarded, discarded);
        assert_eq!(report.faults.len(), faults);
        assert_eq!(report.population_after, 2);
    }

    #[test]
    fn test_bodies_excludes_ships() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let rock = sim.spawn_anomaloid(Mass::new(2.0), Position::new(0.0, 0.0)).unwrap();
        let ship = sim.spawn_ship(Mass::new(1.0), Position::new(500.0, 0.0)).unwrap();

        let bodies: Vec<BodyView> = sim.bodies().collect();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].entity, rock);
        assert_eq!(bodies[0].radius.value(), 10.0);
        assert!(sim.world().has::<Ship>(ship));
    }

    #[test]
    fn test_refresh_disabled_schedules_two_systems() {
        let config = quiet_config().with_refresh_bounds(false);
        let mut sim = Simulation::new(config).unwrap();
        let report = sim.step().unwrap();
        assert_eq!(report.runs.len(), 2);
        assert_eq!(sim.step_count(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = quiet_config().with_mass_rate(0.0);
        assert!(matches!(Simulation::new(config), Err(ConfigError::Invalid(_))));
    }
}
