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
//! Staged system scheduler
//!
//! Systems are organized into stages that execute in ascending order.
//! Systems in the same stage run in the order they were added, so a whole
//! schedule is deterministic.

use crate::ecs::system::SystemReport;
use crate::ecs::{System, World};
use crate::error::EcsError;
use log::trace;
use std::ops::RangeBounds;

/// Stage identifier for grouping systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StageId(pub usize);

impl StageId {
    /// Create a new stage ID
    pub fn new(id: usize) -> Self {
        StageId(id)
    }
}

/// Pre-defined stages of a simulation step
pub mod stages {
    use super::StageId;

    /// Stage for recomputing bounding boxes from positions
    pub const BOUNDS_REFRESH: StageId = StageId(0);

    /// Stage for broad-phase overlap detection
    pub const DETECTION: StageId = StageId(1);

    /// Stage for collision arbitration
    pub const RESOLUTION: StageId = StageId(2);

    /// Stage for post-processing and cleanup
    pub const POST_PROCESS: StageId = StageId(3);
}

/// A system with metadata for scheduling
struct ScheduledSystem {
    system: Box<dyn System>,
    stage: StageId,
}

/// Report of one system inside a schedule run
#[derive(Debug, Clone, PartialEq)]
pub struct SystemRun {
    /// Name reported by the system
    pub name: String,
    /// Stage the system ran in
    pub stage: StageId,
    /// What the system did
    pub report: SystemReport,
}

/// System scheduler with staged execution
///
/// # Examples
///
/// ```
/// use anomaloid_engine::ecs::scheduler::{Scheduler, stages};
/// use anomaloid_engine::ecs::{System, SystemReport, World};
/// use anomaloid_engine::EcsError;
///
/// struct MySystem;
/// impl System for MySystem {
///     fn run(&mut self, _world: &mut World) -> Result<SystemReport, EcsError> {
///         Ok(SystemReport::default())
///     }
/// }
///
/// let mut scheduler = Scheduler::new();
/// scheduler.add_system(MySystem, stages::DETECTION);
///
/// let mut world = World::new();
/// let runs = scheduler.run_sequential(&mut world).unwrap();
/// assert_eq!(runs.len(), 1);
/// ```
pub struct Scheduler {
    systems: Vec<ScheduledSystem>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new() -> Self {
        Scheduler {
            systems: Vec::new(),
        }
    }

    /// Add a system to a specific stage
    ///
    /// Stages are executed in order (stage 0, then 1, then 2, etc.).
    pub fn add_system<S: System + 'static>(&mut self, system: S, stage: StageId) {
        self.systems.push(ScheduledSystem {
            system: Box::new(system),
            stage,
        });
        // Stable sort keeps insertion order inside a stage
        self.systems.sort_by_key(|s| s.stage);
    }

    /// Get the number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Get the number of stages in use
    pub fn stage_count(&self) -> usize {
        self.systems
            .iter()
            .map(|s| s.stage.0)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    /// Names of registered systems in execution order
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.system.name()).collect()
    }

    /// Execute all systems in stage order
    ///
    /// Stops at the first system that returns an error.
    pub fn run_sequential(&mut self, world: &mut World) -> Result<Vec<SystemRun>, EcsError> {
        self.run_stages(world, ..)
    }

    /// Execute the systems whose stage falls in `stages`
    pub fn run_stages<R>(&mut self, world: &mut World, stages: R) -> Result<Vec<SystemRun>, EcsError>
    where
        R: RangeBounds<StageId>,
    {
        let mut runs = Vec::new();
        for scheduled in self.systems.iter_mut().filter(|s| stages.contains(&s.stage)) {
            let report = scheduled.system.run(world)?;
            trace!("{} finished: {:?}", scheduled.system.name(), report);
            runs.push(SystemRun {
                name: scheduled.system.name().to_string(),
                stage: scheduled.stage,
                report,
            });
        }
        Ok(runs)
    }

    /// Clear all systems from the scheduler
    pub fn clear(&mut self) {
        self.systems.clear();
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
