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
//! System execution framework
//!
//! Systems contain the logic that operates on entities and components.
//! Every run returns a [`SystemReport`] describing what the pass looked at
//! and what it changed, or an [`EcsError`] if the pass had to abort.

use crate::ecs::World;
use crate::error::EcsError;

/// Trait for systems that operate on the ECS world
pub trait System: Send + Sync {
    /// Execute the system on the world
    ///
    /// Non-fatal problems are recorded in the report's `faults`; an `Err`
    /// aborts the step the system runs in.
    fn run(&mut self, world: &mut World) -> Result<SystemReport, EcsError>;

    /// Get the name of this system for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Summary of one system run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemReport {
    /// Entities or pairs the system inspected
    pub examined: usize,
    /// Writes the system recorded (components set, relations added)
    pub recorded: usize,
    /// Entities the system destroyed
    pub destroyed: usize,
    /// Work the system deliberately skipped
    pub discarded: usize,
    /// Non-fatal errors met along the way
    pub faults: Vec<EcsError>,
}

impl SystemReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: SystemReport) {
        self.examined += other.examined;
        self.recorded += other.recorded;
        self.destroyed += other.destroyed;
        self.discarded += other.discarded;
        self.faults.extend(other.faults);
    }
}
