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
//! Broad-phase overlap detection
//!
//! Every unordered pair of live entities holding a `BoundingBox` is tested
//! once. There is no spatial index; populations are tens of bodies.

use crate::collision::CollidedWith;
use crate::ecs::{Entity, System, SystemReport, World};
use crate::error::EcsError;
use crate::geometry::BoundingBox;
use log::{debug, trace};

/// Result of one detection pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionReport {
    /// Number of box pairs tested
    pub examined_pairs: usize,
    /// Overlapping pairs, lower entity first, in the order they were found
    pub collisions: Vec<(Entity, Entity)>,
}

/// Record a `CollidedWith` relation for every pair of overlapping boxes
///
/// Boxes are read once, before any relation is written, and the writes are
/// buffered in a deferred scope. A pair recorded early in the pass can
/// therefore never influence a later one. Self-pairs are never tested.
pub fn detect_collisions(world: &mut World) -> Result<DetectionReport, EcsError> {
    let bodies: Vec<(Entity, BoundingBox)> = world
        .iter_with::<(BoundingBox,)>()
        .map(|(entity, (bounds,))| (entity, bounds))
        .collect();

    let mut report = DetectionReport::default();
    world.deferred(|world| {
        for (i, (first, first_box)) in bodies.iter().enumerate() {
            for (second, second_box) in &bodies[i + 1..] {
                report.examined_pairs += 1;
                trace!("testing {} against {}", first, second);
                if first_box.intersects(second_box) {
                    debug!("{} collided with {}", first, second);
                    world.relate::<CollidedWith>(*first, *second)?;
                    report.collisions.push((*first, *second));
                }
            }
        }
        Ok::<(), EcsError>(())
    })?;

    Ok(report)
}

/// Detection pass as a schedulable system
#[derive(Debug, Default)]
pub struct CollisionDetectionSystem;

impl CollisionDetectionSystem {
    /// Create a new detection system
    pub fn new() -> Self {
        CollisionDetectionSystem
    }
}

impl System for CollisionDetectionSystem {
    fn run(&mut self, world: &mut World) -> Result<SystemReport, EcsError> {
        let report = detect_collisions(world)?;
        Ok(SystemReport {
            examined: report.examined_pairs,
            recorded: report.collisions.len(),
            ..SystemReport::default()
        })
    }

    fn name(&self) -> &str {
        "CollisionDetectionSystem"
    }
}
