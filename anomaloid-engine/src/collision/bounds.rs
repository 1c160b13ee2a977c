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
//! Bounding-box refresh
//!
//! Boxes are derived at spawn, but a body that moves afterwards would keep
//! its old box. This pass recomputes every box from the current `Position`
//! and `Radius` so detection always tests where bodies actually are.

use crate::ecs::components::{Position, Radius};
use crate::ecs::{Entity, System, SystemReport, World};
use crate::error::EcsError;
use crate::geometry::{derive_bounding_box, BoundingBox};

/// Recompute `BoundingBox` for every entity with `Position` and `Radius`
///
/// Existing boxes are updated in place, which takes effect immediately
/// even inside a deferred scope. A body that has no box yet gets one
/// through a normal (possibly deferred) insert. Returns how many boxes
/// were written.
pub fn refresh_bounding_boxes(world: &mut World) -> Result<usize, EcsError> {
    let bodies: Vec<(Entity, (Position, Radius))> = world.iter_with::<(Position, Radius)>().collect();

    let mut written = 0;
    for (entity, (position, radius)) in bodies {
        let fresh = derive_bounding_box(position, radius);
        match world.get_mut::<BoundingBox>(entity) {
            Some(bounds) if *bounds == fresh => {}
            Some(bounds) => {
                *bounds = fresh;
                written += 1;
            }
            None => {
                world.set(entity, fresh)?;
                written += 1;
            }
        }
    }
    Ok(written)
}

/// Bounds refresh as a schedulable system
#[derive(Debug, Default)]
pub struct BoundsRefreshSystem;

impl BoundsRefreshSystem {
    /// Create a new refresh system
    pub fn new() -> Self {
        BoundsRefreshSystem
    }
}

impl System for BoundsRefreshSystem {
    fn run(&mut self, world: &mut World) -> Result<SystemReport, EcsError> {
        let examined = world.iter_with::<(Position, Radius)>().count();
        let recorded = refresh_bounding_boxes(world)?;
        Ok(SystemReport {
            examined,
            recorded,
            ..SystemReport::default()
        })
    }

    fn name(&self) -> &str {
        "BoundsRefreshSystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;

    #[test]
    fn test_moved_body_gets_fresh_box() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();
        world.set(e, Position::new(0.0, 0.0)).unwrap();
        world.set(e, Radius::new(5.0)).unwrap();
        world
            .set(e, derive_bounding_box(Position::new(0.0, 0.0), Radius::new(5.0)))
            .unwrap();

        assert_eq!(refresh_bounding_boxes(&mut world).unwrap(), 0);

        if let Some(position) = world.get_mut::<Position>(e) {
            position.translate(Vec2::new(100.0, 0.0));
        }
        assert_eq!(refresh_bounding_boxes(&mut world).unwrap(), 1);

        let bounds = world.get::<BoundingBox>(e).unwrap();
        assert_eq!(bounds.center(), Vec2::new(100.0, 0.0));
    }

    #[test]
    fn test_missing_box_is_created() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();
        world.set(e, Position::new(1.0, 2.0)).unwrap();
        world.set(e, Radius::new(1.0)).unwrap();

        let report = BoundsRefreshSystem::new().run(&mut world).unwrap();
        assert_eq!(report.examined, 1);
        assert_eq!(report.recorded, 1);
        assert_eq!(world.get::<BoundingBox>(e).unwrap().top(), Vec2::new(0.0, 1.0));
    }
}
