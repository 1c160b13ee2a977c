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
//! Collision detection and resolution
//!
//! A step runs three passes over the world:
//!
//! 1. [`bounds`] recomputes each body's `BoundingBox` from its `Position`
//!    and `Radius`;
//! 2. [`detection`] tests every unordered pair of boxes and records a
//!    [`CollidedWith`] relation for each strict overlap;
//! 3. [`resolution`] walks the recorded pairs, destroys the lighter body of
//!    each (or the higher entity on a tie) and clears the relation.
//!
//! Detection and resolution each run in their own deferred scope, so the
//! population they iterate is fixed for the whole pass. The bounds refresh
//! only rewrites component values and runs before either scope opens.

pub mod bounds;
pub mod detection;
pub mod resolution;

use crate::ecs::Relation;

pub use bounds::{refresh_bounding_boxes, BoundsRefreshSystem};
pub use detection::{detect_collisions, CollisionDetectionSystem, DetectionReport};
pub use resolution::{
    arbitrate, resolve_collisions, Arbitration, ArbitrationRule, CollisionFault,
    CollisionResolutionSystem, CollisionResolver, ResolutionReport,
};

/// Symmetric relation recorded between two bodies whose boxes overlap
pub struct CollidedWith;

impl Relation for CollidedWith {
    const SYMMETRIC: bool = true;
}
