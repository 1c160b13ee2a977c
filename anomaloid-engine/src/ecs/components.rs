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
//! Anomaloid components
//!
//! This module provides the components carried by bodies in the
//! simulation: where a body is, how heavy it is, how large it is, and
//! which class of body it belongs to. Geometry types live in
//! [`crate::geometry`]; `BoundingBox` is also a component.

use crate::ecs::Component;
use crate::geometry::Vec2;

/// 2D position component with double-precision coordinates
///
/// # Examples
///
/// ```
/// use anomaloid_engine::ecs::components::Position;
///
/// let pos = Position::new(1.0, 2.0);
/// assert_eq!(pos.x(), 1.0);
/// assert!(pos.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    point: Vec2,
}

impl Position {
    /// Create a new position with the given coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Position {
            point: Vec2::new(x, y),
        }
    }

    /// Create a position at the origin (0, 0)
    pub fn zero() -> Self {
        Position::new(0.0, 0.0)
    }

    /// Get the x coordinate
    pub fn x(&self) -> f64 {
        self.point.x
    }

    /// Get the y coordinate
    pub fn y(&self) -> f64 {
        self.point.y
    }

    /// Get the position as a vector
    pub fn as_vec(&self) -> Vec2 {
        self.point
    }

    /// Move the position by `delta`
    pub fn translate(&mut self, delta: Vec2) {
        self.point += delta;
    }

    /// Check if all coordinates are finite (not NaN or infinite)
    pub fn is_valid(&self) -> bool {
        self.point.is_finite()
    }
}

impl From<Vec2> for Position {
    fn from(point: Vec2) -> Self {
        Position { point }
    }
}

impl Component for Position {}

impl Default for Position {
    fn default() -> Self {
        Position::zero()
    }
}

/// Mass component with double-precision value
///
/// Mass decides collision arbitration: the heavier body survives. It is
/// fixed after spawn; the loser of a collision is removed, not absorbed.
///
/// # Examples
///
/// ```
/// use anomaloid_engine::ecs::components::Mass;
///
/// let mass = Mass::new(10.5);
/// assert!(mass.is_valid());
/// assert!(Mass::try_new(-1.0).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mass {
    value: f64,
}

impl Mass {
    /// Create a new mass component
    ///
    /// # Panics
    ///
    /// Panics if mass is negative or non-finite.
    pub fn new(value: f64) -> Self {
        assert!(value >= 0.0 && value.is_finite(), "Mass must be non-negative and finite");
        // -0.0 would order below 0.0 under total_cmp
        Mass { value: value + 0.0 }
    }

    /// Create a new mass component, returning None if invalid
    pub fn try_new(value: f64) -> Option<Self> {
        if value >= 0.0 && value.is_finite() {
            Some(Mass { value: value + 0.0 })
        } else {
            None
        }
    }

    /// Get the mass value
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Check if the mass is valid (finite and non-negative)
    pub fn is_valid(&self) -> bool {
        self.value >= 0.0 && self.value.is_finite()
    }
}

impl Component for Mass {}

impl Default for Mass {
    fn default() -> Self {
        Mass::new(1.0)
    }
}

/// Radius of a circular body
///
/// Derived from mass at spawn and not recomputed afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Radius {
    value: f64,
}

impl Radius {
    /// Create a new radius
    ///
    /// # Panics
    ///
    /// Panics if radius is negative or non-finite.
    pub fn new(value: f64) -> Self {
        assert!(value >= 0.0 && value.is_finite(), "Radius must be non-negative and finite");
        Radius { value }
    }

    /// Create a new radius, returning None if invalid
    pub fn try_new(value: f64) -> Option<Self> {
        (value >= 0.0 && value.is_finite()).then_some(Radius { value })
    }

    /// Radius of a body of `mass`, `mass * scale`
    ///
    /// A product that overflows saturates to `f64::MAX`.
    ///
    /// # Panics
    ///
    /// Panics if `scale` is negative or non-finite.
    pub fn from_mass(mass: Mass, scale: f64) -> Self {
        assert!(scale >= 0.0 && scale.is_finite(), "Radius scale must be non-negative and finite");
        let value = mass.value() * scale;
        Radius::new(if value.is_finite() { value } else { f64::MAX })
    }

    /// Get the radius value
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Component for Radius {}

/// Gameplay multiplier sampled at spawn
///
/// Marks a body as an anomaloid. Collision resolution only opens on
/// entities carrying it; the value itself is not used by collision logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyMult(pub f64);

impl AnomalyMult {
    /// Get the multiplier value
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Component for AnomalyMult {}

/// Marker for the player ship
///
/// Ships collide with anomaloids but never open a resolution themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ship;

impl Component for Ship {}
