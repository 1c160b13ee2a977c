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
//! Planar geometry
//!
//! Two-dimensional vectors and axis-aligned bounding boxes. Screen-style
//! coordinates are used throughout: `top` is the corner with the smaller
//! coordinates and `bot` the corner with the larger ones.

use crate::ecs::components::{Position, Radius};
use crate::ecs::Component;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// 2D vector with double-precision coordinates
///
/// # Examples
///
/// ```
/// use anomaloid_engine::geometry::Vec2;
///
/// let v = Vec2::new(3.0, 4.0);
/// assert_eq!(v.magnitude(), 5.0);
/// assert_eq!(v + Vec2::splat(1.0), Vec2::new(4.0, 5.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate, growing downwards
    pub y: f64,
}

impl Vec2 {
    /// Create a new vector
    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// The zero vector
    pub const fn zero() -> Self {
        Vec2::new(0.0, 0.0)
    }

    /// Vector with both coordinates set to `value`
    pub const fn splat(value: f64) -> Self {
        Vec2::new(value, value)
    }

    /// Dot product
    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean length
    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction
    ///
    /// The zero vector normalizes to itself.
    pub fn normalize(self) -> Vec2 {
        let length = self.magnitude();
        if length == 0.0 {
            self
        } else {
            self / length
        }
    }

    /// Linear interpolation, `t = 0` gives `self` and `t = 1` gives `other`
    pub fn lerp(self, other: Vec2, t: f64) -> Vec2 {
        self + (other - self) * t
    }

    /// Check if both coordinates are finite (not NaN or infinite)
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle
///
/// Invariant: `top.x <= bot.x` and `top.y <= bot.y`. A box may be
/// degenerate (zero width or height).
///
/// Overlap and containment tests are strict, so boxes that only share an
/// edge do not intersect and a point on the border is not inside.
///
/// # Examples
///
/// ```
/// use anomaloid_engine::geometry::{BoundingBox, Vec2};
///
/// let a = BoundingBox::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
/// let b = BoundingBox::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
/// assert!(!a.intersects(&b)); // touching edges
/// assert_eq!(a.center(), Vec2::new(5.0, 5.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    top: Vec2,
    bot: Vec2,
}

impl BoundingBox {
    /// Create a box from its two corners
    ///
    /// # Panics
    ///
    /// Panics if `top` is not above and to the left of `bot`, or if a
    /// coordinate is not finite.
    pub fn new(top: Vec2, bot: Vec2) -> Self {
        assert!(
            top.is_finite() && bot.is_finite() && top.x <= bot.x && top.y <= bot.y,
            "BoundingBox corners must be finite and ordered"
        );
        BoundingBox { top, bot }
    }

    /// Create a box, returning `None` if the corners are not ordered or finite
    pub fn try_new(top: Vec2, bot: Vec2) -> Option<Self> {
        if top.is_finite() && bot.is_finite() && top.x <= bot.x && top.y <= bot.y {
            Some(BoundingBox { top, bot })
        } else {
            None
        }
    }

    /// Box of half-extent `half` centred on `center`
    ///
    /// A negative `half` is treated as zero.
    pub fn around(center: Vec2, half: f64) -> Self {
        let half = Vec2::splat(half.max(0.0));
        BoundingBox {
            top: center - half,
            bot: center + half,
        }
    }

    /// Corner with the smallest coordinates
    pub fn top(&self) -> Vec2 {
        self.top
    }

    /// Corner with the largest coordinates
    pub fn bot(&self) -> Vec2 {
        self.bot
    }

    /// Strict overlap test
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.top.x < other.bot.x
            && self.bot.x > other.top.x
            && self.top.y < other.bot.y
            && self.bot.y > other.top.y
    }

    /// Strict containment test for a point
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x > self.top.x && point.x < self.bot.x && point.y > self.top.y && point.y < self.bot.y
    }

    /// Grow the box just enough to cover `point`
    pub fn grow_to_include(&mut self, point: Vec2) {
        self.top.x = self.top.x.min(point.x);
        self.top.y = self.top.y.min(point.y);
        self.bot.x = self.bot.x.max(point.x);
        self.bot.y = self.bot.y.max(point.y);
    }

    /// Midpoint of the box
    pub fn center(&self) -> Vec2 {
        self.top.lerp(self.bot, 0.5)
    }

    /// Width and height
    pub fn size(&self) -> Vec2 {
        self.bot - self.top
    }

    /// Check whether the box encloses a non-zero area
    pub fn has_area(&self) -> bool {
        self.top.x < self.bot.x && self.top.y < self.bot.y
    }
}

impl Component for BoundingBox {}

/// Bounding box of a circular body
///
/// `top = position - (radius, radius)` and `bot = position + (radius, radius)`.
pub fn derive_bounding_box(position: Position, radius: Radius) -> BoundingBox {
    BoundingBox::around(position.as_vec(), radius.value())
}
