//! 2D geometry for a side-scrolling world.
//!
//! Coordinates follow screen convention: x grows to the right and y grows
//! downward, so "falling" means y increasing. Actor positions are feet
//! positions (bottom-center of the body).

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Horizontal facing of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Facing toward negative x
    Left,
    /// Facing toward positive x (default)
    #[default]
    Right,
}

impl Facing {
    /// Returns -1.0 for left and 1.0 for right.
    #[must_use]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Returns the opposite facing.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }

    /// Facing that looks from `from_x` toward `to_x`.
    ///
    /// Ties resolve to the right.
    #[must_use]
    pub fn toward(from_x: f32, to_x: f32) -> Self {
        if to_x < from_x {
            Facing::Left
        } else {
            Facing::Right
        }
    }

    /// Picks a facing from a random boolean.
    #[must_use]
    pub fn from_bool(right: bool) -> Self {
        if right {
            Facing::Right
        } else {
            Facing::Left
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Top-left corner
    pub min: Vec2,
    /// Bottom-right corner
    pub max: Vec2,
}

impl Aabb {
    /// Creates a box from its corners.
    #[must_use]
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates a box standing on `feet` (bottom-center).
    #[must_use]
    pub fn from_feet(feet: Vec2, width: f32, height: f32) -> Self {
        let half = width / 2.0;
        Self {
            min: Vec2::new(feet.x - half, feet.y - height),
            max: Vec2::new(feet.x + half, feet.y),
        }
    }

    /// Creates a box centered at `center`.
    #[must_use]
    pub fn from_center(center: Vec2, half_width: f32, half_height: f32) -> Self {
        Self {
            min: Vec2::new(center.x - half_width, center.y - half_height),
            max: Vec2::new(center.x + half_width, center.y + half_height),
        }
    }

    /// Center point of the box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Width of the box.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Height of the box.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Checks whether two boxes overlap. Touching edges do not count.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Returns the box moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// Playable area of a level or arena.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    /// Left edge
    pub min_x: f32,
    /// Right edge
    pub max_x: f32,
    /// Top edge
    pub min_y: f32,
    /// Bottom edge (the lower bound actors can fall past)
    pub max_y: f32,
}

impl WorldBounds {
    /// Creates bounds from an origin-anchored width and height.
    #[must_use]
    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            min_x: 0.0,
            max_x: width,
            min_y: 0.0,
            max_y: height,
        }
    }

    /// Width of the playable area.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Checks whether `x` lies within the horizontal bounds widened by `margin`.
    #[must_use]
    pub fn contains_x(&self, x: f32, margin: f32) -> bool {
        x >= self.min_x - margin && x <= self.max_x + margin
    }

    /// Clamps `x` to the horizontal bounds shrunk by `inset`.
    ///
    /// Bounds narrower than twice the inset clamp to their midpoint.
    #[must_use]
    pub fn clamp_x(&self, x: f32, inset: f32) -> f32 {
        let (lo, hi) = (self.min_x + inset, self.max_x - inset);
        if lo > hi {
            return (self.min_x + self.max_x) / 2.0;
        }
        x.clamp(lo, hi)
    }
}
