//! Static level geometry as seen by the combat core.
//!
//! The core never owns tiles or a physics engine. It asks a [`WorldQuery`]
//! for the level bounds, for floor surfaces below a point and whether a
//! point is inside solid geometry. [`FloorMap`] is a simple implementation
//! built from horizontal floor segments, used by the bundled host and tests.

use corebreak_common::{Facing, Vec2, WorldBounds};
use serde::{Deserialize, Serialize};

/// Vertical distance below the feet that still counts as "ground ahead".
const GROUND_CHECK_DEPTH: f32 = 8.0;

/// Level geometry queries.
pub trait WorldQuery {
    /// Playable area.
    fn bounds(&self) -> WorldBounds;

    /// Topmost floor surface at column `x` that is at or below `y`.
    fn floor_below(&self, x: f32, y: f32) -> Option<f32>;

    /// Checks whether `point` lies inside solid geometry.
    fn is_solid(&self, point: Vec2) -> bool;

    /// Checks for solid ground just past the leading edge of a body.
    ///
    /// `feet` is the body's bottom-center, `half_width` its half width and
    /// `lookahead` how far past the edge to look.
    fn ground_ahead(&self, feet: Vec2, facing: Facing, half_width: f32, lookahead: f32) -> bool {
        let x = feet.x + facing.sign() * (half_width + lookahead);
        self.is_solid(Vec2::new(x, feet.y + GROUND_CHECK_DEPTH))
    }
}

/// A solid horizontal slab.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorSegment {
    /// Left edge
    pub x0: f32,
    /// Right edge
    pub x1: f32,
    /// Surface height (top of the slab)
    pub y: f32,
    /// Slab thickness
    pub thickness: f32,
}

impl FloorSegment {
    fn covers(&self, x: f32) -> bool {
        x >= self.x0 && x <= self.x1
    }
}

/// World made of floor segments inside fixed bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorMap {
    bounds: WorldBounds,
    segments: Vec<FloorSegment>,
}

impl FloorMap {
    /// Default slab thickness.
    pub const THICKNESS: f32 = 64.0;

    /// Creates a world with no floor at all.
    #[must_use]
    pub fn empty(bounds: WorldBounds) -> Self {
        Self {
            bounds,
            segments: Vec::new(),
        }
    }

    /// Creates a world with one floor spanning the full width at `floor_y`.
    #[must_use]
    pub fn flat(bounds: WorldBounds, floor_y: f32) -> Self {
        Self::empty(bounds).with_segment(bounds.min_x, bounds.max_x, floor_y)
    }

    /// Adds a floor segment.
    #[must_use]
    pub fn with_segment(mut self, x0: f32, x1: f32, y: f32) -> Self {
        self.segments.push(FloorSegment {
            x0: x0.min(x1),
            x1: x0.max(x1),
            y,
            thickness: Self::THICKNESS,
        });
        self
    }

    /// Cuts a gap into every segment between `x0` and `x1`.
    #[must_use]
    pub fn with_pit(mut self, x0: f32, x1: f32) -> Self {
        let (lo, hi) = (x0.min(x1), x0.max(x1));
        let mut kept = Vec::with_capacity(self.segments.len() + 1);
        for seg in self.segments {
            if seg.x1 <= lo || seg.x0 >= hi {
                kept.push(seg);
                continue;
            }
            if seg.x0 < lo {
                kept.push(FloorSegment { x1: lo, ..seg });
            }
            if seg.x1 > hi {
                kept.push(FloorSegment { x0: hi, ..seg });
            }
        }
        self.segments = kept;
        self
    }

    /// Floor segments of this world.
    #[must_use]
    pub fn segments(&self) -> &[FloorSegment] {
        &self.segments
    }
}

impl WorldQuery for FloorMap {
    fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    fn floor_below(&self, x: f32, y: f32) -> Option<f32> {
        self.segments
            .iter()
            .filter(|s| s.covers(x) && s.y >= y - 0.5)
            .map(|s| s.y)
            .min_by(f32::total_cmp)
    }

    fn is_solid(&self, point: Vec2) -> bool {
        self.segments
            .iter()
            .any(|s| s.covers(point.x) && point.y >= s.y && point.y <= s.y + s.thickness)
    }
}
