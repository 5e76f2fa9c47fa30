//! # Corebreak Common
//!
//! Common types shared by the corebreak combat core and its hosts.
//!
//! This crate provides:
//! - Handle types for actors, projectiles, pickups and timers
//! - 2D geometry (facing, axis-aligned boxes, world bounds)
//! - Simulation time helpers
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod geometry;
pub mod ids;
pub mod time;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::geometry::*;
    pub use crate::ids::*;
    pub use crate::time::*;
}

pub use glam::Vec2;
pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_allocation_is_monotonic() {
        let mut alloc = IdAllocator::default();
        let a = alloc.next_actor();
        let b = alloc.next_actor();
        assert_ne!(a, b);
        assert!(a.raw() < b.raw());
    }

    #[test]
    fn test_facing_sign() {
        assert_eq!(Facing::Left.sign(), -1.0);
        assert_eq!(Facing::Right.sign(), 1.0);
        assert_eq!(Facing::Left.flipped(), Facing::Right);
    }

    #[test]
    fn test_feet_box_overlap() {
        let a = Aabb::from_feet(Vec2::new(0.0, 100.0), 40.0, 80.0);
        let b = Aabb::from_feet(Vec2::new(30.0, 100.0), 40.0, 80.0);
        let c = Aabb::from_feet(Vec2::new(100.0, 100.0), 40.0, 80.0);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
