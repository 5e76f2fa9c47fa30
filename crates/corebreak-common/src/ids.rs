//! Handle types for simulation objects.
//!
//! Handles are plain numbers handed out by the simulation that owns the
//! objects. They are never reused, so a handle to a reaped object simply
//! stops resolving instead of aliasing a newer one.

use serde::{Deserialize, Serialize};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a handle from a raw value.
            #[must_use]
            pub const fn from_raw(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw handle value.
            #[must_use]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

handle!(
    /// Handle to a combat participant (player, enemy or boss).
    ActorId
);
handle!(
    /// Handle to a projectile or boss hazard in flight.
    ProjectileId
);
handle!(
    /// Handle to a collectible pickup.
    PickupId
);
handle!(
    /// Handle to a scheduled timer.
    TimerId
);

/// Hands out never-reused handles for one simulation.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    fn bump(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    /// Allocates a new actor handle.
    pub fn next_actor(&mut self) -> ActorId {
        ActorId(self.bump())
    }

    /// Allocates a new projectile handle.
    pub fn next_projectile(&mut self) -> ProjectileId {
        ProjectileId(self.bump())
    }

    /// Allocates a new pickup handle.
    pub fn next_pickup(&mut self) -> PickupId {
        PickupId(self.bump())
    }
}
