//! Collectible pickups.

use corebreak_common::{Aabb, PickupId, Vec2};
use serde::{Deserialize, Serialize};

/// Pickup kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    /// Restores health
    Health,
    /// Grants the gun
    Gun,
    /// Grants the jetpack
    Jetpack,
}

impl PickupKind {
    /// Sound key played on collection.
    #[must_use]
    pub fn sound_key(self) -> &'static str {
        match self {
            Self::Health => "pickup_health",
            Self::Gun | Self::Jetpack => "pickup_item",
        }
    }
}

/// A pickup lying in the level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    /// Handle
    pub id: PickupId,
    /// Kind
    pub kind: PickupKind,
    /// Feet position
    pub position: Vec2,
    /// Box size
    pub size: f32,
}

impl Pickup {
    /// Collision box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_feet(self.position, self.size, self.size)
    }
}
