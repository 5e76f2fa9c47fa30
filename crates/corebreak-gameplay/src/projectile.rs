//! Projectiles and boss hazards.
//!
//! Everything that flies or sweeps across the arena and deals damage on
//! touch is a [`Projectile`]: player bullets, crawler eye lasers, slam
//! shockwaves and laser beams. Behaviours queue a [`ProjectileSpawn`]; the
//! simulation assigns the handle and spawn time.

use corebreak_common::{
    to_secs, Aabb, ActorId, Facing, Millis, ProjectileId, Vec2, WorldBounds,
};
use serde::{Deserialize, Serialize};

use crate::config::{Knockback, LaserTuning, ProjectileSpec, SlamTuning};

/// Side a projectile fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// Hurts enemies and the boss
    Player,
    /// Hurts the player
    Hostile,
}

/// Projectile archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    /// Player gun bullet
    Bullet,
    /// Ranged crawler eye laser
    EyeLaser,
    /// Boss slam shockwave
    Shockwave,
    /// Boss arena-wide laser beam
    LaserBeam,
}

impl ProjectileKind {
    /// Boss hazards ignore level geometry.
    #[must_use]
    pub fn is_hazard(self) -> bool {
        matches!(self, Self::Shockwave | Self::LaserBeam)
    }
}

/// Announced height band of a boss laser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaserHeight {
    /// Just above the floor; jump over it
    Low,
    /// Chest height
    Mid,
    /// Head height; duck under it
    High,
}

impl LaserHeight {
    /// All bands.
    pub const ALL: [Self; 3] = [Self::Low, Self::Mid, Self::High];

    /// Picks a band uniformly.
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        Self::ALL[rng.usize(..Self::ALL.len())]
    }

    /// Height of the band above the boss's feet.
    #[must_use]
    pub fn offset(self, tuning: &LaserTuning) -> f32 {
        match self {
            Self::Low => tuning.low,
            Self::Mid => tuning.mid,
            Self::High => tuning.high,
        }
    }
}

/// A projectile waiting to be launched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpawn {
    /// Archetype
    pub kind: ProjectileKind,
    /// Side
    pub faction: Faction,
    /// Actor that fired it
    pub owner: ActorId,
    /// Center of the hit box
    pub center: Vec2,
    /// Velocity (px/s)
    pub velocity: Vec2,
    /// Half size of the hit box
    pub half_extents: Vec2,
    /// Damage on hit
    pub damage: f32,
    /// Knockback on hit
    pub knockback: Knockback,
    /// Time to live (ms)
    pub lifetime: Millis,
    /// Distance outside the level before culling
    pub cull_margin: f32,
}

impl ProjectileSpawn {
    fn straight(
        kind: ProjectileKind,
        faction: Faction,
        owner: ActorId,
        center: Vec2,
        facing: Facing,
        spec: &ProjectileSpec,
    ) -> Self {
        Self {
            kind,
            faction,
            owner,
            center,
            velocity: Vec2::new(facing.sign() * spec.speed, 0.0),
            half_extents: Vec2::new(spec.half_width, spec.half_height),
            damage: spec.damage,
            knockback: spec.knockback,
            lifetime: spec.lifetime_ms,
            cull_margin: spec.cull_margin,
        }
    }

    /// Player gun bullet travelling along `facing`.
    #[must_use]
    pub fn bullet(owner: ActorId, center: Vec2, facing: Facing, spec: &ProjectileSpec) -> Self {
        Self::straight(ProjectileKind::Bullet, Faction::Player, owner, center, facing, spec)
    }

    /// Crawler eye laser travelling along `facing`.
    #[must_use]
    pub fn eye_laser(owner: ActorId, center: Vec2, facing: Facing, spec: &ProjectileSpec) -> Self {
        Self::straight(ProjectileKind::EyeLaser, Faction::Hostile, owner, center, facing, spec)
    }

    /// Slam shockwave rolling away from `feet` along `facing`.
    #[must_use]
    pub fn shockwave(
        owner: ActorId,
        feet: Vec2,
        facing: Facing,
        slam: &SlamTuning,
        enrage: f32,
        cull_margin: f32,
    ) -> Self {
        let half = Vec2::new(slam.width / 2.0, slam.height / 2.0);
        let start_x = feet.x + facing.sign() * slam.spawn_offset;
        Self {
            kind: ProjectileKind::Shockwave,
            faction: Faction::Hostile,
            owner,
            center: Vec2::new(start_x + facing.sign() * half.x, feet.y - half.y),
            velocity: Vec2::new(facing.sign() * slam.speed * enrage, 0.0),
            half_extents: half,
            damage: slam.damage,
            knockback: slam.knockback,
            lifetime: slam.lifetime_ms,
            cull_margin,
        }
    }

    /// Arena-wide laser beam at `height` above `floor_y`.
    #[must_use]
    pub fn laser_beam(
        owner: ActorId,
        floor_y: f32,
        height: LaserHeight,
        bounds: &WorldBounds,
        laser: &LaserTuning,
        cull_margin: f32,
    ) -> Self {
        Self {
            kind: ProjectileKind::LaserBeam,
            faction: Faction::Hostile,
            owner,
            center: Vec2::new(
                (bounds.min_x + bounds.max_x) / 2.0,
                floor_y - height.offset(laser),
            ),
            velocity: Vec2::ZERO,
            half_extents: Vec2::new(bounds.width() / 2.0, laser.beam_height / 2.0),
            damage: laser.damage,
            knockback: laser.knockback,
            lifetime: laser.beam_ms,
            cull_margin,
        }
    }
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    /// Handle
    pub id: ProjectileId,
    /// Time it was launched
    pub spawned_at: Millis,
    /// Launch parameters; `center` is updated as it flies
    pub body: ProjectileSpawn,
}

impl Projectile {
    /// Launches a queued spawn.
    #[must_use]
    pub fn launch(id: ProjectileId, spawn: ProjectileSpawn, now: Millis) -> Self {
        Self {
            id,
            spawned_at: now,
            body: spawn,
        }
    }

    /// Archetype.
    #[must_use]
    pub fn kind(&self) -> ProjectileKind {
        self.body.kind
    }

    /// Side.
    #[must_use]
    pub fn faction(&self) -> Faction {
        self.body.faction
    }

    /// Center of the hit box.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.body.center
    }

    /// Hit box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.body.center, self.body.half_extents.x, self.body.half_extents.y)
    }

    /// Time at which the projectile expires.
    #[must_use]
    pub fn expires_at(&self) -> Millis {
        self.spawned_at.saturating_add(self.body.lifetime)
    }

    /// Checks whether the lifetime has run out.
    #[must_use]
    pub fn is_expired(&self, now: Millis) -> bool {
        now >= self.expires_at()
    }

    /// Checks whether the projectile left the level plus its margin.
    #[must_use]
    pub fn is_outside(&self, bounds: &WorldBounds) -> bool {
        let margin = self.body.cull_margin;
        let p = self.body.center;
        !bounds.contains_x(p.x, margin) || p.y < bounds.min_y - margin || p.y > bounds.max_y + margin
    }

    /// Moves the projectile by one step.
    pub fn advance(&mut self, dt: Millis) {
        self.body.center += self.body.velocity * to_secs(dt);
    }
}
