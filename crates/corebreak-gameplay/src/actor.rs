//! Shared actor record.
//!
//! Every combat participant (player, enemies, boss) carries the same
//! runtime record: kinematics, health, status flags and an optional melee
//! [`AttackZone`]. Archetype behaviour lives in the state machines; this
//! module only enforces the record's own invariants.

use std::collections::HashSet;

use corebreak_common::{Aabb, ActorId, Facing, Millis, Vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Knockback;

/// Archetype of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// The player
    Player,
    /// Patrolling melee enemy
    GroundMelee,
    /// Slow crawler with an eye laser
    RangedCrawler,
    /// Hovering enemy that swoops
    FlyingSwooper,
    /// Arena boss
    Boss,
}

impl ActorKind {
    /// Tag used in kill notifications and logs.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::GroundMelee => "ground_melee",
            Self::RangedCrawler => "ranged_crawler",
            Self::FlyingSwooper => "flying_swooper",
            Self::Boss => "boss",
        }
    }

    /// Checks whether this is one of the regular enemy archetypes.
    #[must_use]
    pub fn is_enemy(self) -> bool {
        matches!(
            self,
            Self::GroundMelee | Self::RangedCrawler | Self::FlyingSwooper
        )
    }

    /// Checks whether actors of this kind fight against the player.
    #[must_use]
    pub fn is_hostile(self) -> bool {
        self != Self::Player
    }
}

/// Status flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorFlags {
    /// Dead; never cleared once set
    pub is_dead: bool,
    /// Mid-attack
    pub is_attacking: bool,
    /// Recoiling from a hit
    pub is_hurting: bool,
    /// Ignores damage
    pub is_invulnerable: bool,
}

/// Result of applying damage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Target was dead or invulnerable
    Ignored,
    /// Target survived
    Hurt {
        /// Health actually removed
        dealt: f32,
    },
    /// Target died from this hit
    Killed {
        /// Health actually removed
        dealt: f32,
    },
}

impl DamageOutcome {
    /// Health actually removed.
    #[must_use]
    pub fn dealt(self) -> f32 {
        match self {
            Self::Ignored => 0.0,
            Self::Hurt { dealt } | Self::Killed { dealt } => dealt,
        }
    }

    /// Checks whether the damage was applied at all.
    #[must_use]
    pub fn landed(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

// ============================================================================
// Attack zone
// ============================================================================

/// Melee hit region in front of an actor.
///
/// Each activation credits a target at most once. The set of credited
/// targets is cleared when the next activation begins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackZone {
    /// Reach in front of the body
    pub reach: f32,
    /// Zone height
    pub height: f32,
    active: bool,
    activation: u64,
    credited: HashSet<ActorId>,
    area: Option<Aabb>,
}

impl AttackZone {
    /// Creates an inactive zone.
    #[must_use]
    pub fn new(reach: f32, height: f32) -> Self {
        Self {
            reach,
            height,
            ..Self::default()
        }
    }

    /// Starts a new activation with an empty hit set.
    pub fn begin(&mut self) {
        self.active = true;
        self.activation += 1;
        self.credited.clear();
    }

    /// Ends the current activation.
    pub fn end(&mut self) {
        self.active = false;
    }

    /// Checks whether the zone can currently hit.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of activations so far.
    #[must_use]
    pub fn activation(&self) -> u64 {
        self.activation
    }

    /// Credits `target` for this activation. Returns false if already credited.
    pub fn credit(&mut self, target: ActorId) -> bool {
        self.credited.insert(target)
    }

    /// Checks whether `target` was credited in this activation.
    #[must_use]
    pub fn has_credited(&self, target: ActorId) -> bool {
        self.credited.contains(&target)
    }

    /// Moves the zone in front of a body standing at `feet`.
    pub fn follow(&mut self, feet: Vec2, facing: Facing, body_height: f32) {
        let center = Vec2::new(
            feet.x + facing.sign() * self.reach / 2.0,
            feet.y - body_height / 2.0,
        );
        self.area = Some(Aabb::from_center(center, self.reach / 2.0, self.height / 2.0));
    }

    /// Current zone area, once positioned.
    #[must_use]
    pub fn area(&self) -> Option<Aabb> {
        self.area
    }
}

// ============================================================================
// Actor
// ============================================================================

/// Runtime record of one combat participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    /// Handle
    pub id: ActorId,
    /// Archetype
    pub kind: ActorKind,
    /// Feet position (bottom-center)
    pub position: Vec2,
    /// Velocity (px/s)
    pub velocity: Vec2,
    /// Facing
    pub facing: Facing,
    /// Body width
    pub width: f32,
    /// Current body height
    pub height: f32,
    /// Standing body height
    pub base_height: f32,
    /// Gravity (px/s^2), zero when unaffected
    pub gravity: f32,
    /// Standing on a floor
    pub grounded: bool,
    /// Status flags
    pub flags: ActorFlags,
    /// Melee zone, if the archetype has one
    pub zone: Option<AttackZone>,
    /// Melee damage
    pub attack_damage: f32,
    /// Damage dealt by touching the player
    pub contact_damage: f32,
    /// Time of the last melee attack
    pub last_attack_at: Option<Millis>,
    /// Time of the last ranged attack
    pub last_ranged_at: Option<Millis>,
    /// Time of the last turn
    pub last_turn_at: Option<Millis>,
    /// Spawn position
    pub home: Vec2,
    /// Death sequence finished; remove at end of tick
    pub reap: bool,
    health: f32,
    max_health: f32,
}

impl Actor {
    /// Creates a live actor standing at `position`.
    #[must_use]
    pub fn new(id: ActorId, kind: ActorKind, position: Vec2, max_health: f32) -> Self {
        let max_health = max_health.max(1.0);
        Self {
            id,
            kind,
            position,
            velocity: Vec2::ZERO,
            facing: Facing::Right,
            width: 32.0,
            height: 32.0,
            base_height: 32.0,
            gravity: 0.0,
            grounded: false,
            flags: ActorFlags::default(),
            zone: None,
            attack_damage: 0.0,
            contact_damage: 0.0,
            last_attack_at: None,
            last_ranged_at: None,
            last_turn_at: None,
            home: position,
            reap: false,
            health: max_health,
            max_health,
        }
    }

    /// Sets the body size.
    #[must_use]
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self.base_height = height;
        self
    }

    /// Sets gravity.
    #[must_use]
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Gives the actor a melee zone and damage.
    #[must_use]
    pub fn with_melee(mut self, damage: f32, reach: f32, height: f32) -> Self {
        self.attack_damage = damage;
        self.zone = Some(AttackZone::new(reach, height));
        self
    }

    /// Sets contact damage.
    #[must_use]
    pub fn with_contact_damage(mut self, damage: f32) -> Self {
        self.contact_damage = damage;
        self
    }

    /// Sets the initial facing.
    #[must_use]
    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Health as a fraction of maximum.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        self.health / self.max_health
    }

    /// Checks whether the actor is dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.flags.is_dead
    }

    /// Checks whether damage would currently land.
    #[must_use]
    pub fn accepts_damage(&self) -> bool {
        !self.flags.is_dead && !self.flags.is_invulnerable
    }

    /// Applies damage. Ignored while dead or invulnerable.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if !self.accepts_damage() || amount <= 0.0 {
            return DamageOutcome::Ignored;
        }
        let dealt = amount.min(self.health);
        self.health -= dealt;
        if self.health <= 0.0 {
            self.kill();
            debug!(actor = %self.id, kind = self.kind.tag(), dealt, "actor killed");
            DamageOutcome::Killed { dealt }
        } else {
            debug!(actor = %self.id, kind = self.kind.tag(), dealt, health = self.health, "actor hurt");
            DamageOutcome::Hurt { dealt }
        }
    }

    /// Restores health up to the maximum. Refused while dead.
    ///
    /// Returns the amount actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.flags.is_dead || amount <= 0.0 {
            return 0.0;
        }
        let restored = amount.min(self.max_health - self.health);
        self.health += restored;
        restored
    }

    /// Marks the actor dead with zero health.
    pub fn kill(&mut self) {
        self.health = 0.0;
        self.flags.is_dead = true;
        self.flags.is_attacking = false;
        self.flags.is_hurting = false;
        if let Some(zone) = self.zone.as_mut() {
            zone.end();
        }
    }

    /// Body box.
    #[must_use]
    pub fn body(&self) -> Aabb {
        Aabb::from_feet(self.position, self.width, self.height)
    }

    /// Distance between feet positions.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Checks the melee cooldown.
    #[must_use]
    pub fn attack_ready(&self, now: Millis, cooldown: Millis) -> bool {
        self.last_attack_at
            .map_or(true, |t| now.saturating_sub(t) > cooldown)
    }

    /// Checks the ranged cooldown.
    #[must_use]
    pub fn ranged_ready(&self, now: Millis, cooldown: Millis) -> bool {
        self.last_ranged_at
            .map_or(true, |t| now.saturating_sub(t) > cooldown)
    }

    /// Turns toward `facing` unless a turn happened within `delay`.
    ///
    /// Returns whether the facing changed.
    pub fn turn_debounced(&mut self, facing: Facing, now: Millis, delay: Millis) -> bool {
        if facing == self.facing {
            return false;
        }
        if self
            .last_turn_at
            .is_some_and(|t| now.saturating_sub(t) <= delay)
        {
            return false;
        }
        self.facing = facing;
        self.last_turn_at = Some(now);
        true
    }

    /// Turns around unconditionally, recording the time.
    pub fn turn_around(&mut self, now: Millis) {
        self.facing = self.facing.flipped();
        self.last_turn_at = Some(now);
    }

    /// Pushes the actor away from `source_x`.
    pub fn knock_back(&mut self, source_x: f32, knockback: Knockback) {
        let dir = if self.position.x > source_x { 1.0 } else { -1.0 };
        self.velocity.x = dir * knockback.horizontal;
        if let Some(vy) = knockback.vertical {
            self.velocity.y = vy;
        }
    }

    /// Starts a melee activation.
    pub fn begin_attack(&mut self) {
        self.flags.is_attacking = true;
        if let Some(zone) = self.zone.as_mut() {
            zone.begin();
        }
    }

    /// Ends the current melee activation.
    pub fn end_attack(&mut self) {
        self.flags.is_attacking = false;
        if let Some(zone) = self.zone.as_mut() {
            zone.end();
        }
    }

    /// Repositions the melee zone in front of the body.
    pub fn sync_zone(&mut self) {
        let (feet, facing, height) = (self.position, self.facing, self.height);
        if let Some(zone) = self.zone.as_mut() {
            zone.follow(feet, facing, height);
        }
    }

    /// Melee zone area if it can hit right now.
    #[must_use]
    pub fn active_zone(&self) -> Option<Aabb> {
        self.zone
            .as_ref()
            .filter(|z| z.is_active() && self.flags.is_attacking && !self.flags.is_dead)
            .and_then(AttackZone::area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grunt() -> Actor {
        Actor::new(ActorId::from_raw(1), ActorKind::GroundMelee, Vec2::ZERO, 100.0)
            .with_size(60.0, 60.0)
            .with_melee(20.0, 60.0, 60.0)
    }

    #[test]
    fn test_damage_reports_clamped_amount() {
        let mut actor = grunt();
        assert_eq!(actor.take_damage(40.0), DamageOutcome::Hurt { dealt: 40.0 });
        assert_eq!(actor.take_damage(100.0), DamageOutcome::Killed { dealt: 60.0 });
        assert_eq!(actor.health(), 0.0);
        assert!(actor.is_dead());
        assert_eq!(actor.take_damage(10.0), DamageOutcome::Ignored);
    }

    #[test]
    fn test_invulnerable_ignores_damage() {
        let mut actor = grunt();
        actor.flags.is_invulnerable = true;
        assert_eq!(actor.take_damage(40.0), DamageOutcome::Ignored);
        assert_eq!(actor.health(), 100.0);
    }

    #[test]
    fn test_heal_clamps_and_refuses_dead() {
        let mut actor = grunt();
        actor.take_damage(10.0);
        assert_eq!(actor.heal(30.0), 10.0);
        assert_eq!(actor.health(), 100.0);

        actor.kill();
        assert_eq!(actor.heal(30.0), 0.0);
        assert_eq!(actor.health(), 0.0);
    }

    #[test]
    fn test_zone_credits_once_per_activation() {
        let mut zone = AttackZone::new(80.0, 100.0);
        let target = ActorId::from_raw(9);
        zone.begin();
        assert!(zone.credit(target));
        assert!(!zone.credit(target));
        zone.end();
        assert!(zone.has_credited(target));

        zone.begin();
        assert!(!zone.has_credited(target));
        assert!(zone.credit(target));
        assert_eq!(zone.activation(), 2);
    }

    #[test]
    fn test_zone_follows_facing() {
        let mut actor = grunt();
        actor.position = Vec2::new(100.0, 500.0);
        actor.facing = Facing::Left;
        actor.sync_zone();
        actor.begin_attack();
        let area = actor.active_zone().expect("zone active");
        assert_eq!(area.min.x, 40.0);
        assert_eq!(area.max.x, 100.0);

        actor.end_attack();
        assert!(actor.active_zone().is_none());
    }

    #[test]
    fn test_turn_debounce() {
        let mut actor = grunt();
        assert!(actor.turn_debounced(Facing::Left, 100, 1000));
        assert!(!actor.turn_debounced(Facing::Right, 900, 1000));
        assert!(actor.turn_debounced(Facing::Right, 1101, 1000));
    }

    #[test]
    fn test_cooldown_ready() {
        let mut actor = grunt();
        assert!(actor.attack_ready(0, 1500));
        actor.last_attack_at = Some(1000);
        assert!(!actor.attack_ready(2500, 1500));
        assert!(actor.attack_ready(2501, 1500));
    }

    #[test]
    fn test_knockback_direction() {
        let mut actor = grunt();
        actor.position.x = 50.0;
        actor.knock_back(80.0, Knockback::new(200.0, -150.0));
        assert_eq!(actor.velocity, Vec2::new(-200.0, -150.0));

        actor.velocity.y = 33.0;
        actor.knock_back(10.0, Knockback::horizontal(150.0));
        assert_eq!(actor.velocity, Vec2::new(150.0, 33.0));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Damage(f32),
        Heal(f32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0.0f32..200.0).prop_map(Op::Damage),
            (0.0f32..200.0).prop_map(Op::Heal),
        ]
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_range(ops in prop::collection::vec(op(), 0..40)) {
            let mut actor = grunt();
            let mut was_dead = false;
            for op in ops {
                match op {
                    Op::Damage(d) => { actor.take_damage(d); },
                    Op::Heal(h) => { actor.heal(h); },
                }
                prop_assert!(actor.health() >= 0.0);
                prop_assert!(actor.health() <= actor.max_health());
                if was_dead {
                    prop_assert!(actor.is_dead());
                    prop_assert_eq!(actor.health(), 0.0);
                }
                was_dead = actor.is_dead();
            }
        }
    }
}
