//! Per-tick environment handed to actor behaviours.

use corebreak_common::{ActorId, Millis, TimerId, Vec2};

use crate::events::{EffectKind, Presentation, Signal};
use crate::projectile::ProjectileSpawn;
use crate::timer::{Scheduler, TimerEvent, TimerScope};
use crate::world::WorldQuery;

/// What an enemy or the boss knows about the player this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInfo {
    /// Player handle
    pub id: ActorId,
    /// Player feet position
    pub position: Vec2,
    /// Player is dead
    pub is_dead: bool,
}

impl TargetInfo {
    /// Position of a living player, if any.
    #[must_use]
    pub fn alive(target: Option<Self>) -> Option<Self> {
        target.filter(|t| !t.is_dead)
    }
}

/// Collaborators shared by every behaviour during one tick.
pub struct Env<'a> {
    /// Simulated time of this tick
    pub now: Millis,
    /// Length of this tick
    pub dt: Millis,
    /// Level geometry
    pub world: &'a dyn WorldQuery,
    /// Deferred transitions
    pub timers: &'a mut Scheduler,
    /// Cosmetic requests
    pub fx: &'a mut dyn Presentation,
    /// Seeded randomness
    pub rng: &'a mut fastrand::Rng,
    /// Projectiles to launch at the end of the tick
    pub spawns: &'a mut Vec<ProjectileSpawn>,
    /// Outcomes for the event sink
    pub signals: &'a mut Vec<Signal>,
}

impl Env<'_> {
    /// Borrows the environment for a shorter scope.
    pub fn reborrow(&mut self) -> Env<'_> {
        Env {
            now: self.now,
            dt: self.dt,
            world: self.world,
            timers: &mut *self.timers,
            fx: &mut *self.fx,
            rng: &mut *self.rng,
            spawns: &mut *self.spawns,
            signals: &mut *self.signals,
        }
    }

    /// Schedules an event bound to the state entered at `epoch`.
    pub fn after_in_state(
        &mut self,
        owner: ActorId,
        epoch: u64,
        delay: Millis,
        event: TimerEvent,
    ) -> TimerId {
        self.timers
            .schedule(owner, self.now, delay, TimerScope::State(epoch), event)
    }

    /// Schedules an event that survives state changes.
    pub fn after(&mut self, owner: ActorId, delay: Millis, event: TimerEvent) -> TimerId {
        self.timers
            .schedule(owner, self.now, delay, TimerScope::Actor, event)
    }

    /// Requests an animation.
    pub fn animate(&mut self, actor: ActorId, key: &'static str) {
        self.fx.on_animation_request(actor, key);
    }

    /// Requests a sound.
    pub fn sound(&mut self, key: &'static str) {
        self.fx.on_sound_request(key);
    }

    /// Requests an effect.
    pub fn effect(&mut self, kind: EffectKind, position: Vec2) {
        self.fx.on_effect_request(kind, position);
    }
}
