//! Player controller.
//!
//! Movement, jumping, melee and hurt/death flow run as a state machine.
//! The gun, jetpack and ducking are layered on top of it every tick and
//! never change the current state themselves.

use corebreak_common::{to_secs, ActorId, Millis, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::actor::{Actor, ActorKind};
use crate::config::{PlayerTuning, ProjectileSpec};
use crate::context::Env;
use crate::events::{EffectKind, Signal};
use crate::fsm::{StateEntry, StateHandlers, StateMachine};
use crate::input::InputState;
use crate::pickup::PickupKind;
use crate::projectile::ProjectileSpawn;
use crate::timer::TimerEvent;

/// Player states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// Standing still
    Idle,
    /// Walking
    Moving,
    /// Airborne, rising or falling
    Jumping,
    /// Melee swing
    Attacking,
    /// Recoiling from a hit; input is ignored
    Hurting,
    /// Dead; terminal
    Dying,
}

impl PlayerState {
    /// All player states.
    pub const ALL: [Self; 6] = [
        Self::Idle,
        Self::Moving,
        Self::Jumping,
        Self::Attacking,
        Self::Hurting,
        Self::Dying,
    ];
}

/// Equipment and abilities outside the state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerGear {
    /// Gun collected
    pub has_gun: bool,
    /// Time of the last shot
    pub last_shot_at: Option<Millis>,
    /// Jetpack collected
    pub has_jetpack: bool,
    /// Remaining jetpack fuel
    pub fuel: f32,
    /// Thrusting this tick
    pub is_jetpacking: bool,
    /// Ducking this tick
    pub is_ducking: bool,
}

impl PlayerGear {
    /// Applies a collected pickup.
    pub fn collect(&mut self, actor: &mut Actor, kind: PickupKind, tuning: &PlayerTuning, heal: f32) {
        match kind {
            PickupKind::Health => {
                let restored = actor.heal(heal);
                debug!(player = %actor.id, restored, "health restored");
            },
            PickupKind::Gun => self.has_gun = true,
            PickupKind::Jetpack => {
                self.has_jetpack = true;
                self.fuel = tuning.jetpack.fuel_capacity;
            },
        }
    }

    /// Fills the jetpack tank if the player has one.
    pub fn refuel(&mut self, tuning: &PlayerTuning) {
        if self.has_jetpack {
            self.fuel = tuning.jetpack.fuel_capacity;
        }
    }
}

/// Builds the player actor record at `position`.
#[must_use]
pub fn build_player(id: ActorId, position: Vec2, tuning: &PlayerTuning) -> Actor {
    let mut actor = Actor::new(id, ActorKind::Player, position, tuning.max_health)
        .with_size(tuning.body_width, tuning.body_height)
        .with_gravity(tuning.gravity)
        .with_melee(tuning.attack_damage, tuning.attack_range, tuning.attack_width);
    actor.grounded = true;
    actor
}

/// Everything the player behaviour touches during one call.
pub struct PlayerCtx<'a> {
    /// Player record
    pub actor: &'a mut Actor,
    /// Equipment
    pub gear: &'a mut PlayerGear,
    /// Input for this tick
    pub input: &'a InputState,
    /// Player tuning
    pub tuning: &'a PlayerTuning,
    /// Gun bullet parameters
    pub bullet: &'a ProjectileSpec,
    /// Shared collaborators
    pub env: Env<'a>,
}

impl PlayerCtx<'_> {
    fn should_die(&self) -> bool {
        let floor_limit = self.env.world.bounds().max_y + self.tuning.fall_death_margin;
        self.actor.health() <= 0.0 || self.actor.position.y > floor_limit
    }

    fn walk_or_stop(&mut self) -> bool {
        match self.input.horizontal() {
            Some(facing) => {
                self.actor.facing = facing;
                self.actor.velocity.x = facing.sign() * self.tuning.walk_speed;
                true
            },
            None => {
                self.actor.velocity.x = 0.0;
                false
            },
        }
    }

    /// State to settle into once an attack or stun ends.
    fn settle(&self) -> PlayerState {
        if !self.actor.grounded {
            PlayerState::Jumping
        } else if self.input.horizontal().is_some() {
            PlayerState::Moving
        } else {
            PlayerState::Idle
        }
    }

    fn fire(&mut self) {
        if !self.gear.has_gun || !self.input.fire_pressed() || self.actor.flags.is_hurting {
            return;
        }
        let now = self.env.now;
        let ready = self
            .gear
            .last_shot_at
            .map_or(true, |t| now.saturating_sub(t) >= self.tuning.fire_cooldown_ms);
        if !ready {
            return;
        }
        let muzzle = Vec2::new(
            self.actor.position.x + self.actor.facing.sign() * self.tuning.muzzle_offset,
            self.actor.position.y - self.actor.height / 2.0,
        );
        self.env.spawns.push(ProjectileSpawn::bullet(
            self.actor.id,
            muzzle,
            self.actor.facing,
            self.bullet,
        ));
        self.gear.last_shot_at = Some(now);
        self.env.sound("shoot");
    }

    fn duck(&mut self) {
        let ducking =
            self.actor.grounded && self.input.down_held() && !self.actor.flags.is_attacking;
        self.gear.is_ducking = ducking;
        self.actor.height = if ducking {
            self.actor.base_height * self.tuning.duck_height_factor
        } else {
            self.actor.base_height
        };
    }

    fn jetpack(&mut self) {
        if !self.gear.has_jetpack {
            return;
        }
        let secs = to_secs(self.env.dt);
        let pack = &self.tuning.jetpack;
        let thrusting = self.input.jump_held() && self.gear.fuel > 0.0 && !self.actor.flags.is_hurting;
        self.gear.is_jetpacking = thrusting;

        if thrusting {
            self.actor.velocity.y =
                (self.actor.velocity.y - pack.thrust * secs).max(-pack.max_rise_speed);
            self.gear.fuel = (self.gear.fuel - pack.drain_per_sec * secs).max(0.0);
            self.env.effect(EffectKind::JetpackFlame, self.actor.position);
        } else if self.actor.grounded {
            self.gear.fuel = (self.gear.fuel + pack.recharge_per_sec * secs).min(pack.fuel_capacity);
        }
    }
}

// ============================================================================
// Behaviour table
// ============================================================================

/// Player state handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerBehavior;

impl<'a> StateHandlers<PlayerCtx<'a>> for PlayerBehavior {
    type State = PlayerState;
    type Event = TimerEvent;
    const LABEL: &'static str = "player";

    fn enter(&self, ctx: &mut PlayerCtx<'a>, entry: StateEntry<PlayerState>) -> Option<PlayerState> {
        let id = ctx.actor.id;
        match entry.state {
            PlayerState::Idle => {
                ctx.actor.velocity.x = 0.0;
                ctx.env.animate(id, "idle");
            },
            PlayerState::Moving => ctx.env.animate(id, "walk"),
            PlayerState::Jumping => {
                if ctx.actor.grounded {
                    ctx.actor.velocity.y = -ctx.tuning.jump_power;
                    ctx.actor.grounded = false;
                    ctx.env.sound("jump");
                }
                ctx.env.animate(id, "jump");
            },
            PlayerState::Attacking => {
                ctx.actor.begin_attack();
                if ctx.actor.grounded {
                    ctx.actor.velocity.x = 0.0;
                }
                ctx.actor.last_attack_at = Some(ctx.env.now);
                ctx.env.animate(id, "attack");
                ctx.env.sound("swing");
                ctx.env.after_in_state(
                    id,
                    entry.epoch,
                    ctx.tuning.attack_duration_ms,
                    TimerEvent::AttackFinished,
                );
            },
            PlayerState::Hurting => {
                ctx.actor.end_attack();
                ctx.actor.flags.is_hurting = true;
                ctx.env.animate(id, "hurt");
                ctx.env.sound("player_hurt");
                ctx.env.after_in_state(
                    id,
                    entry.epoch,
                    ctx.tuning.hurt_duration_ms,
                    TimerEvent::StunFinished,
                );
            },
            PlayerState::Dying => {
                ctx.env.timers.cancel_owner(id);
                ctx.actor.kill();
                ctx.actor.velocity.x = 0.0;
                ctx.gear.is_jetpacking = false;
                info!(player = %id, "player died");
                ctx.env.animate(id, "die");
                ctx.env.sound("player_death");
                ctx.env.after_in_state(
                    id,
                    entry.epoch,
                    ctx.tuning.death_duration_ms,
                    TimerEvent::DeathFinished,
                );
            },
        }
        None
    }

    fn update(&self, ctx: &mut PlayerCtx<'a>, state: PlayerState) -> Option<PlayerState> {
        if state != PlayerState::Dying && ctx.should_die() {
            return Some(PlayerState::Dying);
        }
        match state {
            PlayerState::Idle | PlayerState::Moving => {
                if ctx.input.attack_pressed() {
                    return Some(PlayerState::Attacking);
                }
                if !ctx.actor.grounded || ctx.input.jump_held() {
                    return Some(PlayerState::Jumping);
                }
                match (state, ctx.walk_or_stop()) {
                    (PlayerState::Idle, true) => Some(PlayerState::Moving),
                    (PlayerState::Moving, false) => Some(PlayerState::Idle),
                    _ => None,
                }
            },
            PlayerState::Jumping => {
                if ctx.input.attack_pressed() {
                    return Some(PlayerState::Attacking);
                }
                let walking = ctx.walk_or_stop();
                if ctx.actor.grounded && ctx.actor.velocity.y >= 0.0 {
                    return Some(if walking {
                        PlayerState::Moving
                    } else {
                        PlayerState::Idle
                    });
                }
                None
            },
            PlayerState::Attacking | PlayerState::Dying => {
                if ctx.actor.grounded {
                    ctx.actor.velocity.x = 0.0;
                }
                None
            },
            PlayerState::Hurting => None,
        }
    }

    fn exit(&self, ctx: &mut PlayerCtx<'a>, state: PlayerState) {
        match state {
            PlayerState::Attacking => ctx.actor.end_attack(),
            PlayerState::Hurting => ctx.actor.flags.is_hurting = false,
            _ => {},
        }
    }

    fn event(
        &self,
        ctx: &mut PlayerCtx<'a>,
        state: PlayerState,
        event: TimerEvent,
    ) -> Option<PlayerState> {
        match (state, event) {
            (_, TimerEvent::InvulnerabilityExpired) => {
                ctx.actor.flags.is_invulnerable = false;
                None
            },
            (PlayerState::Attacking, TimerEvent::AttackFinished)
            | (PlayerState::Hurting, TimerEvent::StunFinished) => Some(ctx.settle()),
            (PlayerState::Dying, TimerEvent::DeathFinished) => {
                ctx.env.signals.push(Signal::LevelFailed);
                None
            },
            _ => None,
        }
    }
}

// ============================================================================
// Machine
// ============================================================================

/// Player state machine with its entry points.
#[derive(Debug, Clone)]
pub struct PlayerMachine {
    machine: StateMachine<PlayerState>,
}

impl Default for PlayerMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerMachine {
    /// Creates a machine that has not entered any state yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            machine: StateMachine::new(&PlayerState::ALL, PlayerState::Idle),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> Option<PlayerState> {
        self.machine.current()
    }

    /// Transition epoch, for timer validity.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.machine.epoch()
    }

    /// Enters the initial state.
    pub fn start(&mut self, ctx: &mut PlayerCtx<'_>) {
        self.machine.goto(&PlayerBehavior, ctx, PlayerState::Idle);
    }

    /// Runs one tick: equipment first, then the state machine.
    pub fn tick(&mut self, ctx: &mut PlayerCtx<'_>) {
        if !ctx.actor.is_dead() {
            ctx.fire();
            ctx.duck();
            ctx.jetpack();
        }
        self.machine.update(&PlayerBehavior, ctx);
    }

    /// Delivers a timer event.
    pub fn dispatch(&mut self, ctx: &mut PlayerCtx<'_>, event: TimerEvent) {
        self.machine.dispatch(&PlayerBehavior, ctx, event);
    }

    /// Reacts to damage that landed.
    pub fn hurt(&mut self, ctx: &mut PlayerCtx<'_>) {
        if self.machine.is(PlayerState::Dying) {
            return;
        }
        ctx.actor.flags.is_invulnerable = true;
        ctx.env
            .after(ctx.actor.id, ctx.tuning.invulnerable_ms, TimerEvent::InvulnerabilityExpired);
        self.machine.goto(&PlayerBehavior, ctx, PlayerState::Hurting);
    }

    /// Reacts to a killing blow.
    pub fn die(&mut self, ctx: &mut PlayerCtx<'_>) {
        if !self.machine.is(PlayerState::Dying) {
            self.machine.goto(&PlayerBehavior, ctx, PlayerState::Dying);
        }
    }
}
