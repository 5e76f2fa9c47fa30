//! Enemy archetypes.
//!
//! All enemies share one state vocabulary ([`EnemyState`]) and one context
//! type, but each archetype has its own behaviour table and declares only
//! the states it actually uses:
//!
//! | Archetype        | Idle | Patrolling | Chasing | Attacking | Returning | Hurting | Dying |
//! |------------------|------|------------|---------|-----------|-----------|---------|-------|
//! | Ground melee     | x    | x          | x       | x         |           | x       | x     |
//! | Ranged crawler   | x    |            | x       | x         |           | x       | x     |
//! | Flying swooper   | x    |            | x       | x         | x         | x       | x     |

mod crawler;
mod ground;
mod swooper;

pub use crawler::RangedCrawlerBehavior;
pub use ground::GroundMeleeBehavior;
pub use swooper::FlyingSwooperBehavior;

use corebreak_common::{ActorId, Facing, Vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actor::{Actor, ActorKind};
use crate::config::{CombatConfig, EnemyTuning};
use crate::context::{Env, TargetInfo};
use crate::events::EffectKind;
use crate::fsm::{StateEntry, StateMachine};
use crate::timer::TimerEvent;

/// Enemy states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyState {
    /// Waiting or hovering in place
    Idle,
    /// Walking back and forth
    Patrolling,
    /// Pursuing the player
    Chasing,
    /// Melee attack in progress
    Attacking,
    /// Flying back to the home height
    Returning,
    /// Stunned after taking damage
    Hurting,
    /// Dead; reaped when the death sequence ends
    Dying,
}

/// Per-enemy scratch state outside the machine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnemyMemory {
    /// Hover oscillator phase (radians)
    pub hover_phase: f32,
}

/// Everything an enemy behaviour touches during one call.
pub struct EnemyCtx<'a> {
    /// Enemy record
    pub actor: &'a mut Actor,
    /// Scratch state
    pub memory: &'a mut EnemyMemory,
    /// The player, if one exists
    pub target: Option<TargetInfo>,
    /// All tuning
    pub config: &'a CombatConfig,
    /// Shared collaborators
    pub env: Env<'a>,
}

impl EnemyCtx<'_> {
    /// Living player, if any.
    fn live_target(&self) -> Option<TargetInfo> {
        TargetInfo::alive(self.target)
    }

    /// Distance to a living player.
    fn target_distance(&self) -> Option<f32> {
        self.live_target().map(|t| self.actor.distance_to(t.position))
    }

    /// Checks whether a living player is within `range`.
    fn target_within(&self, range: f32) -> bool {
        self.target_distance().is_some_and(|d| d < range)
    }

    /// Faces the player, respecting the turn debounce.
    fn face_target(&mut self, tuning: &EnemyTuning) {
        if let Some(target) = self.live_target() {
            let facing = Facing::toward(self.actor.position.x, target.position.x);
            self.actor
                .turn_debounced(facing, self.env.now, tuning.turn_delay_ms);
        }
    }

    /// Checks for a ledge in front of a grounded walker.
    fn at_ledge(&self, tuning: &EnemyTuning) -> bool {
        self.actor.grounded
            && !self.env.world.ground_ahead(
                self.actor.position,
                self.actor.facing,
                self.actor.width / 2.0,
                tuning.cliff_lookahead,
            )
    }

    fn enter_idle(&mut self) {
        self.actor.velocity.x = 0.0;
        self.env.animate(self.actor.id, "idle");
    }

    fn enter_attacking(&mut self, entry: StateEntry<EnemyState>, tuning: &EnemyTuning) {
        self.actor.begin_attack();
        self.actor.last_attack_at = Some(self.env.now);
        self.env.animate(self.actor.id, "attack");
        self.env.sound("enemy_attack");
        self.env.after_in_state(
            self.actor.id,
            entry.epoch,
            tuning.attack_duration_ms,
            TimerEvent::AttackFinished,
        );
    }

    fn enter_hurting(&mut self, entry: StateEntry<EnemyState>, tuning: &EnemyTuning) {
        self.actor.end_attack();
        self.actor.flags.is_hurting = true;
        self.env.animate(self.actor.id, "hurt");
        self.env.sound("enemy_hurt");
        self.env
            .after_in_state(self.actor.id, entry.epoch, tuning.stun_ms, TimerEvent::StunFinished);
    }

    fn enter_dying(&mut self, entry: StateEntry<EnemyState>, tuning: &EnemyTuning) {
        let id = self.actor.id;
        self.env.timers.cancel_owner(id);
        self.actor.kill();
        self.actor.velocity.x = 0.0;
        debug!(enemy = %id, kind = self.actor.kind.tag(), "enemy dying");
        self.env.animate(id, "die");
        self.env.sound("enemy_death");
        self.env.effect(EffectKind::Death, self.actor.body().center());
        self.env
            .after_in_state(id, entry.epoch, tuning.death_ms, TimerEvent::DeathFinished);
    }

    /// Cleanup shared by every archetype when leaving a state.
    fn exit_common(&mut self, state: EnemyState) {
        match state {
            EnemyState::Attacking => self.actor.end_attack(),
            EnemyState::Hurting => self.actor.flags.is_hurting = false,
            _ => {},
        }
    }

    /// Marks the actor for reaping once its death sequence ends.
    fn finish_dying(&mut self) {
        self.actor.reap = true;
    }

    /// Unit vector from the body toward `point`.
    fn direction_to(&self, point: Vec2) -> Vec2 {
        (point - self.actor.position).normalize_or_zero()
    }
}

// ============================================================================
// Machine
// ============================================================================

/// Runs `$body` with the behaviour table of `$kind` bound to `$h`.
macro_rules! with_behavior {
    ($kind:expr, $h:ident => $body:expr) => {
        match $kind {
            EnemyArchetype::GroundMelee => {
                let $h = &GroundMeleeBehavior;
                $body
            },
            EnemyArchetype::RangedCrawler => {
                let $h = &RangedCrawlerBehavior;
                $body
            },
            EnemyArchetype::FlyingSwooper => {
                let $h = &FlyingSwooperBehavior;
                $body
            },
        }
    };
}

/// Enemy archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyArchetype {
    /// Patrolling melee enemy
    GroundMelee,
    /// Slow crawler with an eye laser
    RangedCrawler,
    /// Hovering enemy that swoops
    FlyingSwooper,
}

impl EnemyArchetype {
    /// Actor kind of this archetype.
    #[must_use]
    pub fn kind(self) -> ActorKind {
        match self {
            Self::GroundMelee => ActorKind::GroundMelee,
            Self::RangedCrawler => ActorKind::RangedCrawler,
            Self::FlyingSwooper => ActorKind::FlyingSwooper,
        }
    }

    /// Shared tuning of this archetype.
    #[must_use]
    pub fn tuning(self, config: &CombatConfig) -> &EnemyTuning {
        match self {
            Self::GroundMelee => &config.ground_melee,
            Self::RangedCrawler => &config.ranged_crawler.base,
            Self::FlyingSwooper => &config.flying_swooper.base,
        }
    }

    /// States this archetype declares.
    #[must_use]
    pub fn states(self) -> &'static [EnemyState] {
        use EnemyState::*;
        match self {
            Self::GroundMelee => &[Idle, Patrolling, Chasing, Attacking, Hurting, Dying],
            Self::RangedCrawler => &[Idle, Chasing, Attacking, Hurting, Dying],
            Self::FlyingSwooper => &[Idle, Chasing, Attacking, Returning, Hurting, Dying],
        }
    }

    /// Builds the actor record for a new enemy at `position`.
    #[must_use]
    pub fn build_actor(self, id: ActorId, position: Vec2, config: &CombatConfig) -> Actor {
        let t = self.tuning(config);
        Actor::new(id, self.kind(), position, t.max_health)
            .with_size(t.body_width, t.body_height)
            .with_gravity(t.gravity)
            .with_melee(t.attack_damage, t.attack_range, t.attack_width)
            .with_contact_damage(t.contact_damage)
    }
}

/// State machine of one enemy.
#[derive(Debug, Clone)]
pub struct EnemyMachine {
    archetype: EnemyArchetype,
    machine: StateMachine<EnemyState>,
}

impl EnemyMachine {
    /// Creates a machine for `archetype` that has not entered any state yet.
    #[must_use]
    pub fn new(archetype: EnemyArchetype) -> Self {
        Self {
            archetype,
            machine: StateMachine::new(archetype.states(), EnemyState::Idle),
        }
    }

    /// Archetype.
    #[must_use]
    pub fn archetype(&self) -> EnemyArchetype {
        self.archetype
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> Option<EnemyState> {
        self.machine.current()
    }

    /// Transition epoch, for timer validity.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.machine.epoch()
    }

    /// Enters the initial state.
    pub fn start(&mut self, ctx: &mut EnemyCtx<'_>) {
        let machine = &mut self.machine;
        with_behavior!(self.archetype, h => machine.goto(h, ctx, EnemyState::Idle));
    }

    /// Runs the current state's update.
    pub fn tick(&mut self, ctx: &mut EnemyCtx<'_>) {
        let machine = &mut self.machine;
        with_behavior!(self.archetype, h => machine.update(h, ctx));
    }

    /// Delivers a timer event.
    pub fn dispatch(&mut self, ctx: &mut EnemyCtx<'_>, event: TimerEvent) {
        let machine = &mut self.machine;
        with_behavior!(self.archetype, h => machine.dispatch(h, ctx, event));
    }

    /// Reacts to damage that landed.
    pub fn hurt(&mut self, ctx: &mut EnemyCtx<'_>) {
        if self.machine.is(EnemyState::Dying) {
            return;
        }
        let machine = &mut self.machine;
        with_behavior!(self.archetype, h => machine.goto(h, ctx, EnemyState::Hurting));
    }

    /// Reacts to a killing blow.
    pub fn die(&mut self, ctx: &mut EnemyCtx<'_>) {
        if self.machine.is(EnemyState::Dying) {
            return;
        }
        let machine = &mut self.machine;
        with_behavior!(self.archetype, h => machine.goto(h, ctx, EnemyState::Dying));
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Harness for driving a single enemy without a full simulation.

    use super::*;
    use crate::events::{NullPresentation, Signal};
    use crate::projectile::ProjectileSpawn;
    use crate::timer::Scheduler;
    use crate::world::FloorMap;
    use corebreak_common::{ActorId, Millis, WorldBounds};

    pub const FLOOR: f32 = 500.0;

    pub struct Rig {
        pub actor: Actor,
        pub machine: EnemyMachine,
        pub memory: EnemyMemory,
        pub target: Option<TargetInfo>,
        pub config: CombatConfig,
        pub world: FloorMap,
        pub timers: Scheduler,
        pub fx: NullPresentation,
        pub rng: fastrand::Rng,
        pub spawns: Vec<ProjectileSpawn>,
        pub signals: Vec<Signal>,
        pub now: Millis,
    }

    impl Rig {
        pub fn new(archetype: EnemyArchetype, position: Vec2) -> Self {
            Self::with_config(archetype, position, CombatConfig::default())
        }

        pub fn with_config(archetype: EnemyArchetype, position: Vec2, config: CombatConfig) -> Self {
            let mut actor = archetype.build_actor(ActorId::from_raw(10), position, &config);
            actor.grounded = actor.gravity > 0.0;
            let mut rig = Self {
                actor,
                machine: EnemyMachine::new(archetype),
                memory: EnemyMemory::default(),
                target: None,
                config,
                world: FloorMap::flat(WorldBounds::sized(2000.0, 600.0), FLOOR),
                timers: Scheduler::new(),
                fx: NullPresentation,
                rng: fastrand::Rng::with_seed(3),
                spawns: Vec::new(),
                signals: Vec::new(),
                now: 0,
            };
            rig.with_ctx(|m, ctx| m.start(ctx));
            rig
        }

        pub fn with_ctx(&mut self, f: impl FnOnce(&mut EnemyMachine, &mut EnemyCtx<'_>)) {
            let mut ctx = EnemyCtx {
                actor: &mut self.actor,
                memory: &mut self.memory,
                target: self.target,
                config: &self.config,
                env: Env {
                    now: self.now,
                    dt: 16,
                    world: &self.world,
                    timers: &mut self.timers,
                    fx: &mut self.fx,
                    rng: &mut self.rng,
                    spawns: &mut self.spawns,
                    signals: &mut self.signals,
                },
            };
            f(&mut self.machine, &mut ctx);
        }

        pub fn place_target(&mut self, x: f32, y: f32) {
            self.target = Some(TargetInfo {
                id: ActorId::from_raw(1),
                position: Vec2::new(x, y),
                is_dead: false,
            });
        }

        pub fn step(&mut self) {
            self.now += 16;
            while let Some(timer) = self.timers.pop_due(self.now) {
                if timer.is_current(self.machine.epoch()) {
                    self.with_ctx(|m, ctx| m.dispatch(ctx, timer.event));
                }
            }
            self.with_ctx(|m, ctx| m.tick(ctx));
        }

        pub fn run(&mut self, ms: Millis) {
            let end = self.now + ms;
            while self.now < end {
                self.step();
            }
        }

        pub fn state(&self) -> Option<EnemyState> {
            self.machine.state()
        }

        pub fn hurt(&mut self, amount: f32) {
            let outcome = self.actor.take_damage(amount);
            if self.actor.is_dead() {
                self.with_ctx(|m, ctx| m.die(ctx));
            } else if outcome.landed() {
                self.with_ctx(|m, ctx| m.hurt(ctx));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_archetype_state_sets() {
        assert!(!EnemyArchetype::GroundMelee.states().contains(&EnemyState::Returning));
        assert!(!EnemyArchetype::RangedCrawler.states().contains(&EnemyState::Patrolling));
        assert!(!EnemyArchetype::FlyingSwooper.states().contains(&EnemyState::Patrolling));
    }

    #[test]
    fn test_killed_while_stunned_stays_dead() {
        let mut rig = Rig::new(EnemyArchetype::GroundMelee, Vec2::new(400.0, FLOOR));
        rig.hurt(40.0);
        assert_eq!(rig.state(), Some(EnemyState::Hurting));

        rig.hurt(100.0);
        assert_eq!(rig.state(), Some(EnemyState::Dying));

        // The stun timer from the first hit must not pull it out of dying.
        rig.run(300);
        assert_eq!(rig.state(), Some(EnemyState::Dying));
        assert!(!rig.actor.reap);

        rig.run(600);
        assert!(rig.actor.reap);
        assert_eq!(rig.timers.pending_for(rig.actor.id), 0);
    }

    #[test]
    fn test_build_actor_uses_archetype_tuning() {
        let config = CombatConfig::default();
        let crawler = EnemyArchetype::RangedCrawler.build_actor(
            corebreak_common::ActorId::from_raw(5),
            Vec2::ZERO,
            &config,
        );
        assert_eq!(crawler.kind, ActorKind::RangedCrawler);
        assert_eq!(crawler.max_health(), 150.0);
        assert_eq!(crawler.contact_damage, 18.0);
    }
}
