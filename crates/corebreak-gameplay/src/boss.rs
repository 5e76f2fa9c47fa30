//! Boss encounter.
//!
//! The boss waits until the host activates the encounter, plays an intro
//! and then cycles idle -> move -> idle through its attack pattern. It only
//! takes damage while its core is exposed (the vulnerable move). Losing
//! health enrages it: cooldowns shrink, shockwaves speed up and the laser
//! sequence grows.

use corebreak_common::{ActorId, Facing, Vec2};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::actor::{Actor, ActorKind};
use crate::config::{BossMove, BossTuning};
use crate::context::{Env, TargetInfo};
use crate::events::{EffectKind, Signal};
use crate::fsm::{StateEntry, StateHandlers, StateMachine};
use crate::projectile::{LaserHeight, ProjectileSpawn};
use crate::timer::TimerEvent;

/// Boss states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossState {
    /// Dormant until the encounter is activated
    Waiting,
    /// Intro sequence
    Intro,
    /// Repositioning between moves
    Idle,
    /// Ground slam
    Slam,
    /// Laser sequence
    Laser,
    /// Core exposed
    Vulnerable,
    /// Defeated; terminal
    Dying,
}

impl BossState {
    /// All boss states.
    pub const ALL: [Self; 7] = [
        Self::Waiting,
        Self::Intro,
        Self::Idle,
        Self::Slam,
        Self::Laser,
        Self::Vulnerable,
        Self::Dying,
    ];
}

impl From<BossMove> for BossState {
    fn from(value: BossMove) -> Self {
        match value {
            BossMove::Slam => Self::Slam,
            BossMove::Laser => Self::Laser,
            BossMove::Vulnerable => Self::Vulnerable,
        }
    }
}

/// Encounter state outside the machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossPhase {
    /// Encounter started
    pub is_active: bool,
    /// Core exposed
    pub is_vulnerable: bool,
    /// Enrage multiplier; never decreases
    pub enrage: f32,
    /// Next entry of the attack pattern
    pub pattern_index: usize,
    /// Walking toward `target_x`
    pub is_moving: bool,
    /// Where the boss is walking to
    pub target_x: f32,
}

impl Default for BossPhase {
    fn default() -> Self {
        Self {
            is_active: false,
            is_vulnerable: false,
            enrage: 1.0,
            pattern_index: 0,
            is_moving: false,
            target_x: 0.0,
        }
    }
}

impl BossPhase {
    /// Raises the enrage multiplier after the boss lost health.
    ///
    /// Returns whether the multiplier changed.
    pub fn register_damage(&mut self, health_fraction: f32, tuning: &BossTuning) -> bool {
        let enrage = tuning.enrage_for(health_fraction);
        if enrage > self.enrage {
            info!(from = self.enrage, to = enrage, "boss enraged");
            self.enrage = enrage;
            return true;
        }
        false
    }

    /// Takes the next move of the pattern and advances the cursor.
    pub fn next_move(&mut self, pattern: &[BossMove]) -> BossMove {
        let Some(&next) = pattern.get(self.pattern_index % pattern.len().max(1)) else {
            return BossMove::Slam;
        };
        self.pattern_index = (self.pattern_index + 1) % pattern.len();
        next
    }
}

/// Builds the boss actor record at `position`.
#[must_use]
pub fn build_boss(id: ActorId, position: Vec2, tuning: &BossTuning) -> Actor {
    let mut actor = Actor::new(id, ActorKind::Boss, position, tuning.max_health)
        .with_size(tuning.body_width, tuning.body_height)
        .with_contact_damage(tuning.contact_damage)
        .with_facing(Facing::Left);
    actor.flags.is_invulnerable = true;
    actor
}

/// Everything the boss behaviour touches during one call.
pub struct BossCtx<'a> {
    /// Boss record
    pub actor: &'a mut Actor,
    /// Encounter state
    pub phase: &'a mut BossPhase,
    /// The player, if one exists
    pub target: Option<TargetInfo>,
    /// Boss tuning
    pub tuning: &'a BossTuning,
    /// Shared collaborators
    pub env: Env<'a>,
}

impl BossCtx<'_> {
    fn set_vulnerable(&mut self, vulnerable: bool) {
        if self.phase.is_vulnerable == vulnerable {
            return;
        }
        self.phase.is_vulnerable = vulnerable;
        self.actor.flags.is_invulnerable = !vulnerable;
        self.env.signals.push(Signal::BossVulnerability(vulnerable));
        let effect = if vulnerable {
            EffectKind::CoreExposed
        } else {
            EffectKind::CoreHidden
        };
        self.env.effect(effect, self.actor.body().center());
    }

    fn shake(&mut self, duration_ms: u64, intensity: f32) {
        self.env
            .effect(EffectKind::CameraShake { duration_ms, intensity }, self.actor.position);
    }

    /// Picks a spot `keep_distance` from the player on the boss's side.
    fn approach_player(&mut self) {
        let Some(target) = TargetInfo::alive(self.target) else {
            return;
        };
        let side = if target.position.x < self.actor.position.x {
            1.0
        } else {
            -1.0
        };
        let desired = target.position.x + side * self.tuning.keep_distance;
        self.phase.target_x = self
            .env
            .world
            .bounds()
            .clamp_x(desired, self.tuning.lane_inset);
        self.phase.is_moving = true;
    }

    /// Faces the player and walks toward the chosen spot.
    fn steer(&mut self) {
        if let Some(target) = TargetInfo::alive(self.target) {
            self.actor.facing = Facing::toward(self.actor.position.x, target.position.x);
        }

        let free = !self.actor.flags.is_attacking && !self.phase.is_vulnerable;
        if !(self.phase.is_moving && free) {
            self.actor.velocity.x = 0.0;
            return;
        }
        let dx = self.phase.target_x - self.actor.position.x;
        if dx.abs() > self.tuning.arrive_tolerance {
            self.actor.velocity.x = dx.signum() * self.tuning.move_speed;
        } else {
            self.actor.velocity.x = 0.0;
            self.phase.is_moving = false;
        }
    }

    fn slam_impact(&mut self) {
        let (id, feet, enrage) = (self.actor.id, self.actor.position, self.phase.enrage);
        for facing in [Facing::Left, Facing::Right] {
            self.env.spawns.push(ProjectileSpawn::shockwave(
                id,
                feet,
                facing,
                &self.tuning.slam,
                enrage,
                self.tuning.hazard_cull_margin,
            ));
        }
        self.env.sound("boss_impact");
        self.shake(300, 0.02);
    }

    fn announce_laser(&mut self) {
        let height = LaserHeight::random(self.env.rng);
        let bounds = self.env.world.bounds();
        let y = self.actor.position.y - height.offset(&self.tuning.laser);
        self.env.effect(
            EffectKind::LaserWarning { height },
            Vec2::new((bounds.min_x + bounds.max_x) / 2.0, y),
        );
        self.env.sound("laser_warning");
        self.env
            .after(self.actor.id, self.tuning.laser.warning_ms, TimerEvent::LaserFire(height));
    }

    fn fire_laser(&mut self, height: LaserHeight) {
        let bounds = self.env.world.bounds();
        self.env.spawns.push(ProjectileSpawn::laser_beam(
            self.actor.id,
            self.actor.position.y,
            height,
            &bounds,
            &self.tuning.laser,
            self.tuning.hazard_cull_margin,
        ));
        self.env.sound("laser_fire");
    }
}

// ============================================================================
// Behaviour table
// ============================================================================

/// Boss state handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BossBehavior;

impl<'a> StateHandlers<BossCtx<'a>> for BossBehavior {
    type State = BossState;
    type Event = TimerEvent;
    const LABEL: &'static str = "boss";

    fn enter(&self, ctx: &mut BossCtx<'a>, entry: StateEntry<BossState>) -> Option<BossState> {
        let id = ctx.actor.id;
        let epoch = entry.epoch;
        match entry.state {
            BossState::Waiting => ctx.actor.velocity = Vec2::ZERO,
            BossState::Intro => {
                info!(boss = %id, "boss encounter started");
                ctx.env.animate(id, "intro");
                ctx.env.sound("boss_roar");
                ctx.shake(1000, 0.01);
                ctx.env
                    .after_in_state(id, epoch, ctx.tuning.intro_ms, TimerEvent::IntroFinished);
            },
            BossState::Idle => {
                ctx.set_vulnerable(false);
                ctx.actor.flags.is_attacking = false;
                ctx.env.animate(id, "idle");
                ctx.approach_player();
                let cooldown = ctx.tuning.idle_cooldown(ctx.phase.enrage);
                ctx.env
                    .after_in_state(id, epoch, cooldown, TimerEvent::CooldownElapsed);
            },
            BossState::Slam => {
                ctx.actor.flags.is_attacking = true;
                ctx.phase.is_moving = false;
                ctx.actor.velocity.x = 0.0;
                ctx.env.animate(id, "slam");
                ctx.env.sound("boss_slam");
                let slam = ctx.tuning.slam;
                ctx.env
                    .after_in_state(id, epoch, slam.impact_ms, TimerEvent::SlamImpact);
                ctx.env
                    .after_in_state(id, epoch, slam.recover_ms, TimerEvent::SlamFinished);
            },
            BossState::Laser => {
                ctx.actor.flags.is_attacking = true;
                ctx.phase.is_moving = false;
                ctx.actor.velocity.x = 0.0;
                ctx.env.animate(id, "laser");
                ctx.env.sound("boss_charge");
                let laser = ctx.tuning.laser;
                let beams = laser.beams(ctx.phase.enrage);
                for i in 0..beams {
                    ctx.env.after_in_state(
                        id,
                        epoch,
                        u64::from(i) * laser.spacing_ms,
                        TimerEvent::LaserWarning,
                    );
                }
                ctx.env.after_in_state(
                    id,
                    epoch,
                    laser.sequence_ms(beams),
                    TimerEvent::LaserFinished,
                );
            },
            BossState::Vulnerable => {
                ctx.actor.flags.is_attacking = false;
                ctx.phase.is_moving = false;
                ctx.actor.velocity.x = 0.0;
                ctx.set_vulnerable(true);
                ctx.env.animate(id, "vulnerable");
                ctx.env.sound("boss_exposed");
                let window = ctx.tuning.vulnerable_window(ctx.phase.enrage);
                ctx.env
                    .after_in_state(id, epoch, window, TimerEvent::VulnerableExpired);
            },
            BossState::Dying => {
                ctx.env.timers.cancel_owner(id);
                ctx.set_vulnerable(false);
                ctx.actor.kill();
                ctx.phase.is_moving = false;
                ctx.actor.velocity = Vec2::ZERO;
                info!(boss = %id, "boss defeated");
                ctx.env.animate(id, "die");
                ctx.env.sound("boss_death");
                ctx.shake(1500, 0.03);
                ctx.env
                    .after_in_state(id, epoch, ctx.tuning.death_ms, TimerEvent::DeathFinished);
            },
        }
        None
    }

    fn update(&self, ctx: &mut BossCtx<'a>, state: BossState) -> Option<BossState> {
        match state {
            BossState::Waiting => ctx.phase.is_active.then_some(BossState::Intro),
            BossState::Dying => None,
            _ => {
                ctx.steer();
                None
            },
        }
    }

    fn exit(&self, ctx: &mut BossCtx<'a>, state: BossState) {
        match state {
            BossState::Vulnerable => ctx.set_vulnerable(false),
            BossState::Slam | BossState::Laser => ctx.actor.flags.is_attacking = false,
            _ => {},
        }
    }

    fn event(&self, ctx: &mut BossCtx<'a>, state: BossState, event: TimerEvent) -> Option<BossState> {
        match (state, event) {
            (BossState::Dying, TimerEvent::DeathFinished) => {
                ctx.env.signals.push(Signal::EncounterCompleted);
                ctx.actor.reap = true;
                None
            },
            (BossState::Dying, _) => None,
            (_, TimerEvent::LaserFire(height)) => {
                ctx.fire_laser(height);
                None
            },
            (BossState::Intro, TimerEvent::IntroFinished)
            | (BossState::Slam, TimerEvent::SlamFinished)
            | (BossState::Laser, TimerEvent::LaserFinished)
            | (BossState::Vulnerable, TimerEvent::VulnerableExpired) => Some(BossState::Idle),
            (BossState::Idle, TimerEvent::CooldownElapsed) => {
                Some(ctx.phase.next_move(&ctx.tuning.pattern).into())
            },
            (BossState::Slam, TimerEvent::SlamImpact) => {
                ctx.slam_impact();
                None
            },
            (BossState::Laser, TimerEvent::LaserWarning) => {
                ctx.announce_laser();
                None
            },
            _ => None,
        }
    }
}

// ============================================================================
// Machine
// ============================================================================

/// Boss state machine with its entry points.
#[derive(Debug, Clone)]
pub struct BossMachine {
    machine: StateMachine<BossState>,
}

impl Default for BossMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl BossMachine {
    /// Creates a machine that has not entered any state yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            machine: StateMachine::new(&BossState::ALL, BossState::Idle),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> Option<BossState> {
        self.machine.current()
    }

    /// Transition epoch, for timer validity.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.machine.epoch()
    }

    /// Enters the dormant state.
    pub fn start(&mut self, ctx: &mut BossCtx<'_>) {
        self.machine.goto(&BossBehavior, ctx, BossState::Waiting);
    }

    /// Starts the encounter if it has not started yet.
    pub fn activate(&mut self, ctx: &mut BossCtx<'_>) {
        ctx.phase.is_active = true;
        if self.machine.is(BossState::Waiting) {
            self.machine.goto(&BossBehavior, ctx, BossState::Intro);
        }
    }

    /// Runs the current state's update.
    pub fn tick(&mut self, ctx: &mut BossCtx<'_>) {
        self.machine.update(&BossBehavior, ctx);
    }

    /// Delivers a timer event.
    pub fn dispatch(&mut self, ctx: &mut BossCtx<'_>, event: TimerEvent) {
        self.machine.dispatch(&BossBehavior, ctx, event);
    }

    /// Reacts to damage that landed. The boss keeps its current move.
    pub fn hurt(&mut self, ctx: &mut BossCtx<'_>) {
        let fraction = ctx.actor.health_fraction();
        ctx.phase.register_damage(fraction, ctx.tuning);
        ctx.env.sound("boss_hit");
    }

    /// Reacts to the killing blow.
    pub fn die(&mut self, ctx: &mut BossCtx<'_>) {
        if !self.machine.is(BossState::Dying) {
            self.machine.goto(&BossBehavior, ctx, BossState::Dying);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullPresentation;
    use crate::timer::Scheduler;
    use crate::world::FloorMap;
    use corebreak_common::{Millis, WorldBounds};
    use proptest::prelude::*;

    const FLOOR: f32 = 600.0;

    struct Rig {
        actor: Actor,
        machine: BossMachine,
        phase: BossPhase,
        target: Option<TargetInfo>,
        tuning: BossTuning,
        world: FloorMap,
        timers: Scheduler,
        fx: NullPresentation,
        rng: fastrand::Rng,
        spawns: Vec<ProjectileSpawn>,
        signals: Vec<Signal>,
        now: Millis,
    }

    impl Rig {
        fn new() -> Self {
            let tuning = BossTuning::default();
            let mut rig = Self {
                actor: build_boss(ActorId::from_raw(50), Vec2::new(952.0, FLOOR), &tuning),
                machine: BossMachine::new(),
                phase: BossPhase::default(),
                target: Some(TargetInfo {
                    id: ActorId::from_raw(1),
                    position: Vec2::new(288.0, FLOOR),
                    is_dead: false,
                }),
                tuning,
                world: FloorMap::flat(WorldBounds::sized(1152.0, 648.0), FLOOR),
                timers: Scheduler::new(),
                fx: NullPresentation,
                rng: fastrand::Rng::with_seed(11),
                spawns: Vec::new(),
                signals: Vec::new(),
                now: 0,
            };
            rig.with_ctx(|m, ctx| m.start(ctx));
            rig
        }

        fn with_ctx(&mut self, f: impl FnOnce(&mut BossMachine, &mut BossCtx<'_>)) {
            let mut ctx = BossCtx {
                actor: &mut self.actor,
                phase: &mut self.phase,
                target: self.target,
                tuning: &self.tuning,
                env: Env {
                    now: self.now,
                    dt: 50,
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

        fn step(&mut self) {
            self.now += 50;
            while let Some(timer) = self.timers.pop_due(self.now) {
                if timer.is_current(self.machine.epoch()) {
                    self.with_ctx(|m, ctx| m.dispatch(ctx, timer.event));
                }
            }
            self.with_ctx(|m, ctx| m.tick(ctx));
        }

        fn run_until(&mut self, state: BossState, limit: Millis) -> Millis {
            let start = self.now;
            while self.machine.state() != Some(state) {
                assert!(self.now - start < limit, "never reached {state:?}");
                self.step();
            }
            self.now - start
        }
    }

    #[test]
    fn test_waits_until_activated() {
        let mut rig = Rig::new();
        for _ in 0..10 {
            rig.step();
        }
        assert_eq!(rig.machine.state(), Some(BossState::Waiting));

        rig.with_ctx(|m, ctx| m.activate(ctx));
        assert_eq!(rig.machine.state(), Some(BossState::Intro));
        assert_eq!(rig.run_until(BossState::Idle, 2500), 2000);
    }

    #[test]
    fn test_pattern_cycle_and_vulnerability() {
        let mut rig = Rig::new();
        rig.with_ctx(|m, ctx| m.activate(ctx));
        rig.run_until(BossState::Idle, 2500);

        assert_eq!(rig.run_until(BossState::Slam, 3500), 3000);
        assert!(rig.actor.flags.is_invulnerable);
        rig.run_until(BossState::Idle, 1500);
        assert_eq!(rig.spawns.len(), 2);

        rig.run_until(BossState::Laser, 3500);
        rig.run_until(BossState::Idle, 2500);
        rig.run_until(BossState::Vulnerable, 3500);
        assert!(rig.phase.is_vulnerable);
        assert!(!rig.actor.flags.is_invulnerable);
        assert_eq!(rig.signals, vec![Signal::BossVulnerability(true)]);

        assert_eq!(rig.run_until(BossState::Idle, 4500), 4000);
        assert!(rig.actor.flags.is_invulnerable);
        assert_eq!(rig.signals.last(), Some(&Signal::BossVulnerability(false)));

        // Lasers outlive the laser state: both beams fire eventually.
        let beams = rig
            .spawns
            .iter()
            .filter(|s| s.kind == crate::projectile::ProjectileKind::LaserBeam)
            .count();
        assert_eq!(beams, 2);
    }

    #[test]
    fn test_walks_to_keep_distance_inside_lane() {
        let mut rig = Rig::new();
        rig.with_ctx(|m, ctx| m.activate(ctx));
        rig.run_until(BossState::Idle, 2500);
        assert!(rig.phase.is_moving);
        assert_eq!(rig.phase.target_x, 488.0);
        rig.step();
        assert_eq!(rig.actor.velocity.x, -80.0);
        assert_eq!(rig.actor.facing, Facing::Left);

        rig.target = Some(TargetInfo {
            id: ActorId::from_raw(1),
            position: Vec2::new(1100.0, FLOOR),
            is_dead: false,
        });
        rig.with_ctx(|_, ctx| ctx.approach_player());
        assert_eq!(rig.phase.target_x, 852.0);
    }

    #[test]
    fn test_enraged_cooldowns_apply_next_cycle() {
        let mut rig = Rig::new();
        rig.with_ctx(|m, ctx| m.activate(ctx));
        rig.run_until(BossState::Idle, 2500);
        rig.run_until(BossState::Slam, 3500);

        rig.actor.flags.is_invulnerable = false;
        rig.actor.take_damage(215.0);
        rig.actor.flags.is_invulnerable = true;
        rig.with_ctx(|m, ctx| m.hurt(ctx));
        assert_eq!(rig.phase.enrage, 1.5);
        assert_eq!(rig.machine.state(), Some(BossState::Slam));

        rig.run_until(BossState::Idle, 1500);
        assert_eq!(rig.run_until(BossState::Laser, 3500), 2000);
    }

    #[test]
    fn test_death_completes_encounter_once() {
        let mut rig = Rig::new();
        rig.with_ctx(|m, ctx| m.activate(ctx));
        rig.run_until(BossState::Idle, 2500);

        rig.actor.flags.is_invulnerable = false;
        rig.actor.take_damage(1000.0);
        rig.with_ctx(|m, ctx| m.die(ctx));
        rig.with_ctx(|m, ctx| m.die(ctx));
        assert_eq!(rig.machine.state(), Some(BossState::Dying));

        for _ in 0..60 {
            rig.step();
        }
        let completions = rig
            .signals
            .iter()
            .filter(|s| **s == Signal::EncounterCompleted)
            .count();
        assert_eq!(completions, 1);
        assert!(rig.actor.reap);
        assert_eq!(rig.machine.state(), Some(BossState::Dying));
    }

    #[test]
    fn test_pattern_cursor_wraps() {
        let mut phase = BossPhase::default();
        let pattern = [BossMove::Slam, BossMove::Vulnerable];
        assert_eq!(phase.next_move(&pattern), BossMove::Slam);
        assert_eq!(phase.next_move(&pattern), BossMove::Vulnerable);
        assert_eq!(phase.next_move(&pattern), BossMove::Slam);
    }

    proptest! {
        #[test]
        fn prop_enrage_never_decreases(fractions in prop::collection::vec(0.0f32..1.0, 1..30)) {
            let tuning = BossTuning::default();
            let mut phase = BossPhase::default();
            let mut last = phase.enrage;
            for f in fractions {
                phase.register_damage(f, &tuning);
                prop_assert!(phase.enrage >= last);
                last = phase.enrage;
            }
        }
    }
}
