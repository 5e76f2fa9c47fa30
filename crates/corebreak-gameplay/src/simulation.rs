//! Per-tick simulation driver.
//!
//! [`Simulation`] owns every actor, projectile and pickup of one level and
//! advances them in a fixed order:
//!
//! 1. advance the clock and sample input
//! 2. fire due timers
//! 3. update behaviours: player, then enemies, then the boss
//! 4. integrate kinematics and move attack zones
//! 5. advance, cull and launch projectiles
//! 6. resolve combat
//! 7. forward behaviour signals to the sink
//! 8. reap actors whose death sequence finished
//! 9. check level completion
//!
//! The host injects the event sink and presentation on every tick, so the
//! simulation holds no reference to either between ticks. Requests raised
//! while spawning are buffered and handed to the next tick's presentation.

use corebreak_common::{
    ActorId, CoreResult, Facing, IdAllocator, Millis, PickupId, SimulationError, Vec2,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::actor::{Actor, ActorKind};
use crate::boss::{build_boss, BossMachine, BossPhase, BossState};
use crate::combat::Scene;
use crate::combatant::{Brain, Combatant, Drive, Shared};
use crate::config::CombatConfig;
use crate::context::{Env, TargetInfo};
use crate::enemy::{EnemyArchetype, EnemyMachine, EnemyMemory, EnemyState};
use crate::events::{DeferredPresentation, EventSink, Presentation, Signal};
use crate::input::{InputSnapshot, InputState};
use crate::physics;
use crate::pickup::{Pickup, PickupKind};
use crate::player::{build_player, PlayerGear, PlayerMachine, PlayerState};
use crate::projectile::{Projectile, ProjectileSpawn};
use crate::timer::Scheduler;
use crate::world::WorldQuery;

// ============================================================================
// Level bookkeeping
// ============================================================================

/// How a level is won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    /// Won once every spawned enemy has been reaped
    Stage,
    /// Won when the boss encounter completes
    BossEncounter,
}

/// Outcome tracking for one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelState {
    /// Identifier reported to the sink
    pub level_id: String,
    /// Win condition
    pub kind: LevelKind,
    completed: bool,
    failed: bool,
    hostiles_spawned: usize,
}

impl LevelState {
    /// Creates an unresolved level.
    #[must_use]
    pub fn new(level_id: impl Into<String>, kind: LevelKind) -> Self {
        Self {
            level_id: level_id.into(),
            kind,
            completed: false,
            failed: false,
            hostiles_spawned: 0,
        }
    }

    /// Stage level.
    #[must_use]
    pub fn stage(level_id: impl Into<String>) -> Self {
        Self::new(level_id, LevelKind::Stage)
    }

    /// Boss encounter level.
    #[must_use]
    pub fn boss_encounter(level_id: impl Into<String>) -> Self {
        Self::new(level_id, LevelKind::BossEncounter)
    }

    /// Level was won.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Level was lost.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Either outcome was reached.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.completed || self.failed
    }

    fn complete(&mut self, sink: &mut dyn EventSink) {
        if self.is_resolved() {
            return;
        }
        self.completed = true;
        info!(level = %self.level_id, "level completed");
        sink.on_level_completed(&self.level_id);
    }

    fn fail(&mut self, sink: &mut dyn EventSink) {
        if self.is_resolved() {
            return;
        }
        self.failed = true;
        info!(level = %self.level_id, "level failed");
        sink.on_level_failed(&self.level_id);
    }
}

// ============================================================================
// Runtime
// ============================================================================

/// Mutable collaborators handed to behaviours through [`Env`].
#[derive(Debug)]
struct Runtime {
    now: Millis,
    timers: Scheduler,
    rng: fastrand::Rng,
    spawns: Vec<ProjectileSpawn>,
    signals: Vec<Signal>,
    staged: DeferredPresentation,
}

impl Runtime {
    fn new(seed: u64) -> Self {
        Self {
            now: 0,
            timers: Scheduler::new(),
            rng: fastrand::Rng::with_seed(seed),
            spawns: Vec::new(),
            signals: Vec::new(),
            staged: DeferredPresentation::default(),
        }
    }

    fn env<'a>(
        &'a mut self,
        dt: Millis,
        world: &'a dyn WorldQuery,
        fx: &'a mut dyn Presentation,
    ) -> Env<'a> {
        Env {
            now: self.now,
            dt,
            world,
            timers: &mut self.timers,
            fx,
            rng: &mut self.rng,
            spawns: &mut self.spawns,
            signals: &mut self.signals,
        }
    }
}

/// Update order: player, enemies, boss.
fn update_rank(kind: ActorKind) -> u8 {
    match kind {
        ActorKind::Player => 0,
        ActorKind::Boss => 2,
        _ => 1,
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// One level's worth of combat.
pub struct Simulation<W: WorldQuery> {
    config: CombatConfig,
    world: W,
    level: LevelState,
    runtime: Runtime,
    ids: IdAllocator,
    input: InputState,
    roster: Vec<Combatant>,
    projectiles: Vec<Projectile>,
    pickups: Vec<Pickup>,
}

impl<W: WorldQuery> Simulation<W> {
    /// Creates an empty level.
    ///
    /// `seed` drives every random choice, so equal seeds and inputs give
    /// equal runs.
    pub fn new(config: CombatConfig, world: W, level: LevelState, seed: u64) -> Self {
        info!(level = %level.level_id, kind = ?level.kind, seed, "simulation created");
        Self {
            config,
            world,
            level,
            runtime: Runtime::new(seed),
            ids: IdAllocator::default(),
            input: InputState::new(),
            roster: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------------

    fn enroll(&mut self, actor: Actor, brain: Brain) -> ActorId {
        let mut combatant = Combatant { actor, brain };
        let id = combatant.id();
        let shared = Shared {
            config: &self.config,
            input: &self.input,
            target: self.player_target(),
        };
        // Spawning happens between ticks; enter requests reach the host on the next tick.
        let mut staged = std::mem::take(&mut self.runtime.staged);
        combatant.drive(&shared, self.runtime.env(0, &self.world, &mut staged), Drive::Start);
        self.runtime.staged = staged;
        debug!(actor = %id, kind = combatant.kind().tag(), "actor spawned");
        self.roster.push(combatant);
        id
    }

    /// Spawns the player. Only one player may exist.
    pub fn spawn_player(&mut self, position: Vec2) -> CoreResult<ActorId> {
        if let Some(existing) = self.player_id() {
            return Err(SimulationError::PlayerAlreadySpawned(existing).into());
        }
        let id = self.ids.next_actor();
        let actor = build_player(id, position, &self.config.player);
        Ok(self.enroll(
            actor,
            Brain::Player {
                machine: PlayerMachine::new(),
                gear: PlayerGear::default(),
            },
        ))
    }

    /// Spawns an enemy facing a random direction.
    pub fn spawn_enemy(&mut self, archetype: EnemyArchetype, position: Vec2) -> ActorId {
        let id = self.ids.next_actor();
        let mut actor = archetype.build_actor(id, position, &self.config);
        actor.facing = Facing::from_bool(self.runtime.rng.bool());
        self.level.hostiles_spawned += 1;
        self.enroll(
            actor,
            Brain::Enemy {
                machine: EnemyMachine::new(archetype),
                memory: EnemyMemory::default(),
            },
        )
    }

    /// Spawns the dormant boss. It stays in its waiting state until
    /// [`Simulation::activate_boss`] is called.
    pub fn spawn_boss(&mut self, position: Vec2) -> ActorId {
        let id = self.ids.next_actor();
        let actor = build_boss(id, position, &self.config.boss);
        self.level.hostiles_spawned += 1;
        self.enroll(
            actor,
            Brain::Boss {
                machine: BossMachine::new(),
                phase: BossPhase::default(),
            },
        )
    }

    /// Drops a pickup into the level.
    pub fn spawn_pickup(&mut self, kind: PickupKind, position: Vec2) -> PickupId {
        let id = self.ids.next_pickup();
        self.pickups.push(Pickup {
            id,
            kind,
            position,
            size: self.config.pickups.size,
        });
        id
    }

    /// Starts the boss encounter.
    pub fn activate_boss(&mut self, fx: &mut dyn Presentation) -> CoreResult<ActorId> {
        let index = self
            .roster
            .iter()
            .position(|c| c.kind() == ActorKind::Boss)
            .ok_or(SimulationError::MissingActor("boss"))?;
        self.runtime.staged.replay(fx);
        let shared = Shared {
            config: &self.config,
            input: &self.input,
            target: self.player_target(),
        };
        let combatant = &mut self.roster[index];
        combatant.drive(&shared, self.runtime.env(0, &self.world, fx), Drive::Activate);
        Ok(combatant.id())
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advances the simulation by `dt` milliseconds.
    pub fn tick(
        &mut self,
        dt: Millis,
        snapshot: &InputSnapshot,
        sink: &mut dyn EventSink,
        fx: &mut dyn Presentation,
    ) {
        self.runtime.now += dt;
        self.input.advance(*snapshot);
        self.runtime.staged.replay(fx);

        self.fire_timers(dt, fx);
        self.update_behaviours(dt, fx);
        self.move_bodies(dt);
        self.advance_projectiles(dt);
        self.resolve_combat(dt, sink, fx);
        self.flush_signals(sink);
        self.reap();
        self.check_completion(sink);
    }

    fn player_target(&self) -> Option<TargetInfo> {
        self.roster
            .iter()
            .find(|c| c.kind() == ActorKind::Player)
            .map(Combatant::target_info)
    }

    fn fire_timers(&mut self, dt: Millis, fx: &mut dyn Presentation) {
        while let Some(timer) = self.runtime.timers.pop_due(self.runtime.now) {
            let Some(index) = self.index_of(timer.owner) else {
                warn!(timer = %timer.id, owner = %timer.owner, "timer for missing actor dropped");
                continue;
            };
            if !timer.is_current(self.roster[index].epoch()) {
                trace!(timer = %timer.id, event = ?timer.event, "stale timer dropped");
                continue;
            }
            let target = self.player_target();
            let shared = Shared {
                config: &self.config,
                input: &self.input,
                target,
            };
            self.roster[index].drive(
                &shared,
                self.runtime.env(dt, &self.world, fx),
                Drive::Timer(timer.event),
            );
        }
    }

    fn update_behaviours(&mut self, dt: Millis, fx: &mut dyn Presentation) {
        for rank in 0..=2 {
            let target = self.player_target();
            let shared = Shared {
                config: &self.config,
                input: &self.input,
                target,
            };
            for combatant in &mut self.roster {
                if update_rank(combatant.kind()) == rank {
                    combatant.drive(&shared, self.runtime.env(dt, &self.world, fx), Drive::Tick);
                }
            }
        }
    }

    fn move_bodies(&mut self, dt: Millis) {
        for combatant in &mut self.roster {
            physics::integrate(
                &mut combatant.actor,
                dt,
                &self.world,
                self.config.terminal_velocity,
            );
            combatant.actor.sync_zone();
        }
    }

    fn advance_projectiles(&mut self, dt: Millis) {
        let now = self.runtime.now;
        let bounds = self.world.bounds();
        for projectile in &mut self.projectiles {
            projectile.advance(dt);
        }
        self.projectiles.retain(|p| {
            let keep = !p.is_expired(now) && !p.is_outside(&bounds);
            if !keep {
                trace!(projectile = %p.id, kind = ?p.kind(), "projectile culled");
            }
            keep
        });
        for spawn in self.runtime.spawns.drain(..) {
            let id = self.ids.next_projectile();
            self.projectiles.push(Projectile::launch(id, spawn, now));
        }
    }

    fn resolve_combat(&mut self, dt: Millis, sink: &mut dyn EventSink, fx: &mut dyn Presentation) {
        let shared = Shared {
            config: &self.config,
            input: &self.input,
            target: self.player_target(),
        };
        let mut scene = Scene {
            roster: &mut self.roster,
            projectiles: &mut self.projectiles,
            pickups: &mut self.pickups,
            shared,
            env: self.runtime.env(dt, &self.world, fx),
            sink: &mut *sink,
        };
        scene.resolve();
    }

    fn flush_signals(&mut self, sink: &mut dyn EventSink) {
        for signal in std::mem::take(&mut self.runtime.signals) {
            match signal {
                Signal::LevelFailed => self.level.fail(sink),
                Signal::BossVulnerability(open) => sink.on_boss_vulnerability(open),
                Signal::EncounterCompleted => {
                    info!(level = %self.level.level_id, "encounter completed");
                    sink.on_encounter_completed();
                    if self.level.kind == LevelKind::BossEncounter {
                        self.level.complete(sink);
                    }
                },
            }
        }
    }

    fn reap(&mut self) {
        let timers = &mut self.runtime.timers;
        self.roster.retain(|c| {
            if !c.actor.reap {
                return true;
            }
            let cancelled = timers.cancel_owner(c.id());
            debug!(actor = %c.id(), kind = c.kind().tag(), cancelled, "actor reaped");
            false
        });
    }

    fn check_completion(&mut self, sink: &mut dyn EventSink) {
        if self.level.kind != LevelKind::Stage
            || self.level.is_resolved()
            || self.level.hostiles_spawned == 0
        {
            return;
        }
        if !self.roster.iter().any(|c| c.kind().is_hostile()) {
            self.level.complete(sink);
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    fn index_of(&self, id: ActorId) -> Option<usize> {
        self.roster.iter().position(|c| c.id() == id)
    }

    /// Simulated time (ms).
    #[must_use]
    pub fn now(&self) -> Millis {
        self.runtime.now
    }

    /// Tuning in use.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Mutable tuning. Changes apply from the next tick; actors already
    /// spawned keep their health and body size.
    pub fn config_mut(&mut self) -> &mut CombatConfig {
        &mut self.config
    }

    /// Level geometry.
    #[must_use]
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Level outcome.
    #[must_use]
    pub fn level(&self) -> &LevelState {
        &self.level
    }

    /// Live actors in spawn order.
    #[must_use]
    pub fn roster(&self) -> &[Combatant] {
        &self.roster
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Pickups lying in the level.
    #[must_use]
    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// Number of scheduled timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.runtime.timers.len()
    }

    /// Looks up a live actor.
    pub fn combatant(&self, id: ActorId) -> CoreResult<&Combatant> {
        self.roster
            .iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| SimulationError::UnknownActor(id).into())
    }

    /// Actor record of a live actor.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.roster.iter().find(|c| c.id() == id).map(|c| &c.actor)
    }

    /// Mutable actor record of a live actor.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.roster
            .iter_mut()
            .find(|c| c.id() == id)
            .map(|c| &mut c.actor)
    }

    /// Player handle, if the player exists.
    #[must_use]
    pub fn player_id(&self) -> Option<ActorId> {
        crate::combat::find_kind(&self.roster, ActorKind::Player)
    }

    /// Boss handle, if the boss exists.
    #[must_use]
    pub fn boss_id(&self) -> Option<ActorId> {
        crate::combat::find_kind(&self.roster, ActorKind::Boss)
    }

    /// Player state, if the player exists.
    #[must_use]
    pub fn player_state(&self) -> Option<PlayerState> {
        self.roster.iter().find_map(Combatant::player_state)
    }

    /// Player equipment, if the player exists.
    #[must_use]
    pub fn player_gear(&self) -> Option<&PlayerGear> {
        self.roster.iter().find_map(Combatant::gear)
    }

    /// State of the enemy `id`.
    pub fn enemy_state(&self, id: ActorId) -> CoreResult<EnemyState> {
        let combatant = self.combatant(id)?;
        combatant.enemy_state().ok_or_else(|| {
            SimulationError::WrongKind {
                id,
                expected: "enemy",
                actual: combatant.kind().tag(),
            }
            .into()
        })
    }

    /// Boss state, if the boss exists.
    #[must_use]
    pub fn boss_state(&self) -> Option<BossState> {
        self.roster.iter().find_map(Combatant::boss_state)
    }

    /// Boss encounter state, if the boss exists.
    #[must_use]
    pub fn boss_phase(&self) -> Option<&BossPhase> {
        self.roster.iter().find_map(Combatant::phase)
    }
}
