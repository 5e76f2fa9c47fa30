//! End-to-end combat scenarios driven through the public simulation API.

use corebreak_common::{ActorId, Millis, Vec2, WorldBounds};
use corebreak_gameplay::prelude::*;

const DT: Millis = 20;
const STAGE_FLOOR: f32 = 500.0;
const ARENA_FLOOR: f32 = 600.0;

struct Harness {
    sim: Simulation<FloorMap>,
    sink: RecordingSink,
    fx: NullPresentation,
}

impl Harness {
    fn stage(config: CombatConfig, width: f32) -> Self {
        Self {
            sim: Simulation::new(
                config,
                FloorMap::flat(WorldBounds::sized(width, 600.0), STAGE_FLOOR),
                LevelState::stage("scenario-stage"),
                42,
            ),
            sink: RecordingSink::new(),
            fx: NullPresentation,
        }
    }

    fn arena(config: CombatConfig) -> Self {
        Self {
            sim: Simulation::new(
                config,
                FloorMap::flat(WorldBounds::sized(1152.0, 648.0), ARENA_FLOOR),
                LevelState::boss_encounter("scenario-arena"),
                42,
            ),
            sink: RecordingSink::new(),
            fx: NullPresentation,
        }
    }

    fn tick(&mut self, input: InputSnapshot) {
        self.sim.tick(DT, &input, &mut self.sink, &mut self.fx);
    }

    fn run(&mut self, ms: Millis) {
        let end = self.sim.now() + ms;
        while self.sim.now() < end {
            self.tick(InputSnapshot::idle());
        }
    }

    fn run_until(&mut self, limit: Millis, mut done: impl FnMut(&Simulation<FloorMap>) -> bool) {
        let end = self.sim.now() + limit;
        while !done(&self.sim) {
            assert!(self.sim.now() < end, "condition not reached within {limit} ms");
            self.tick(InputSnapshot::idle());
        }
    }

    fn health(&self, id: ActorId) -> f32 {
        self.sim.actor(id).map_or(0.0, Actor::health)
    }

    /// Presses attack for one tick.
    fn swing(&mut self) {
        self.tick(InputSnapshot::idle().with_attack(true));
    }

    /// Presses alt-fire for one tick.
    fn shoot(&mut self) {
        self.tick(InputSnapshot::idle().with_alt_fire(true));
    }
}

/// Tuning with a passive ground enemy that never walks or chases.
fn passive_enemy_config() -> CombatConfig {
    let mut config = CombatConfig::default();
    config.ground_melee.walk_speed = 0.0;
    config.ground_melee.detection_range = 0.0;
    config
}

/// Tuning for boss fights where the player only needs to stay alive.
fn sturdy_player_config() -> CombatConfig {
    let mut config = CombatConfig::default();
    config.player.max_health = 10_000.0;
    config
}

/// Starts the boss fight with an armed player on the left.
fn armed_arena(config: CombatConfig) -> (Harness, ActorId) {
    let mut h = Harness::arena(config);
    h.sim
        .spawn_player(Vec2::new(288.0, ARENA_FLOOR))
        .expect("player spawns");
    h.sim.spawn_pickup(PickupKind::Gun, Vec2::new(288.0, ARENA_FLOOR));
    let boss = h.sim.spawn_boss(Vec2::new(952.0, ARENA_FLOOR));
    h.tick(InputSnapshot::idle());
    assert!(h.sim.player_gear().is_some_and(|g| g.has_gun));
    h.sim.activate_boss(&mut h.fx).expect("boss activates");
    (h, boss)
}

#[test]
fn test_contact_damage_respects_invulnerability_window() {
    let mut h = Harness::stage(passive_enemy_config(), 2000.0);
    let player = h.sim.spawn_player(Vec2::new(500.0, STAGE_FLOOR)).expect("player");
    let enemy = h.sim.spawn_enemy(EnemyArchetype::GroundMelee, Vec2::new(900.0, STAGE_FLOOR));
    h.tick(InputSnapshot::idle());

    let touch = |h: &mut Harness| {
        let x = h.sim.actor(player).map_or(0.0, |a| a.position.x);
        h.sim.actor_mut(enemy).expect("enemy").position.x = x;
        h.tick(InputSnapshot::idle());
    };
    let step_away = |h: &mut Harness| {
        let x = h.sim.actor(player).map_or(0.0, |a| a.position.x);
        h.sim.actor_mut(enemy).expect("enemy").position.x = x + 400.0;
    };

    touch(&mut h);
    let first_hit = h.sim.now();
    assert_eq!(h.health(player), 85.0);
    assert_eq!(h.sim.player_state(), Some(PlayerState::Hurting));

    step_away(&mut h);
    h.run(100);
    touch(&mut h);
    assert!(h.sim.now() - first_hit <= 200);
    assert_eq!(h.health(player), 85.0);

    // The window closes after 1000 ms; the next touch lands.
    step_away(&mut h);
    h.run_until(1200, |sim| sim.now() >= first_hit + 1000 - DT);
    touch(&mut h);
    assert_eq!(h.health(player), 70.0);

    // Enemy-dealt damage is not reported to the sink.
    assert_eq!(h.sink.total_damage(), 0.0);
}

#[test]
fn test_melee_hits_until_death_report_one_kill() {
    let mut config = passive_enemy_config();
    config.player.melee_knockback = Knockback::new(0.0, 0.0);
    let mut h = Harness::stage(config, 2000.0);
    let player = h.sim.spawn_player(Vec2::new(500.0, STAGE_FLOOR)).expect("player");
    let enemy = h.sim.spawn_enemy(EnemyArchetype::GroundMelee, Vec2::new(560.0, STAGE_FLOOR));
    h.sim.actor_mut(enemy).expect("enemy").contact_damage = 0.0;
    h.tick(InputSnapshot::idle());

    h.swing();
    assert_eq!(h.health(enemy), 60.0);
    assert_eq!(h.sim.enemy_state(enemy).ok(), Some(EnemyState::Hurting));
    h.run(600);

    h.swing();
    assert_eq!(h.health(enemy), 20.0);
    assert_eq!(h.sim.enemy_state(enemy).ok(), Some(EnemyState::Hurting));
    h.run(600);

    h.sim.actor_mut(player).expect("player").attack_damage = 30.0;
    h.swing();
    assert_eq!(h.health(enemy), 0.0);
    assert_eq!(h.sim.enemy_state(enemy).ok(), Some(EnemyState::Dying));
    assert_eq!(h.sink.kills(), 1);

    // A swing at the corpse changes nothing, and the corpse is reaped.
    h.run(400);
    h.swing();
    h.run(1000);
    assert!(h.sim.actor(enemy).is_none());
    assert_eq!(h.sink.kills(), 1);
    assert_eq!(h.sink.total_damage(), 100.0);
    assert!(h.sink.contains(&GameEvent::ActorKilled {
        kind: ActorKind::GroundMelee
    }));
}

#[test]
fn test_boss_cycle_and_defeat_inside_vulnerable_window() {
    let mut config = sturdy_player_config();
    config.projectiles.player_bullet.damage = 120.0;
    let (mut h, boss) = armed_arena(config);
    assert_eq!(h.sim.boss_state(), Some(BossState::Intro));

    let mut seen = vec![BossState::Intro];
    h.run_until(20_000, |sim| {
        let state = sim.boss_state();
        if let Some(state) = state {
            if seen.last() != Some(&state) {
                seen.push(state);
            }
        }
        state == Some(BossState::Vulnerable)
    });
    assert_eq!(
        seen,
        vec![
            BossState::Intro,
            BossState::Idle,
            BossState::Slam,
            BossState::Idle,
            BossState::Laser,
            BossState::Idle,
            BossState::Vulnerable,
        ]
    );
    assert_eq!(h.health(boss), 300.0);
    assert!(h.sink.contains(&GameEvent::BossVulnerability { vulnerable: true }));
    let window_opened = h.sim.now();

    let mut health_trail = Vec::new();
    let mut record = |h: &Harness| {
        let health = h.health(boss);
        if health_trail.last() != Some(&health) && health < 300.0 {
            health_trail.push(health);
        }
    };
    for _ in 0..3 {
        h.shoot();
        record(&h);
        for _ in 0..16 {
            h.tick(InputSnapshot::idle());
            record(&h);
        }
    }
    let mut guard = 0;
    while h.sim.boss_state() != Some(BossState::Dying) && guard < 100 {
        h.tick(InputSnapshot::idle());
        record(&h);
        guard += 1;
    }

    assert_eq!(health_trail, vec![180.0, 60.0, 0.0]);
    assert_eq!(h.sim.boss_state(), Some(BossState::Dying));
    assert!(h.sim.now() - window_opened < 4000);
    assert!(!h.sim.boss_phase().is_some_and(|p| p.is_vulnerable));

    h.run(2000);
    assert!(h.sim.boss_id().is_none());
    let count = |event: &GameEvent| h.sink.events().iter().filter(|e| *e == event).count();
    assert_eq!(count(&GameEvent::EncounterCompleted), 1);
    assert_eq!(count(&GameEvent::ActorKilled { kind: ActorKind::Boss }), 1);
    assert!(h.sim.level().is_completed());
}

#[test]
fn test_enrage_shortens_the_next_cycle() {
    let mut config = sturdy_player_config();
    config.projectiles.player_bullet.damage = 215.0;
    let (mut h, boss) = armed_arena(config);
    h.run_until(20_000, |sim| sim.boss_state() == Some(BossState::Vulnerable));

    h.shoot();
    h.run_until(1500, |sim| sim.actor(boss).is_some_and(|a| a.health() < 300.0));
    assert_eq!(h.health(boss), 85.0);
    assert_eq!(h.sim.boss_phase().map(|p| p.enrage), Some(1.5));

    h.run_until(4000, |sim| sim.boss_state() == Some(BossState::Idle));
    let idle_at = h.sim.now();
    h.run_until(3500, |sim| sim.boss_state() == Some(BossState::Slam));
    assert_eq!(h.sim.now() - idle_at, 2000);

    // Enraged lasers come in threes.
    h.run_until(5000, |sim| sim.boss_state() == Some(BossState::Laser));
    let mut beams = std::collections::HashSet::new();
    h.run_until(10_000, |sim| {
        for p in sim.projectiles() {
            if p.kind() == ProjectileKind::LaserBeam {
                beams.insert(p.id);
            }
        }
        sim.boss_state() == Some(BossState::Vulnerable)
    });
    assert_eq!(beams.len(), 3);

    let opened = h.sim.now();
    h.run_until(5000, |sim| sim.boss_state() == Some(BossState::Idle));
    let window = h.sim.now() - opened;
    assert!((2667..2667 + DT).contains(&window), "window lasted {window} ms");
}

#[test]
fn test_projectile_expires_exactly_at_lifetime() {
    let mut h = Harness::stage(CombatConfig::default(), 5000.0);
    h.sim.spawn_player(Vec2::new(100.0, STAGE_FLOOR)).expect("player");
    h.sim.spawn_pickup(PickupKind::Gun, Vec2::new(100.0, STAGE_FLOOR));
    h.tick(InputSnapshot::idle());

    h.shoot();
    let fired_at = h.sim.now();
    assert_eq!(h.sim.projectiles().len(), 1);
    let lifetime = h.sim.config().projectiles.player_bullet.lifetime_ms;

    while h.sim.now() < fired_at + lifetime - DT {
        h.tick(InputSnapshot::idle());
        assert_eq!(h.sim.projectiles().len(), 1, "gone early at {}", h.sim.now());
    }
    h.tick(InputSnapshot::idle());
    assert_eq!(h.sim.now(), fired_at + lifetime);
    assert!(h.sim.projectiles().is_empty());
}

#[test]
fn test_ledge_keeps_ground_enemy_on_its_platform() {
    let mut config = CombatConfig::default();
    config.ground_melee.patrol_flip_rate = 0.0;
    let mut h = Harness {
        sim: Simulation::new(
            config,
            FloorMap::empty(WorldBounds::sized(2000.0, 600.0)).with_segment(800.0, 1100.0, STAGE_FLOOR),
            LevelState::stage("ledge"),
            5,
        ),
        sink: RecordingSink::new(),
        fx: NullPresentation,
    };
    let enemy = h.sim.spawn_enemy(EnemyArchetype::GroundMelee, Vec2::new(950.0, STAGE_FLOOR));
    h.run(15_000);

    let actor = h.sim.actor(enemy).expect("enemy still alive");
    assert!(actor.position.x > 800.0 && actor.position.x < 1100.0);
    assert!(actor.grounded);
}
