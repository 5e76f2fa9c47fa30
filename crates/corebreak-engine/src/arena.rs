//! Built-in levels for the headless runner.

use anyhow::Result;
use clap::ValueEnum;
use corebreak_common::{Vec2, WorldBounds};
use corebreak_gameplay::{
    CombatConfig, EnemyArchetype, FloorMap, LevelState, PickupKind, Presentation, Simulation,
};
use tracing::info;

/// Level layouts the runner knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Side-scrolling stage with one enemy of each archetype
    Level,
    /// Boss arena
    Boss,
}

/// Floor height of the stage.
pub const STAGE_FLOOR: f32 = 600.0;

/// Floor height of the boss arena.
pub const ARENA_FLOOR: f32 = 600.0;

/// Builds and populates a scenario.
///
/// The boss is woken up immediately, so its intro plays from the first tick.
pub fn build(
    scenario: Scenario,
    config: CombatConfig,
    seed: u64,
    fx: &mut dyn Presentation,
) -> Result<Simulation<FloorMap>> {
    let sim = match scenario {
        Scenario::Level => stage(config, seed)?,
        Scenario::Boss => boss_arena(config, seed, fx)?,
    };
    info!(
        ?scenario,
        actors = sim.roster().len(),
        pickups = sim.pickups().len(),
        "scenario ready"
    );
    Ok(sim)
}

fn stage(config: CombatConfig, seed: u64) -> Result<Simulation<FloorMap>> {
    let world = FloorMap::flat(WorldBounds::sized(2400.0, 720.0), STAGE_FLOOR)
        .with_pit(1500.0, 1560.0)
        .with_segment(1800.0, 2100.0, STAGE_FLOOR - 150.0);
    let mut sim = Simulation::new(config, world, LevelState::stage("stage-1"), seed);

    sim.spawn_player(Vec2::new(100.0, STAGE_FLOOR))?;
    sim.spawn_pickup(PickupKind::Gun, Vec2::new(420.0, STAGE_FLOOR));
    sim.spawn_pickup(PickupKind::Health, Vec2::new(900.0, STAGE_FLOOR));
    sim.spawn_pickup(PickupKind::Jetpack, Vec2::new(1300.0, STAGE_FLOOR));

    sim.spawn_enemy(EnemyArchetype::GroundMelee, Vec2::new(500.0, STAGE_FLOOR));
    sim.spawn_enemy(EnemyArchetype::RangedCrawler, Vec2::new(1100.0, STAGE_FLOOR));
    sim.spawn_enemy(EnemyArchetype::FlyingSwooper, Vec2::new(1700.0, STAGE_FLOOR - 220.0));
    Ok(sim)
}

fn boss_arena(
    config: CombatConfig,
    seed: u64,
    fx: &mut dyn Presentation,
) -> Result<Simulation<FloorMap>> {
    let world = FloorMap::flat(WorldBounds::sized(1152.0, 648.0), ARENA_FLOOR);
    let mut sim = Simulation::new(config, world, LevelState::boss_encounter("boss-arena"), seed);

    sim.spawn_player(Vec2::new(288.0, ARENA_FLOOR))?;
    sim.spawn_pickup(PickupKind::Gun, Vec2::new(288.0, ARENA_FLOOR));
    sim.spawn_pickup(PickupKind::Jetpack, Vec2::new(200.0, ARENA_FLOOR));
    sim.spawn_boss(Vec2::new(952.0, ARENA_FLOOR));
    sim.activate_boss(fx)?;
    Ok(sim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use corebreak_gameplay::{ActorKind, BossState, NullPresentation};

    #[test]
    fn test_stage_has_every_archetype() {
        let sim = build(Scenario::Level, CombatConfig::default(), 1, &mut NullPresentation)
            .expect("stage builds");
        let kinds: Vec<ActorKind> = sim.roster().iter().map(|c| c.kind()).collect();
        assert!(kinds.contains(&ActorKind::Player));
        assert!(kinds.contains(&ActorKind::GroundMelee));
        assert!(kinds.contains(&ActorKind::RangedCrawler));
        assert!(kinds.contains(&ActorKind::FlyingSwooper));
        assert_eq!(sim.pickups().len(), 3);
    }

    #[test]
    fn test_boss_arena_starts_in_intro() {
        let sim = build(Scenario::Boss, CombatConfig::default(), 1, &mut NullPresentation)
            .expect("arena builds");
        assert_eq!(sim.boss_state(), Some(BossState::Intro));
        assert!(sim.boss_phase().is_some_and(|p| p.is_active));
    }
}
