//! Property tests for hit bookkeeping across whole simulations.

use corebreak_common::{Millis, Vec2, WorldBounds};
use corebreak_gameplay::prelude::*;
use proptest::prelude::*;

const DT: Millis = 20;

fn stage(config: CombatConfig) -> Simulation<FloorMap> {
    Simulation::new(
        config,
        FloorMap::flat(WorldBounds::sized(2000.0, 600.0), 500.0),
        LevelState::stage("props"),
        9,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_one_swing_hits_each_enemy_once(hold in 1usize..40, offset in 20.0f32..70.0) {
        let mut config = CombatConfig::default();
        config.ground_melee.walk_speed = 0.0;
        config.ground_melee.detection_range = 0.0;
        config.ground_melee.contact_damage = 0.0;
        config.player.melee_knockback = Knockback::new(0.0, 0.0);
        let mut sim = stage(config);
        sim.spawn_player(Vec2::new(500.0, 500.0)).expect("player");
        let enemy = sim.spawn_enemy(EnemyArchetype::GroundMelee, Vec2::new(500.0 + offset, 500.0));

        let mut sink = RecordingSink::new();
        let mut fx = NullPresentation;
        let held = InputSnapshot::idle().with_attack(true);
        for _ in 0..hold {
            sim.tick(DT, &held, &mut sink, &mut fx);
        }

        let health = sim.actor(enemy).map_or(0.0, Actor::health);
        prop_assert!(health >= 60.0, "health {health} after {hold} held ticks");
        prop_assert!(sink.total_damage() <= 40.0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn test_boss_only_bleeds_while_exposed(fire_every in 2usize..25) {
        let mut config = CombatConfig::default();
        config.player.max_health = 10_000.0;
        let mut sim = Simulation::new(
            config,
            FloorMap::flat(WorldBounds::sized(1152.0, 648.0), 600.0),
            LevelState::boss_encounter("props-arena"),
            3,
        );
        let mut sink = RecordingSink::new();
        let mut fx = NullPresentation;

        sim.spawn_player(Vec2::new(288.0, 600.0)).expect("player");
        sim.spawn_pickup(PickupKind::Gun, Vec2::new(288.0, 600.0));
        let boss = sim.spawn_boss(Vec2::new(952.0, 600.0));
        sim.tick(DT, &InputSnapshot::idle(), &mut sink, &mut fx);
        sim.activate_boss(&mut fx).expect("boss");

        let mut last = sim.actor(boss).map_or(0.0, Actor::health);
        for step in 0..800 {
            let input = InputSnapshot::idle().with_alt_fire(step % fire_every == 0);
            sim.tick(DT, &input, &mut sink, &mut fx);
            let Some(actor) = sim.actor(boss) else {
                break;
            };
            if actor.health() < last {
                let state = sim.boss_state();
                prop_assert!(
                    matches!(state, Some(BossState::Vulnerable | BossState::Dying)),
                    "boss lost health in {state:?}"
                );
            }
            last = actor.health();
        }
    }
}
