//! Ranged crawler: slow, tanky, fires an eye laser from range and lunges
//! when the player gets close. Never walks off a ledge but keeps shooting
//! from it.

use corebreak_common::Vec2;

use super::{EnemyCtx, EnemyState};
use crate::fsm::{StateEntry, StateHandlers};
use crate::projectile::ProjectileSpawn;
use crate::timer::TimerEvent;

/// Behaviour table of the ranged crawler.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangedCrawlerBehavior;

impl RangedCrawlerBehavior {
    fn eye_position(ctx: &EnemyCtx<'_>) -> Vec2 {
        let t = &ctx.config.ranged_crawler;
        Vec2::new(
            ctx.actor.position.x + ctx.actor.facing.sign() * t.eye_offset,
            ctx.actor.position.y - ctx.actor.height * t.eye_height_fraction,
        )
    }

    fn shoot(ctx: &mut EnemyCtx<'_>) {
        let config = ctx.config;
        let eye = Self::eye_position(ctx);
        ctx.env.spawns.push(ProjectileSpawn::eye_laser(
            ctx.actor.id,
            eye,
            ctx.actor.facing,
            &config.projectiles.eye_laser,
        ));
        ctx.actor.last_ranged_at = Some(ctx.env.now);
        ctx.env.animate(ctx.actor.id, "shoot");
        ctx.env.sound("eye_laser");
    }

    /// Where to go after an attack or stun.
    fn regroup(ctx: &EnemyCtx<'_>) -> EnemyState {
        if ctx.target_within(ctx.config.ranged_crawler.base.detection_range) {
            EnemyState::Chasing
        } else {
            EnemyState::Idle
        }
    }

    fn chase(ctx: &mut EnemyCtx<'_>) -> Option<EnemyState> {
        let config = ctx.config;
        let crawler = &config.ranged_crawler;
        let tuning = &crawler.base;
        let Some(distance) = ctx.target_distance() else {
            return Some(EnemyState::Idle);
        };
        if distance > tuning.lose_interest_range() {
            return Some(EnemyState::Idle);
        }

        ctx.face_target(tuning);
        let now = ctx.env.now;
        if distance < tuning.attack_trigger_range()
            && ctx.actor.attack_ready(now, tuning.attack_cooldown_ms)
        {
            return Some(EnemyState::Attacking);
        }

        let laser_ready = distance < crawler.ranged_range
            && ctx.actor.ranged_ready(now, crawler.ranged_cooldown_ms);
        if ctx.at_ledge(tuning) {
            ctx.actor.velocity.x = 0.0;
            if laser_ready {
                Self::shoot(ctx);
            }
        } else if laser_ready && distance > tuning.attack_range {
            ctx.actor.velocity.x = 0.0;
            Self::shoot(ctx);
        } else {
            ctx.actor.velocity.x = ctx.actor.facing.sign() * tuning.chase_speed();
        }
        None
    }
}

impl<'a> StateHandlers<EnemyCtx<'a>> for RangedCrawlerBehavior {
    type State = EnemyState;
    type Event = TimerEvent;
    const LABEL: &'static str = "ranged_crawler";

    fn enter(&self, ctx: &mut EnemyCtx<'a>, entry: StateEntry<EnemyState>) -> Option<EnemyState> {
        let config = ctx.config;
        let crawler = &config.ranged_crawler;
        match entry.state {
            EnemyState::Idle => ctx.enter_idle(),
            EnemyState::Chasing => ctx.env.animate(ctx.actor.id, "crawl"),
            EnemyState::Attacking => {
                ctx.enter_attacking(entry, &crawler.base);
                ctx.actor.velocity = Vec2::new(
                    ctx.actor.facing.sign() * crawler.lunge_speed,
                    -crawler.lunge_hop,
                );
            },
            EnemyState::Hurting => {
                ctx.actor.velocity.x = 0.0;
                ctx.enter_hurting(entry, &crawler.base);
            },
            EnemyState::Dying => ctx.enter_dying(entry, &crawler.base),
            EnemyState::Patrolling | EnemyState::Returning => {},
        }
        None
    }

    fn update(&self, ctx: &mut EnemyCtx<'a>, state: EnemyState) -> Option<EnemyState> {
        match state {
            EnemyState::Idle => {
                ctx.actor.velocity.x = 0.0;
                ctx.target_within(ctx.config.ranged_crawler.base.detection_range)
                    .then_some(EnemyState::Chasing)
            },
            EnemyState::Chasing => Self::chase(ctx),
            EnemyState::Attacking | EnemyState::Hurting | EnemyState::Dying => {
                if ctx.actor.grounded {
                    ctx.actor.velocity.x = 0.0;
                }
                None
            },
            EnemyState::Patrolling | EnemyState::Returning => None,
        }
    }

    fn exit(&self, ctx: &mut EnemyCtx<'a>, state: EnemyState) {
        ctx.exit_common(state);
    }

    fn event(
        &self,
        ctx: &mut EnemyCtx<'a>,
        state: EnemyState,
        event: TimerEvent,
    ) -> Option<EnemyState> {
        match (state, event) {
            (EnemyState::Attacking, TimerEvent::AttackFinished)
            | (EnemyState::Hurting, TimerEvent::StunFinished) => Some(Self::regroup(ctx)),
            (EnemyState::Dying, TimerEvent::DeathFinished) => {
                ctx.finish_dying();
                None
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{EnemyArchetype, EnemyState};
    use crate::projectile::{Faction, ProjectileKind};
    use corebreak_common::{Facing, Vec2};

    fn rig_at(x: f32) -> Rig {
        Rig::new(EnemyArchetype::RangedCrawler, Vec2::new(x, FLOOR))
    }

    #[test]
    fn test_idles_until_player_in_range() {
        let mut rig = rig_at(400.0);
        rig.place_target(700.0, FLOOR);
        rig.step();
        assert_eq!(rig.state(), Some(EnemyState::Idle));

        rig.place_target(600.0, FLOOR);
        rig.step();
        assert_eq!(rig.state(), Some(EnemyState::Chasing));
    }

    #[test]
    fn test_fires_eye_laser_beyond_melee_range() {
        let mut rig = rig_at(400.0);
        rig.place_target(250.0, FLOOR);
        rig.step();
        rig.step();

        assert_eq!(rig.actor.facing, Facing::Left);
        assert_eq!(rig.spawns.len(), 1);
        let shot = rig.spawns[0];
        assert_eq!(shot.kind, ProjectileKind::EyeLaser);
        assert_eq!(shot.faction, Faction::Hostile);
        assert_eq!(shot.center, Vec2::new(390.0, FLOOR - 50.0 * 0.85));
        assert_eq!(rig.actor.velocity.x, 0.0);

        // Cooldown holds the next shot back.
        rig.run(1000);
        assert_eq!(rig.spawns.len(), 1);
    }

    #[test]
    fn test_lunges_up_close() {
        let mut rig = rig_at(400.0);
        rig.place_target(450.0, FLOOR);
        rig.step();
        rig.step();
        assert_eq!(rig.state(), Some(EnemyState::Attacking));
        assert_eq!(rig.actor.velocity, Vec2::new(200.0, -100.0));
        assert!(rig.spawns.is_empty());

        rig.run(600);
        assert_eq!(rig.state(), Some(EnemyState::Chasing));
    }

    #[test]
    fn test_holds_at_ledge_but_shoots() {
        let mut rig = rig_at(400.0);
        rig.world = rig.world.clone().with_pit(100.0, 430.0);
        rig.place_target(300.0, FLOOR);
        rig.step();
        rig.step();
        assert_eq!(rig.actor.velocity.x, 0.0);
        assert_eq!(rig.spawns.len(), 1);
    }
}
