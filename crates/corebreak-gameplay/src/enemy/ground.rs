//! Ground melee enemy: patrols, chases on sight and swings when close.

use corebreak_common::to_secs;

use super::{EnemyCtx, EnemyState};
use crate::fsm::{StateEntry, StateHandlers};
use crate::timer::TimerEvent;

/// Behaviour table of the ground melee enemy.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroundMeleeBehavior;

impl GroundMeleeBehavior {
    fn patrol(ctx: &mut EnemyCtx<'_>) {
        let config = ctx.config;
        let tuning = &config.ground_melee;
        let now = ctx.env.now;

        if ctx.at_ledge(tuning) {
            ctx.actor.turn_around(now);
        } else if tuning.patrol_flip_rate > 0.0
            && ctx
                .actor
                .last_turn_at
                .map_or(true, |t| now.saturating_sub(t) > tuning.turn_delay_ms)
        {
            let chance = 1.0 - (-tuning.patrol_flip_rate * to_secs(ctx.env.dt)).exp();
            if ctx.env.rng.f32() < chance {
                ctx.actor.turn_around(now);
            }
        }

        ctx.actor.velocity.x = ctx.actor.facing.sign() * tuning.walk_speed;
    }

    fn chase(ctx: &mut EnemyCtx<'_>) -> Option<EnemyState> {
        let config = ctx.config;
        let tuning = &config.ground_melee;
        let Some(distance) = ctx.target_distance() else {
            return Some(EnemyState::Patrolling);
        };
        if distance > tuning.lose_interest_range() {
            return Some(EnemyState::Patrolling);
        }

        ctx.face_target(tuning);
        if distance < tuning.attack_trigger_range()
            && ctx.actor.attack_ready(ctx.env.now, tuning.attack_cooldown_ms)
        {
            return Some(EnemyState::Attacking);
        }

        ctx.actor.velocity.x = if ctx.at_ledge(tuning) {
            0.0
        } else {
            ctx.actor.facing.sign() * tuning.chase_speed()
        };
        None
    }
}

impl<'a> StateHandlers<EnemyCtx<'a>> for GroundMeleeBehavior {
    type State = EnemyState;
    type Event = TimerEvent;
    const LABEL: &'static str = "ground_melee";

    fn enter(&self, ctx: &mut EnemyCtx<'a>, entry: StateEntry<EnemyState>) -> Option<EnemyState> {
        let config = ctx.config;
        let tuning = &config.ground_melee;
        match entry.state {
            EnemyState::Idle => ctx.enter_idle(),
            EnemyState::Patrolling | EnemyState::Chasing => ctx.env.animate(ctx.actor.id, "walk"),
            EnemyState::Attacking => {
                ctx.actor.velocity.x = 0.0;
                ctx.enter_attacking(entry, tuning);
            },
            EnemyState::Hurting => {
                ctx.actor.velocity.x = 0.0;
                ctx.enter_hurting(entry, tuning);
            },
            EnemyState::Dying => ctx.enter_dying(entry, tuning),
            EnemyState::Returning => {},
        }
        None
    }

    fn update(&self, ctx: &mut EnemyCtx<'a>, state: EnemyState) -> Option<EnemyState> {
        let detection = ctx.config.ground_melee.detection_range;
        match state {
            EnemyState::Idle => Some(if ctx.target_within(detection) {
                EnemyState::Chasing
            } else {
                EnemyState::Patrolling
            }),
            EnemyState::Patrolling => {
                if ctx.target_within(detection) {
                    return Some(EnemyState::Chasing);
                }
                Self::patrol(ctx);
                None
            },
            EnemyState::Chasing => Self::chase(ctx),
            EnemyState::Attacking | EnemyState::Hurting | EnemyState::Dying => {
                if ctx.actor.grounded {
                    ctx.actor.velocity.x = 0.0;
                }
                None
            },
            EnemyState::Returning => None,
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
            | (EnemyState::Hurting, TimerEvent::StunFinished) => Some(EnemyState::Chasing),
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
    use corebreak_common::{Facing, Vec2};

    fn rig_at(x: f32) -> Rig {
        Rig::new(EnemyArchetype::GroundMelee, Vec2::new(x, FLOOR))
    }

    #[test]
    fn test_patrols_without_player() {
        let mut rig = rig_at(400.0);
        rig.step();
        assert_eq!(rig.state(), Some(EnemyState::Patrolling));
        rig.step();
        assert_eq!(rig.actor.velocity.x.abs(), 60.0);
    }

    #[test]
    fn test_chases_and_attacks() {
        let mut rig = rig_at(400.0);
        rig.place_target(600.0, FLOOR);
        rig.step();
        assert_eq!(rig.state(), Some(EnemyState::Chasing));
        rig.step();
        assert_eq!(rig.actor.facing, Facing::Right);
        assert_eq!(rig.actor.velocity.x, 72.0);

        rig.place_target(470.0, FLOOR);
        rig.step();
        assert_eq!(rig.state(), Some(EnemyState::Attacking));
        assert!(rig.actor.flags.is_attacking);

        rig.run(500);
        assert_eq!(rig.state(), Some(EnemyState::Chasing));
        assert!(!rig.actor.flags.is_attacking);

        // Cooldown blocks an immediate second swing.
        rig.step();
        assert_eq!(rig.state(), Some(EnemyState::Chasing));
    }

    #[test]
    fn test_gives_up_far_chase() {
        let mut rig = rig_at(400.0);
        rig.place_target(600.0, FLOOR);
        rig.step();
        assert_eq!(rig.state(), Some(EnemyState::Chasing));

        rig.place_target(900.0, FLOOR);
        rig.step();
        assert_eq!(rig.state(), Some(EnemyState::Patrolling));
    }

    #[test]
    fn test_turns_at_ledge() {
        let mut rig = rig_at(400.0);
        rig.world = rig.world.clone().with_pit(440.0, 600.0);
        rig.actor.facing = Facing::Right;
        rig.step();
        rig.step();
        assert_eq!(rig.actor.facing, Facing::Left);
        assert_eq!(rig.actor.velocity.x, -60.0);
    }

    #[test]
    fn test_stun_returns_to_chase() {
        let mut rig = rig_at(400.0);
        rig.hurt(20.0);
        assert_eq!(rig.state(), Some(EnemyState::Hurting));
        assert!(rig.actor.flags.is_hurting);
        rig.run(208);
        // No player around: chase gives up straight away.
        assert_eq!(rig.state(), Some(EnemyState::Patrolling));
        assert!(!rig.actor.flags.is_hurting);
    }
}
