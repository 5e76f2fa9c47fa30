//! Flying swooper: hovers at its home height, dives at the player and
//! flies back home afterwards. Falls out of the sky when killed.

use corebreak_common::{to_secs, Facing, Vec2};

use super::{EnemyCtx, EnemyState};
use crate::fsm::{StateEntry, StateHandlers};
use crate::timer::TimerEvent;

/// Behaviour table of the flying swooper.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlyingSwooperBehavior;

impl FlyingSwooperBehavior {
    /// Point the swooper flies at: a little above the player's feet.
    fn aim_point(ctx: &EnemyCtx<'_>) -> Option<Vec2> {
        let offset = ctx.config.flying_swooper.aim_offset_y;
        ctx.live_target()
            .map(|t| t.position - Vec2::new(0.0, offset))
    }

    fn hover(ctx: &mut EnemyCtx<'_>) {
        let t = &ctx.config.flying_swooper;
        ctx.memory.hover_phase += t.hover_rate * to_secs(ctx.env.dt);
        ctx.actor.position.y = ctx.actor.home.y + ctx.memory.hover_phase.sin() * t.hover_amplitude;
    }

    fn chase(ctx: &mut EnemyCtx<'_>) -> Option<EnemyState> {
        let config = ctx.config;
        let tuning = &config.flying_swooper.base;
        let (Some(distance), Some(aim)) = (ctx.target_distance(), Self::aim_point(ctx)) else {
            return Some(EnemyState::Returning);
        };
        if distance > tuning.lose_interest_range() {
            return Some(EnemyState::Returning);
        }

        ctx.actor.facing = Facing::toward(ctx.actor.position.x, aim.x);
        if distance < tuning.attack_trigger_range()
            && ctx.actor.attack_ready(ctx.env.now, tuning.attack_cooldown_ms)
        {
            return Some(EnemyState::Attacking);
        }

        ctx.actor.velocity = ctx.direction_to(aim) * tuning.chase_speed();
        None
    }

    fn fly_home(ctx: &mut EnemyCtx<'_>) -> Option<EnemyState> {
        let config = ctx.config;
        let t = &config.flying_swooper;
        if ctx.target_within(t.base.detection_range) {
            return Some(EnemyState::Chasing);
        }

        let dy = ctx.actor.home.y - ctx.actor.position.y;
        if dy.abs() <= t.home_tolerance {
            return Some(EnemyState::Idle);
        }
        ctx.actor.velocity = Vec2::new(0.0, dy.signum() * t.base.walk_speed);
        None
    }
}

impl<'a> StateHandlers<EnemyCtx<'a>> for FlyingSwooperBehavior {
    type State = EnemyState;
    type Event = TimerEvent;
    const LABEL: &'static str = "flying_swooper";

    fn enter(&self, ctx: &mut EnemyCtx<'a>, entry: StateEntry<EnemyState>) -> Option<EnemyState> {
        let config = ctx.config;
        let t = &config.flying_swooper;
        match entry.state {
            EnemyState::Idle => {
                ctx.actor.velocity = Vec2::ZERO;
                ctx.memory.hover_phase = 0.0;
                ctx.env.animate(ctx.actor.id, "fly");
            },
            EnemyState::Chasing | EnemyState::Returning => ctx.env.animate(ctx.actor.id, "fly"),
            EnemyState::Attacking => {
                ctx.enter_attacking(entry, &t.base);
                let swoop = t.base.walk_speed * t.swoop_multiplier;
                ctx.actor.velocity = Self::aim_point(ctx)
                    .map_or(Vec2::ZERO, |aim| ctx.direction_to(aim) * swoop);
            },
            EnemyState::Hurting => {
                ctx.actor.velocity = Vec2::ZERO;
                ctx.enter_hurting(entry, &t.base);
            },
            EnemyState::Dying => {
                ctx.enter_dying(entry, &t.base);
                ctx.actor.gravity = t.death_gravity;
                ctx.actor.velocity = Vec2::new(0.0, t.death_fall_speed);
            },
            EnemyState::Patrolling => {},
        }
        None
    }

    fn update(&self, ctx: &mut EnemyCtx<'a>, state: EnemyState) -> Option<EnemyState> {
        match state {
            EnemyState::Idle => {
                Self::hover(ctx);
                ctx.target_within(ctx.config.flying_swooper.base.detection_range)
                    .then_some(EnemyState::Chasing)
            },
            EnemyState::Chasing => Self::chase(ctx),
            EnemyState::Returning => Self::fly_home(ctx),
            EnemyState::Hurting => {
                ctx.actor.velocity = Vec2::ZERO;
                None
            },
            EnemyState::Attacking | EnemyState::Dying | EnemyState::Patrolling => None,
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
            | (EnemyState::Hurting, TimerEvent::StunFinished) => Some(EnemyState::Returning),
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
    use corebreak_common::Vec2;

    const HOME_Y: f32 = 300.0;

    fn rig() -> Rig {
        Rig::new(EnemyArchetype::FlyingSwooper, Vec2::new(400.0, HOME_Y))
    }

    #[test]
    fn test_hovers_around_home() {
        let mut rig = rig();
        for _ in 0..100 {
            rig.step();
            assert!((rig.actor.position.y - HOME_Y).abs() <= 20.0 + 1e-3);
        }
        assert_eq!(rig.state(), Some(EnemyState::Idle));
    }

    #[test]
    fn test_chase_aims_above_player() {
        let mut rig = rig();
        rig.place_target(600.0, HOME_Y + 30.0);
        rig.step();
        assert_eq!(rig.state(), Some(EnemyState::Chasing));

        let y = rig.actor.position.y;
        rig.step();
        let aim = Vec2::new(600.0, HOME_Y);
        let expected = (aim - Vec2::new(400.0, y)).normalize() * 80.0;
        assert!((rig.actor.velocity - expected).length() < 1e-3);
    }

    #[test]
    fn test_swoop_then_return_home() {
        let mut rig = rig();
        rig.place_target(450.0, HOME_Y + 30.0);
        rig.step();
        rig.step();
        assert_eq!(rig.state(), Some(EnemyState::Attacking));
        assert!((rig.actor.velocity.length() - 160.0).abs() < 1e-3);

        rig.target = None;
        rig.actor.position.y = HOME_Y + 100.0;
        rig.run(500);
        assert_eq!(rig.state(), Some(EnemyState::Returning));
        assert_eq!(rig.actor.velocity, Vec2::new(0.0, -80.0));

        rig.actor.position.y = HOME_Y + 5.0;
        rig.step();
        assert_eq!(rig.state(), Some(EnemyState::Idle));
    }

    #[test]
    fn test_falls_when_killed() {
        let mut rig = rig();
        rig.hurt(500.0);
        assert_eq!(rig.state(), Some(EnemyState::Dying));
        assert!(rig.actor.gravity > 0.0);
        assert_eq!(rig.actor.velocity, Vec2::new(0.0, 100.0));
    }
}
