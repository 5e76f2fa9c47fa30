//! Kinematics for actors.
//!
//! Applies gravity, moves bodies by their velocity, keeps them inside the
//! horizontal level bounds and lands falling bodies on floors. There is no
//! body-vs-body collision; overlaps are resolved as combat, not physics.

use corebreak_common::{to_secs, Millis};

use crate::actor::Actor;
use crate::world::WorldQuery;

/// Advances one actor by `dt`.
pub fn integrate(actor: &mut Actor, dt: Millis, world: &dyn WorldQuery, terminal_velocity: f32) {
    let secs = to_secs(dt);
    let prev_y = actor.position.y;

    if actor.gravity > 0.0 {
        actor.velocity.y = (actor.velocity.y + actor.gravity * secs).min(terminal_velocity);
    }
    actor.position += actor.velocity * secs;

    let clamped = world.bounds().clamp_x(actor.position.x, actor.width / 2.0);
    if clamped != actor.position.x {
        actor.position.x = clamped;
        actor.velocity.x = 0.0;
    }

    // Fliers and the boss hold their height; only falling bodies land.
    if actor.gravity <= 0.0 || actor.velocity.y < 0.0 {
        actor.grounded = false;
        return;
    }

    match world.floor_below(actor.position.x, prev_y) {
        Some(floor) if actor.position.y >= floor => {
            actor.position.y = floor;
            actor.velocity.y = 0.0;
            actor.grounded = true;
        },
        _ => actor.grounded = false,
    }
}
