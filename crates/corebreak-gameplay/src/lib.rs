//! # Corebreak Gameplay
//!
//! Combat core of a 2D side-scroller.
//!
//! This crate provides:
//! - A generic state machine with explicit transitions
//! - A timer scheduler for deferred, cancellable transitions
//! - Actors, attack zones, projectiles and pickups
//! - Player controller with gun, jetpack and ducking
//! - Enemy archetypes (ground melee, ranged crawler, flying swooper)
//! - The boss encounter with its vulnerability window and enrage
//! - Combat resolution (contact, melee, projectiles, pickups)
//! - Event sinks, presentation requests and a score tally
//! - Tuning configuration loaded from TOML
//! - The per-tick [`Simulation`] driver

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod actor;
pub mod boss;
pub mod combat;
pub mod combatant;
pub mod config;
pub mod context;
pub mod enemy;
pub mod events;
pub mod fsm;
pub mod input;
pub mod physics;
pub mod pickup;
pub mod player;
pub mod projectile;
pub mod score;
pub mod simulation;
pub mod timer;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::actor::*;
    pub use crate::boss::*;
    pub use crate::combat::*;
    pub use crate::combatant::*;
    pub use crate::config::*;
    pub use crate::context::*;
    pub use crate::enemy::*;
    pub use crate::events::*;
    pub use crate::fsm::*;
    pub use crate::input::*;
    pub use crate::physics::*;
    pub use crate::pickup::*;
    pub use crate::player::*;
    pub use crate::projectile::*;
    pub use crate::score::*;
    pub use crate::simulation::*;
    pub use crate::timer::*;
    pub use crate::world::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use corebreak_common::{Vec2, WorldBounds};

    #[test]
    fn test_score_board_as_sink() {
        let mut sim = Simulation::new(
            CombatConfig::default(),
            FloorMap::flat(WorldBounds::sized(800.0, 600.0), 500.0),
            LevelState::stage("lib"),
            0,
        );
        sim.spawn_player(Vec2::new(100.0, 500.0)).expect("player");
        sim.spawn_pickup(PickupKind::Health, Vec2::new(100.0, 500.0));

        let mut board = ScoreBoard::new();
        let mut fx = NullPresentation;
        sim.tick(16, &InputSnapshot::idle(), &mut board, &mut fx);
        assert_eq!(board.score(), 25);
        assert_eq!(board.stats().pickups_collected, 1);
        assert!(sim.pickups().is_empty());
    }

    #[test]
    fn test_fanout_feeds_both_sinks() {
        let mut board = ScoreBoard::new();
        let mut recorder = RecordingSink::new();
        {
            let mut both = Fanout::new(&mut board, &mut recorder);
            both.on_actor_killed(ActorKind::RangedCrawler);
        }
        assert_eq!(board.score(), 150);
        assert_eq!(recorder.kills(), 1);
    }
}
