//! In-memory score tally.
//!
//! [`ScoreBoard`] is an [`EventSink`] that turns gameplay notifications into
//! points and session statistics. It never persists anything.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actor::ActorKind;
use crate::events::EventSink;
use crate::pickup::PickupKind;

/// Points awarded per notification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreValues {
    /// Points per point of damage dealt
    pub per_damage: f32,
    /// Ground melee kill
    pub ground_melee_kill: u64,
    /// Ranged crawler kill
    pub ranged_crawler_kill: u64,
    /// Flying swooper kill
    pub flying_swooper_kill: u64,
    /// Boss kill
    pub boss_kill: u64,
    /// Any pickup
    pub pickup: u64,
    /// Completed level
    pub level_completed: u64,
    /// Completed boss encounter
    pub encounter_completed: u64,
}

impl Default for ScoreValues {
    fn default() -> Self {
        Self {
            per_damage: 1.0,
            ground_melee_kill: 100,
            ranged_crawler_kill: 150,
            flying_swooper_kill: 200,
            boss_kill: 1000,
            pickup: 25,
            level_completed: 1000,
            encounter_completed: 2500,
        }
    }
}

impl ScoreValues {
    /// Kill bonus for an actor kind. Players are worth nothing.
    #[must_use]
    pub fn kill(&self, kind: ActorKind) -> u64 {
        match kind {
            ActorKind::Player => 0,
            ActorKind::GroundMelee => self.ground_melee_kill,
            ActorKind::RangedCrawler => self.ranged_crawler_kill,
            ActorKind::FlyingSwooper => self.flying_swooper_kill,
            ActorKind::Boss => self.boss_kill,
        }
    }
}

/// Session statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    /// Enemies killed, the boss included
    pub enemies_killed: u32,
    /// Bosses defeated
    pub bosses_defeated: u32,
    /// Pickups collected
    pub pickups_collected: u32,
    /// Completed level ids, each listed once
    pub levels_completed: Vec<String>,
    /// Damage dealt by the player
    pub total_damage_dealt: f32,
    /// Completed boss encounters
    pub encounters_completed: u32,
}

/// Score tally for one session.
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    values: ScoreValues,
    score: u64,
    high_score: u64,
    stats: ScoreStats,
}

impl ScoreBoard {
    /// Creates an empty board with the default point values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty board with custom point values.
    #[must_use]
    pub fn with_values(values: ScoreValues) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    /// Current session score.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Best score reached since the board was created.
    #[must_use]
    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    /// Session statistics.
    #[must_use]
    pub fn stats(&self) -> &ScoreStats {
        &self.stats
    }

    /// Starts a new session. The high score is kept.
    pub fn reset_session(&mut self) {
        self.score = 0;
        self.stats = ScoreStats::default();
    }

    fn award(&mut self, points: u64, reason: &'static str) {
        self.score += points;
        self.high_score = self.high_score.max(self.score);
        debug!(points, reason, total = self.score, "score awarded");
    }
}

impl EventSink for ScoreBoard {
    fn on_damage_dealt(&mut self, amount: f32) {
        self.stats.total_damage_dealt += amount;
        let points = (amount * self.values.per_damage).max(0.0).floor() as u64;
        self.award(points, "damage");
    }

    fn on_actor_killed(&mut self, kind: ActorKind) {
        if kind == ActorKind::Player {
            return;
        }
        self.stats.enemies_killed += 1;
        if kind == ActorKind::Boss {
            self.stats.bosses_defeated += 1;
        }
        self.award(self.values.kill(kind), kind.tag());
    }

    fn on_pickup_collected(&mut self, _kind: PickupKind) {
        self.stats.pickups_collected += 1;
        self.award(self.values.pickup, "pickup");
    }

    fn on_level_completed(&mut self, level_id: &str) {
        if !self.stats.levels_completed.iter().any(|l| l == level_id) {
            self.stats.levels_completed.push(level_id.to_string());
        }
        self.award(self.values.level_completed, "level");
    }

    fn on_encounter_completed(&mut self) {
        self.stats.encounters_completed += 1;
        self.award(self.values.encounter_completed, "encounter");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_bonus_by_kind() {
        let mut board = ScoreBoard::new();
        board.on_actor_killed(ActorKind::GroundMelee);
        board.on_actor_killed(ActorKind::RangedCrawler);
        board.on_actor_killed(ActorKind::FlyingSwooper);
        assert_eq!(board.score(), 450);
        board.on_actor_killed(ActorKind::Boss);
        assert_eq!(board.score(), 1450);
        assert_eq!(board.stats().enemies_killed, 4);
        assert_eq!(board.stats().bosses_defeated, 1);
    }

    #[test]
    fn test_damage_points_round_down() {
        let mut board = ScoreBoard::new();
        board.on_damage_dealt(12.7);
        assert_eq!(board.score(), 12);
        assert!((board.stats().total_damage_dealt - 12.7).abs() < 1e-4);
    }

    #[test]
    fn test_level_listed_once() {
        let mut board = ScoreBoard::new();
        board.on_level_completed("level-1");
        board.on_level_completed("level-1");
        board.on_pickup_collected(PickupKind::Health);
        board.on_encounter_completed();
        assert_eq!(board.stats().levels_completed, vec!["level-1".to_string()]);
        assert_eq!(board.score(), 2000 + 25 + 2500);
    }

    #[test]
    fn test_reset_keeps_high_score() {
        let mut board = ScoreBoard::new();
        board.on_actor_killed(ActorKind::Boss);
        board.reset_session();
        assert_eq!(board.score(), 0);
        assert_eq!(board.high_score(), 1000);
        assert_eq!(board.stats(), &ScoreStats::default());
    }

    #[test]
    fn test_player_death_scores_nothing() {
        let mut board = ScoreBoard::new();
        board.on_actor_killed(ActorKind::Player);
        board.on_level_failed("level-1");
        assert_eq!(board.score(), 0);
    }
}
