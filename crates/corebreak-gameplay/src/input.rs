//! Per-tick player input.
//!
//! The host hands the core one [`InputSnapshot`] per tick. [`InputState`]
//! keeps the previous snapshot so actions can react to presses rather than
//! holds.

use corebreak_common::Facing;
use serde::{Deserialize, Serialize};

/// Button state sampled by the host for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSnapshot {
    /// Move left
    pub left: bool,
    /// Move right
    pub right: bool,
    /// Jump / jetpack thrust
    pub up: bool,
    /// Duck
    pub down: bool,
    /// Melee attack
    pub attack: bool,
    /// Fire the gun
    pub alt_fire: bool,
}

impl InputSnapshot {
    /// Snapshot with no buttons held.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Sets the left button.
    #[must_use]
    pub fn with_left(mut self, held: bool) -> Self {
        self.left = held;
        self
    }

    /// Sets the right button.
    #[must_use]
    pub fn with_right(mut self, held: bool) -> Self {
        self.right = held;
        self
    }

    /// Sets the up button.
    #[must_use]
    pub fn with_up(mut self, held: bool) -> Self {
        self.up = held;
        self
    }

    /// Sets the down button.
    #[must_use]
    pub fn with_down(mut self, held: bool) -> Self {
        self.down = held;
        self
    }

    /// Sets the attack button.
    #[must_use]
    pub fn with_attack(mut self, held: bool) -> Self {
        self.attack = held;
        self
    }

    /// Sets the fire button.
    #[must_use]
    pub fn with_alt_fire(mut self, held: bool) -> Self {
        self.alt_fire = held;
        self
    }
}

/// Current and previous snapshot, for edge detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    current: InputSnapshot,
    previous: InputSnapshot,
}

impl InputState {
    /// Creates an input state with nothing held.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shifts in the snapshot for a new tick.
    pub fn advance(&mut self, snapshot: InputSnapshot) {
        self.previous = self.current;
        self.current = snapshot;
    }

    /// Snapshot for the current tick.
    #[must_use]
    pub fn current(&self) -> InputSnapshot {
        self.current
    }

    /// Horizontal direction requested this tick. Left wins over right.
    #[must_use]
    pub fn horizontal(&self) -> Option<Facing> {
        if self.current.left {
            Some(Facing::Left)
        } else if self.current.right {
            Some(Facing::Right)
        } else {
            None
        }
    }

    /// Checks whether jump is held.
    #[must_use]
    pub fn jump_held(&self) -> bool {
        self.current.up
    }

    /// Checks whether duck is held.
    #[must_use]
    pub fn down_held(&self) -> bool {
        self.current.down
    }

    /// Attack was pressed this tick.
    #[must_use]
    pub fn attack_pressed(&self) -> bool {
        self.current.attack && !self.previous.attack
    }

    /// Fire was pressed this tick.
    #[must_use]
    pub fn fire_pressed(&self) -> bool {
        self.current.alt_fire && !self.previous.alt_fire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_is_edge_triggered() {
        let mut input = InputState::new();
        input.advance(InputSnapshot::idle().with_attack(true));
        assert!(input.attack_pressed());

        input.advance(InputSnapshot::idle().with_attack(true));
        assert!(!input.attack_pressed());

        input.advance(InputSnapshot::idle());
        input.advance(InputSnapshot::idle().with_attack(true));
        assert!(input.attack_pressed());
    }

    #[test]
    fn test_left_wins() {
        let mut input = InputState::new();
        input.advance(InputSnapshot::idle().with_left(true).with_right(true));
        assert_eq!(input.horizontal(), Some(Facing::Left));

        input.advance(InputSnapshot::idle());
        assert_eq!(input.horizontal(), None);
    }
}
