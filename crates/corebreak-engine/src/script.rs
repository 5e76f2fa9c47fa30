//! Scripted input timelines.
//!
//! A [`Script`] is a list of cues, each holding one action over a time
//! range. Attack and fire are pulsed (pressed on every other frame) so the
//! core sees a fresh press whenever its cooldowns allow one.

use corebreak_common::Millis;
use corebreak_gameplay::InputSnapshot;

use crate::arena::Scenario;

/// A single input the script can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Walk left
    Left,
    /// Walk right
    Right,
    /// Jump or thrust
    Up,
    /// Duck
    Down,
    /// Melee, pulsed
    Attack,
    /// Gun, pulsed
    Fire,
}

/// Action held from `from` until `until` (exclusive).
#[derive(Debug, Clone, Copy)]
pub struct Cue {
    /// Start time
    pub from: Millis,
    /// End time
    pub until: Millis,
    /// Held action
    pub action: Action,
}

/// Input timeline.
#[derive(Debug, Clone, Default)]
pub struct Script {
    cues: Vec<Cue>,
}

impl Script {
    /// Empty script: nothing is ever pressed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cue.
    #[must_use]
    pub fn hold(mut self, action: Action, from: Millis, until: Millis) -> Self {
        self.cues.push(Cue {
            from,
            until: until.max(from),
            action,
        });
        self
    }

    /// Number of cues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Input for the frame starting at `now`.
    #[must_use]
    pub fn sample(&self, now: Millis, frame: u64) -> InputSnapshot {
        let pulse = frame % 2 == 0;
        self.cues
            .iter()
            .filter(|cue| now >= cue.from && now < cue.until)
            .fold(InputSnapshot::idle(), |input, cue| match cue.action {
                Action::Left => input.with_left(true),
                Action::Right => input.with_right(true),
                Action::Up => input.with_up(true),
                Action::Down => input.with_down(true),
                Action::Attack => input.with_attack(input.attack || pulse),
                Action::Fire => input.with_alt_fire(input.alt_fire || pulse),
            })
    }

    /// Default timeline for a scenario lasting `length` ms.
    #[must_use]
    pub fn for_scenario(scenario: Scenario, length: Millis) -> Self {
        match scenario {
            Scenario::Level => Self::new()
                .hold(Action::Right, 0, 1_400)
                .hold(Action::Attack, 1_400, 4_000)
                .hold(Action::Right, 4_000, 6_000)
                .hold(Action::Fire, 4_000, 12_000)
                .hold(Action::Up, 6_000, 6_400)
                .hold(Action::Right, 6_000, 8_000)
                .hold(Action::Attack, 8_000, length),
            Scenario::Boss => Self::new()
                .hold(Action::Fire, 0, length)
                .hold(Action::Up, 5_000, 5_300)
                .hold(Action::Down, 9_000, 10_500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_combine() {
        let script = Script::new()
            .hold(Action::Right, 0, 1000)
            .hold(Action::Up, 500, 700);
        let input = script.sample(600, 0);
        assert!(input.right && input.up);
        assert!(!script.sample(700, 0).up);
        assert!(!script.sample(1000, 0).right);
    }

    #[test]
    fn test_attack_is_pulsed() {
        let script = Script::new().hold(Action::Attack, 0, 1000);
        assert!(script.sample(0, 0).attack);
        assert!(!script.sample(16, 1).attack);
        assert!(script.sample(33, 2).attack);
    }

    #[test]
    fn test_boss_script_fires_throughout() {
        let script = Script::for_scenario(Scenario::Boss, 30_000);
        assert!(script.sample(29_000, 4).alt_fire);
        assert!(!script.sample(30_000, 4).alt_fire);
    }
}
