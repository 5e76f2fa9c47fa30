//! Fixed-rate simulation clock.
//!
//! The core only accepts whole milliseconds, so a 60 Hz step alternates
//! between 16 and 17 ms while staying exact over every second.

use corebreak_common::Millis;

/// Produces tick durations for a fixed rate.
#[derive(Debug, Clone)]
pub struct FixedStep {
    hz: u64,
    frame: u64,
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FixedStep {
    /// Creates a clock ticking `hz` times per second.
    #[must_use]
    pub fn new(hz: u64) -> Self {
        Self {
            hz: hz.clamp(1, 1000),
            frame: 0,
        }
    }

    /// Frames produced so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Duration of the next frame.
    pub fn next_dt(&mut self) -> Millis {
        let start = self.frame * 1000 / self.hz;
        self.frame += 1;
        self.frame * 1000 / self.hz - start
    }
}
