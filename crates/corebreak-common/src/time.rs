//! Simulation time.
//!
//! The core runs on a simulated millisecond clock that only advances when
//! the host ticks it. Durations in tuning files are milliseconds too.

/// Simulated time or duration in milliseconds.
pub type Millis = u64;

/// Converts a millisecond duration to seconds for kinematics.
#[must_use]
pub fn to_secs(ms: Millis) -> f32 {
    ms as f32 / 1000.0
}

/// Scales a duration by a divisor, rounding to the nearest millisecond.
///
/// Used for cooldowns that shrink as a multiplier grows.
#[must_use]
pub fn scale_duration(ms: Millis, divisor: f32) -> Millis {
    if divisor <= 0.0 {
        return ms;
    }
    (ms as f32 / divisor).round() as Millis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_duration() {
        assert_eq!(scale_duration(3000, 1.5), 2000);
        assert_eq!(scale_duration(4000, 1.25), 3200);
        assert_eq!(scale_duration(4000, 0.0), 4000);
    }

    #[test]
    fn test_to_secs() {
        assert!((to_secs(250) - 0.25).abs() < f32::EPSILON);
    }
}
