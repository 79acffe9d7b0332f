//! Attack/release response shaping for meter readings.

use crate::config::MeterSpeed;
use crate::math::{db_to_amplitude, meter_db, METER_FLOOR_DB};

/// Asymmetric one-pole smoothing applied once per update, in the linear
/// amplitude domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ballistics {
    attack: f32,
    release: f32,
}

impl Default for Ballistics {
    fn default() -> Self {
        Self::from_speed(MeterSpeed::default())
    }
}

impl Ballistics {
    /// Coefficients are clamped to `[0, 1)`.
    pub fn new(attack: f32, release: f32) -> Self {
        Self {
            attack: attack.clamp(0.0, 0.999),
            release: release.clamp(0.0, 0.999),
        }
    }

    pub fn from_speed(speed: MeterSpeed) -> Self {
        let (attack, release) = speed.coefficients();
        Self::new(attack, release)
    }

    /// Slower variant: the per-update step toward the target is divided by
    /// `multiplier` (values below 1.0 are treated as 1.0).
    pub fn relaxed(self, multiplier: f32) -> Self {
        let m = multiplier.max(1.0);
        Self::new(
            1.0 - (1.0 - self.attack) / m,
            1.0 - (1.0 - self.release) / m,
        )
    }

    pub fn attack(&self) -> f32 {
        self.attack
    }

    pub fn release(&self) -> f32 {
        self.release
    }

    /// Moves `current_db` toward `target_db`. Result is floored at -60 dB.
    pub fn smooth(&self, current_db: f32, target_db: f32) -> f32 {
        if current_db <= METER_FLOOR_DB && target_db <= METER_FLOOR_DB {
            return METER_FLOOR_DB;
        }

        let current = db_to_amplitude(current_db);
        let target = db_to_amplitude(target_db);
        let k = if target > current {
            self.attack
        } else {
            self.release
        };

        meter_db(target * (1.0 - k) + current * k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_instant_attack() {
        let b = Ballistics::new(0.0, 0.9);
        assert_abs_diff_eq!(b.smooth(-60.0, -6.0), -6.0, epsilon = 1e-4);
    }

    #[test]
    fn test_release_is_gradual() {
        let b = Ballistics::new(0.0, 0.9);
        let next = b.smooth(0.0, -60.0);
        assert!(next < 0.0 && next > -3.0, "release too fast: {}", next);
    }

    #[test]
    fn test_linear_domain_blend() {
        // 0.5 * 1.0 + 0.5 * 0.0 in amplitude, i.e. -6.02 dB
        let b = Ballistics::new(0.5, 0.5);
        assert_abs_diff_eq!(b.smooth(0.0, f32::NEG_INFINITY), -6.0206, epsilon = 1e-3);
    }

    #[test]
    fn test_silence_stays_on_floor() {
        let b = Ballistics::default();
        assert_eq!(b.smooth(METER_FLOOR_DB, METER_FLOOR_DB), METER_FLOOR_DB);
        assert_eq!(b.smooth(METER_FLOOR_DB, f32::NEG_INFINITY), METER_FLOOR_DB);
    }

    #[test]
    fn test_relaxed_is_slower() {
        let peak = Ballistics::from_speed(MeterSpeed::Fast);
        let rms = peak.relaxed(2.0);
        assert!(rms.attack() > peak.attack());
        assert!(rms.release() > peak.release());
        assert_abs_diff_eq!(rms.attack(), 0.5, epsilon = 1e-6);
        assert_eq!(peak.relaxed(1.0), peak);
        assert_eq!(peak.relaxed(0.2), peak);
    }

    #[test]
    fn test_converges() {
        let b = Ballistics::from_speed(MeterSpeed::Slow);
        let mut level = METER_FLOOR_DB;
        for _ in 0..200 {
            level = b.smooth(level, -12.0);
        }
        assert_abs_diff_eq!(level, -12.0, epsilon = 0.01);
    }
}
