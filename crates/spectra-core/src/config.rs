//! Meter configuration.

use crate::weighting::Weighting;
use crate::{Error, Result};

/// Shortest and longest allowed hold time.
pub const HOLD_SECS_RANGE: (f32, f32) = (0.5, 2.0);

/// Number of channels fed to the analyzer. Fixed for the life of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum ChannelLayout {
    Mono,
    #[default]
    Stereo,
}

impl ChannelLayout {
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Mid/Side and phase correlation need two channels.
    pub fn is_stereo(self) -> bool {
        self == ChannelLayout::Stereo
    }
}

/// Meter response presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum MeterSpeed {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl MeterSpeed {
    /// Per-update `(attack, release)` retention coefficients.
    ///
    /// `smoothed = target * (1 - k) + current * k`, so 0.0 follows the input
    /// instantly and values near 1.0 respond slowly.
    pub fn coefficients(self) -> (f32, f32) {
        match self {
            MeterSpeed::Slow => (0.5, 0.95),
            MeterSpeed::Medium => (0.25, 0.9),
            MeterSpeed::Fast => (0.0, 0.8),
        }
    }
}

/// Configuration for [`crate::LevelMeter`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct MeterConfig {
    pub speed: MeterSpeed,
    pub weighting: Weighting,
    /// Seconds a peak hold stays before snapping to the live level.
    pub peak_hold_secs: f32,
    /// Seconds an RMS hold stays before snapping to the live level.
    pub rms_hold_secs: f32,
    /// How much slower RMS ballistics are than peak (>= 1.0).
    pub rms_release_multiplier: f32,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            speed: MeterSpeed::Medium,
            weighting: Weighting::Z,
            peak_hold_secs: 1.0,
            rms_hold_secs: 1.0,
            rms_release_multiplier: 2.0,
        }
    }
}

impl MeterConfig {
    pub fn validate(&self) -> Result<()> {
        validate_hold("peak_hold_secs", self.peak_hold_secs)?;
        validate_hold("rms_hold_secs", self.rms_hold_secs)?;
        if !self.rms_release_multiplier.is_finite() || self.rms_release_multiplier < 1.0 {
            return Err(Error::InvalidConfig(format!(
                "rms_release_multiplier {} must be >= 1.0",
                self.rms_release_multiplier
            )));
        }
        Ok(())
    }
}

fn validate_hold(name: &str, secs: f32) -> Result<()> {
    let (min, max) = HOLD_SECS_RANGE;
    if !(min..=max).contains(&secs) {
        return Err(Error::InvalidConfig(format!(
            "{} {} out of range ({}-{} s)",
            name, secs, min, max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MeterConfig::default();
        assert_eq!(config.rms_release_multiplier, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hold_range() {
        let mut config = MeterConfig {
            peak_hold_secs: 0.4,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        config.peak_hold_secs = 2.0;
        config.rms_hold_secs = 2.5;
        assert!(config.validate().is_err());

        config.rms_hold_secs = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rms_multiplier_floor() {
        let config = MeterConfig {
            rms_release_multiplier: 0.9,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_speed_presets_ordered() {
        let (fast_a, fast_r) = MeterSpeed::Fast.coefficients();
        let (med_a, med_r) = MeterSpeed::Medium.coefficients();
        let (slow_a, slow_r) = MeterSpeed::Slow.coefficients();
        assert!(fast_a < med_a && med_a < slow_a);
        assert!(fast_r < med_r && med_r < slow_r);
    }

    #[test]
    fn test_layout() {
        assert_eq!(ChannelLayout::Mono.channels(), 1);
        assert!(ChannelLayout::Stereo.is_stereo());
        assert!(!ChannelLayout::Mono.is_stereo());
    }
}
