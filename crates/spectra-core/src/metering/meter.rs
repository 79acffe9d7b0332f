//! Peak/RMS level meter with hold indicators and phase correlation.

use super::ballistics::Ballistics;
use super::correlation::{pearson_correlation, CorrelationState};
use super::hold::HoldIndicator;
use crate::config::{ChannelLayout, MeterConfig, MeterSpeed};
use crate::math::{meter_db, peak_amplitude, rms_amplitude, METER_FLOOR_DB};
use crate::weighting::{ChannelFilterState, Weighting, WeightingFilter};
use crate::{Error, Result};

/// A left/right pair of levels in dBFS.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct StereoLevel {
    pub left: f32,
    pub right: f32,
}

impl Default for StereoLevel {
    fn default() -> Self {
        Self::splat(METER_FLOOR_DB)
    }
}

impl StereoLevel {
    pub fn splat(db: f32) -> Self {
        Self {
            left: db,
            right: db,
        }
    }

    pub fn max(&self) -> f32 {
        self.left.max(self.right)
    }
}

/// One update's worth of meter output. All levels are dBFS floored at -60.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct LevelReading {
    pub peak: StereoLevel,
    pub rms: StereoLevel,
    pub peak_hold: StereoLevel,
    pub rms_hold: StereoLevel,
    /// Smoothed phase correlation; 0.0 on mono layouts.
    pub correlation: f32,
}

/// Persistent per-channel meter values.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterState {
    peak: [f32; 2],
    rms: [f32; 2],
    peak_hold: [HoldIndicator; 2],
    rms_hold: [HoldIndicator; 2],
}

impl Default for MeterState {
    fn default() -> Self {
        Self {
            peak: [METER_FLOOR_DB; 2],
            rms: [METER_FLOOR_DB; 2],
            peak_hold: [HoldIndicator::default(); 2],
            rms_hold: [HoldIndicator::default(); 2],
        }
    }
}

/// Frame-driven level meter.
///
/// Owns the weighting delay lines, smoothed levels, hold indicators and the
/// correlation state for one session. Feed it one buffer per channel per
/// frame with [`update`](LevelMeter::update).
///
/// # Example
///
/// ```
/// use spectra_core::{ChannelLayout, LevelMeter, MeterConfig};
///
/// let mut meter = LevelMeter::new(MeterConfig::default(), ChannelLayout::Stereo).unwrap();
/// let left = vec![0.0f32; 512];
/// let right = vec![0.0f32; 512];
/// let reading = meter.update(&left, Some(&right[..]), 512.0 / 44100.0).unwrap();
/// assert_eq!(reading.peak.left, -60.0);
/// assert_eq!(reading.correlation, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct LevelMeter {
    config: MeterConfig,
    layout: ChannelLayout,
    filter: WeightingFilter,
    filter_state: [ChannelFilterState; 2],
    peak_ballistics: Ballistics,
    rms_ballistics: Ballistics,
    state: MeterState,
    correlation: CorrelationState,
    scratch: Vec<f32>,
}

impl LevelMeter {
    pub fn new(config: MeterConfig, layout: ChannelLayout) -> Result<Self> {
        config.validate()?;
        let filter = WeightingFilter::new(config.weighting);
        let peak_ballistics = Ballistics::from_speed(config.speed);
        Ok(Self {
            filter_state: [filter.new_state(), filter.new_state()],
            filter,
            peak_ballistics,
            rms_ballistics: peak_ballistics.relaxed(config.rms_release_multiplier),
            config,
            layout,
            state: MeterState::default(),
            correlation: CorrelationState::default(),
            scratch: Vec::new(),
        })
    }

    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn state(&self) -> &MeterState {
        &self.state
    }

    /// Replaces the whole configuration. Weighting changes clear the delay lines.
    pub fn set_config(&mut self, config: MeterConfig) -> Result<()> {
        config.validate()?;
        self.set_weighting(config.weighting);
        self.peak_ballistics = Ballistics::from_speed(config.speed);
        self.rms_ballistics = self.peak_ballistics.relaxed(config.rms_release_multiplier);
        self.config = config;
        Ok(())
    }

    /// Switching curves zeroes every delay line so the old curve's history
    /// does not ring through the new one.
    pub fn set_weighting(&mut self, weighting: Weighting) {
        if weighting == self.filter.weighting() {
            return;
        }
        tracing::debug!(
            "Weighting {} -> {}, clearing filter state",
            self.filter.weighting().label(),
            weighting.label()
        );
        self.filter = WeightingFilter::new(weighting);
        self.filter_state = [self.filter.new_state(), self.filter.new_state()];
        self.config.weighting = weighting;
    }

    pub fn set_speed(&mut self, speed: MeterSpeed) {
        tracing::debug!("Meter speed {:?} -> {:?}", self.config.speed, speed);
        self.config.speed = speed;
        self.peak_ballistics = Ballistics::from_speed(speed);
        self.rms_ballistics = self
            .peak_ballistics
            .relaxed(self.config.rms_release_multiplier);
    }

    /// Session start: levels and holds to the floor, delay lines and correlation cleared.
    pub fn reset(&mut self) {
        self.state = MeterState::default();
        for state in &mut self.filter_state {
            state.reset();
        }
        self.correlation.reset();
    }

    /// Meters one frame.
    ///
    /// `right` must be `Some` on stereo layouts and `None` on mono ones, and
    /// must match `left` in length. `elapsed_secs` is the time since the
    /// previous update and drives the hold timers.
    pub fn update(
        &mut self,
        left: &[f32],
        right: Option<&[f32]>,
        elapsed_secs: f32,
    ) -> Result<LevelReading> {
        if !elapsed_secs.is_finite() || elapsed_secs < 0.0 {
            return Err(Error::InvalidInput(format!(
                "elapsed_secs must be finite and non-negative, got {}",
                elapsed_secs
            )));
        }

        let right = match (self.layout, right) {
            (ChannelLayout::Stereo, Some(right)) => {
                Error::check_lengths(left.len(), right.len())?;
                Some(right)
            }
            (ChannelLayout::Stereo, None) => {
                return Err(Error::InvalidInput(
                    "stereo meter requires a right channel buffer".into(),
                ))
            }
            (ChannelLayout::Mono, Some(_)) => {
                return Err(Error::InvalidInput(
                    "mono meter does not accept a right channel buffer".into(),
                ))
            }
            (ChannelLayout::Mono, None) => None,
        };

        self.meter_channel(0, left, elapsed_secs);
        match right {
            Some(right) => {
                self.meter_channel(1, right, elapsed_secs);
                self.correlation.update(pearson_correlation(left, right));
            }
            None => self.mirror_left(),
        }

        Ok(self.reading())
    }

    /// Current values without advancing any state.
    pub fn reading(&self) -> LevelReading {
        let s = &self.state;
        LevelReading {
            peak: StereoLevel {
                left: s.peak[0],
                right: s.peak[1],
            },
            rms: StereoLevel {
                left: s.rms[0],
                right: s.rms[1],
            },
            peak_hold: StereoLevel {
                left: s.peak_hold[0].value(),
                right: s.peak_hold[1].value(),
            },
            rms_hold: StereoLevel {
                left: s.rms_hold[0].value(),
                right: s.rms_hold[1].value(),
            },
            correlation: self.correlation.value(),
        }
    }

    fn meter_channel(&mut self, ch: usize, samples: &[f32], elapsed_secs: f32) {
        let peak_db = meter_db(peak_amplitude(samples));
        let rms_db = meter_db(weighted_rms(
            &self.filter,
            &mut self.filter_state[ch],
            &mut self.scratch,
            samples,
        ));

        let state = &mut self.state;
        state.peak[ch] = self.peak_ballistics.smooth(state.peak[ch], peak_db);
        state.rms[ch] = self.rms_ballistics.smooth(state.rms[ch], rms_db);

        // Holds latch the unsmoothed level so a step registers in one update.
        state.peak_hold[ch].update(
            peak_db.max(state.peak[ch]),
            state.peak[ch],
            elapsed_secs,
            self.config.peak_hold_secs,
        );
        state.rms_hold[ch].update(
            rms_db.max(state.rms[ch]),
            state.rms[ch],
            elapsed_secs,
            self.config.rms_hold_secs,
        );
    }

    fn mirror_left(&mut self) {
        let s = &mut self.state;
        s.peak[1] = s.peak[0];
        s.rms[1] = s.rms[0];
        s.peak_hold[1] = s.peak_hold[0];
        s.rms_hold[1] = s.rms_hold[0];
    }
}

fn weighted_rms(
    filter: &WeightingFilter,
    state: &mut ChannelFilterState,
    scratch: &mut Vec<f32>,
    samples: &[f32],
) -> f32 {
    if filter.sections().is_empty() {
        return rms_amplitude(samples);
    }
    scratch.clear();
    scratch.extend_from_slice(samples);
    filter.apply_in_place(scratch, state);
    rms_amplitude(scratch)
}
