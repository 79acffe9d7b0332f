//! Spectral Mapper
//!
//! Maps per-bin magnitude spectra (dB) onto display columns along a
//! logarithmic frequency axis:
//!
//! ```text
//! column = round(log10(f / f_min) / log10(f_max / f_min) * column_count)
//! ```
//!
//! Per frame, for each column that at least one bin lands in:
//!
//! 1. Combine its bins (peak envelope, or power-domain average, optionally
//!    frequency-weighted toward the loudest bins)
//! 2. Subtract the noise floor, if configured
//! 3. Add the calibration offset, clamp to the display range
//! 4. Flag columns where both channels are within the overlap tolerance
//! 5. Smooth across neighbouring columns, if configured
//!
//! The bin-to-column table is cached and rebuilt only when the sample rate,
//! bin count or axis configuration changes.

use core::ops::Range;

use spectra_core::{Error, Result};

use crate::combine::{
    combine_average, combine_peak, combine_weighted_average, keep_fraction, subtract_noise_floor,
};
use crate::smoothing::smooth_columns;

/// Largest allowed column smoothing radius.
pub const MAX_SMOOTHING_RADIUS: usize = 16;

/// Frequency axis limits in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct FrequencyRange {
    pub min_hz: f32,
    pub max_hz: f32,
}

impl Default for FrequencyRange {
    fn default() -> Self {
        Self {
            min_hz: 20.0,
            max_hz: 20000.0,
        }
    }
}

impl FrequencyRange {
    pub fn contains(&self, freq: f32) -> bool {
        freq >= self.min_hz && freq <= self.max_hz
    }
}

/// Display range in dB. Every output value is clamped into it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct DbRange {
    pub min_db: f32,
    pub max_db: f32,
}

impl Default for DbRange {
    fn default() -> Self {
        Self {
            min_db: -90.0,
            max_db: 0.0,
        }
    }
}

impl DbRange {
    #[inline]
    pub fn clamp(&self, db: f32) -> f32 {
        if db.is_nan() {
            self.min_db
        } else {
            db.clamp(self.min_db, self.max_db)
        }
    }
}

/// How bins sharing a column are combined. One policy per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum BinCombine {
    /// Loudest bin wins.
    #[default]
    PeakEnvelope,
    /// Mean of linear power.
    Average,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct MapperConfig {
    pub freq_range: FrequencyRange,
    pub db_range: DbRange,
    pub column_count: usize,
    pub combine: BinCombine,
    /// With [`BinCombine::Average`], average only the loudest bins of
    /// higher columns (100% of bins at the bottom, 10% at the top).
    pub frequency_weighted: bool,
    pub noise_floor_db: Option<f32>,
    /// Moving-average radius in columns (0 disables).
    pub smoothing_radius: usize,
    /// Added to every value before clamping.
    pub calibration_offset_db: f32,
    pub overlap_tolerance_db: f32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            freq_range: FrequencyRange::default(),
            db_range: DbRange::default(),
            column_count: 512,
            combine: BinCombine::PeakEnvelope,
            frequency_weighted: false,
            noise_floor_db: None,
            smoothing_radius: 0,
            calibration_offset_db: 0.0,
            overlap_tolerance_db: 1.0,
        }
    }
}

impl MapperConfig {
    pub fn validate(&self) -> Result<()> {
        let FrequencyRange { min_hz, max_hz } = self.freq_range;
        if !(min_hz.is_finite() && max_hz.is_finite() && min_hz > 0.0 && min_hz < max_hz) {
            return Err(Error::InvalidConfig(format!(
                "frequency range {}-{} Hz must satisfy 0 < min < max",
                min_hz, max_hz
            )));
        }
        let DbRange { min_db, max_db } = self.db_range;
        if !(min_db.is_finite() && max_db.is_finite() && min_db < max_db && max_db <= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "dB range {}..{} must satisfy min < max <= 0",
                min_db, max_db
            )));
        }
        if self.column_count == 0 {
            return Err(Error::InvalidConfig("column_count must be > 0".into()));
        }
        if self.smoothing_radius > MAX_SMOOTHING_RADIUS {
            return Err(Error::InvalidConfig(format!(
                "smoothing_radius {} exceeds {}",
                self.smoothing_radius, MAX_SMOOTHING_RADIUS
            )));
        }
        if !self.calibration_offset_db.is_finite() {
            return Err(Error::InvalidConfig(
                "calibration_offset_db must be finite".into(),
            ));
        }
        if !self.overlap_tolerance_db.is_finite() || self.overlap_tolerance_db < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "overlap_tolerance_db {} must be >= 0",
                self.overlap_tolerance_db
            )));
        }
        if let Some(floor) = self.noise_floor_db {
            if !floor.is_finite() {
                return Err(Error::InvalidConfig("noise_floor_db must be finite".into()));
            }
        }
        Ok(())
    }
}

/// One display column's values for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PixelPoint {
    /// Horizontal position in columns (`0..column_count`).
    pub x: f32,
    pub left_db: f32,
    /// `None` for mono input.
    pub right_db: Option<f32>,
    /// Both channels within the overlap tolerance. Advisory, for renderers.
    pub overlapping: bool,
}

/// Contiguous run of bins landing in one column.
#[derive(Debug, Clone, PartialEq)]
struct ColumnGroup {
    column: usize,
    bins: Range<usize>,
}

/// Centre frequency of `bin` for a spectrum of `bin_count` bins
/// (FFT size `2 * bin_count`).
#[inline]
pub fn bin_frequency(bin: usize, bin_count: usize, sample_rate: f32) -> f32 {
    bin as f32 * sample_rate / (2 * bin_count) as f32
}

/// Column for `freq`, or `None` outside the frequency range.
pub fn column_for_frequency(freq: f32, range: FrequencyRange, column_count: usize) -> Option<usize> {
    if column_count == 0 || !range.contains(freq) {
        return None;
    }
    let span = (range.max_hz / range.min_hz).log10();
    let pos = (freq / range.min_hz).log10() / span;
    let column = (pos * column_count as f32).round() as usize;
    Some(column.min(column_count - 1))
}

/// Stateful mapper caching the bin-to-column layout.
#[derive(Debug, Clone)]
pub struct SpectralMapper {
    config: MapperConfig,
    layout_key: Option<(u32, usize)>,
    groups: Vec<ColumnGroup>,
    scratch: Vec<f32>,
}

impl SpectralMapper {
    pub fn new(config: MapperConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            layout_key: None,
            groups: Vec::new(),
            scratch: Vec::new(),
        })
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: MapperConfig) -> Result<()> {
        config.validate()?;
        if config.freq_range != self.config.freq_range
            || config.column_count != self.config.column_count
        {
            self.layout_key = None;
        }
        self.config = config;
        Ok(())
    }

    /// Maps one frame. `right` is `None` for mono input and must otherwise
    /// match `left` in length.
    pub fn map_to_columns(
        &mut self,
        left: &[f32],
        right: Option<&[f32]>,
        sample_rate: f32,
    ) -> Result<Vec<PixelPoint>> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "sample_rate must be positive, got {}",
                sample_rate
            )));
        }
        if let Some(right) = right {
            Error::check_lengths(left.len(), right.len())?;
        }

        self.ensure_layout(left.len(), sample_rate);

        let config = &self.config;
        let top = config.column_count.saturating_sub(1).max(1) as f32;
        let mut points = Vec::with_capacity(self.groups.len());

        for group in &self.groups {
            let keep = keep_fraction(group.column as f32 / top);
            let l = finish_value(
                config,
                combine_bins(config, &left[group.bins.clone()], keep, &mut self.scratch),
            );
            let r = right.map(|right| {
                finish_value(
                    config,
                    combine_bins(config, &right[group.bins.clone()], keep, &mut self.scratch),
                )
            });

            points.push(PixelPoint {
                x: group.column as f32,
                left_db: l,
                right_db: r,
                overlapping: r.is_some_and(|r| (l - r).abs() <= config.overlap_tolerance_db),
            });
        }

        if config.smoothing_radius > 0 {
            smooth_columns(&mut points, config.smoothing_radius);
        }
        Ok(points)
    }

    /// Number of columns that receive at least one bin for this layout.
    pub fn occupied_columns(&mut self, bin_count: usize, sample_rate: f32) -> usize {
        self.ensure_layout(bin_count, sample_rate);
        self.groups.len()
    }

    fn ensure_layout(&mut self, bin_count: usize, sample_rate: f32) {
        let key = (sample_rate.to_bits(), bin_count);
        if self.layout_key == Some(key) {
            return;
        }

        self.groups.clear();
        for bin in 0..bin_count {
            let freq = bin_frequency(bin, bin_count, sample_rate);
            let Some(column) =
                column_for_frequency(freq, self.config.freq_range, self.config.column_count)
            else {
                continue;
            };
            match self.groups.last_mut() {
                Some(group) if group.column == column && group.bins.end == bin => {
                    group.bins.end = bin + 1;
                }
                _ => self.groups.push(ColumnGroup {
                    column,
                    bins: bin..bin + 1,
                }),
            }
        }

        tracing::debug!(
            "Spectrum layout: {} bins @ {} Hz -> {} occupied of {} columns",
            bin_count,
            sample_rate,
            self.groups.len(),
            self.config.column_count
        );
        self.layout_key = Some(key);
    }
}

/// One-shot mapping with a temporary [`SpectralMapper`].
pub fn map_to_columns(
    left: &[f32],
    right: Option<&[f32]>,
    sample_rate: f32,
    config: &MapperConfig,
) -> Result<Vec<PixelPoint>> {
    SpectralMapper::new(config.clone())?.map_to_columns(left, right, sample_rate)
}

fn combine_bins(config: &MapperConfig, bins: &[f32], keep: f32, scratch: &mut Vec<f32>) -> f32 {
    match config.combine {
        BinCombine::PeakEnvelope => combine_peak(bins),
        BinCombine::Average if config.frequency_weighted => {
            combine_weighted_average(bins, keep, scratch)
        }
        BinCombine::Average => combine_average(bins),
    }
}

fn finish_value(config: &MapperConfig, db: f32) -> f32 {
    let db = match config.noise_floor_db {
        Some(floor) => subtract_noise_floor(db, floor),
        None => db,
    };
    config.db_range.clamp(db + config.calibration_offset_db)
}
