//! AnalyzerSession that drives every component once per frame.

use spectra_analysis::{
    CaptureBank, CaptureCommand, CaptureConfig, CaptureMode, CaptureTransition, MagnitudeAnalyzer,
    MapperConfig, PixelPoint, SlotId, SlotPhase, SpectralMapper, MAX_FFT_SIZE, MIN_FFT_SIZE,
};
use spectra_core::{
    midside, ChannelLayout, LevelMeter, LevelReading, MeterConfig, MeterSpeed, MidSideConfig,
    Weighting,
};

use crate::{AnalyzerSessionBuilder, Result};

/// Supported sample rates in Hz.
pub const SAMPLE_RATE_RANGE: (f32, f32) = (8000.0, 384000.0);

/// Everything needed to construct a session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SessionConfig {
    pub sample_rate: f32,
    /// Analysis window; spectra carry `fft_size / 2` bins.
    pub fft_size: usize,
    pub layout: ChannelLayout,
    pub meter: MeterConfig,
    pub mapper: MapperConfig,
    pub mid_side: MidSideConfig,
    pub capture: CaptureConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            fft_size: 2048,
            layout: ChannelLayout::Stereo,
            meter: MeterConfig::default(),
            mapper: MapperConfig::default(),
            mid_side: MidSideConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        let (min, max) = SAMPLE_RATE_RANGE;
        if !(min..=max).contains(&self.sample_rate) {
            return Err(spectra_core::Error::InvalidConfig(format!(
                "sample_rate {} Hz out of range ({}-{} Hz)",
                self.sample_rate, min, max
            ))
            .into());
        }
        if !self.fft_size.is_power_of_two()
            || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(spectra_core::Error::InvalidConfig(format!(
                "fft_size {} must be a power of two in {}-{}",
                self.fft_size, MIN_FFT_SIZE, MAX_FFT_SIZE
            ))
            .into());
        }
        self.meter.validate()?;
        self.mapper.validate()?;
        self.capture.validate()?;
        check_mid_side(self.layout, self.mid_side)?;
        Ok(())
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }
}

fn check_mid_side(layout: ChannelLayout, mid_side: MidSideConfig) -> Result<()> {
    if mid_side.enabled && !layout.is_stereo() {
        return Err(spectra_core::Error::InvalidConfig(
            "Mid/Side requires a stereo layout".into(),
        )
        .into());
    }
    Ok(())
}

/// Precomputed per-bin dB spectra from an external FFT stage.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumInput<'a> {
    pub left_db: &'a [f32],
    /// `None` on mono layouts.
    pub right_db: Option<&'a [f32]>,
}

/// One frame of input.
///
/// Without a [`SpectrumInput`] the session runs its own windowed FFT over
/// the most recent `fft_size` samples.
#[derive(Debug, Clone, Copy)]
pub struct AudioFrame<'a> {
    pub left: &'a [f32],
    /// `None` on mono layouts.
    pub right: Option<&'a [f32]>,
    pub spectrum: Option<SpectrumInput<'a>>,
    /// Time since the previous frame. Defaults to the buffer duration.
    pub elapsed_secs: Option<f32>,
}

impl<'a> AudioFrame<'a> {
    pub fn stereo(left: &'a [f32], right: &'a [f32]) -> Self {
        Self {
            left,
            right: Some(right),
            spectrum: None,
            elapsed_secs: None,
        }
    }

    pub fn mono(samples: &'a [f32]) -> Self {
        Self {
            left: samples,
            right: None,
            spectrum: None,
            elapsed_secs: None,
        }
    }

    pub fn with_spectrum(mut self, left_db: &'a [f32], right_db: Option<&'a [f32]>) -> Self {
        self.spectrum = Some(SpectrumInput { left_db, right_db });
        self
    }

    pub fn with_elapsed(mut self, secs: f32) -> Self {
        self.elapsed_secs = Some(secs);
        self
    }
}

/// A capture slot's snapshot mapped onto the display columns.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CaptureView {
    pub slot: SlotId,
    pub phase: SlotPhase,
    pub mode: CaptureMode,
    pub points: Vec<PixelPoint>,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct FrameOutput {
    pub level: LevelReading,
    /// Live spectrum (Mid/Side when enabled).
    pub spectrum: Vec<PixelPoint>,
    /// Slots that are capturing or displaying, in slot order.
    pub captures: Vec<CaptureView>,
}

impl FrameOutput {
    /// Snapshots frozen for display.
    pub fn displaying(&self) -> impl Iterator<Item = &CaptureView> {
        self.captures
            .iter()
            .filter(|view| view.phase == SlotPhase::Displaying)
    }
}

/// One analysis session: meter, mapper, capture slots and the FFT stage.
///
/// Single-threaded and frame-driven. Run one session per monitored device;
/// nothing is shared between sessions.
///
/// # Example
///
/// ```
/// use spectra::prelude::*;
///
/// let mut session = AnalyzerSession::builder()
///     .sample_rate(48000.0)
///     .fft_size(1024)
///     .build()?;
///
/// let left = vec![0.25f32; 512];
/// let right = vec![-0.25f32; 512];
/// let out = session.process_frame(&AudioFrame::stereo(&left, &right))?;
/// assert!(out.level.correlation <= 0.0);
/// # Ok::<(), spectra::Error>(())
/// ```
#[derive(Debug)]
pub struct AnalyzerSession {
    config: SessionConfig,
    meter: LevelMeter,
    mapper: SpectralMapper,
    captures: CaptureBank,
    analyzer: MagnitudeAnalyzer,
    /// Most recent `fft_size` samples per channel.
    history: [Vec<f32>; 2],
    /// Current frame's per-bin dB, L/R or M/S.
    spectrum: [Vec<f32>; 2],
}

impl AnalyzerSession {
    pub fn builder() -> AnalyzerSessionBuilder {
        AnalyzerSessionBuilder::default()
    }

    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let bins = config.bin_count();
        let meter = LevelMeter::new(config.meter.clone(), config.layout)?;
        let mapper = SpectralMapper::new(config.mapper.clone())?;
        let captures = CaptureBank::new(config.capture.clone(), config.layout.channels(), bins)?;
        let analyzer = MagnitudeAnalyzer::new(config.fft_size)?;

        tracing::debug!(
            "Analyzer session: {} Hz, {}-point FFT, {:?}, mid/side {:?}",
            config.sample_rate,
            config.fft_size,
            config.layout,
            config.mid_side
        );

        Ok(Self {
            history: [vec![0.0; config.fft_size], vec![0.0; config.fft_size]],
            spectrum: [vec![f32::NEG_INFINITY; bins], vec![f32::NEG_INFINITY; bins]],
            config,
            meter,
            mapper,
            captures,
            analyzer,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    pub fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    pub fn meter(&self) -> &LevelMeter {
        &self.meter
    }

    pub fn captures(&self) -> &CaptureBank {
        &self.captures
    }

    /// Runs one analysis pass.
    ///
    /// Samples go to the level meter (always L/R). The spectrum, supplied or
    /// computed, is re-encoded to Mid/Side when enabled, merged into every
    /// capturing slot and mapped onto display columns.
    pub fn process_frame(&mut self, frame: &AudioFrame<'_>) -> Result<FrameOutput> {
        let elapsed = frame
            .elapsed_secs
            .unwrap_or(frame.left.len() as f32 / self.config.sample_rate);
        if let Some(input) = frame.spectrum {
            self.check_spectrum(input)?;
        }
        let level = self.meter.update(frame.left, frame.right, elapsed)?;

        match frame.spectrum {
            Some(input) => self.load_spectrum(input)?,
            None => self.analyze_samples(frame.left, frame.right)?,
        }

        let stereo = self.config.layout.is_stereo();
        let sample_rate = self.config.sample_rate;
        let [left_db, right_db] = &self.spectrum;
        let right_db = stereo.then_some(right_db.as_slice());

        match right_db {
            Some(right_db) => self.captures.merge_frame(&[left_db.as_slice(), right_db])?,
            None => self.captures.merge_frame(&[left_db.as_slice()])?,
        }

        let spectrum = self.mapper.map_to_columns(left_db, right_db, sample_rate)?;

        let mut captures = Vec::new();
        for (slot, phase, snapshot) in self.captures.active() {
            let Some(left) = snapshot.channel_db(0) else {
                continue;
            };
            let right = snapshot.channel_db(1);
            let points = self
                .mapper
                .map_to_columns(&left, right.as_deref(), sample_rate)?;
            captures.push(CaptureView {
                slot,
                phase,
                mode: snapshot.mode(),
                points,
            });
        }

        Ok(FrameOutput {
            level,
            spectrum,
            captures,
        })
    }

    /// Rejects a supplied spectrum before any state is touched.
    fn check_spectrum(&self, input: SpectrumInput<'_>) -> Result<()> {
        let bins = self.bin_count();
        spectra_core::Error::check_lengths(bins, input.left_db.len())?;
        match (self.config.layout, input.right_db) {
            (ChannelLayout::Stereo, Some(right_db)) => {
                spectra_core::Error::check_lengths(bins, right_db.len())?;
            }
            (ChannelLayout::Stereo, None) => {
                return Err(spectra_core::Error::InvalidInput(
                    "stereo session requires a right spectrum".into(),
                )
                .into())
            }
            (ChannelLayout::Mono, Some(_)) => {
                return Err(spectra_core::Error::InvalidInput(
                    "mono session does not accept a right spectrum".into(),
                )
                .into())
            }
            (ChannelLayout::Mono, None) => {}
        }
        Ok(())
    }

    fn load_spectrum(&mut self, input: SpectrumInput<'_>) -> Result<()> {
        if let Some(right_db) = input.right_db {
            self.spectrum[1].copy_from_slice(right_db);
        }
        self.spectrum[0].copy_from_slice(input.left_db);

        if self.config.mid_side.enabled {
            // Magnitudes only: power-domain approximation
            let (mid, side) =
                midside::approximate_spectrum_db(&self.spectrum[0], &self.spectrum[1])?;
            self.spectrum = [mid, side];
        }
        Ok(())
    }

    fn analyze_samples(&mut self, left: &[f32], right: Option<&[f32]>) -> Result<()> {
        push_history(&mut self.history[0], left);
        if let Some(right) = right {
            push_history(&mut self.history[1], right);
        }

        let [left_db, right_db] = &mut self.spectrum;
        if self.config.mid_side.enabled {
            // Samples are available, so encode exactly before the FFT
            let (mid, side) =
                midside::encode(&self.history[0], &self.history[1], self.config.mid_side.mode)?;
            self.analyzer.analyze_into(&mid, left_db)?;
            self.analyzer.analyze_into(&side, right_db)?;
        } else {
            self.analyzer.analyze_into(&self.history[0], left_db)?;
            if self.config.layout.is_stereo() {
                self.analyzer.analyze_into(&self.history[1], right_db)?;
            }
        }
        Ok(())
    }

    pub fn set_weighting(&mut self, weighting: Weighting) {
        self.meter.set_weighting(weighting);
        self.config.meter = self.meter.config().clone();
    }

    pub fn set_meter_speed(&mut self, speed: MeterSpeed) {
        self.meter.set_speed(speed);
        self.config.meter = self.meter.config().clone();
    }

    pub fn set_meter_config(&mut self, config: MeterConfig) -> Result<()> {
        self.meter.set_config(config)?;
        self.config.meter = self.meter.config().clone();
        Ok(())
    }

    pub fn set_mapper_config(&mut self, config: MapperConfig) -> Result<()> {
        self.mapper.set_config(config.clone())?;
        self.config.mapper = config;
        Ok(())
    }

    /// Enabling Mid/Side on a mono session is an error. Switching the
    /// spectrum domain restarts every capture in progress.
    pub fn set_mid_side(&mut self, mid_side: MidSideConfig) -> Result<()> {
        check_mid_side(self.config.layout, mid_side)?;
        if mid_side.enabled != self.config.mid_side.enabled
            || (mid_side.enabled && mid_side.mode != self.config.mid_side.mode)
        {
            // A snapshot holds bins from one domain only
            let restarted = self.captures.restart_capturing();
            tracing::debug!(
                "Mid/Side {:?} -> {:?}, restarted {} capture(s)",
                self.config.mid_side,
                mid_side,
                restarted
            );
        } else if mid_side != self.config.mid_side {
            tracing::debug!("Mid/Side {:?} -> {:?}", self.config.mid_side, mid_side);
        }
        self.config.mid_side = mid_side;
        Ok(())
    }

    /// Applies immediately; an average capture in progress restarts.
    pub fn set_average_window(&mut self, secs: f32) -> Result<()> {
        self.captures.set_average_window(secs)?;
        self.config.capture = self.captures.config().clone();
        Ok(())
    }

    pub fn capture(&mut self, slot: SlotId, command: CaptureCommand) -> Result<CaptureTransition> {
        Ok(self.captures.transition(slot, command)?)
    }

    /// Session start: meters to the floor, filters and correlation cleared,
    /// captures dropped, sample history zeroed.
    pub fn reset(&mut self) {
        self.meter.reset();
        self.captures.reset();
        for history in &mut self.history {
            history.fill(0.0);
        }
        for spectrum in &mut self.spectrum {
            spectrum.fill(f32::NEG_INFINITY);
        }
        tracing::debug!("Analyzer session reset");
    }
}

/// Shifts `samples` into the tail of `history`, dropping the oldest.
fn push_history(history: &mut [f32], samples: &[f32]) {
    let n = samples.len().min(history.len());
    history.copy_within(n.., 0);
    let start = history.len() - n;
    history[start..].copy_from_slice(&samples[samples.len() - n..]);
}
