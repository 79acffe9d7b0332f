//! Builder for configuring and constructing an `AnalyzerSession`.

use spectra_analysis::{CaptureConfig, MapperConfig};
use spectra_core::{ChannelLayout, MeterConfig, MidSideConfig};

use crate::{AnalyzerSession, Result, SessionConfig};

/// Every setting starts at its [`SessionConfig::default`] value. Validation
/// happens once, in [`build`](Self::build).
///
/// # Example
///
/// ```
/// use spectra::prelude::*;
///
/// let session = AnalyzerSession::builder()
///     .sample_rate(44100.0)
///     .fft_size(4096)
///     .mono()
///     .meter(MeterConfig {
///         weighting: Weighting::A,
///         ..MeterConfig::default()
///     })
///     .build()?;
///
/// assert_eq!(session.bin_count(), 2048);
/// # Ok::<(), spectra::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnalyzerSessionBuilder {
    config: SessionConfig,
}

impl AnalyzerSessionBuilder {
    /// Default: 48000.0
    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 2048
    pub fn fft_size(mut self, fft_size: usize) -> Self {
        self.config.fft_size = fft_size;
        self
    }

    /// Default: stereo
    pub fn layout(mut self, layout: ChannelLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn mono(self) -> Self {
        self.layout(ChannelLayout::Mono)
    }

    pub fn stereo(self) -> Self {
        self.layout(ChannelLayout::Stereo)
    }

    pub fn meter(mut self, meter: MeterConfig) -> Self {
        self.config.meter = meter;
        self
    }

    pub fn mapper(mut self, mapper: MapperConfig) -> Self {
        self.config.mapper = mapper;
        self
    }

    /// Rejected by `build` on mono layouts.
    pub fn mid_side(mut self, mid_side: MidSideConfig) -> Self {
        self.config.mid_side = mid_side;
        self
    }

    pub fn capture(mut self, capture: CaptureConfig) -> Self {
        self.config.capture = capture;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn build(self) -> Result<AnalyzerSession> {
        AnalyzerSession::new(self.config)
    }
}
