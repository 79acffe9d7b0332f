//! # Spectra - Real-time Stereo Analysis Engine
//!
//! Calibrated spectrum, level metering and capture overlays for a stereo
//! (or mono) signal, computed frame by frame.
//!
//! ## Architecture
//!
//! Spectra is an umbrella crate that coordinates:
//! - **spectra-core** - Weighting filters, level meter (ballistics, holds, phase correlation), Mid/Side codec
//! - **spectra-analysis** - FFT magnitude stage, logarithmic spectral mapper, capture slots
//!
//! Per frame, data flows one way:
//!
//! ```text
//! samples ──▶ (weighting) ──▶ LevelMeter ─────────────────────────────▶ LevelReading
//! samples ──▶ FFT (or supplied dB spectra) ──▶ (Mid/Side) ──▶ CaptureBank
//!                                                  └──────▶ SpectralMapper ──▶ PixelPoints
//! ```
//!
//! Device capture, rendering and settings persistence live outside this
//! crate; it only takes buffers in and hands data structures out.
//!
//! ## Quick Start
//!
//! ```rust
//! use spectra::prelude::*;
//!
//! let mut session = AnalyzerSession::builder()
//!     .sample_rate(48000.0)
//!     .fft_size(2048)
//!     .mid_side(MidSideConfig { enabled: true, mode: MidSideMode::Simple })
//!     .build()?;
//!
//! let left: Vec<f32> = (0..512).map(|i| (i as f32 * 0.13).sin() * 0.5).collect();
//! let right = left.clone();
//!
//! session.capture(SlotId::Hold, CaptureCommand::Activate(CaptureMode::Latch))?;
//! let out = session.process_frame(&AudioFrame::stereo(&left, &right))?;
//!
//! assert!(out.level.peak_hold.left > -6.1);
//! assert_eq!(out.captures.len(), 1);
//! # Ok::<(), spectra::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Everything needed for analysis
//! - `serialization` - serde derives on configuration and output types

/// Re-export of spectra-core for direct access
pub use spectra_core as core;

/// Re-export of spectra-analysis for direct access
pub use spectra_analysis as analysis;

// Metering
pub use spectra_core::{
    Ballistics, ChannelLayout, CorrelationState, HoldIndicator, LevelMeter, LevelReading,
    MeterConfig, MeterSpeed, StereoLevel, METER_FLOOR_DB,
};

// Weighting and Mid/Side
pub use spectra_core::{midside, MidSideConfig, MidSideMode, Weighting, WeightingFilter};

// Spectrum
pub use spectra_analysis::{
    BinCombine, DbRange, FrequencyRange, MagnitudeAnalyzer, MapperConfig, PixelPoint,
    SpectralMapper,
};

// Capture
pub use spectra_analysis::{
    CaptureBank, CaptureCommand, CaptureConfig, CaptureMode, CaptureTransition, SlotId, SlotPhase,
    FREEZE_SLOTS,
};

mod builder;
mod error;
mod session;

pub use builder::AnalyzerSessionBuilder;
pub use error::{Error, Result};
pub use session::{
    AnalyzerSession, AudioFrame, CaptureView, FrameOutput, SessionConfig, SpectrumInput,
    SAMPLE_RATE_RANGE,
};

/// Convenience prelude for common imports
pub mod prelude {
    // Session
    pub use crate::{
        AnalyzerSession, AnalyzerSessionBuilder, AudioFrame, CaptureView, FrameOutput,
        SessionConfig,
    };

    // Configuration
    pub use crate::{
        BinCombine, ChannelLayout, MapperConfig, MeterConfig, MeterSpeed, MidSideConfig,
        MidSideMode, Weighting,
    };

    // Capture commands
    pub use crate::{CaptureCommand, CaptureConfig, CaptureMode, SlotId, SlotPhase};

    // Outputs
    pub use crate::{LevelReading, PixelPoint, StereoLevel};
}
