//! # Spectra Analysis
//!
//! Spectrum-side tools of the Spectra stereo analyzer.
//!
//! - **Magnitude stage**: Hann-windowed FFT to per-bin dB
//! - **Spectral mapper**: FFT bins to logarithmic display columns with
//!   peak/average combining, noise-floor subtraction, calibration and smoothing
//! - **Capture overlays**: hold (latch or average) and freeze lines
//!
//! All functions take per-bin dB values as `&[f32]`; `-inf` is a valid
//! (silent) bin.
//!
//! ## Example
//!
//! ```rust
//! use spectra_analysis::{MagnitudeAnalyzer, MapperConfig, SpectralMapper};
//!
//! let samples: Vec<f32> = (0..2048)
//!     .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 48000.0).sin())
//!     .collect();
//!
//! let mut analyzer = MagnitudeAnalyzer::new(2048)?;
//! let spectrum = analyzer.analyze(&samples)?;
//!
//! let mut mapper = SpectralMapper::new(MapperConfig::default())?;
//! let points = mapper.map_to_columns(&spectrum, None, 48000.0)?;
//! assert!(points.iter().all(|p| p.left_db <= 0.0 && p.left_db >= -90.0));
//! # Ok::<(), spectra_core::Error>(())
//! ```

pub mod capture;
pub mod combine;
pub mod fft;
pub mod mapper;
pub mod smoothing;

pub use capture::{
    CaptureBank, CaptureCommand, CaptureConfig, CaptureMode, CaptureTransition, SlotId, SlotPhase,
    SlotState, Snapshot, AVERAGE_WINDOW_RANGE, FREEZE_SLOTS,
};
pub use combine::{combine_average, combine_peak, combine_weighted_average, subtract_noise_floor};
pub use fft::{MagnitudeAnalyzer, MAX_FFT_SIZE, MIN_FFT_SIZE};
pub use mapper::{
    bin_frequency, column_for_frequency, map_to_columns, BinCombine, DbRange, FrequencyRange,
    MapperConfig, PixelPoint, SpectralMapper,
};
pub use smoothing::smooth_columns;
