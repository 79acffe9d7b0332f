//! # Spectra Core
//!
//! Numeric kernel of the Spectra stereo analyzer.
//!
//! - **Weighting filters**: A, C and flat (Z) biquad cascades for RMS metering
//! - **Level meter**: peak/RMS with attack/release ballistics, stepped holds, phase correlation
//! - **Mid/Side**: reversible L/R <-> M/S transform plus a display-only spectral approximation
//! - **Math**: dB conversions, denormal flushing
//!
//! Everything is single-threaded and frame-driven. Components own their
//! state; run one instance per analysis session.
//!
//! ## Example
//!
//! ```rust
//! use spectra_core::{midside, ChannelLayout, LevelMeter, MeterConfig, MidSideMode};
//!
//! let left: Vec<f32> = (0..512).map(|i| 0.5 * (i as f32 * 0.1).sin()).collect();
//! let right = left.clone();
//!
//! let mut meter = LevelMeter::new(MeterConfig::default(), ChannelLayout::Stereo)?;
//! let reading = meter.update(&left, Some(&right[..]), 512.0 / 44100.0)?;
//! assert!(reading.peak_hold.left > -6.1);
//!
//! let (mid, side) = midside::encode(&left, &right, MidSideMode::Simple)?;
//! assert!(side.iter().all(|&s| s == 0.0));
//! # let _ = mid;
//! # Ok::<(), spectra_core::Error>(())
//! ```

pub mod config;
pub mod math;
pub mod metering;
pub mod midside;
pub mod weighting;

mod error;

pub use config::{ChannelLayout, MeterConfig, MeterSpeed, HOLD_SECS_RANGE};
pub use error::{Error, Result};
pub use math::{amplitude_to_db, db_to_amplitude, db_to_power, power_to_db, METER_FLOOR_DB};
pub use metering::{
    pearson_correlation, Ballistics, CorrelationState, HoldIndicator, LevelMeter, LevelReading,
    MeterState, StereoLevel,
};
pub use midside::{MidSideConfig, MidSideMode};
pub use weighting::{Biquad, ChannelFilterState, Weighting, WeightingFilter};
