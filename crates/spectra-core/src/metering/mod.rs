//! Level metering.
//!
//! - `LevelMeter`: per-frame peak/RMS with ballistics, hold indicators and phase correlation
//! - Building blocks: `Ballistics`, `HoldIndicator`, `pearson_correlation`

mod ballistics;
mod correlation;
mod hold;
mod meter;

pub use ballistics::Ballistics;
pub use correlation::{pearson_correlation, CorrelationState, CORRELATION_BLEND};
pub use hold::HoldIndicator;
pub use meter::{LevelMeter, LevelReading, MeterState, StereoLevel};
