//! Tolerance constants for analysis testing.
//!
//! Different measurements require different precision levels.

/// Floating point rounding errors.
/// Use for transforms that should be mathematically exact.
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Level readings of analytically known signals, in dB.
pub const DB_EPSILON: f32 = 0.1;

/// Converged exponential averages, in dB.
pub const CAPTURE_EPSILON: f32 = 0.5;

/// Expected level of a 0.5 amplitude sine peak: 20·log10(0.5).
pub const HALF_SCALE_DB: f32 = -6.0206;
