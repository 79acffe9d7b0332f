//! Mid/Side encoding of a stereo pair.
//!
//! Two gain conventions are offered:
//!
//! - [`MidSideMode::Simple`]: `M = L + R`, `S = L - R`, decoded with a factor
//!   of 1/2. Correlated (mono) material reads +6 dB louder on the mid
//!   channel. This is expected, not clipping-safe headroom loss.
//! - [`MidSideMode::EnergyPreserving`]: both directions scaled by 1/sqrt(2),
//!   so correlated material reads +3 dB and total RMS energy is preserved.
//!
//! The transform is stateless; switching modes between frames is safe.
//!
//! [`approximate_spectrum_db`] works on magnitude-only spectra and is a
//! display approximation. It is lossy and has no inverse; never use it for
//! metering.

use crate::math::{db_to_power, flush_denormal, power_to_db};
use crate::{Error, Result};

use core::f32::consts::FRAC_1_SQRT_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum MidSideMode {
    #[default]
    Simple,
    EnergyPreserving,
}

impl MidSideMode {
    #[inline]
    fn encode_gain(self) -> f32 {
        match self {
            MidSideMode::Simple => 1.0,
            MidSideMode::EnergyPreserving => FRAC_1_SQRT_2,
        }
    }

    #[inline]
    fn decode_gain(self) -> f32 {
        match self {
            MidSideMode::Simple => 0.5,
            MidSideMode::EnergyPreserving => FRAC_1_SQRT_2,
        }
    }
}

/// Mid/Side switch as set by the configuration collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct MidSideConfig {
    pub enabled: bool,
    pub mode: MidSideMode,
}

/// Encodes one L/R sample pair.
#[inline]
pub fn encode_sample(left: f32, right: f32, mode: MidSideMode) -> (f32, f32) {
    let g = mode.encode_gain();
    (
        flush_denormal((left + right) * g),
        flush_denormal((left - right) * g),
    )
}

/// Decodes one M/S sample pair.
#[inline]
pub fn decode_sample(mid: f32, side: f32, mode: MidSideMode) -> (f32, f32) {
    let g = mode.decode_gain();
    (
        flush_denormal((mid + side) * g),
        flush_denormal((mid - side) * g),
    )
}

/// Encodes L/R buffers into new `(mid, side)` buffers.
pub fn encode(left: &[f32], right: &[f32], mode: MidSideMode) -> Result<(Vec<f32>, Vec<f32>)> {
    Error::check_lengths(left.len(), right.len())?;
    Ok(left
        .iter()
        .zip(right)
        .map(|(&l, &r)| encode_sample(l, r, mode))
        .unzip())
}

/// Decodes M/S buffers into new `(left, right)` buffers.
pub fn decode(mid: &[f32], side: &[f32], mode: MidSideMode) -> Result<(Vec<f32>, Vec<f32>)> {
    Error::check_lengths(mid.len(), side.len())?;
    Ok(mid
        .iter()
        .zip(side)
        .map(|(&m, &s)| decode_sample(m, s, mode))
        .unzip())
}

/// Encodes in place: `left` becomes mid, `right` becomes side.
pub fn encode_in_place(left: &mut [f32], right: &mut [f32], mode: MidSideMode) -> Result<()> {
    Error::check_lengths(left.len(), right.len())?;
    for (l, r) in left.iter_mut().zip(right.iter_mut()) {
        let (m, s) = encode_sample(*l, *r, mode);
        *l = m;
        *r = s;
    }
    Ok(())
}

/// Approximate Mid/Side levels from two magnitude spectra in dB.
///
/// Without phase, mid power is taken as `(P_L + P_R) / 2` and side power as
/// `|P_L - P_R| / 2`. Display only: the result is not invertible and does
/// not match the time-domain transform for partially correlated signals.
pub fn approximate_spectrum_db(left_db: &[f32], right_db: &[f32]) -> Result<(Vec<f32>, Vec<f32>)> {
    Error::check_lengths(left_db.len(), right_db.len())?;
    Ok(left_db
        .iter()
        .zip(right_db)
        .map(|(&l, &r)| {
            let pl = db_to_power(l);
            let pr = db_to_power(r);
            (
                power_to_db((pl + pr) * 0.5),
                power_to_db((pl - pr).abs() * 0.5),
            )
        })
        .unzip())
}
