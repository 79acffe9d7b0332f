//! Policies for collapsing several FFT bins into one display column.
//!
//! Averaging always happens in the linear power domain. Averaging dB values
//! directly understates the level: a -6 dB bin next to a silent one averages
//! to about -9 dB, not to `-inf` or -3 dB.

use spectra_core::math::{db_to_power, power_to_db};

/// Values this far above the noise floor get an exact power subtraction.
pub const NOISE_FLOOR_MARGIN_DB: f32 = 6.0;

/// Flat reduction below the margin. Equals the power-subtraction loss at
/// exactly `floor + 6 dB`, i.e. `-10 * log10(1 - 10^-0.6)`, so the two
/// regions meet without a step.
pub const NOISE_FLOOR_FLAT_REDUCTION_DB: f32 = 1.2564;

/// Share of bins kept by the frequency-weighted average at the lowest and
/// highest column.
pub const WEIGHTED_KEEP_RANGE: (f32, f32) = (1.0, 0.1);

#[inline]
fn sanitize(db: f32) -> f32 {
    if db.is_nan() {
        f32::NEG_INFINITY
    } else {
        db
    }
}

/// Peak envelope: loudest bin wins.
pub fn combine_peak(values: &[f32]) -> f32 {
    values
        .iter()
        .map(|&v| sanitize(v))
        .fold(f32::NEG_INFINITY, f32::max)
}

/// Mean of the bins' linear power, back in dB.
pub fn combine_average(values: &[f32]) -> f32 {
    if values.is_empty() {
        return f32::NEG_INFINITY;
    }
    let sum: f64 = values
        .iter()
        .map(|&v| db_to_power(sanitize(v)) as f64)
        .sum();
    power_to_db((sum / values.len() as f64) as f32)
}

/// Fraction of a column's bins kept at normalized position `position`
/// (0.0 = lowest column, 1.0 = highest). Falls linearly from 100% to 10%.
pub fn keep_fraction(position: f32) -> f32 {
    let (low, high) = WEIGHTED_KEEP_RANGE;
    let t = position.clamp(0.0, 1.0);
    low + (high - low) * t
}

/// Averages only the loudest `ceil(keep * len)` bins (at least one).
///
/// Uses a partial selection rather than a full sort; `scratch` is reused
/// between calls to avoid allocating per column.
pub fn combine_weighted_average(values: &[f32], keep: f32, scratch: &mut Vec<f32>) -> f32 {
    if values.is_empty() {
        return f32::NEG_INFINITY;
    }
    let len = values.len();
    let n = ((keep.clamp(0.0, 1.0) * len as f32).ceil() as usize).clamp(1, len);
    if n == len {
        return combine_average(values);
    }

    scratch.clear();
    scratch.extend(values.iter().map(|&v| sanitize(v)));
    scratch.select_nth_unstable_by(n - 1, |a, b| b.total_cmp(a));
    combine_average(&scratch[..n])
}

/// Removes a noise floor's contribution from `value_db`.
///
/// Above `floor + 6 dB` the floor's power is subtracted; at or below it a
/// flat reduction is applied instead, so values near the floor are
/// attenuated rather than cut off.
pub fn subtract_noise_floor(value_db: f32, floor_db: f32) -> f32 {
    if value_db > floor_db + NOISE_FLOOR_MARGIN_DB {
        power_to_db(db_to_power(value_db) - db_to_power(floor_db))
    } else {
        value_db - NOISE_FLOOR_FLAT_REDUCTION_DB
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_peak() {
        assert_eq!(combine_peak(&[-30.0, -6.0, -12.0]), -6.0);
        assert_eq!(combine_peak(&[]), f32::NEG_INFINITY);
        assert_eq!(combine_peak(&[f32::NAN, -40.0]), -40.0);
    }

    #[test]
    fn test_average_uses_power_domain() {
        let avg = combine_average(&[-6.0, f32::NEG_INFINITY]);
        assert!(avg.is_finite());
        assert_abs_diff_eq!(avg, -9.01, epsilon = 0.05);
        assert_abs_diff_eq!(combine_average(&[-20.0, -20.0, -20.0]), -20.0, epsilon = 1e-4);
    }

    #[test]
    fn test_average_of_silence() {
        assert_eq!(
            combine_average(&[f32::NEG_INFINITY, f32::NEG_INFINITY]),
            f32::NEG_INFINITY
        );
    }

    #[test]
    fn test_keep_fraction() {
        assert_eq!(keep_fraction(0.0), 1.0);
        assert_abs_diff_eq!(keep_fraction(1.0), 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(keep_fraction(0.5), 0.55, epsilon = 1e-6);
        assert_eq!(keep_fraction(7.0), keep_fraction(1.0));
    }

    #[test]
    fn test_weighted_average_keeps_loudest() {
        let mut scratch = Vec::new();
        let bins = [-60.0, -10.0, -60.0, -60.0, -60.0, -60.0, -60.0, -60.0, -60.0, -60.0];
        // 10% of 10 bins: only the -10 dB peak survives
        assert_abs_diff_eq!(
            combine_weighted_average(&bins, 0.1, &mut scratch),
            -10.0,
            epsilon = 1e-4
        );
        // Full keep is the plain average
        assert_abs_diff_eq!(
            combine_weighted_average(&bins, 1.0, &mut scratch),
            combine_average(&bins),
            epsilon = 1e-6
        );
        // Top 2 of 10
        assert_abs_diff_eq!(
            combine_weighted_average(&bins, 0.2, &mut scratch),
            combine_average(&[-10.0, -60.0]),
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_weighted_average_single_bin() {
        let mut scratch = Vec::new();
        assert_eq!(combine_weighted_average(&[-3.0], 0.1, &mut scratch), -3.0);
        assert_eq!(
            combine_weighted_average(&[], 0.5, &mut scratch),
            f32::NEG_INFINITY
        );
    }

    #[test]
    fn test_noise_floor_continuity() {
        let floor = -80.0;
        let above = subtract_noise_floor(floor + NOISE_FLOOR_MARGIN_DB + 1e-3, floor);
        let at = subtract_noise_floor(floor + NOISE_FLOOR_MARGIN_DB, floor);
        assert_abs_diff_eq!(above, at, epsilon = 0.01);
    }

    #[test]
    fn test_noise_floor_far_above_is_transparent() {
        assert_abs_diff_eq!(subtract_noise_floor(-10.0, -90.0), -10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_noise_floor_below_is_flat() {
        assert_abs_diff_eq!(
            subtract_noise_floor(-100.0, -80.0),
            -100.0 - NOISE_FLOOR_FLAT_REDUCTION_DB,
            epsilon = 1e-6
        );
        assert_eq!(
            subtract_noise_floor(f32::NEG_INFINITY, -80.0),
            f32::NEG_INFINITY
        );
    }
}
