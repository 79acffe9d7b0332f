//! DSP math utilities for metering and spectrum display.

/// Floor applied to every meter reading (peak, RMS, holds).
pub const METER_FLOOR_DB: f32 = -60.0;

/// Samples below this magnitude are flushed to exactly zero.
///
/// Roughly -300 dBFS, far below anything audible.
pub const DENORMAL_THRESHOLD: f32 = 1e-15;

/// Linear amplitude to dBFS. Zero maps to `-inf`.
#[inline]
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    if amplitude > 0.0 {
        20.0 * amplitude.log10()
    } else {
        f32::NEG_INFINITY
    }
}

/// dBFS to linear amplitude. `-inf` maps to zero.
#[inline]
pub fn db_to_amplitude(db: f32) -> f32 {
    if db == f32::NEG_INFINITY {
        0.0
    } else {
        10.0f32.powf(db / 20.0)
    }
}

/// Linear power to dB. Zero maps to `-inf`.
#[inline]
pub fn power_to_db(power: f32) -> f32 {
    if power > 0.0 {
        10.0 * power.log10()
    } else {
        f32::NEG_INFINITY
    }
}

/// dB to linear power. `-inf` maps to zero.
#[inline]
pub fn db_to_power(db: f32) -> f32 {
    if db == f32::NEG_INFINITY {
        0.0
    } else {
        10.0f32.powf(db / 10.0)
    }
}

/// Amplitude to dBFS, floored at [`METER_FLOOR_DB`]. Never returns NaN or `-inf`.
#[inline]
pub fn meter_db(amplitude: f32) -> f32 {
    let db = amplitude_to_db(amplitude);
    if db.is_nan() || db < METER_FLOOR_DB {
        METER_FLOOR_DB
    } else {
        db
    }
}

#[inline]
pub fn flush_denormal(sample: f32) -> f32 {
    if sample.abs() < DENORMAL_THRESHOLD {
        0.0
    } else {
        sample
    }
}

/// Maximum absolute sample value. Empty buffers read as zero.
pub fn peak_amplitude(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

/// Root mean square of the buffer. Empty buffers read as zero.
pub fn rms_amplitude(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_db_conversions() {
        assert_abs_diff_eq!(amplitude_to_db(1.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(amplitude_to_db(0.5), -6.0206, epsilon = 1e-3);
        assert_abs_diff_eq!(db_to_amplitude(-6.0206), 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(power_to_db(0.5), -3.0103, epsilon = 1e-3);
        assert_abs_diff_eq!(db_to_power(-3.0103), 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_silence_is_negative_infinity() {
        assert_eq!(amplitude_to_db(0.0), f32::NEG_INFINITY);
        assert_eq!(power_to_db(0.0), f32::NEG_INFINITY);
        assert_eq!(db_to_amplitude(f32::NEG_INFINITY), 0.0);
        assert_eq!(db_to_power(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_meter_db_floor() {
        assert_eq!(meter_db(0.0), METER_FLOOR_DB);
        assert_eq!(meter_db(1e-9), METER_FLOOR_DB);
        assert_eq!(meter_db(f32::NAN), METER_FLOOR_DB);
        assert_abs_diff_eq!(meter_db(1.0), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1e-20), 0.0);
        assert_eq!(flush_denormal(-1e-16), 0.0);
        assert_eq!(flush_denormal(1e-10), 1e-10);
    }

    #[test]
    fn test_peak_and_rms() {
        let buf = [0.5f32, -0.8, 0.3];
        assert_eq!(peak_amplitude(&buf), 0.8);
        assert_eq!(peak_amplitude(&[]), 0.0);
        assert_eq!(rms_amplitude(&[]), 0.0);
        assert_abs_diff_eq!(rms_amplitude(&[0.5; 64]), 0.5, epsilon = 1e-6);
    }
}
