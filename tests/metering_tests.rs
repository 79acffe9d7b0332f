//! Level meter verification with known signals.
//!
//! Run with:
//! ```bash
//! cargo test -p spectra --test metering_tests
//! ```

mod helpers;

use approx::assert_abs_diff_eq;
use helpers::tolerances::*;
use helpers::*;
use spectra::core::pearson_correlation;
use spectra::prelude::*;
use spectra::{LevelMeter, METER_FLOOR_DB};

fn meter(config: MeterConfig) -> LevelMeter {
    LevelMeter::new(config, ChannelLayout::Stereo).expect("Failed to create meter")
}

/// All-zero buffers read exactly -60 dB for peak and RMS on both channels,
/// whatever the weighting curve.
#[test]
fn test_silence_reads_floor() {
    let zeros = generate_silence(TEST_BUFFER_SIZE);
    for weighting in [Weighting::Z, Weighting::A, Weighting::C] {
        let mut meter = meter(MeterConfig {
            weighting,
            ..MeterConfig::default()
        });
        for _ in 0..5 {
            let r = meter.update(&zeros, Some(&zeros[..]), 0.01).unwrap();
            assert_eq!(r.peak.left, METER_FLOOR_DB);
            assert_eq!(r.peak.right, METER_FLOOR_DB);
            assert_eq!(r.rms.left, METER_FLOOR_DB);
            assert_eq!(r.rms.right, METER_FLOOR_DB);
            assert_eq!(r.correlation, 0.0);
        }
    }
}

/// 0.5 amplitude 1 kHz sine: the hold registers -6.02 dBFS on the first
/// update, and the smoothed peak converges there.
#[test]
fn test_half_scale_sine_peak() {
    let s = generate_sine(1000.0, 0.5, TEST_SAMPLE_RATE as f64, TEST_BUFFER_SIZE);
    let mut meter = meter(MeterConfig::default());

    let first = meter.update(&s, Some(&s[..]), 0.01).unwrap();
    assert_abs_diff_eq!(first.peak_hold.left, HALF_SCALE_DB, epsilon = DB_EPSILON);
    assert_abs_diff_eq!(first.peak_hold.right, HALF_SCALE_DB, epsilon = DB_EPSILON);
    assert!(first.peak.left < first.peak_hold.left);

    let mut last = first;
    for _ in 0..60 {
        last = meter.update(&s, Some(&s[..]), 0.01).unwrap();
    }
    assert_abs_diff_eq!(last.peak.left, HALF_SCALE_DB, epsilon = DB_EPSILON);
    // RMS of a sine sits 3.01 dB under its peak
    assert_abs_diff_eq!(last.rms.left, HALF_SCALE_DB - 3.0103, epsilon = DB_EPSILON);
}

/// Fast ballistics have zero attack: the first update already reads the target.
#[test]
fn test_fast_speed_is_immediate() {
    let s = generate_sine(1000.0, 0.5, TEST_SAMPLE_RATE as f64, TEST_BUFFER_SIZE);
    let mut meter = meter(MeterConfig {
        speed: MeterSpeed::Fast,
        ..MeterConfig::default()
    });
    let r = meter.update(&s, Some(&s[..]), 0.01).unwrap();
    assert_abs_diff_eq!(r.peak.left, HALF_SCALE_DB, epsilon = DB_EPSILON);
}

/// A -60 -> 0 dB step reaches the hold in one update and the hold does not
/// drop before the hold time has passed.
#[test]
fn test_step_hold_is_monotonic() {
    let zeros = generate_silence(TEST_BUFFER_SIZE);
    let full = generate_dc(1.0, TEST_BUFFER_SIZE);
    for speed in [MeterSpeed::Slow, MeterSpeed::Medium, MeterSpeed::Fast] {
        let mut meter = meter(MeterConfig {
            speed,
            peak_hold_secs: 1.0,
            ..MeterConfig::default()
        });
        meter.update(&zeros, Some(&zeros[..]), 0.1).unwrap();

        let r = meter.update(&full, Some(&full[..]), 0.1).unwrap();
        assert_abs_diff_eq!(r.peak_hold.left, 0.0, epsilon = FLOAT_EPSILON);

        // 0.9 s of silence: still held
        for _ in 0..9 {
            let r = meter.update(&zeros, Some(&zeros[..]), 0.1).unwrap();
            assert_abs_diff_eq!(r.peak_hold.left, 0.0, epsilon = FLOAT_EPSILON);
        }

        // Well past the hold time it has stepped down
        let mut r = meter.reading();
        for _ in 0..12 {
            r = meter.update(&zeros, Some(&zeros[..]), 0.1).unwrap();
        }
        assert!(r.peak_hold.left < 0.0, "hold never released ({})", r.peak_hold.left);
    }
}

/// RMS responds more slowly than peak on release.
#[test]
fn test_rms_release_slower_than_peak() {
    let zeros = generate_silence(TEST_BUFFER_SIZE);
    let full = generate_dc(1.0, TEST_BUFFER_SIZE);
    let mut meter = meter(MeterConfig {
        speed: MeterSpeed::Fast,
        ..MeterConfig::default()
    });
    for _ in 0..30 {
        meter.update(&full, Some(&full[..]), 0.01).unwrap();
    }
    let r = meter.update(&zeros, Some(&zeros[..]), 0.01).unwrap();
    assert!(r.rms.left > r.peak.left);
}

#[test]
fn test_correlation_extremes() {
    let s = generate_sine(440.0, 0.7, TEST_SAMPLE_RATE as f64, TEST_BUFFER_SIZE);
    let inverted: Vec<f32> = s.iter().map(|x| -x).collect();

    assert_abs_diff_eq!(pearson_correlation(&s, &s), 1.0, epsilon = FLOAT_EPSILON);
    assert_abs_diff_eq!(pearson_correlation(&s, &inverted), -1.0, epsilon = FLOAT_EPSILON);

    let mut meter = meter(MeterConfig::default());
    let mut r = meter.reading();
    for _ in 0..100 {
        r = meter.update(&s, Some(&inverted[..]), 0.01).unwrap();
    }
    assert_abs_diff_eq!(r.correlation, -1.0, epsilon = 1e-3);
}

#[test]
fn test_uncorrelated_noise() {
    let a = generate_noise(8192, 1);
    let b = generate_noise(8192, 99);
    let c = pearson_correlation(&a, &b);
    assert!(c.abs() < 0.1, "independent noise correlated at {}", c);
}

#[test]
fn test_contract_violations() {
    let mut meter = meter(MeterConfig::default());
    let a = generate_silence(512);
    let b = generate_silence(256);
    assert!(matches!(
        meter.update(&a, Some(&b[..]), 0.01),
        Err(spectra::core::Error::LengthMismatch { .. })
    ));
    assert!(meter.update(&a, None, 0.01).unwrap_err().is_invalid_input());
}

/// Mono layouts mirror left into right and never report correlation.
#[test]
fn test_mono_layout() {
    let s = generate_sine(1000.0, 0.5, TEST_SAMPLE_RATE as f64, TEST_BUFFER_SIZE);
    let mut meter = LevelMeter::new(MeterConfig::default(), ChannelLayout::Mono).unwrap();
    let r = meter.update(&s, None, 0.01).unwrap();
    assert_eq!(r.peak.left, r.peak.right);
    assert_eq!(r.peak_hold.left, r.peak_hold.right);
    assert_eq!(r.correlation, 0.0);
}
