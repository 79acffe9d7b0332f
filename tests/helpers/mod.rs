//! Test helpers and fixtures for Spectra integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (Mid/Side round trip, correlation)
//! - `DB_EPSILON` (0.1 dB): Level readings of known signals
//! - `CAPTURE_EPSILON` (0.5 dB): Converged capture averages

#![allow(dead_code)]

pub mod tolerances;

use spectra::prelude::*;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f32 = 48000.0;

/// Standard buffer size for deterministic testing
pub const TEST_BUFFER_SIZE: usize = 512;

/// Display frame rate assumed by capture averaging.
pub const TEST_FRAME_RATE: f32 = 30.0;

/// Routes `tracing` output through the test harness at debug level.
/// Shown only for failing tests or with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Stereo session with a small FFT, default everything else.
pub fn test_session() -> AnalyzerSession {
    init_tracing();
    AnalyzerSession::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .fft_size(1024)
        .build()
        .expect("Failed to create test session")
}

/// Session built from a full config.
pub fn test_session_with(config: SessionConfig) -> AnalyzerSession {
    init_tracing();
    AnalyzerSession::new(config).expect("Failed to create test session")
}

/// Generate a test signal: sine wave at given frequency and amplitude.
pub fn generate_sine(frequency: f64, amplitude: f32, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Generate silence (zero samples).
pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Generate white noise (random samples in -1..1).
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    // Simple LCG for reproducible "random" noise
    let mut rng = seed;
    (0..num_samples)
        .map(|_| {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((rng >> 33) as f32 / (1u64 << 31) as f32) * 2.0 - 1.0
        })
        .collect()
}

/// Generate a DC offset signal (constant value).
pub fn generate_dc(value: f32, num_samples: usize) -> Vec<f32> {
    vec![value; num_samples]
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Peak in dBFS, floored like the meter.
pub fn peak_db(samples: &[f32]) -> f32 {
    let p = peak(samples);
    if p > 0.0 {
        (20.0 * p.log10()).max(-60.0)
    } else {
        -60.0
    }
}

/// Flat per-bin dB spectrum.
pub fn flat_spectrum(db: f32, bins: usize) -> Vec<f32> {
    vec![db; bins]
}

/// Feeds `frames` identical frames and returns the last output.
pub fn run_frames(session: &mut AnalyzerSession, frame: &AudioFrame<'_>, frames: usize) -> FrameOutput {
    let mut out = None;
    for _ in 0..frames {
        out = Some(session.process_frame(frame).expect("frame failed"));
    }
    out.expect("at least one frame")
}
