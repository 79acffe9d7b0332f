//! Windowed FFT magnitude stage.
//!
//! Turns one block of time-domain samples into a per-bin dB spectrum, the
//! input format of [`crate::SpectralMapper`] and [`crate::CaptureBank`].
//! Magnitudes are normalized by the window's coherent gain so a full-scale
//! sine centred on a bin reads 0 dB.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use spectra_core::math::amplitude_to_db;
use spectra_core::{Error, Result};

/// Smallest supported FFT size.
pub const MIN_FFT_SIZE: usize = 64;
/// Largest supported FFT size.
pub const MAX_FFT_SIZE: usize = 65536;

/// Reusable Hann-windowed forward FFT producing `fft_size / 2` dB bins.
pub struct MagnitudeAnalyzer {
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// `2 / sum(window)`: undoes the window's coherent gain and folds in the
    /// mirrored negative-frequency half.
    scale: f32,
    buffer: Vec<Complex<f32>>,
}

impl core::fmt::Debug for MagnitudeAnalyzer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MagnitudeAnalyzer")
            .field("fft_size", &self.fft_size)
            .finish_non_exhaustive()
    }
}

impl MagnitudeAnalyzer {
    pub fn new(fft_size: usize) -> Result<Self> {
        if !fft_size.is_power_of_two() || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
            return Err(Error::InvalidConfig(format!(
                "fft_size {} must be a power of two in {}-{}",
                fft_size, MIN_FFT_SIZE, MAX_FFT_SIZE
            )));
        }

        let window = hann_window(fft_size);
        let scale = 2.0 / window.iter().sum::<f32>();
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        tracing::debug!("Planned {}-point FFT", fft_size);

        Ok(Self {
            fft_size,
            fft,
            window,
            scale,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Spectrum of `samples` (exactly `fft_size` long) in dB per bin.
    /// Silent bins read `-inf`.
    pub fn analyze(&mut self, samples: &[f32]) -> Result<Vec<f32>> {
        let mut out = vec![f32::NEG_INFINITY; self.bin_count()];
        self.analyze_into(samples, &mut out)?;
        Ok(out)
    }

    /// Like [`analyze`](Self::analyze), writing into `out`
    /// (`fft_size / 2` long).
    pub fn analyze_into(&mut self, samples: &[f32], out: &mut [f32]) -> Result<()> {
        Error::check_lengths(self.fft_size, samples.len())?;
        Error::check_lengths(self.bin_count(), out.len())?;

        for ((slot, &s), &w) in self.buffer.iter_mut().zip(samples).zip(&self.window) {
            *slot = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.buffer);

        for (db, c) in out.iter_mut().zip(&self.buffer) {
            *db = amplitude_to_db(c.norm() * self.scale);
        }
        Ok(())
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let angle = 2.0 * core::f32::consts::PI * i as f32 / (size - 1) as f32;
            0.5 * (1.0 - angle.cos())
        })
        .collect()
}
