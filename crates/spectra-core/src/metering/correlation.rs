//! Phase correlation between the two channels of a frame.
//!
//! - +1.0: identical channels (mono)
//! - 0.0: uncorrelated, or one channel has no variance
//! - -1.0: one channel is the inverse of the other

/// Weight given to the previous smoothed value on each update.
pub const CORRELATION_BLEND: f32 = 0.7;

/// Pearson correlation coefficient of two equal-length buffers, in `[-1, 1]`.
///
/// Returns 0.0 when either buffer has zero variance (including silence and
/// empty buffers). Only the common prefix is used if lengths differ; callers
/// that care reject mismatched lengths first.
pub fn pearson_correlation(left: &[f32], right: &[f32]) -> f32 {
    let len = left.len().min(right.len());
    if len == 0 {
        return 0.0;
    }
    let n = len as f64;

    let mean_l = left[..len].iter().map(|&x| x as f64).sum::<f64>() / n;
    let mean_r = right[..len].iter().map(|&x| x as f64).sum::<f64>() / n;

    let mut cov = 0.0f64;
    let mut var_l = 0.0f64;
    let mut var_r = 0.0f64;
    for (&l, &r) in left[..len].iter().zip(&right[..len]) {
        let dl = l as f64 - mean_l;
        let dr = r as f64 - mean_r;
        cov += dl * dr;
        var_l += dl * dl;
        var_r += dr * dr;
    }

    if var_l <= f64::EPSILON * n || var_r <= f64::EPSILON * n {
        return 0.0;
    }

    let r = cov / (var_l.sqrt() * var_r.sqrt());
    if r.is_finite() {
        r.clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}

/// Frame-to-frame smoothed correlation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CorrelationState {
    value: f32,
}

impl CorrelationState {
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Blends a new instantaneous coefficient into the running value.
    pub fn update(&mut self, instant: f32) -> f32 {
        let instant = if instant.is_finite() {
            instant.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        self.value = (self.value * CORRELATION_BLEND + instant * (1.0 - CORRELATION_BLEND))
            .clamp(-1.0, 1.0);
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}
