//! Frequency weighting filters (A, C and flat Z) for RMS metering.
//!
//! Each curve is a fixed cascade of second-order sections designed at a
//! 44.1 kHz reference rate and normalized to unity gain at 1 kHz. The
//! coefficients are owned by [`WeightingFilter`]; the per-channel delay lines
//! live in a separate [`ChannelFilterState`] so the same filter can run over
//! any number of independent channels.
//!
//! | Curve | Sections |
//! |-------|----------|
//! | Z | none (identity) |
//! | A | 2x first-order HP @ 20.6 Hz, HP pair @ 107.7/737.9 Hz, LP @ 12.2 kHz |
//! | C | HP @ 20.6 Hz (-3 dB near 31 Hz), LP @ 12.2 kHz (-3 dB near 8 kHz) |

use core::f64::consts::PI;

/// Sample rate the weighting coefficients are designed for.
pub const REFERENCE_SAMPLE_RATE: f64 = 44100.0;

/// Frequency at which every weighting curve reads 0 dB.
const NORMALIZATION_HZ: f64 = 1000.0;

/// IEC 61672 pole frequencies.
const POLE_LOW_HZ: f64 = 20.598997;
const POLE_MID_A_HZ: f64 = 107.65265;
const POLE_MID_B_HZ: f64 = 737.86223;
const POLE_HIGH_HZ: f64 = 12194.217;

/// Frequency weighting curve applied before RMS computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Weighting {
    /// Flat response (no filtering).
    #[default]
    Z,
    /// A-weighting (IEC 61672), 4 sections.
    A,
    /// C-weighting (IEC 61672), 2 sections.
    C,
}

impl Weighting {
    /// Biquad cascade implementing this curve, normalized to 0 dB at 1 kHz.
    pub fn sections(self) -> Vec<Biquad> {
        let fs = REFERENCE_SAMPLE_RATE;
        let mut sections = match self {
            Weighting::Z => return Vec::new(),
            Weighting::A => {
                // The 107.7/737.9 Hz real poles form one section:
                // w0^2 = w1*w2, w0/Q = w1 + w2.
                let mid_f0 = (POLE_MID_A_HZ * POLE_MID_B_HZ).sqrt();
                let mid_q = mid_f0 / (POLE_MID_A_HZ + POLE_MID_B_HZ);
                vec![
                    Biquad::first_order_highpass(POLE_LOW_HZ, fs),
                    Biquad::first_order_highpass(POLE_LOW_HZ, fs),
                    Biquad::highpass(mid_f0, mid_q, fs),
                    Biquad::lowpass(POLE_HIGH_HZ, 0.5, fs),
                ]
            }
            Weighting::C => vec![
                Biquad::highpass(POLE_LOW_HZ, 0.5, fs),
                Biquad::lowpass(POLE_HIGH_HZ, 0.5, fs),
            ],
        };

        let gain: f64 = sections
            .iter()
            .map(|s| s.magnitude_at(NORMALIZATION_HZ, fs))
            .product();
        if gain > 0.0 {
            sections[0] = sections[0].scaled(1.0 / gain);
        }
        sections
    }

    pub fn label(self) -> &'static str {
        match self {
            Weighting::Z => "Z",
            Weighting::A => "A",
            Weighting::C => "C",
        }
    }
}

/// Second-order section coefficients, normalized so `a0 == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    /// RBJ cookbook high-pass.
    pub fn highpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * freq / sample_rate;
        let cos = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 + cos) / 2.0 / a0,
            b1: -(1.0 + cos) / a0,
            b2: (1.0 + cos) / 2.0 / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// RBJ cookbook low-pass.
    pub fn lowpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * freq / sample_rate;
        let cos = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 - cos) / 2.0 / a0,
            b1: (1.0 - cos) / a0,
            b2: (1.0 - cos) / 2.0 / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Bilinear-transformed first-order high-pass held in biquad form.
    pub fn first_order_highpass(freq: f64, sample_rate: f64) -> Self {
        let k = (PI * freq / sample_rate).tan();
        let norm = 1.0 / (1.0 + k);
        Self {
            b0: norm,
            b1: -norm,
            b2: 0.0,
            a1: (k - 1.0) * norm,
            a2: 0.0,
        }
    }

    /// Scales the numerator (overall gain).
    pub fn scaled(mut self, gain: f64) -> Self {
        self.b0 *= gain;
        self.b1 *= gain;
        self.b2 *= gain;
        self
    }

    /// Linear magnitude response at `freq`.
    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq / sample_rate;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        let den = (den_re * den_re + den_im * den_im).sqrt();
        if den == 0.0 {
            return f64::INFINITY;
        }
        (num_re * num_re + num_im * num_im).sqrt() / den
    }

    #[inline]
    fn process(&self, x: f64, state: &mut BiquadState) -> f64 {
        let y = self.b0 * x + self.b1 * state.x1 + self.b2 * state.x2
            - self.a1 * state.y1
            - self.a2 * state.y2;
        state.x2 = state.x1;
        state.x1 = x;
        state.y2 = state.y1;
        state.y1 = y;
        y
    }
}

/// Two input and two output delay values for one section.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

/// Delay lines for one channel across every section of a cascade.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelFilterState {
    stages: Vec<BiquadState>,
}

impl ChannelFilterState {
    pub fn new(stages: usize) -> Self {
        Self {
            stages: vec![BiquadState::default(); stages],
        }
    }

    pub fn reset(&mut self) {
        self.stages.fill(BiquadState::default());
    }

    pub fn is_cleared(&self) -> bool {
        self.stages.iter().all(|s| *s == BiquadState::default())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// A weighting curve's coefficients. Stateless; delay lines are passed in.
#[derive(Debug, Clone)]
pub struct WeightingFilter {
    weighting: Weighting,
    sections: Vec<Biquad>,
}

impl Default for WeightingFilter {
    fn default() -> Self {
        Self::new(Weighting::Z)
    }
}

impl WeightingFilter {
    pub fn new(weighting: Weighting) -> Self {
        Self {
            weighting,
            sections: weighting.sections(),
        }
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Zeroed delay lines sized for this cascade.
    pub fn new_state(&self) -> ChannelFilterState {
        ChannelFilterState::new(self.sections.len())
    }

    /// Filters `input` into a new buffer, advancing `state`.
    pub fn apply(&self, input: &[f32], state: &mut ChannelFilterState) -> Vec<f32> {
        let mut output = input.to_vec();
        self.apply_in_place(&mut output, state);
        output
    }

    /// Filters `buffer` in place, advancing `state`.
    ///
    /// A state sized for a different cascade is replaced by zeroed delay lines.
    pub fn apply_in_place(&self, buffer: &mut [f32], state: &mut ChannelFilterState) {
        if self.sections.is_empty() {
            return;
        }
        if state.stages.len() != self.sections.len() {
            *state = self.new_state();
        }

        for sample in buffer.iter_mut() {
            let mut x = *sample as f64;
            for (section, stage) in self.sections.iter().zip(state.stages.iter_mut()) {
                x = section.process(x, stage);
            }
            *sample = x as f32;
        }
    }

    /// Cascade magnitude response in dB at `freq` (reference rate).
    pub fn response_db(&self, freq: f64) -> f64 {
        let gain: f64 = self
            .sections
            .iter()
            .map(|s| s.magnitude_at(freq, REFERENCE_SAMPLE_RATE))
            .product();
        20.0 * gain.log10()
    }
}
