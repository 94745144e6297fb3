//! Biquad high-pass filter used after every harmonic stage.
//!
//! Squaring a signal pushes energy down to DC as well as up into the
//! harmonics, so each stage is followed by one of these to strip it.

use std::f32::consts::PI;

/// Normalized biquad coefficients (`a0` is implicitly 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Coefficients {
    /// Built-in response used until `set_coefficients` runs:
    /// a 40 Hz, Q = 0.8 high-pass designed at 44.1 kHz.
    ///
    /// The legacy constant table lists these with the feed-forward and
    /// feedback names swapped (b = 1, -1.99287, 0.99290; a = -1.99289,
    /// 0.99644). They are stored here under the names that make them a
    /// high-pass, so `b0 == b2` holds for the defaults as well.
    pub const DEFAULT: Coefficients = Coefficients {
        b0: 0.996_442_7,
        b1: -1.992_885_3,
        b2: 0.996_442_7,
        a1: -1.992_869_2,
        a2: 0.992_901_5,
    };

    /// High-pass coefficients from the Audio EQ Cookbook.
    pub fn highpass(frequency: f32, q: f32, sample_rate: f32) -> Self {
        let omega = 2.0 * PI * frequency / sample_rate;
        let alpha = omega.sin() / (2.0 * q);
        let cos_w = omega.cos();

        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w;
        let a2 = 1.0 - alpha;

        let b0 = (1.0 + cos_w) / 2.0;
        let b1 = -(1.0 + cos_w);
        let b2 = b0;

        Coefficients {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

impl Default for Coefficients {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Cutoff and Q for the harmonic-stage filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighPassConfig {
    /// Cutoff in Hz.
    pub frequency: f32,
    pub q: f32,
}

impl Default for HighPassConfig {
    fn default() -> Self {
        Self {
            frequency: 20.0,
            q: 0.7,
        }
    }
}

/// A second-order high-pass filter (Direct Form I).
///
/// Keeps the two previous inputs and outputs explicitly. State is never
/// cleared; it only decays through the filter's own feedback.
#[derive(Debug, Clone, Default)]
pub struct BiquadHighPass {
    sample_rate: u32,
    coefficients: Coefficients,

    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadHighPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the sample rate. Filter state is left alone.
    pub fn init(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    /// Derive coefficients for a high-pass at `frequency` Hz.
    ///
    /// Does nothing until `init` has set a sample rate; the previous
    /// coefficients stay in effect.
    pub fn set_coefficients(&mut self, frequency: f32, q: f32) {
        if self.sample_rate == 0 {
            return;
        }
        self.coefficients = Coefficients::highpass(frequency, q, self.sample_rate as f32);
    }

    pub fn configure(&mut self, config: &HighPassConfig) {
        self.set_coefficients(config.frequency, config.q);
    }

    /// Filter one sample. Call exactly once per sample, in order.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coefficients;
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2
            - c.a1 * self.y1
            - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// `[x1, x2, y1, y2]`
    pub fn state(&self) -> [f32; 4] {
        [self.x1, self.x2, self.y1, self.y2]
    }
}
