//! Harmonic cascade — four squaring stages, each high-passed, gated,
//! summed, hard-limited and blended back with the dry signal.
//!
//! Stage inputs are described by [`STAGES`]. Every stage multiplies two
//! taps (the trimmed input or an earlier stage's filtered output) and
//! scales the product by a fixed gain:
//!
//! | stage | product          | gain |
//! |-------|------------------|------|
//! | 2nd   | input × input    | 2    |
//! | 4th   | 2nd × 2nd        | 8    |
//! | 6th   | 2nd × 4th        | 16   |
//! | 8th   | 4th × 4th        | 24   |
//!
//! The 8th stage reads the 4th, not the 6th.

use crate::params::ControlSnapshot;

use super::filter::{BiquadHighPass, HighPassConfig};

pub const HARMONIC_COUNT: usize = 4;
pub const MAX_CHANNELS: usize = 2;

/// Harmonic order of a cascade stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Harmonic {
    Second,
    Fourth,
    Sixth,
    Eighth,
}

impl Harmonic {
    pub const ALL: [Harmonic; HARMONIC_COUNT] = [
        Harmonic::Second,
        Harmonic::Fourth,
        Harmonic::Sixth,
        Harmonic::Eighth,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn order(self) -> u32 {
        2 * (self.index() as u32 + 1)
    }
}

/// Where a stage takes one factor of its product from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tap {
    /// The gain-trimmed input sample.
    Input,
    /// The filtered output of an earlier stage.
    Stage(Harmonic),
}

#[derive(Debug, Clone, Copy)]
pub struct Stage {
    pub harmonic: Harmonic,
    pub lhs: Tap,
    pub rhs: Tap,
    pub gain: f32,
}

/// Cascade topology, evaluated top to bottom.
pub const STAGES: [Stage; HARMONIC_COUNT] = [
    Stage {
        harmonic: Harmonic::Second,
        lhs: Tap::Input,
        rhs: Tap::Input,
        gain: 2.0,
    },
    Stage {
        harmonic: Harmonic::Fourth,
        lhs: Tap::Stage(Harmonic::Second),
        rhs: Tap::Stage(Harmonic::Second),
        gain: 8.0,
    },
    Stage {
        harmonic: Harmonic::Sixth,
        lhs: Tap::Stage(Harmonic::Second),
        rhs: Tap::Stage(Harmonic::Fourth),
        gain: 16.0,
    },
    Stage {
        harmonic: Harmonic::Eighth,
        lhs: Tap::Stage(Harmonic::Fourth),
        rhs: Tap::Stage(Harmonic::Fourth),
        gain: 24.0,
    },
];

/// Sum the stage outputs whose gates are open.
#[inline]
pub fn gated_sum(stages: &[f32; HARMONIC_COUNT], gates: &[f32; HARMONIC_COUNT]) -> f32 {
    gates[0] * stages[0] + gates[1] * stages[1] + gates[2] * stages[2] + gates[3] * stages[3]
}

/// Hard limit of the distortion path. NaN limits to +1.
#[inline]
pub fn limit(x: f32) -> f32 {
    (-1.0_f32).max(x.min(1.0))
}

/// Filter bank and per-sample cascade for up to two channels.
#[derive(Debug, Clone)]
pub struct HarmonicCascade {
    /// Indexed `[channel][harmonic]`.
    filters: [[BiquadHighPass; HARMONIC_COUNT]; MAX_CHANNELS],
    config: HighPassConfig,
}

impl HarmonicCascade {
    pub fn new() -> Self {
        Self::with_config(HighPassConfig::default())
    }

    pub fn with_config(config: HighPassConfig) -> Self {
        Self {
            filters: Default::default(),
            config,
        }
    }

    /// Initialize every filter for `sample_rate` and fix its coefficients.
    pub fn prepare(&mut self, sample_rate: u32) {
        for filter in self.filters.iter_mut().flatten() {
            filter.init(sample_rate);
            filter.configure(&self.config);
        }
    }

    /// # Panics
    ///
    /// Panics if `channel >= MAX_CHANNELS`.
    pub fn filter(&self, harmonic: Harmonic, channel: usize) -> &BiquadHighPass {
        &self.filters[channel][harmonic.index()]
    }

    pub fn config(&self) -> &HighPassConfig {
        &self.config
    }

    /// Run all four stages for one trimmed sample and return each stage's
    /// filtered output, indexed by `Harmonic::index`.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= MAX_CHANNELS`.
    #[inline]
    pub fn run_stages(&mut self, channel: usize, input: f32) -> [f32; HARMONIC_COUNT] {
        let filters = &mut self.filters[channel];
        let mut out = [0.0_f32; HARMONIC_COUNT];
        for stage in &STAGES {
            let lhs = tap_value(stage.lhs, input, &out);
            let rhs = tap_value(stage.rhs, input, &out);
            let i = stage.harmonic.index();
            out[i] = filters[i].process(lhs * rhs * stage.gain);
        }
        out
    }

    /// Process one raw sample of `channel`.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= MAX_CHANNELS`.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, raw: f32, controls: &ControlSnapshot) -> f32 {
        let input = raw * controls.gain;
        let stages = self.run_stages(channel, input);
        let limited = limit(gated_sum(&stages, &controls.gates));
        controls.volume * (controls.mix * limited + controls.mix_inverse() * input)
    }

    /// Process one channel in place, strictly in sample order.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= MAX_CHANNELS`.
    pub fn process_channel(&mut self, channel: usize, samples: &mut [f32], controls: &ControlSnapshot) {
        for sample in samples.iter_mut() {
            *sample = self.process_sample(channel, *sample, controls);
        }
    }
}

impl Default for HarmonicCascade {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn tap_value(tap: Tap, input: f32, stages: &[f32; HARMONIC_COUNT]) -> f32 {
    match tap {
        Tap::Input => input,
        Tap::Stage(h) => stages[h.index()],
    }
}
