//! Parameter layout and the lock-free parameter store.
//!
//! The control thread writes parameters at any time. The audio thread copies
//! them once per block into a [`ControlSnapshot`] and works only from that.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::Serialize;

use crate::dsp::cascade::{Harmonic, HARMONIC_COUNT};
use crate::error::HarmonicsError;

/// Below this level `db_to_gain` returns silence.
pub const MINUS_INFINITY_DB: f32 = -100.0;

/// Convert decibels to linear gain, flooring at [`MINUS_INFINITY_DB`].
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    if db > MINUS_INFINITY_DB {
        10.0_f32.powf(db * 0.05)
    } else {
        0.0
    }
}

/// f32 stored in an `AtomicU32` for lock-free parameter access.
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Every parameter the host can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    Gain,
    Mix,
    Volume,
    Button2,
    Button4,
    Button6,
    Button8,
}

impl ParamId {
    pub const ALL: [ParamId; 7] = [
        ParamId::Gain,
        ParamId::Mix,
        ParamId::Volume,
        ParamId::Button2,
        ParamId::Button4,
        ParamId::Button6,
        ParamId::Button8,
    ];

    /// Host-facing identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamId::Gain => "Gain",
            ParamId::Mix => "Mix",
            ParamId::Volume => "Volume",
            ParamId::Button2 => "Button2",
            ParamId::Button4 => "Button4",
            ParamId::Button6 => "Button6",
            ParamId::Button8 => "Button8",
        }
    }

    pub fn parse(id: &str) -> Result<Self, HarmonicsError> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == id)
            .ok_or_else(|| HarmonicsError::UnknownParameter { id: id.to_string() })
    }

    /// The gate button for a harmonic order.
    pub fn gate(harmonic: Harmonic) -> Self {
        match harmonic {
            Harmonic::Second => ParamId::Button2,
            Harmonic::Fourth => ParamId::Button4,
            Harmonic::Sixth => ParamId::Button6,
            Harmonic::Eighth => ParamId::Button8,
        }
    }

    pub fn range(self) -> &'static ParamRange {
        match self {
            ParamId::Gain => &GAIN_RANGE,
            ParamId::Mix => &MIX_RANGE,
            ParamId::Volume => &VOLUME_RANGE,
            ParamId::Button2 => &GATE_ON_RANGE,
            ParamId::Button4 | ParamId::Button6 | ParamId::Button8 => &GATE_OFF_RANGE,
        }
    }

    pub fn is_toggle(self) -> bool {
        !matches!(self, ParamId::Gain | ParamId::Mix | ParamId::Volume)
    }
}

/// Range, step interval and default of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
}

impl ParamRange {
    /// Clamp into range and round to the nearest step from `min`.
    /// Non-finite values fall back to the default.
    pub fn snap(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.default;
        }
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).clamp(self.min, self.max)
    }
}

pub const GAIN_RANGE: ParamRange = ParamRange {
    min: -24.0,
    max: 24.0,
    step: 0.1,
    default: 0.0,
};

pub const MIX_RANGE: ParamRange = ParamRange {
    min: 0.0,
    max: 1.0,
    step: 0.05,
    default: 1.0,
};

pub const VOLUME_RANGE: ParamRange = ParamRange {
    min: -24.0,
    max: 24.0,
    step: 0.1,
    default: 0.0,
};

const GATE_ON_RANGE: ParamRange = ParamRange {
    min: 0.0,
    max: 1.0,
    step: 1.0,
    default: 1.0,
};

const GATE_OFF_RANGE: ParamRange = ParamRange {
    min: 0.0,
    max: 1.0,
    step: 1.0,
    default: 0.0,
};

/// One entry of the parameter layout handed to hosts and UIs.
#[derive(Debug, Clone, Serialize)]
pub struct ParamDescriptor {
    pub id: &'static str,
    pub toggle: bool,
    #[serde(flatten)]
    pub range: ParamRange,
}

/// The full parameter layout, in host registration order.
pub fn layout() -> Vec<ParamDescriptor> {
    ParamId::ALL
        .into_iter()
        .map(|p| ParamDescriptor {
            id: p.as_str(),
            toggle: p.is_toggle(),
            range: *p.range(),
        })
        .collect()
}

/// Per-block copy of every control value, already converted to the units
/// the cascade works in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSnapshot {
    /// Linear input trim.
    pub gain: f32,
    /// Wet fraction, 0..1.
    pub mix: f32,
    /// Linear output level.
    pub volume: f32,
    /// 0.0 or 1.0 per harmonic, indexed by `Harmonic::index`.
    pub gates: [f32; HARMONIC_COUNT],
}

impl ControlSnapshot {
    #[inline]
    pub fn mix_inverse(&self) -> f32 {
        1.0 - self.mix
    }
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Self {
            gain: db_to_gain(GAIN_RANGE.default),
            mix: MIX_RANGE.default,
            volume: db_to_gain(VOLUME_RANGE.default),
            gates: Harmonic::ALL.map(|h| ParamId::gate(h).range().default),
        }
    }
}

/// Shared parameter store. Wrap in an `Arc` to hand it to a control thread;
/// every field is a single atomic, so reads never see a torn value.
#[derive(Debug)]
pub struct HarmonicsParams {
    gain_db: AtomicF32,
    mix: AtomicF32,
    volume_db: AtomicF32,
    gates: [AtomicF32; HARMONIC_COUNT],
}

impl HarmonicsParams {
    pub fn new() -> Self {
        Self {
            gain_db: AtomicF32::new(GAIN_RANGE.default),
            mix: AtomicF32::new(MIX_RANGE.default),
            volume_db: AtomicF32::new(VOLUME_RANGE.default),
            gates: Harmonic::ALL.map(|h| AtomicF32::new(ParamId::gate(h).range().default)),
        }
    }

    fn slot(&self, id: ParamId) -> &AtomicF32 {
        match id {
            ParamId::Gain => &self.gain_db,
            ParamId::Mix => &self.mix,
            ParamId::Volume => &self.volume_db,
            ParamId::Button2 => &self.gates[Harmonic::Second.index()],
            ParamId::Button4 => &self.gates[Harmonic::Fourth.index()],
            ParamId::Button6 => &self.gates[Harmonic::Sixth.index()],
            ParamId::Button8 => &self.gates[Harmonic::Eighth.index()],
        }
    }

    /// Plain value in host units (dB, fraction, or 0/1).
    pub fn get(&self, id: ParamId) -> f32 {
        self.slot(id).load()
    }

    /// Store a value after clamping and snapping it to the parameter's range.
    pub fn set(&self, id: ParamId, value: f32) {
        self.slot(id).store(id.range().snap(value));
    }

    pub fn set_by_id(&self, id: &str, value: f32) -> Result<(), HarmonicsError> {
        self.set(ParamId::parse(id)?, value);
        Ok(())
    }

    pub fn get_by_id(&self, id: &str) -> Result<f32, HarmonicsError> {
        Ok(self.get(ParamId::parse(id)?))
    }

    pub fn gate(&self, harmonic: Harmonic) -> bool {
        self.gates[harmonic.index()].load() >= 0.5
    }

    pub fn set_gate(&self, harmonic: Harmonic, enabled: bool) {
        self.set(ParamId::gate(harmonic), if enabled { 1.0 } else { 0.0 });
    }

    /// One load per parameter; the result is what a block processes with.
    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            gain: db_to_gain(self.gain_db.load()),
            mix: self.mix.load(),
            volume: db_to_gain(self.volume_db.load()),
            gates: [
                gate_multiplier(self.gates[0].load()),
                gate_multiplier(self.gates[1].load()),
                gate_multiplier(self.gates[2].load()),
                gate_multiplier(self.gates[3].load()),
            ],
        }
    }
}

impl Default for HarmonicsParams {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn gate_multiplier(raw: f32) -> f32 {
    if raw >= 0.5 { 1.0 } else { 0.0 }
}
