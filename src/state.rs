//! Parameter state captured for the host's session blob.
//!
//! Values are stored in host units (dB, fraction, on/off) and restored
//! through the same snapping setters the host uses.

use serde::{Deserialize, Serialize};

use crate::dsp::cascade::Harmonic;
use crate::error::HarmonicsError;
use crate::params::{GAIN_RANGE, HarmonicsParams, MIX_RANGE, ParamId, VOLUME_RANGE};

/// Current value of every parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamState {
    #[serde(default = "default_gain")]
    pub gain: f32,
    #[serde(default = "default_mix")]
    pub mix: f32,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_harmonic2")]
    pub harmonic2: bool,
    #[serde(default)]
    pub harmonic4: bool,
    #[serde(default)]
    pub harmonic6: bool,
    #[serde(default)]
    pub harmonic8: bool,
}

fn default_gain() -> f32 {
    GAIN_RANGE.default
}

fn default_mix() -> f32 {
    MIX_RANGE.default
}

fn default_volume() -> f32 {
    VOLUME_RANGE.default
}

fn default_harmonic2() -> bool {
    true
}

impl Default for ParamState {
    fn default() -> Self {
        Self {
            gain: default_gain(),
            mix: default_mix(),
            volume: default_volume(),
            harmonic2: default_harmonic2(),
            harmonic4: false,
            harmonic6: false,
            harmonic8: false,
        }
    }
}

impl ParamState {
    pub fn capture(params: &HarmonicsParams) -> Self {
        Self {
            gain: params.get(ParamId::Gain),
            mix: params.get(ParamId::Mix),
            volume: params.get(ParamId::Volume),
            harmonic2: params.gate(Harmonic::Second),
            harmonic4: params.gate(Harmonic::Fourth),
            harmonic6: params.gate(Harmonic::Sixth),
            harmonic8: params.gate(Harmonic::Eighth),
        }
    }

    pub fn apply(&self, params: &HarmonicsParams) {
        params.set(ParamId::Gain, self.gain);
        params.set(ParamId::Mix, self.mix);
        params.set(ParamId::Volume, self.volume);
        params.set_gate(Harmonic::Second, self.harmonic2);
        params.set_gate(Harmonic::Fourth, self.harmonic4);
        params.set_gate(Harmonic::Sixth, self.harmonic6);
        params.set_gate(Harmonic::Eighth, self.harmonic8);
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, HarmonicsError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, HarmonicsError> {
        Ok(serde_json::from_slice(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_reflects_params() {
        let params = HarmonicsParams::new();
        params.set(ParamId::Gain, 6.0);
        params.set(ParamId::Mix, 0.5);
        params.set_gate(Harmonic::Sixth, true);

        let state = ParamState::capture(&params);
        assert!((state.gain - 6.0).abs() < 1e-4);
        assert_eq!(state.mix, 0.5);
        assert_eq!(state.volume, 0.0);
        assert!(state.harmonic2);
        assert!(!state.harmonic4);
        assert!(state.harmonic6);
        assert!(!state.harmonic8);
    }

    #[test]
    fn restore_goes_through_snapping() {
        let params = HarmonicsParams::new();
        let state = ParamState {
            gain: 40.0,
            mix: 0.52,
            volume: -3.0,
            harmonic2: false,
            harmonic4: true,
            harmonic6: false,
            harmonic8: true,
        };
        state.apply(&params);

        assert_eq!(params.get(ParamId::Gain), 24.0);
        assert!((params.get(ParamId::Mix) - 0.5).abs() < 1e-6);
        assert!((params.get(ParamId::Volume) + 3.0).abs() < 1e-4);
        assert!(!params.gate(Harmonic::Second));
        assert!(params.gate(Harmonic::Fourth));
        assert!(params.gate(Harmonic::Eighth));
    }

    #[test]
    fn blob_round_trip() {
        let state = ParamState {
            gain: -12.5,
            mix: 0.75,
            volume: 3.0,
            harmonic2: true,
            harmonic4: true,
            harmonic6: false,
            harmonic8: false,
        };
        let bytes = state.to_bytes().unwrap();
        assert_eq!(ParamState::from_bytes(&bytes).unwrap(), state);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let state = ParamState::from_bytes(br#"{"mix":0.25,"harmonic8":true}"#).unwrap();
        assert_eq!(state.mix, 0.25);
        assert_eq!(state.gain, 0.0);
        assert!(state.harmonic2);
        assert!(state.harmonic8);
    }

    #[test]
    fn malformed_blob_is_an_error() {
        let err = ParamState::from_bytes(b"<Parameters/>").unwrap_err();
        assert!(matches!(err, HarmonicsError::State(_)));
    }
}
