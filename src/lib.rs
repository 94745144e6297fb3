pub mod dsp;
pub mod error;
pub mod params;
pub mod processor;
pub mod state;

use crate::error::HarmonicsError;
use crate::params::ParamId;
use crate::processor::HarmonicsProcessor;
use crate::state::ParamState;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the harmonics-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

fn js_err(e: HarmonicsError) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed: the parameter layout as an array of
/// `{ id, toggle, min, max, step, default }` objects.
#[wasm_bindgen]
pub fn parameter_layout() -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    params::layout()
        .serialize(&serializer)
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: process a clip offline and return it as WAV bytes.
/// `right` may be empty for a mono clip. `state_json` uses the same
/// format as `WasmHarmonics::get_state`.
#[wasm_bindgen]
pub fn render_wav(left: Vec<f32>, right: Vec<f32>, sample_rate: u32, state_json: &str) -> Result<Vec<u8>, JsValue> {
    let state = ParamState::from_bytes(state_json.as_bytes()).map_err(js_err)?;
    let mut channels = vec![left];
    if !right.is_empty() {
        channels.push(right);
    }
    dsp::renderer::render_wav(&channels, sample_rate, &state).map_err(js_err)
}

/// WASM-exposed processor for AudioWorklet use.
#[wasm_bindgen]
pub struct WasmHarmonics {
    inner: HarmonicsProcessor,
}

#[wasm_bindgen]
impl WasmHarmonics {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64, max_block_size: usize) -> Result<WasmHarmonics, JsValue> {
        let mut inner = HarmonicsProcessor::new();
        inner.prepare_to_play(sample_rate, max_block_size).map_err(js_err)?;
        Ok(WasmHarmonics { inner })
    }

    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) -> Result<(), JsValue> {
        self.inner.prepare_to_play(sample_rate, max_block_size).map_err(js_err)
    }

    pub fn set_param(&self, id: &str, value: f32) -> Result<(), JsValue> {
        self.inner.params().set_by_id(id, value).map_err(js_err)
    }

    pub fn get_param(&self, id: &str) -> Result<f32, JsValue> {
        self.inner.params().get_by_id(id).map_err(js_err)
    }

    pub fn process_mono(&mut self, samples: &mut [f32]) -> Result<(), JsValue> {
        self.inner.process(&mut [samples]).map_err(js_err)
    }

    pub fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) -> Result<(), JsValue> {
        self.inner.process(&mut [left, right]).map_err(js_err)
    }

    /// Current parameters as a JSON string.
    pub fn get_state(&self) -> Result<String, JsValue> {
        let bytes = self.inner.get_state().map_err(js_err)?;
        String::from_utf8(bytes).map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    pub fn set_state(&self, json: &str) -> Result<(), JsValue> {
        self.inner.set_state(json.as_bytes()).map_err(js_err)
    }

    /// Snap `value` the way `set_param` would, without storing it.
    pub fn snap_param(id: &str, value: f32) -> Result<f32, JsValue> {
        let param = ParamId::parse(id).map_err(js_err)?;
        Ok(param.range().snap(value))
    }
}
