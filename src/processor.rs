//! Host-facing processor — lifecycle, channel layout and the block entry
//! point around the harmonic cascade.

use std::sync::Arc;

use crate::dsp::cascade::{HarmonicCascade, MAX_CHANNELS};
use crate::error::HarmonicsError;
use crate::params::{ControlSnapshot, HarmonicsParams};
use crate::state::ParamState;

pub const PLUGIN_NAME: &str = "Harmonics";

/// Mono or stereo, with matching input and output.
pub fn is_layout_supported(input_channels: usize, output_channels: usize) -> bool {
    (output_channels == 1 || output_channels == 2) && input_channels == output_channels
}

/// The harmonics effect as a host sees it.
///
/// Parameters live in a shared [`HarmonicsParams`] the control thread may
/// write at any time. `process` reads them once per block.
pub struct HarmonicsProcessor {
    params: Arc<HarmonicsParams>,
    cascade: HarmonicCascade,
    sample_rate: Option<u32>,
    max_block_size: usize,
}

impl HarmonicsProcessor {
    pub fn new() -> Self {
        Self::with_params(Arc::new(HarmonicsParams::new()))
    }

    pub fn with_params(params: Arc<HarmonicsParams>) -> Self {
        HarmonicsProcessor {
            params,
            cascade: HarmonicCascade::new(),
            sample_rate: None,
            max_block_size: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn accepts_midi(&self) -> bool {
        false
    }

    pub fn produces_midi(&self) -> bool {
        false
    }

    pub fn tail_length_seconds(&self) -> f64 {
        0.0
    }

    pub fn params(&self) -> &Arc<HarmonicsParams> {
        &self.params
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn cascade(&self) -> &HarmonicCascade {
        &self.cascade
    }

    /// Initialize every filter for playback at `sample_rate`.
    pub fn prepare_to_play(&mut self, sample_rate: f64, max_block_size: usize) -> Result<(), HarmonicsError> {
        if !sample_rate.is_finite() || sample_rate < 1.0 {
            return Err(HarmonicsError::InvalidSampleRate { sample_rate });
        }
        let rate = sample_rate as u32;
        self.cascade.prepare(rate);
        self.sample_rate = Some(rate);
        self.max_block_size = max_block_size;
        log::debug!(
            "prepared {PLUGIN_NAME} at {rate} Hz, max block {max_block_size}, high-pass {} Hz q={}",
            self.cascade.config().frequency,
            self.cascade.config().q
        );
        Ok(())
    }

    pub fn release_resources(&mut self) {
        self.sample_rate = None;
        log::debug!("released {PLUGIN_NAME}");
    }

    /// Process one block in place. Each slice is one channel.
    ///
    /// Parameters are read once up front; the whole block uses that copy.
    pub fn process(&mut self, buffer: &mut [&mut [f32]]) -> Result<(), HarmonicsError> {
        if self.sample_rate.is_none() {
            return Err(HarmonicsError::NotPrepared);
        }
        if buffer.is_empty() || buffer.len() > MAX_CHANNELS {
            return Err(HarmonicsError::UnsupportedChannelCount {
                channels: buffer.len(),
            });
        }

        let controls = self.params.snapshot();
        self.process_with(buffer, &controls);
        Ok(())
    }

    fn process_with(&mut self, buffer: &mut [&mut [f32]], controls: &ControlSnapshot) {
        for (channel, samples) in buffer.iter_mut().enumerate() {
            self.cascade.process_channel(channel, samples, controls);
        }
    }

    pub fn get_state(&self) -> Result<Vec<u8>, HarmonicsError> {
        ParamState::capture(&self.params).to_bytes()
    }

    /// Restore parameters from a blob produced by `get_state`. A malformed
    /// blob leaves every parameter untouched.
    pub fn set_state(&self, data: &[u8]) -> Result<(), HarmonicsError> {
        let state = ParamState::from_bytes(data).inspect_err(|e| {
            log::warn!("ignoring {PLUGIN_NAME} state blob: {e}");
        })?;
        state.apply(&self.params);
        log::info!("restored {PLUGIN_NAME} state: {state:?}");
        Ok(())
    }
}

impl Default for HarmonicsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::cascade::Harmonic;
    use crate::params::{ParamId, db_to_gain};

    fn prepared() -> HarmonicsProcessor {
        let mut p = HarmonicsProcessor::new();
        p.prepare_to_play(48000.0, 512).unwrap();
        p
    }

    #[test]
    fn layouts() {
        assert!(is_layout_supported(1, 1));
        assert!(is_layout_supported(2, 2));
        assert!(!is_layout_supported(1, 2));
        assert!(!is_layout_supported(6, 6));
        assert!(!is_layout_supported(0, 0));
    }

    #[test]
    fn rejects_processing_before_prepare() {
        let mut p = HarmonicsProcessor::new();
        let mut left = [0.5_f32; 8];
        let err = p.process(&mut [&mut left[..]]).unwrap_err();
        assert!(matches!(err, HarmonicsError::NotPrepared));
        assert_eq!(left, [0.5; 8]);
    }

    #[test]
    fn rejects_bad_channel_counts() {
        let mut p = prepared();
        let mut a = [0.1_f32; 4];
        let mut b = [0.1_f32; 4];
        let mut c = [0.1_f32; 4];
        let err = p.process(&mut [&mut a[..], &mut b[..], &mut c[..]]).unwrap_err();
        assert!(matches!(err, HarmonicsError::UnsupportedChannelCount { channels: 3 }));
        assert_eq!(a, [0.1; 4]);

        let err = p.process(&mut []).unwrap_err();
        assert!(matches!(err, HarmonicsError::UnsupportedChannelCount { channels: 0 }));
    }

    #[test]
    fn rejects_bad_sample_rate() {
        let mut p = HarmonicsProcessor::new();
        assert!(p.prepare_to_play(0.0, 512).is_err());
        assert!(p.prepare_to_play(f64::NAN, 512).is_err());
        assert_eq!(p.sample_rate(), None);
    }

    #[test]
    fn prepare_initializes_all_filters() {
        let p = prepared();
        assert_eq!(p.sample_rate(), Some(48000));
        assert_eq!(p.max_block_size(), 512);
        for channel in 0..MAX_CHANNELS {
            for h in Harmonic::ALL {
                assert_eq!(p.cascade().filter(h, channel).sample_rate(), 48000);
            }
        }
    }

    #[test]
    fn empty_block_is_fine() {
        let mut p = prepared();
        let mut left: [f32; 0] = [];
        let mut right: [f32; 0] = [];
        p.process(&mut [&mut left[..], &mut right[..]]).unwrap();
    }

    #[test]
    fn block_reads_controls_once() {
        let mut p = prepared();
        p.params().set(ParamId::Mix, 0.0);
        p.params().set(ParamId::Volume, -6.0);

        let mut mono = [0.25_f32; 64];
        p.process(&mut [&mut mono[..]]).unwrap();
        let expected = db_to_gain(-6.0) * 0.25;
        for s in mono {
            assert!((s - expected).abs() < 1e-6, "expected {expected}, got {s}");
        }
    }

    #[test]
    fn stereo_channels_match_for_identical_input() {
        let mut p = prepared();
        let input: Vec<f32> = (0..480).map(|i| 0.7 * (i as f32 * 0.013).sin()).collect();
        let mut left = input.clone();
        let mut right = input;
        p.process(&mut [&mut left[..], &mut right[..]]).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn control_thread_writes_land_between_blocks() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let params = Arc::new(HarmonicsParams::new());
        params.set_gate(Harmonic::Second, false);
        let mut p = HarmonicsProcessor::with_params(Arc::clone(&params));
        p.prepare_to_play(48000.0, 64).unwrap();

        let done = AtomicBool::new(false);
        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..1_000_000 {
                    if done.load(Ordering::Relaxed) {
                        break;
                    }
                    params.set(ParamId::Mix, if i % 2 == 0 { 1.0 } else { 0.0 });
                }
            });

            // All gates closed: a dry block is 0.5 throughout, a wet one 0.0.
            for block in 0..500 {
                let mut mono = [0.5_f32; 64];
                p.process(&mut [&mut mono[..]]).unwrap();
                let first = mono[0];
                assert!(first == 0.5 || first == 0.0, "block {block}: {first}");
                assert!(
                    mono.iter().all(|&s| s == first),
                    "block {block} mixed two control values"
                );
            }
            done.store(true, Ordering::Relaxed);
        });
    }

    #[test]
    fn block_boundaries_do_not_change_output() {
        let input: Vec<f32> = (0..1000).map(|i| 0.6 * (i as f32 * 0.02).sin()).collect();

        let mut whole = prepared();
        let mut one_block = input.clone();
        whole.process(&mut [&mut one_block[..]]).unwrap();

        let mut split = prepared();
        let mut chunked = input;
        for chunk in chunked.chunks_mut(64) {
            split.process(&mut [chunk]).unwrap();
        }
        assert_eq!(one_block, chunked);
    }

    #[test]
    fn state_round_trip_through_processor() {
        let source = prepared();
        source.params().set(ParamId::Gain, 4.5);
        source.params().set_gate(Harmonic::Fourth, true);
        let blob = source.get_state().unwrap();

        let target = HarmonicsProcessor::new();
        target.set_state(&blob).unwrap();
        assert!((target.params().get(ParamId::Gain) - 4.5).abs() < 1e-4);
        assert!(target.params().gate(Harmonic::Fourth));
        assert!(target.params().gate(Harmonic::Second));
    }

    #[test]
    fn bad_state_leaves_params_alone() {
        let p = HarmonicsProcessor::new();
        p.params().set(ParamId::Mix, 0.3);
        assert!(p.set_state(b"not json").is_err());
        assert!((p.params().get(ParamId::Mix) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn release_requires_new_prepare() {
        let mut p = prepared();
        p.release_resources();
        let mut mono = [0.0_f32; 4];
        assert!(p.process(&mut [&mut mono[..]]).is_err());
        p.prepare_to_play(44100.0, 256).unwrap();
        p.process(&mut [&mut mono[..]]).unwrap();
    }

    #[test]
    fn metadata() {
        let p = HarmonicsProcessor::new();
        assert_eq!(p.name(), "Harmonics");
        assert!(!p.accepts_midi());
        assert!(!p.produces_midi());
        assert_eq!(p.tail_length_seconds(), 0.0);
    }
}
