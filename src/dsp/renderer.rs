//! Offline renderer — runs the processor over a whole clip and encodes the
//! result as a WAV byte buffer, for previews.

use crate::error::HarmonicsError;
use crate::processor::HarmonicsProcessor;
use crate::state::ParamState;

pub const RENDER_BLOCK_SIZE: usize = 512;

/// Process planar `channels` with the parameters in `state`.
///
/// The clip is fed through in `RENDER_BLOCK_SIZE` blocks, the same way a
/// host would drive it.
pub fn render(
    channels: &[Vec<f32>],
    sample_rate: u32,
    state: &ParamState,
) -> Result<Vec<Vec<f32>>, HarmonicsError> {
    let mut processor = HarmonicsProcessor::new();
    state.apply(processor.params());
    processor.prepare_to_play(sample_rate as f64, RENDER_BLOCK_SIZE)?;

    let mut output = channels.to_vec();
    let frames = output.iter().map(Vec::len).min().unwrap_or(0);
    for ch in output.iter_mut() {
        ch.truncate(frames);
    }

    let mut start = 0;
    while start < frames {
        let end = (start + RENDER_BLOCK_SIZE).min(frames);
        let mut block: Vec<&mut [f32]> = output.iter_mut().map(|ch| &mut ch[start..end]).collect();
        processor.process(&mut block)?;
        start = end;
    }
    Ok(output)
}

/// Render and encode as 16-bit PCM WAV.
pub fn render_wav(
    channels: &[Vec<f32>],
    sample_rate: u32,
    state: &ParamState,
) -> Result<Vec<u8>, HarmonicsError> {
    let processed = render(channels, sample_rate, state)?;
    Ok(encode_wav(&processed, sample_rate))
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Interleave planar channels into a 16-bit PCM WAV.
fn encode_wav(channels: &[Vec<f32>], sample_rate: u32) -> Vec<u8> {
    let num_channels = channels.len() as u16;
    let frames = channels.first().map_or(0, Vec::len);
    let bits_per_sample: u16 = 16;
    let block_align = num_channels * (bits_per_sample / 8);
    let byte_rate = sample_rate * block_align as u32;
    let data_size = (frames * block_align as usize) as u32;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for frame in 0..frames {
        for ch in channels {
            buf.extend_from_slice(&to_i16(ch[frame]).to_le_bytes());
        }
    }

    buf
}
