//! DSP core — the high-pass filter and the harmonic cascade built on it.
//!
//! Everything here runs on the audio thread: no locks, no allocation in
//! the per-sample path.

pub mod cascade;
pub mod filter;
pub mod renderer;
