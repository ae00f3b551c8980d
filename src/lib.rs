//! Realtime-safe wavetable ("pad") note engine.
//!
//! A [`synth::note::PadNote`] plays one note from an immutable
//! [`patch::bank::SampleBank`], shaping it with envelopes, LFOs, a stereo
//! filter pair, a punch transient and legato cross-fades. Modulation sources
//! live in a caller-owned [`engine::allocator::Allocator`] so rendering never
//! touches the heap.

pub mod config;
pub mod dsp; // Envelopes, LFOs, filters, interpolation kernels
pub mod engine; // Fixed-capacity storage for per-note modulation sources
pub mod error;
pub mod patch; // Static instrument description and sample bank
pub mod synth; // The note engine, controllers and legato handling
pub mod util;

pub use config::SynthConfig;

pub const MAX_BLOCK_SIZE: usize = 2048;
