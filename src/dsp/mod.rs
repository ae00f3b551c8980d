//! Low-level DSP primitives a pad note is assembled from.
//!
//! These components are allocation-free and realtime-safe once constructed,
//! making them safe to embed directly inside per-note state. They stay focused
//! on the signal-processing math; the note engine layers on the orchestration.

/// Parameter curves: dB, velocity sensing, detune.
pub mod curves;
/// Breakpoint envelope generator.
pub mod envelope;
/// Analog (biquad) and state-variable filter cascades.
pub mod filter;
/// Table playback kernels and the first-buffer fade-in.
pub mod interpolate;
/// Per-buffer low frequency oscillator.
pub mod lfo;

pub use envelope::Envelope;
pub use filter::Filter;
pub use interpolate::Interpolation;
pub use lfo::Lfo;
