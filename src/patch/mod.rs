//! Static instrument description consumed by pad notes.
//!
//! Everything here is built on the control thread and shared read-only with
//! the audio thread behind an `Arc`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Guarded sample tables and nearest-table lookup.
pub mod bank;
/// Breakpoint envelope descriptions.
pub mod envelope;
/// Filter category, response and 7-bit controls.
pub mod filter;
/// LFO shape, rate and depth.
pub mod lfo;

pub use bank::{PadSample, SampleBank};
pub use envelope::{EnvelopeMode, EnvelopeParams, EnvelopePoint};
pub use filter::{FilterCategory, FilterParams};
pub use lfo::{LfoKind, LfoParams, LfoShape};

/// Panning value that asks for a random position per note.
pub const RANDOM_PANNING: u8 = 0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct PadNoteParameters {
    /// Offset the right channel's read position by half a table.
    pub stereo: bool,

    /// Ignore the played pitch and sound at 440 Hz.
    pub fixed_freq: bool,
    /// With `fixed_freq`, how much the key still bends pitch; 0 = not at all.
    pub fixed_freq_et: u8,

    pub detune_type: u8,
    pub coarse_detune: u16,
    /// Fine detune centred on 8192.
    pub detune: u16,

    /// 1..127 left to right; [`RANDOM_PANNING`] randomizes.
    pub panning: u8,
    /// 96 is 0 dB, 0 is -60 dB.
    pub volume: u8,
    pub amp_velocity_scale_function: u8,

    pub punch_strength: u8,
    pub punch_time: u8,
    pub punch_stretch: u8,
    pub punch_velocity_sensing: u8,

    pub freq_envelope: EnvelopeParams,
    pub freq_lfo: LfoParams,

    pub amp_envelope: EnvelopeParams,
    pub amp_lfo: LfoParams,

    pub filter: FilterParams,
    pub filter_velocity_scale: u8,
    pub filter_velocity_scale_function: u8,
    pub filter_envelope: EnvelopeParams,
    pub filter_lfo: LfoParams,

    /// Regenerated from the spectral description, never persisted.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub bank: SampleBank,
}

impl PadNoteParameters {
    pub fn with_bank(bank: SampleBank) -> Self {
        Self {
            bank,
            ..Self::default()
        }
    }
}

impl Default for PadNoteParameters {
    fn default() -> Self {
        Self {
            stereo: true,
            fixed_freq: false,
            fixed_freq_et: 0,
            detune_type: 1,
            coarse_detune: 0,
            detune: 8192,
            panning: 64,
            volume: 90,
            amp_velocity_scale_function: 64,
            punch_strength: 0,
            punch_time: 60,
            punch_stretch: 64,
            punch_velocity_sensing: 72,
            freq_envelope: EnvelopeParams::asr_freq(64, 50, 64, 60),
            freq_lfo: LfoParams::new(LfoKind::Frequency),
            amp_envelope: EnvelopeParams::adsr_db(0, 40, 127, 25),
            amp_lfo: LfoParams::new(LfoKind::Amplitude),
            filter: FilterParams::default(),
            filter_velocity_scale: 64,
            filter_velocity_scale_function: 64,
            filter_envelope: EnvelopeParams::adsr_filter(64, 40, 64, 70, 60, 64),
            filter_lfo: LfoParams::new(LfoKind::Filter),
            bank: SampleBank::default(),
        }
    }
}
