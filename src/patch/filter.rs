#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f32::consts::LN_2;

use crate::dsp::filter::{AnalogType, FilterType};

pub const MAX_FILTER_STAGES: usize = 5;

/*
Filter parameters are stored as 7-bit controls and converted on demand:

  freq        center pitch in octaves relative to 1 kHz: (freq/64 - 1) * 5
  q           resonance, exponential: e^((q/127)^2 * ln 1000) - 0.9
  freq_track  how far the cutoff follows the note, in octaves per octave
              away from A4: (freq_track - 64) / 64
  gain        -30..+30 dB; output gain, or boost for peak/shelf responses
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCategory {
    /// Biquad cascade.
    Analog(AnalogType),
    /// Topology-preserving state-variable cascade.
    StateVariable(FilterType),
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParams {
    pub category: FilterCategory,
    pub freq: u8,
    pub q: u8,
    /// Extra cascaded stages; 0 is a single stage.
    pub stages: u8,
    pub freq_track: u8,
    pub gain: u8,
}

impl FilterParams {
    pub fn new(category: FilterCategory, freq: u8, q: u8) -> Self {
        Self {
            category,
            freq,
            q,
            stages: 0,
            freq_track: 64,
            gain: 64,
        }
    }

    pub fn with_stages(mut self, stages: u8) -> Self {
        self.stages = stages.min(MAX_FILTER_STAGES as u8 - 1);
        self
    }

    pub fn with_freq_track(mut self, freq_track: u8) -> Self {
        self.freq_track = freq_track;
        self
    }

    pub fn with_gain(mut self, gain: u8) -> Self {
        self.gain = gain;
        self
    }

    /// Cutoff pitch in octaves relative to 1 kHz.
    pub fn center_pitch(&self) -> f32 {
        (self.freq as f32 / 64.0 - 1.0) * 5.0
    }

    pub fn q(&self) -> f32 {
        ((self.q as f32 / 127.0).powi(2) * 1000.0f32.ln()).exp() - 0.9
    }

    /// Cutoff offset in octaves for a note at `note_freq`.
    pub fn freq_tracking(&self, note_freq: f32) -> f32 {
        (note_freq / 440.0).ln() * (self.freq_track as f32 - 64.0) / (64.0 * LN_2)
    }

    pub fn gain_db(&self) -> f32 {
        (self.gain as f32 / 64.0 - 1.0) * 30.0
    }

    pub fn stage_count(&self) -> usize {
        (self.stages as usize + 1).min(MAX_FILTER_STAGES)
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::new(FilterCategory::Analog(AnalogType::LowPass2), 94, 40)
    }
}
