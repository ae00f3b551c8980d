#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which parameter the LFO drives; sets the unit of its intensity.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LfoKind {
    /// Vibrato depth in cents (0..2047).
    Frequency,
    /// Tremolo depth as a fraction of full gain.
    Amplitude,
    /// Cutoff sweep in octaves (0..4).
    Filter,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LfoShape {
    Sine,
    Triangle,
    Square,
    RampUp,
    RampDown,
    ExpDown1,
    ExpDown2,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoParams {
    pub kind: LfoKind,
    pub shape: LfoShape,
    /// Rate control, 0..1. Maps exponentially to ~0..85 Hz.
    pub freq: f32,
    pub intensity: u8,
    /// 0 picks a random phase per note; otherwise 64 is phase zero.
    pub start_phase: u8,
    /// Random amplitude per cycle.
    pub randomness: u8,
    /// Random rate per cycle.
    pub freq_rand: u8,
    /// 0..4 seconds before the LFO starts moving.
    pub delay: u8,
    /// Rate tracking of note pitch; 64 = none.
    pub stretch: u8,
}

impl LfoParams {
    pub fn new(kind: LfoKind) -> Self {
        let freq = match kind {
            LfoKind::Frequency => 70.0 / 127.0,
            LfoKind::Amplitude | LfoKind::Filter => 80.0 / 127.0,
        };
        Self {
            kind,
            shape: LfoShape::Sine,
            freq,
            intensity: 0,
            start_phase: 64,
            randomness: 0,
            freq_rand: 0,
            delay: 0,
            stretch: 64,
        }
    }

    pub fn with_intensity(mut self, intensity: u8) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_shape(mut self, shape: LfoShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_freq(mut self, freq: f32) -> Self {
        self.freq = freq.clamp(0.0, 1.0);
        self
    }
}
