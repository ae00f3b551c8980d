//! Resonant filters applied in place to a note's buffers.

use crate::{
    config::SynthConfig,
    patch::filter::{FilterCategory, FilterParams},
};

pub mod analog;
pub mod svf;

pub use analog::{AnalogFilter, AnalogType};
pub use svf::{FilterType, SVFilter};

/*
| type              | passes          | rejects      |
| ----------------- | --------------- | ------------ |
| low-pass          | below cutoff    | above cutoff |
| high-pass         | above cutoff    | below cutoff |
| band-pass         | around cutoff   | elsewhere    |
| notch / band-stop | elsewhere       | around cutoff|
| peak / shelf      | everything, with a boost or cut near / above / below |

Both families cascade up to `MAX_FILTER_STAGES` identical stages for steeper
slopes. Resonance is spread over the stages (q^(1/stages)) so a cascade does
not ring harder than a single stage.

A note changes cutoff once per buffer. Small steps are applied directly.
A jump of more than a factor of 3 would click, so the filter renders the
buffer with both the old and the new settings and crossfades between them.
*/

/// Cutoffs this close to Nyquist turn the filter into a wire.
pub(crate) const NYQUIST_MARGIN_HZ: f32 = 500.0;

/// Cutoff jumps larger than this ratio are crossfaded over one buffer.
pub(crate) const INTERPOLATION_RATIO: f32 = 3.0;

/// log2(1000): pitch 0 is 1 kHz.
const PITCH_OFFSET: f32 = 9.965_784_28;

/// Octaves relative to 1 kHz → Hz.
#[inline]
pub fn real_freq(pitch: f32) -> f32 {
    2.0f32.powf(pitch + PITCH_OFFSET)
}

#[derive(Debug, Clone)]
pub enum Filter {
    Analog(AnalogFilter),
    StateVariable(SVFilter),
}

impl Filter {
    /// Build the filter a note starts with, tuned to the description's center.
    pub fn generate(params: &FilterParams, config: &SynthConfig) -> Self {
        let freq = real_freq(params.center_pitch());
        let q = params.q();
        let stages = params.stage_count();
        match params.category {
            FilterCategory::Analog(kind) => Filter::Analog(AnalogFilter::new(
                kind,
                freq,
                q,
                stages,
                params.gain_db(),
                config.sample_rate_f(),
            )),
            FilterCategory::StateVariable(kind) => Filter::StateVariable(SVFilter::new(
                kind,
                freq,
                q,
                stages,
                params.gain_db(),
                config.sample_rate_f(),
            )),
        }
    }

    pub fn filter_out(&mut self, buffer: &mut [f32]) {
        match self {
            Filter::Analog(f) => f.filter_out(buffer),
            Filter::StateVariable(f) => f.filter_out(buffer),
        }
    }

    pub fn set_freq(&mut self, freq: f32) {
        match self {
            Filter::Analog(f) => f.set_freq(freq),
            Filter::StateVariable(f) => f.set_freq(freq),
        }
    }

    pub fn set_q(&mut self, q: f32) {
        match self {
            Filter::Analog(f) => f.set_q(q),
            Filter::StateVariable(f) => f.set_q(q),
        }
    }

    pub fn set_freq_and_q(&mut self, freq: f32, q: f32) {
        match self {
            Filter::Analog(f) => f.set_freq_and_q(freq, q),
            Filter::StateVariable(f) => f.set_freq_and_q(freq, q),
        }
    }

    pub fn freq(&self) -> f32 {
        match self {
            Filter::Analog(f) => f.freq(),
            Filter::StateVariable(f) => f.freq(),
        }
    }
}

/// Resonance per stage of an n-stage cascade.
#[inline]
pub(crate) fn stage_q(q: f32, stages: usize) -> f32 {
    if q > 1.0 {
        q.powf(1.0 / stages as f32)
    } else {
        q
    }
}

/// True when going from `old` to `new` Hz should be crossfaded.
#[inline]
pub(crate) fn needs_crossfade(old: f32, new: f32) -> bool {
    let rap = if old > new { old / new } else { new / old };
    rap > INTERPOLATION_RATIO
}

#[cfg(test)]
pub(crate) mod test_signal {
    use std::f32::consts::TAU;

    pub fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (TAU * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    pub fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len().min(256);
        buffer
            .get(skip..)
            .unwrap_or(buffer)
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }
}
