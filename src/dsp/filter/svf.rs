use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{needs_crossfade, stage_q, NYQUIST_MARGIN_HZ};
use crate::{dsp::curves::db_to_rap, patch::filter::MAX_FILTER_STAGES};

/*
Topology-preserving transform (TPT) state-variable filter. Every stage
produces all four responses at once; we pick one.

  g = tan(π·fc/fs)            cutoff, prewarped
  k = 1/q                     damping; lower k rings more
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
    pub notch: f32,
}

#[derive(Debug, Clone, Copy, Default)]
struct Integrators {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory
}

impl Integrators {
    #[inline]
    fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> FilterOutputs {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
            notch: sample - k * v1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SVFilter {
    filter_type: FilterType,
    stages: usize,
    state: [Integrators; MAX_FILTER_STAGES],

    sample_rate: f32,
    freq: f32,
    q: f32,
    outgain: f32,

    g: f32,
    old_g: f32,
    k: f32,
    bypass: bool,
    needs_interpolation: bool,
    first_time: bool,
}

impl SVFilter {
    pub fn new(
        filter_type: FilterType,
        freq: f32,
        q: f32,
        stages: usize,
        gain_db: f32,
        sample_rate: f32,
    ) -> Self {
        let mut filter = Self {
            filter_type,
            stages: stages.clamp(1, MAX_FILTER_STAGES),
            state: [Integrators::default(); MAX_FILTER_STAGES],
            sample_rate,
            freq,
            q,
            outgain: db_to_rap(gain_db),
            g: 0.0,
            old_g: 0.0,
            k: 1.0,
            bypass: false,
            needs_interpolation: false,
            first_time: true,
        };
        filter.set_freq_and_q(freq, q);
        filter
    }

    pub fn lowpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz, 0.707, 1, 0.0, sample_rate)
    }

    pub fn highpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff_hz, 0.707, 1, 0.0, sample_rate)
    }

    pub fn freq(&self) -> f32 {
        self.freq
    }

    fn nyquist_limit(&self) -> f32 {
        (self.sample_rate / 2.0 - NYQUIST_MARGIN_HZ).max(0.1)
    }

    #[inline]
    fn compute_g(&self) -> f32 {
        let wd = TAU * self.freq;
        let wa = (2.0 * self.sample_rate) * (wd / (2.0 * self.sample_rate)).tan();
        wa / (2.0 * self.sample_rate)
    }

    fn compute_k(&self) -> f32 {
        1.0 / stage_q(self.q, self.stages).max(0.01)
    }

    pub fn set_freq(&mut self, freq: f32) {
        let freq = freq.max(0.1);
        let jump = needs_crossfade(self.freq.max(0.1), freq);
        self.freq = freq;
        self.bypass = freq > self.nyquist_limit();
        if self.bypass {
            return;
        }

        let g = self.compute_g();
        if jump && !self.first_time {
            self.old_g = self.g;
            self.needs_interpolation = true;
        } else {
            self.old_g = g;
        }
        self.g = g;
        self.first_time = false;
    }

    pub fn set_q(&mut self, q: f32) {
        self.q = q;
        self.k = self.compute_k();
    }

    pub fn set_freq_and_q(&mut self, freq: f32, q: f32) {
        self.set_q(q);
        self.set_freq(freq);
    }

    pub fn filter_out(&mut self, buffer: &mut [f32]) {
        if self.bypass {
            self.needs_interpolation = false;
        } else {
            let len_f = buffer.len() as f32;
            for stage in self.state[..self.stages].iter_mut() {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let g = if self.needs_interpolation {
                        self.old_g + (self.g - self.old_g) * i as f32 / len_f
                    } else {
                        self.g
                    };
                    let outputs = stage.next_sample(*sample, self.k, g);
                    *sample = match self.filter_type {
                        FilterType::LowPass => outputs.lowpass,
                        FilterType::HighPass => outputs.highpass,
                        FilterType::BandPass => outputs.bandpass,
                        FilterType::Notch => outputs.notch,
                    }
                }
            }
            self.needs_interpolation = false;
        }

        for sample in buffer.iter_mut() {
            *sample *= self.outgain;
        }
    }

    pub fn reset(&mut self) {
        self.state = [Integrators::default(); MAX_FILTER_STAGES];
    }
}
