use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{needs_crossfade, stage_q, NYQUIST_MARGIN_HZ};
use crate::{dsp::curves::db_to_rap, patch::filter::MAX_FILTER_STAGES, MAX_BLOCK_SIZE};

// Biquad forms from Robert Bristow-Johnson's audio EQ cookbook. Coefficients
// are stored pre-divided by a0.

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogType {
    LowPass1,
    HighPass1,
    LowPass2,
    HighPass2,
    BandPass2,
    Notch2,
    Peak,
    LowShelf,
    HighShelf,
}

impl AnalogType {
    /// Peak and shelf responses spend their gain on the boost itself.
    fn uses_gain(self) -> bool {
        matches!(
            self,
            AnalogType::Peak | AnalogType::LowShelf | AnalogType::HighShelf
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Coefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Coefficients {
    const WIRE: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    fn normalized(a0: f32, a1: f32, a2: f32, b0: f32, b1: f32, b2: f32) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct History {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl History {
    #[inline]
    fn process(&mut self, c: &Coefficients, x: f32) -> f32 {
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

/// Cascade of identical biquad (or one-pole) stages.
#[derive(Debug, Clone)]
pub struct AnalogFilter {
    kind: AnalogType,
    stages: usize,
    sample_rate: f32,
    freq: f32,
    q: f32,
    gain_db: f32,
    outgain: f32,

    coeffs: Coefficients,
    history: [History; MAX_FILTER_STAGES],

    old_coeffs: Coefficients,
    old_history: [History; MAX_FILTER_STAGES],
    needs_interpolation: bool,
    first_time: bool,
}

impl AnalogFilter {
    pub fn new(
        kind: AnalogType,
        freq: f32,
        q: f32,
        stages: usize,
        gain_db: f32,
        sample_rate: f32,
    ) -> Self {
        let outgain = if kind.uses_gain() {
            1.0
        } else {
            db_to_rap(gain_db)
        };
        let mut filter = Self {
            kind,
            stages: stages.clamp(1, MAX_FILTER_STAGES),
            sample_rate,
            freq,
            q,
            gain_db,
            outgain,
            coeffs: Coefficients::WIRE,
            history: [History::default(); MAX_FILTER_STAGES],
            old_coeffs: Coefficients::WIRE,
            old_history: [History::default(); MAX_FILTER_STAGES],
            needs_interpolation: false,
            first_time: true,
        };
        filter.set_freq(freq);
        filter
    }

    pub fn freq(&self) -> f32 {
        self.freq
    }

    fn nyquist_limit(&self) -> f32 {
        (self.sample_rate / 2.0 - NYQUIST_MARGIN_HZ).max(0.1)
    }

    fn compute_coefficients(&self) -> Coefficients {
        if self.freq > self.nyquist_limit() {
            return Coefficients::WIRE;
        }
        let freq = self.freq.max(0.1);
        let w0 = TAU * freq / self.sample_rate;
        let (sn, cs) = w0.sin_cos();
        let q = stage_q(self.q, self.stages).max(f32::EPSILON);
        let alpha = sn / (2.0 * q);

        match self.kind {
            AnalogType::LowPass1 => {
                let p = (-w0).exp();
                Coefficients {
                    b0: 1.0 - p,
                    b1: 0.0,
                    b2: 0.0,
                    a1: -p,
                    a2: 0.0,
                }
            }
            AnalogType::HighPass1 => {
                let p = (-w0).exp();
                Coefficients {
                    b0: (1.0 + p) / 2.0,
                    b1: -(1.0 + p) / 2.0,
                    b2: 0.0,
                    a1: -p,
                    a2: 0.0,
                }
            }
            AnalogType::LowPass2 => Coefficients::normalized(
                1.0 + alpha,
                -2.0 * cs,
                1.0 - alpha,
                (1.0 - cs) / 2.0,
                1.0 - cs,
                (1.0 - cs) / 2.0,
            ),
            AnalogType::HighPass2 => Coefficients::normalized(
                1.0 + alpha,
                -2.0 * cs,
                1.0 - alpha,
                (1.0 + cs) / 2.0,
                -(1.0 + cs),
                (1.0 + cs) / 2.0,
            ),
            AnalogType::BandPass2 => Coefficients::normalized(
                1.0 + alpha,
                -2.0 * cs,
                1.0 - alpha,
                alpha,
                0.0,
                -alpha,
            ),
            AnalogType::Notch2 => {
                Coefficients::normalized(1.0 + alpha, -2.0 * cs, 1.0 - alpha, 1.0, -2.0 * cs, 1.0)
            }
            AnalogType::Peak => {
                let a = db_to_rap(self.gain_db / self.stages as f32 / 2.0);
                Coefficients::normalized(
                    1.0 + alpha / a,
                    -2.0 * cs,
                    1.0 - alpha / a,
                    1.0 + alpha * a,
                    -2.0 * cs,
                    1.0 - alpha * a,
                )
            }
            AnalogType::LowShelf => {
                let a = db_to_rap(self.gain_db / self.stages as f32 / 2.0);
                let beta = 2.0 * a.sqrt() * alpha;
                Coefficients::normalized(
                    (a + 1.0) + (a - 1.0) * cs + beta,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cs),
                    (a + 1.0) + (a - 1.0) * cs - beta,
                    a * ((a + 1.0) - (a - 1.0) * cs + beta),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cs),
                    a * ((a + 1.0) - (a - 1.0) * cs - beta),
                )
            }
            AnalogType::HighShelf => {
                let a = db_to_rap(self.gain_db / self.stages as f32 / 2.0);
                let beta = 2.0 * a.sqrt() * alpha;
                Coefficients::normalized(
                    (a + 1.0) - (a - 1.0) * cs + beta,
                    2.0 * ((a - 1.0) - (a + 1.0) * cs),
                    (a + 1.0) - (a - 1.0) * cs - beta,
                    a * ((a + 1.0) + (a - 1.0) * cs + beta),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cs),
                    a * ((a + 1.0) + (a - 1.0) * cs - beta),
                )
            }
        }
    }

    pub fn set_freq(&mut self, freq: f32) {
        let freq = freq.max(0.1);
        let limit = self.nyquist_limit();
        let crossed_nyquist = (self.freq > limit) != (freq > limit);
        if needs_crossfade(self.freq.max(0.1), freq) || crossed_nyquist {
            self.old_coeffs = self.coeffs;
            self.old_history = self.history;
            if !self.first_time {
                self.needs_interpolation = true;
            }
        }
        self.freq = freq;
        self.coeffs = self.compute_coefficients();
        self.first_time = false;
    }

    pub fn set_q(&mut self, q: f32) {
        self.q = q;
        self.coeffs = self.compute_coefficients();
    }

    pub fn set_freq_and_q(&mut self, freq: f32, q: f32) {
        self.q = q;
        self.set_freq(freq);
    }

    fn run(coeffs: &Coefficients, history: &mut [History], buffer: &mut [f32]) {
        for stage in history.iter_mut() {
            for sample in buffer.iter_mut() {
                *sample = stage.process(coeffs, *sample);
            }
        }
    }

    pub fn filter_out(&mut self, buffer: &mut [f32]) {
        let len = buffer.len().min(MAX_BLOCK_SIZE);
        let buffer = &mut buffer[..len];

        if self.needs_interpolation {
            let mut previous = [0.0f32; MAX_BLOCK_SIZE];
            previous[..len].copy_from_slice(buffer);
            Self::run(
                &self.old_coeffs,
                &mut self.old_history[..self.stages],
                &mut previous[..len],
            );
            Self::run(&self.coeffs, &mut self.history[..self.stages], buffer);

            let len_f = len as f32;
            for (i, (sample, old)) in buffer.iter_mut().zip(&previous[..len]).enumerate() {
                let x = i as f32 / len_f;
                *sample = old * (1.0 - x) + *sample * x;
            }
            self.needs_interpolation = false;
        } else {
            Self::run(&self.coeffs, &mut self.history[..self.stages], buffer);
        }

        for sample in buffer.iter_mut() {
            *sample *= self.outgain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::filter::test_signal::{peak_after_transient, sine};

    const SR: f32 = 48_000.0;

    fn filter(kind: AnalogType, freq: f32) -> AnalogFilter {
        AnalogFilter::new(kind, freq, 0.707, 1, 0.0, SR)
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut f = filter(AnalogType::LowPass2, 500.0);
        let mut buffer = vec![1.0; 1024];
        f.filter_out(&mut buffer);
        assert!((buffer[1023] - 1.0).abs() < 1e-3, "got {}", buffer[1023]);
    }

    #[test]
    fn highpass_blocks_dc() {
        for kind in [AnalogType::HighPass1, AnalogType::HighPass2] {
            let mut f = filter(kind, 500.0);
            let mut buffer = vec![1.0; 2048];
            f.filter_out(&mut buffer);
            assert!(buffer[2047].abs() < 1e-3, "{:?} left {}", kind, buffer[2047]);
        }
    }

    #[test]
    fn lowpass_attenuates_highs() {
        for kind in [AnalogType::LowPass1, AnalogType::LowPass2] {
            let mut f = filter(kind, 500.0);
            let mut buffer = sine(8_000.0, SR, 1024);
            f.filter_out(&mut buffer);
            let peak = peak_after_transient(&buffer);
            assert!(peak < 0.1, "{:?} peak {}", kind, peak);
        }
    }

    #[test]
    fn more_stages_are_steeper() {
        let mut one = AnalogFilter::new(AnalogType::LowPass2, 500.0, 0.707, 1, 0.0, SR);
        let mut three = AnalogFilter::new(AnalogType::LowPass2, 500.0, 0.707, 3, 0.0, SR);
        let mut a = sine(2_000.0, SR, 1024);
        let mut b = a.clone();
        one.filter_out(&mut a);
        three.filter_out(&mut b);
        assert!(peak_after_transient(&b) < peak_after_transient(&a) * 0.5);
    }

    #[test]
    fn notch_rejects_center() {
        let mut f = AnalogFilter::new(AnalogType::Notch2, 1_000.0, 2.0, 1, 0.0, SR);
        let mut center = sine(1_000.0, SR, 4096);
        f.filter_out(&mut center[..2048]);
        f.filter_out(&mut center[2048..]);
        assert!(peak_after_transient(&center[2048..]) < 0.05);
    }

    #[test]
    fn peak_boosts_center() {
        let mut f = AnalogFilter::new(AnalogType::Peak, 1_000.0, 1.0, 1, 12.0, SR);
        let mut buffer = sine(1_000.0, SR, 2048);
        f.filter_out(&mut buffer);
        let peak = peak_after_transient(&buffer);
        assert!((peak - db_to_rap(12.0)).abs() < 0.2, "peak {}", peak);
    }

    #[test]
    fn output_gain_applies_to_plain_types() {
        let mut f = AnalogFilter::new(AnalogType::LowPass2, 5_000.0, 0.707, 1, -6.0, SR);
        let mut buffer = vec![1.0; 1024];
        f.filter_out(&mut buffer);
        assert!((buffer[1023] - db_to_rap(-6.0)).abs() < 1e-3);
    }

    #[test]
    fn above_nyquist_is_a_wire() {
        let mut f = filter(AnalogType::LowPass2, 30_000.0);
        let input = sine(10_000.0, SR, 256);
        let mut buffer = input.clone();
        f.filter_out(&mut buffer);
        assert_eq!(buffer, input);
    }

    #[test]
    fn large_jumps_crossfade() {
        let mut f = filter(AnalogType::LowPass2, 200.0);
        let mut warmup = vec![1.0; 512];
        f.filter_out(&mut warmup);

        f.set_freq(5_000.0);
        assert!(f.needs_interpolation);
        let mut buffer = vec![1.0; 256];
        f.filter_out(&mut buffer);
        assert!(!f.needs_interpolation);
        assert!(buffer.iter().all(|s| s.is_finite()));

        f.set_freq(6_000.0);
        assert!(!f.needs_interpolation, "small steps apply directly");
    }
}
