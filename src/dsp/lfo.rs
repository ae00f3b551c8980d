//! Low Frequency Oscillator (LFO) evaluated once per audio buffer.

use std::f32::consts::TAU;

use crate::{
    config::SynthConfig,
    patch::lfo::{LfoKind, LfoParams, LfoShape},
    util::rng::Rng,
};

/*
Low Frequency Oscillators
=========================

An LFO is an oscillator running at sub-audio rate whose output modulates a
parameter instead of being heard. A pad note owns three: vibrato (cents),
tremolo (gain) and a filter sweep (octaves).

Vocabulary
----------

  control-rate    The LFO is stepped once per buffer, not once per sample.
                  At 44.1 kHz with 256-sample buffers that is ~172 Hz, which
                  is why the phase increment is capped just under 0.5.

  x               Phase, 0..1. One full cycle per wrap.

  intensity       Depth in the unit of the driven parameter. Frequency LFOs
                  use an exponential curve (0..2047 cents), the others are
                  linear.

  stretch         Rate tracking. Higher notes run faster when stretch > 64,
                  slower when < 64.


Randomness
----------

Two independent kinds, both redrawn at every cycle wrap:

AMPLITUDE
    Each cycle gets a random depth between (1 - rnd) and 1. Sine and
    triangle glide from the previous cycle's depth to the next one across
    the cycle; the other shapes jump.

RATE
    Each cycle gets a random speed multiplier in [0.5^r, 0.5^r + 2^r - 1].
    The multiplier is crossfaded across the cycle and clamped to 0..1 so the
    phase never runs backwards.


Delay
-----

The LFO holds its starting phase for up to four seconds after note-on, then
starts moving. Output during the delay is the shape's value at that phase,
not silence.


Shapes (x = 0 → 1)
------------------

    Sine        cos(2πx)
    Triangle    0 → 1 → 0 → -1 → 0
    Square      -1 for the first half, +1 after
    RampUp      -1 → +1
    RampDown    +1 → -1
    ExpDown1    0.05^x, rescaled to ±1
    ExpDown2    0.001^x, rescaled to ±1
*/

const MAX_PHASE_INCREMENT: f32 = 0.499_999_999;

#[derive(Debug, Clone)]
pub struct Lfo {
    shape: LfoShape,
    x: f32,
    incx: f32,
    intensity: f32,

    amp1: f32,
    amp2: f32,
    amp_rnd: f32,

    freq_rnd: f32,
    incrnd: f32,
    next_incrnd: f32,

    delay: f32,
    dt: f32,
    rng: Rng,
}

impl Lfo {
    pub fn new(params: &LfoParams, base_freq: f32, config: &SynthConfig, mut rng: Rng) -> Self {
        let stretch = params.stretch.max(1) as f32;
        let lfo_stretch = (base_freq / 440.0).powf((stretch - 64.0) / 63.0);
        let lfo_freq = (2.0f32.powf(params.freq * 10.0) - 1.0) / 12.0 * lfo_stretch;
        let dt = config.dt();
        let incx = (lfo_freq.abs() * dt).min(MAX_PHASE_INCREMENT);

        let mut x = if params.start_phase == 0 {
            rng.rand_float()
        } else {
            ((params.start_phase as f32 - 64.0) / 127.0 + 1.0).rem_euclid(1.0)
        };

        let amount = params.intensity as f32 / 127.0;
        let intensity = match params.kind {
            LfoKind::Amplitude => amount,
            LfoKind::Filter => amount * 4.0,
            LfoKind::Frequency => {
                // vibrato starts at the zero crossing
                x -= 0.25;
                2.0f32.powf(amount * 11.0) - 1.0
            }
        };

        let amp_rnd = (params.randomness as f32 / 127.0).clamp(0.0, 1.0);
        let amp1 = (1.0 - amp_rnd) + amp_rnd * rng.rand_float();
        let amp2 = (1.0 - amp_rnd) + amp_rnd * rng.rand_float();

        let mut lfo = Self {
            shape: params.shape,
            x,
            incx,
            intensity,
            amp1,
            amp2,
            amp_rnd,
            freq_rnd: (params.freq_rand as f32 / 127.0).powi(2) * 4.0,
            incrnd: 1.0,
            next_incrnd: 1.0,
            delay: params.delay as f32 / 127.0 * 4.0,
            dt,
            rng,
        };
        // twice, so both the current and the next cycle are randomized
        lfo.next_rate();
        lfo.next_rate();
        lfo
    }

    fn rate_randomized(&self) -> bool {
        self.freq_rnd > 0.0
    }

    fn next_rate(&mut self) {
        if !self.rate_randomized() {
            return;
        }
        self.incrnd = self.next_incrnd;
        self.next_incrnd = 0.5f32.powf(self.freq_rnd)
            + self.rng.rand_float() * (2.0f32.powf(self.freq_rnd) - 1.0);
    }

    #[inline]
    fn shape_value(&self) -> f32 {
        let x = self.x.rem_euclid(1.0);
        match self.shape {
            LfoShape::Sine => (x * TAU).cos(),
            LfoShape::Triangle => {
                if x < 0.25 {
                    4.0 * x
                } else if x < 0.75 {
                    2.0 - 4.0 * x
                } else {
                    4.0 * x - 4.0
                }
            }
            LfoShape::Square => {
                if x < 0.5 {
                    -1.0
                } else {
                    1.0
                }
            }
            LfoShape::RampUp => (x - 0.5) * 2.0,
            LfoShape::RampDown => (0.5 - x) * 2.0,
            LfoShape::ExpDown1 => 0.05f32.powf(x) * 2.0 - 1.0,
            LfoShape::ExpDown2 => 0.001f32.powf(x) * 2.0 - 1.0,
        }
    }

    /// Current value scaled by intensity, then advance one buffer.
    pub fn out(&mut self) -> f32 {
        let mut out = self.shape_value();
        out *= match self.shape {
            LfoShape::Sine | LfoShape::Triangle => {
                self.intensity * (self.amp1 + self.x * (self.amp2 - self.amp1))
            }
            _ => self.intensity * self.amp2,
        };

        if self.delay < 0.000_01 {
            if self.rate_randomized() {
                let rate =
                    (self.incrnd * (1.0 - self.x) + self.next_incrnd * self.x).clamp(0.0, 1.0);
                self.x += self.incx * rate;
            } else {
                self.x += self.incx;
            }
            if self.x >= 1.0 {
                self.x = self.x.rem_euclid(1.0);
                self.amp1 = self.amp2;
                self.amp2 = (1.0 - self.amp_rnd) + self.amp_rnd * self.rng.rand_float();
                self.next_rate();
            }
        } else {
            self.delay -= self.dt;
        }

        out
    }

    /// Gain multiplier for tremolo, in -1..1.
    pub fn amp_out(&mut self) -> f32 {
        (1.0 - self.intensity + self.out()).clamp(-1.0, 1.0)
    }
}
