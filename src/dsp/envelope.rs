use crate::{
    dsp::curves::{db_to_rap, rap_to_db},
    patch::envelope::{EnvelopeParams, MAX_ENVELOPE_POINTS},
};

/*
Breakpoint Envelope
===================

A pad note's envelopes are not fixed ADSR shapes but a list of breakpoints:
each point has a level and the time it takes to get there from the previous
one. One point may be marked as the sustain point; the envelope parks there
while the key is held.

Vocabulary
----------

  point       One breakpoint. Point 0 is the level at note-on.

  segment     The ramp from point i-1 to point i. `t` runs 0 → 1 along it.

  inct        How far `t` moves per call. Envelopes advance once per audio
              buffer, so this is buffer_dt / segment_duration. Segments
              shorter than one buffer get inct >= 1 and jump straight to
              their target.

  sustain     While the key is down and we reach the segment after the
              sustain point, output holds the sustain level.

  forced      On key release, abandon the current segment and ramp from the
  release     current level straight to the point after sustain.


The Shape
---------

    level
      │    1
      │   ╱╲  2 (sustain)
      │  ╱  ╲_________
      │ ╱             ╲
      │╱0              ╲ 3
      └──────────────────────→ buffers
               key up ─┘

Amplitude envelopes are stored in dB (-40..0) and converted to gain on the
way out, which makes decays sound even. The first segment is the exception:
it is interpolated in linear gain, because a dB ramp from -40 would spend most
of the attack nearly silent.


Finishing
---------

When the last segment completes the envelope reports `finished()` and keeps
returning the last level. The note uses this to fade out and stop.
*/

/// Level reported for a dB envelope that has fallen below audibility.
const MIN_ENVELOPE_DB: f32 = -400.0;

#[derive(Debug, Clone)]
pub struct Envelope {
    point_count: usize,
    sustain: Option<usize>,
    forced_release: bool,
    linear: bool,

    // Per point: `t` increment per call, and converted level.
    dt: [f32; MAX_ENVELOPE_POINTS],
    val: [f32; MAX_ENVELOPE_POINTS],

    current_point: usize,
    key_released: bool,
    t: f32,
    inct: f32,
    finished: bool,
    out_val: f32,
}

impl Envelope {
    /// Instantiate for a note at `base_freq`, advancing `buffer_dt` seconds per call.
    pub fn new(params: &EnvelopeParams, base_freq: f32, buffer_dt: f32) -> Self {
        let point_count = params.points().len().min(MAX_ENVELOPE_POINTS);
        let stretch = (440.0 / base_freq).powf(params.stretch as f32 / 64.0);

        let mut dt = [0.0; MAX_ENVELOPE_POINTS];
        let mut val = [0.0; MAX_ENVELOPE_POINTS];
        for i in 0..point_count {
            let seconds = params.point_dt_ms(i) / 1000.0 * stretch;
            // any value >= 1 means "reach the point within one buffer"
            dt[i] = if seconds > buffer_dt {
                buffer_dt / seconds
            } else {
                2.0
            };
            val[i] = params.point_value(i);
        }
        dt[0] = 1.0;

        Self {
            point_count,
            // a sustain without a following point has nowhere to release to
            sustain: params.sustain().filter(|&s| s + 1 < point_count),
            forced_release: params.forced_release,
            linear: params.linear,
            dt,
            val,
            current_point: 1,
            key_released: false,
            t: 0.0,
            inct: dt[1],
            finished: false,
            out_val: 0.0,
        }
    }

    /// Key up. Forced-release envelopes restart their segment clock.
    pub fn release_key(&mut self) {
        if self.key_released {
            return;
        }
        self.key_released = true;
        if self.forced_release {
            self.t = 0.0;
        }
    }

    /// Advance one buffer and return the level in the envelope's own units.
    pub fn out(&mut self) -> f32 {
        if self.finished {
            self.out_val = self.val[self.point_count - 1];
            return self.out_val;
        }

        if let Some(sustain) = self.sustain {
            if self.current_point == sustain + 1 && !self.key_released {
                self.out_val = self.val[sustain];
                return self.out_val;
            }
        }

        if self.key_released && self.forced_release {
            let release_point = match self.sustain {
                Some(sustain) => sustain + 1,
                None => self.point_count - 1,
            }
            .min(self.point_count - 1);
            let out = if self.dt[release_point] < 1e-8 {
                self.val[release_point]
            } else {
                self.out_val + (self.val[release_point] - self.out_val) * self.t
            };
            self.t += self.dt[release_point];
            if self.t >= 1.0 {
                self.current_point = release_point + 1;
                self.forced_release = false;
                self.t = 0.0;
                if self.current_point >= self.point_count || self.sustain.is_none() {
                    self.finished = true;
                } else {
                    self.inct = self.dt[self.current_point];
                }
            }
            return out;
        }

        let cp = self.current_point;
        let out = if self.inct >= 1.0 {
            self.val[cp]
        } else {
            self.val[cp - 1] + (self.val[cp] - self.val[cp - 1]) * self.t
        };

        self.t += self.inct;
        if self.t >= 1.0 {
            if self.current_point >= self.point_count - 1 {
                self.finished = true;
            } else {
                self.current_point += 1;
            }
            self.t = 0.0;
            self.inct = self.dt[self.current_point];
        }

        self.out_val = out;
        out
    }

    /// Advance one buffer and return linear gain. Linear envelopes pass through.
    pub fn out_db(&mut self) -> f32 {
        if self.linear {
            return self.out();
        }

        if self.current_point == 1 && (!self.key_released || !self.forced_release) {
            // attack segment: interpolate gain, not dB
            let v1 = db_to_rap(self.val[0]);
            let v2 = db_to_rap(self.val[1]);
            let mut out = v1 + (v2 - v1) * self.t;

            self.t += self.inct;
            if self.t >= 1.0 {
                self.t = 0.0;
                out = v2;
                if self.point_count > 2 {
                    self.current_point += 1;
                    self.inct = self.dt[2];
                } else {
                    self.finished = true;
                }
            }

            self.out_val = if out > 0.001 {
                rap_to_db(out)
            } else {
                MIN_ENVELOPE_DB
            };
            out
        } else {
            db_to_rap(self.out())
        }
    }

    pub fn finished(&self) -> bool {
        self.finished
    }
}
