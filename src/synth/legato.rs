use crate::config::SynthConfig;

/*
Legato Cross-fade
=================

In legato mode the voice manager keeps two notes per voice: one audible and
one quiet. A new key retunes both without restarting envelopes, but jumping
pitch mid-waveform clicks, so the pair cross-fades:

    audible:  FadeOut ──> CatchUp ──> ToNormal ──> Normal   (now silent)
    quiet:    FadeIn  ─────────────────────────────> Normal (now audible)

FadeOut     Ramp the old pitch down over 5 ms, then zero the rest of the
            buffer, go silent, and retune to freq·freq/last_freq. Running
            that much sharp for as long as the fade took puts this note's
            phase back in step with its partner.

CatchUp     Stay silent for another 5 ms at the catch-up pitch, then retune
            to the real target.

ToNormal    The next transition drops back to Normal.

FadeIn      Ramp up over 5 ms from silence at the new pitch.

Retunes are handed back to the note as values; the note performs them.
*/

/// Cross-fade length.
const FADE_SECONDS: f32 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegatoParams {
    pub frequency: f32,
    pub velocity: f32,
    pub portamento: bool,
    pub midi_note: u8,
    /// The transition comes from the voice manager rather than from the
    /// note's own catch-up.
    pub extern_call: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegatoState {
    Normal,
    FadeIn,
    FadeOut,
    CatchUp,
    ToNormal,
}

#[derive(Debug, Clone)]
pub struct Legato {
    state: LegatoState,
    fade_length: i32,
    fade_step: f32,
    fade_gain: f32,
    /// Samples left in the current fade; `None` until a fade starts.
    decounter: Option<i32>,
    param: LegatoParams,
    last_freq: f32,
    silent: bool,
}

impl Legato {
    pub fn new(config: &SynthConfig, param: LegatoParams, quiet: bool) -> Self {
        let fade_length = ((config.sample_rate_f() * FADE_SECONDS) as i32).max(1);
        Self {
            state: LegatoState::Normal,
            fade_length,
            fade_step: 1.0 / fade_length as f32,
            fade_gain: 0.0,
            decounter: None,
            param,
            last_freq: 0.0,
            silent: quiet,
        }
    }

    pub fn state(&self) -> LegatoState {
        self.state
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Record a legato transition. Returns `true` when the cross-fade takes
    /// it over and the note must not retune yet.
    pub fn update(&mut self, params: LegatoParams) -> bool {
        if params.extern_call {
            self.state = LegatoState::Normal;
        }
        if self.state == LegatoState::CatchUp {
            return false;
        }

        self.last_freq = self.param.frequency;
        self.param = LegatoParams {
            extern_call: false,
            ..params
        };
        match self.state {
            LegatoState::Normal if self.silent => {
                self.fade_gain = 0.0;
                self.state = LegatoState::FadeIn;
            }
            LegatoState::Normal => {
                self.fade_gain = 1.0;
                self.state = LegatoState::FadeOut;
                return true;
            }
            LegatoState::ToNormal => self.state = LegatoState::Normal,
            _ => {}
        }
        false
    }

    /// Post-process a rendered buffer. Returns a retune the note must apply.
    pub fn apply(&mut self, out_l: &mut [f32], out_r: &mut [f32]) -> Option<LegatoParams> {
        if self.silent && self.state != LegatoState::FadeIn {
            out_l.fill(0.0);
            out_r.fill(0.0);
        }

        let len = out_l.len().min(out_r.len());
        match self.state {
            LegatoState::CatchUp => {
                let counter = self.decounter.get_or_insert(self.fade_length);
                // the catch-up spans whole buffers; count them down in one step
                *counter -= len as i32;
                if *counter < 1 {
                    self.decounter = None;
                    self.state = LegatoState::ToNormal;
                    return Some(self.param);
                }
            }
            LegatoState::FadeIn => {
                let counter = self.decounter.get_or_insert(self.fade_length);
                self.silent = false;
                for i in 0..len {
                    *counter -= 1;
                    if *counter < 1 {
                        self.decounter = None;
                        self.state = LegatoState::Normal;
                        break;
                    }
                    self.fade_gain += self.fade_step;
                    out_l[i] *= self.fade_gain;
                    out_r[i] *= self.fade_gain;
                }
            }
            LegatoState::FadeOut => {
                let counter = self.decounter.get_or_insert(self.fade_length);
                for i in 0..len {
                    *counter -= 1;
                    if *counter < 1 {
                        out_l[i..len].fill(0.0);
                        out_r[i..len].fill(0.0);
                        self.silent = true;
                        self.decounter = Some(self.fade_length);
                        self.state = LegatoState::CatchUp;
                        let catch_up = self.param.frequency * (self.param.frequency / self.last_freq);
                        return Some(LegatoParams {
                            frequency: catch_up,
                            ..self.param
                        });
                    }
                    self.fade_gain -= self.fade_step;
                    out_l[i] *= self.fade_gain;
                    out_r[i] *= self.fade_gain;
                }
            }
            LegatoState::Normal | LegatoState::ToNormal => {}
        }
        None
    }
}
