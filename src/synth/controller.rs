//! Real-time controller state read by notes once per buffer.
//!
//! The owner feeds MIDI controller values in through the setters; notes only
//! read the derived fields (`relmod`, `relfreq`, `relq`, `freqrap`).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SynthConfig;

/// ln(10) / ln(2): one decade of cutoff expressed in octaves.
const OCTAVES_PER_DECADE: f32 = 3.321_928;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModWheel {
    pub depth: u8,
    pub exponential: bool,
    /// Vibrato depth multiplier.
    pub relmod: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchWheel {
    /// Cents at full deflection.
    pub bend_range: i16,
    pub relfreq: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCutoff {
    pub depth: u8,
    /// Cutoff offset in octaves.
    pub relfreq: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterQ {
    pub depth: u8,
    pub relq: f32,
}

/// What `pitch_threshold` means.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    /// Glide only between notes at most this far apart.
    Below,
    /// Glide only between notes at least this far apart.
    AtLeast,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Portamento {
    pub enabled: bool,
    /// 0..127, exponential from 20 ms to 2 s.
    pub time: u8,
    /// 64 = same speed both ways; above speeds up downward glides, below
    /// speeds up upward ones. 0 and 127 disable one direction.
    pub up_down_stretch: u8,
    /// Semitones.
    pub pitch_threshold: u8,
    pub threshold_kind: ThresholdKind,

    /// Frequency ratio notes apply while gliding; decays to 1.
    pub freqrap: f32,
    /// A glide is in progress.
    pub used: bool,
    x: f32,
    dx: f32,
    orig_freqrap: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Controller {
    config: SynthConfig,
    pub mod_wheel: ModWheel,
    pub pitch_wheel: PitchWheel,
    pub filter_cutoff: FilterCutoff,
    pub filter_q: FilterQ,
    pub portamento: Portamento,
}

impl Controller {
    pub fn new(config: SynthConfig) -> Self {
        let mut ctl = Self {
            config,
            mod_wheel: ModWheel {
                depth: 80,
                exponential: false,
                relmod: 1.0,
            },
            pitch_wheel: PitchWheel {
                bend_range: 200,
                relfreq: 1.0,
            },
            filter_cutoff: FilterCutoff {
                depth: 64,
                relfreq: 0.0,
            },
            filter_q: FilterQ {
                depth: 64,
                relq: 1.0,
            },
            portamento: Portamento {
                enabled: false,
                time: 64,
                up_down_stretch: 64,
                pitch_threshold: 3,
                threshold_kind: ThresholdKind::AtLeast,
                freqrap: 1.0,
                used: false,
                x: 0.0,
                dx: 0.0,
                orig_freqrap: 1.0,
            },
        };
        ctl.reset();
        ctl
    }

    /// Centre every controller.
    pub fn reset(&mut self) {
        self.set_mod_wheel(64);
        self.set_pitch_wheel(0);
        self.set_filter_cutoff(64);
        self.set_filter_q(64);
        self.portamento.freqrap = 1.0;
        self.portamento.used = false;
    }

    pub fn set_mod_wheel(&mut self, value: u8) {
        let value = value as f32;
        let depth = self.mod_wheel.depth as f32;
        self.mod_wheel.relmod = if self.mod_wheel.exponential {
            25.0f32.powf((value - 64.0) / 64.0 * (depth / 80.0))
        } else {
            let mut tmp = 25.0f32.powf((depth / 127.0).powf(1.5) * 2.0) / 25.0;
            if value < 64.0 && depth >= 64.0 {
                tmp = 1.0;
            }
            ((value / 64.0 - 1.0) * tmp + 1.0).max(0.0)
        };
    }

    /// `value` is the signed 14-bit bend, -8192..8191.
    pub fn set_pitch_wheel(&mut self, value: i16) {
        let cents = value as f32 / 8192.0 * self.pitch_wheel.bend_range as f32;
        self.pitch_wheel.relfreq = 2.0f32.powf(cents / 1200.0);
    }

    pub fn set_filter_cutoff(&mut self, value: u8) {
        self.filter_cutoff.relfreq = (value as f32 - 64.0) * self.filter_cutoff.depth as f32
            / 4096.0
            * OCTAVES_PER_DECADE;
    }

    pub fn set_filter_q(&mut self, value: u8) {
        self.filter_q.relq =
            30.0f32.powf((value as f32 - 64.0) / 64.0 * (self.filter_q.depth as f32 / 64.0));
    }

    /// Start a glide from `old_freq` to `new_freq`. Returns whether the new
    /// note should follow it.
    pub fn init_portamento(&mut self, old_freq: f32, new_freq: f32, legato: bool) -> bool {
        let p = &mut self.portamento;
        p.x = 0.0;
        if !p.enabled || (!legato && p.used) {
            return false;
        }

        let mut time = 100.0f32.powf(p.time as f32 / 127.0) / 50.0;
        if p.up_down_stretch >= 64 && new_freq < old_freq {
            if p.up_down_stretch == 127 {
                return false;
            }
            time *= 0.1f32.powf((p.up_down_stretch as f32 - 64.0) / 63.0);
        }
        if p.up_down_stretch < 64 && new_freq > old_freq {
            if p.up_down_stretch == 0 {
                return false;
            }
            time *= 0.1f32.powf((64.0 - p.up_down_stretch as f32) / 64.0);
        }

        p.dx = self.config.buffer_size_f() / (time * self.config.sample_rate_f());
        p.orig_freqrap = old_freq / new_freq;

        let rap = if p.orig_freqrap > 1.0 {
            p.orig_freqrap
        } else {
            1.0 / p.orig_freqrap
        };
        let threshold = 2.0f32.powf(p.pitch_threshold as f32 / 12.0);
        let outside = match p.threshold_kind {
            ThresholdKind::Below => rap - 0.000_01 > threshold,
            ThresholdKind::AtLeast => rap + 0.000_01 < threshold,
        };
        if outside {
            return false;
        }

        p.used = true;
        p.freqrap = p.orig_freqrap;
        true
    }

    /// Advance the glide by one buffer.
    pub fn update_portamento(&mut self) {
        let p = &mut self.portamento;
        if !p.used {
            return;
        }
        p.x += p.dx;
        if p.x > 1.0 {
            p.x = 1.0;
            p.used = false;
        }
        p.freqrap = (1.0 - p.x) * p.orig_freqrap + p.x;
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(SynthConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centred_controllers_are_neutral() {
        let ctl = Controller::default();
        assert!((ctl.mod_wheel.relmod - 1.0).abs() < 1e-6);
        assert!((ctl.pitch_wheel.relfreq - 1.0).abs() < 1e-6);
        assert_eq!(ctl.filter_cutoff.relfreq, 0.0);
        assert!((ctl.filter_q.relq - 1.0).abs() < 1e-6);
        assert_eq!(ctl.portamento.freqrap, 1.0);
    }

    #[test]
    fn mod_wheel_curves() {
        let mut ctl = Controller::default();
        ctl.set_mod_wheel(0);
        assert_eq!(ctl.mod_wheel.relmod, 0.0, "depth >= 64 pins the lower half linear");
        ctl.set_mod_wheel(127);
        assert!(ctl.mod_wheel.relmod > 1.0);

        ctl.mod_wheel.exponential = true;
        ctl.set_mod_wheel(0);
        assert!((ctl.mod_wheel.relmod - 1.0 / 25.0).abs() < 1e-5);
    }

    #[test]
    fn pitch_wheel_bends_two_semitones() {
        let mut ctl = Controller::default();
        ctl.set_pitch_wheel(8191);
        assert!((ctl.pitch_wheel.relfreq - 2.0f32.powf(2.0 / 12.0)).abs() < 1e-3);
        ctl.set_pitch_wheel(-8192);
        assert!((ctl.pitch_wheel.relfreq - 2.0f32.powf(-2.0 / 12.0)).abs() < 1e-5);
    }

    #[test]
    fn filter_controls() {
        let mut ctl = Controller::default();
        ctl.set_filter_cutoff(127);
        assert!(ctl.filter_cutoff.relfreq > 3.0);
        ctl.set_filter_q(0);
        assert!((ctl.filter_q.relq - 1.0 / 30.0).abs() < 1e-5);
    }

    #[test]
    fn portamento_glides_to_unity() {
        let mut ctl = Controller::default();
        ctl.portamento.enabled = true;
        ctl.portamento.time = 0;

        assert!(ctl.init_portamento(440.0, 880.0, false));
        assert!(ctl.portamento.used);
        assert!((ctl.portamento.freqrap - 0.5).abs() < 1e-6);

        let mut steps = 0;
        while ctl.portamento.used {
            ctl.update_portamento();
            steps += 1;
            assert!(steps < 1000);
        }
        assert_eq!(ctl.portamento.freqrap, 1.0);
        // 20 ms at 256-sample buffers
        assert_eq!(steps, 4);
    }

    #[test]
    fn portamento_respects_threshold_and_state() {
        let mut ctl = Controller::default();
        assert!(!ctl.init_portamento(440.0, 880.0, false), "disabled by default");

        ctl.portamento.enabled = true;
        assert!(!ctl.init_portamento(440.0, 450.0, false), "below the 3 semitone threshold");

        assert!(ctl.init_portamento(440.0, 880.0, false));
        assert!(!ctl.init_portamento(880.0, 440.0, false), "a glide is already running");
        assert!(ctl.init_portamento(880.0, 440.0, true), "legato may restart it");

        ctl.portamento.up_down_stretch = 127;
        ctl.portamento.used = false;
        assert!(!ctl.init_portamento(880.0, 440.0, false), "downward glides disabled");
    }
}
