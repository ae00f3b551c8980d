//! One sounding pad note.

use std::sync::Arc;

use crate::{
    config::SynthConfig,
    dsp::{
        curves::{above_amplitude_threshold, detune_cents, interpolate_amplitude, vel_f},
        filter::real_freq,
        interpolate::{fade_in, split_ratio, PlaybackPosition},
        Envelope, Filter, Interpolation, Lfo,
    },
    engine::allocator::{Allocator, Handle},
    error::AllocError,
    patch::{PadNoteParameters, RANDOM_PANNING},
    synth::{
        controller::Controller,
        legato::{Legato, LegatoParams},
    },
    util::rng::Rng,
};

/*
Rendering one buffer
====================

    compute parameters      envelopes + LFOs + controllers → pitch, gain,
                            cutoff, Q (once per buffer)
    interpolate             read the selected table at the current pitch
    fade-in                 first buffer only, removes the start click
    filter                  left and right filters, same settings
    punch                   short gain boost after note-on
    amplitude               gain × pan, ramped if it moved since last buffer
    legato                  cross-fade / silence for legato pairs
    fade-out                when the amplitude envelope has finished

Everything the note modulates with lives in the caller's Allocator; the note
only holds handles. Nothing here allocates, blocks or logs once the note is
built.
*/

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteParams {
    pub frequency: f32,
    /// 0..1
    pub velocity: f32,
    pub portamento: bool,
    pub midi_note: u8,
    /// Start silent, as the hidden half of a legato pair.
    pub quiet: bool,
}

impl NoteParams {
    pub fn new(frequency: f32, velocity: f32, midi_note: u8) -> Self {
        Self {
            frequency,
            velocity,
            portamento: false,
            midi_note,
            quiet: false,
        }
    }
}

/// Handles to the modulation sources one note owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteSources {
    pub freq_envelope: Handle<Envelope>,
    pub freq_lfo: Handle<Lfo>,
    pub amp_envelope: Handle<Envelope>,
    pub amp_lfo: Handle<Lfo>,
    pub filter_envelope: Handle<Envelope>,
    pub filter_lfo: Handle<Lfo>,
    pub filter_l: Handle<Filter>,
    pub filter_r: Handle<Filter>,
}

impl NoteSources {
    fn alloc(
        memory: &mut Allocator,
        params: &PadNoteParameters,
        base_freq: f32,
        config: &SynthConfig,
        rng: &mut Rng,
    ) -> Result<Self, AllocError> {
        // all or nothing: after this check the allocations below cannot fail
        memory.ensure_room_for_note()?;
        let dt = config.dt();
        Ok(Self {
            freq_envelope: memory.alloc(Envelope::new(&params.freq_envelope, base_freq, dt))?,
            freq_lfo: memory.alloc(Lfo::new(&params.freq_lfo, base_freq, config, rng.fork()))?,
            amp_envelope: memory.alloc(Envelope::new(&params.amp_envelope, base_freq, dt))?,
            amp_lfo: memory.alloc(Lfo::new(&params.amp_lfo, base_freq, config, rng.fork()))?,
            filter_l: memory.alloc(Filter::generate(&params.filter, config))?,
            filter_r: memory.alloc(Filter::generate(&params.filter, config))?,
            filter_envelope: memory.alloc(Envelope::new(&params.filter_envelope, base_freq, dt))?,
            filter_lfo: memory.alloc(Lfo::new(&params.filter_lfo, base_freq, config, rng.fork()))?,
        })
    }

    fn free(self, memory: &mut Allocator) {
        memory.dealloc(self.freq_envelope);
        memory.dealloc(self.freq_lfo);
        memory.dealloc(self.amp_envelope);
        memory.dealloc(self.amp_lfo);
        memory.dealloc(self.filter_envelope);
        memory.dealloc(self.filter_lfo);
        memory.dealloc(self.filter_l);
        memory.dealloc(self.filter_r);
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Punch {
    enabled: bool,
    initial_value: f32,
    dt: f32,
    /// 1 → 0 over the punch duration.
    t: f32,
}

pub struct PadNote {
    params: Arc<PadNoteParameters>,
    config: SynthConfig,
    interpolation: Interpolation,
    rng: Rng,
    legato: Legato,
    sources: Option<NoteSources>,

    portamento: bool,
    velocity: f32,
    base_freq: f32,
    real_freq: f32,

    sample_index: usize,
    position: PlaybackPosition,
    first_time: bool,
    finished: bool,

    detune: f32,
    panning: f32,
    volume: f32,
    filter_center_pitch: f32,
    filter_q: f32,
    filter_freq_tracking: f32,
    punch: Punch,

    old_amplitude: f32,
    new_amplitude: f32,
}

/// Pitch the note is built around, before detune and modulation.
fn base_frequency(params: &PadNoteParameters, frequency: f32, midi_note: u8) -> f32 {
    if !params.fixed_freq {
        return frequency;
    }
    let et = params.fixed_freq_et;
    if et == 0 {
        return 440.0;
    }
    let tmp = (midi_note as f32 - 69.0) / 12.0 * (2.0f32.powf((et as f32 - 1.0) / 63.0) - 1.0);
    if et <= 64 {
        440.0 * 2.0f32.powf(tmp)
    } else {
        440.0 * 3.0f32.powf(tmp)
    }
}

impl PadNote {
    /// Build a note and take its modulation sources from `memory`. On
    /// exhaustion nothing is taken and the error comes back.
    pub fn new(
        params: Arc<PadNoteParameters>,
        config: SynthConfig,
        note: NoteParams,
        interpolation: Interpolation,
        memory: &mut Allocator,
        rng: &mut Rng,
    ) -> Result<Self, AllocError> {
        let legato = Legato::new(
            &config,
            LegatoParams {
                frequency: note.frequency,
                velocity: note.velocity,
                portamento: note.portamento,
                midi_note: note.midi_note,
                extern_call: false,
            },
            note.quiet,
        );
        let mut pad = Self {
            params,
            config,
            interpolation,
            rng: rng.fork(),
            legato,
            sources: None,
            portamento: note.portamento,
            velocity: note.velocity,
            base_freq: note.frequency,
            real_freq: note.frequency,
            sample_index: 0,
            position: PlaybackPosition::default(),
            first_time: true,
            finished: false,
            detune: 0.0,
            panning: 0.5,
            volume: 0.0,
            filter_center_pitch: 0.0,
            filter_q: 0.0,
            filter_freq_tracking: 0.0,
            punch: Punch::default(),
            old_amplitude: 0.0,
            new_amplitude: 0.0,
        };
        pad.setup(
            memory,
            note.frequency,
            note.velocity,
            note.portamento,
            note.midi_note,
            false,
        )?;

        tracing::trace!(
            frequency = note.frequency,
            base_freq = pad.base_freq,
            sample = pad.sample_index,
            ?interpolation,
            finished = pad.finished,
            "pad note started"
        );
        Ok(pad)
    }

    fn setup(
        &mut self,
        memory: &mut Allocator,
        frequency: f32,
        velocity: f32,
        portamento: bool,
        midi_note: u8,
        legato: bool,
    ) -> Result<(), AllocError> {
        let params = Arc::clone(&self.params);

        self.portamento = portamento;
        self.velocity = velocity;
        self.finished = false;

        self.base_freq = base_frequency(&params, frequency, midi_note);
        self.first_time = true;
        self.real_freq = self.base_freq;
        if !legato {
            self.detune = detune_cents(params.detune_type, params.coarse_detune, params.detune);
        }

        self.sample_index = params
            .bank
            .closest(self.base_freq * 2.0f32.powf(self.detune / 1200.0));
        let sample = params.bank.get(self.sample_index);
        let size = sample.map_or(0, |s| s.size()).max(1);

        if !legato {
            self.position = PlaybackPosition::start(size, params.stereo, self.rng.rand_float());
        }

        self.panning = if params.panning == RANDOM_PANNING {
            self.rng.rand_float()
        } else {
            params.panning as f32 / 128.0
        };

        self.filter_center_pitch = params.filter.center_pitch()
            + params.filter_velocity_scale as f32 / 127.0
                * 6.0
                * (vel_f(velocity, params.filter_velocity_scale_function) - 1.0);

        if !legato {
            self.punch = if params.punch_strength != 0 {
                let time = 10.0f32.powf(3.0 * params.punch_time as f32 / 127.0) / 10_000.0;
                let stretch = (440.0 / frequency).powf(params.punch_stretch as f32 / 64.0);
                Punch {
                    enabled: true,
                    t: 1.0,
                    initial_value: (10.0f32.powf(1.5 * params.punch_strength as f32 / 127.0)
                        - 1.0)
                        * vel_f(velocity, params.punch_velocity_sensing),
                    dt: 1.0 / (time * self.config.sample_rate_f() * stretch),
                }
            } else {
                Punch::default()
            };

            if let Some(old) = self.sources.take() {
                old.free(memory);
            }
            self.sources = Some(NoteSources::alloc(
                memory,
                &params,
                self.base_freq,
                &self.config,
                &mut self.rng,
            )?);
        }

        self.volume = 4.0
            * 0.1f32.powf(3.0 * (1.0 - params.volume as f32 / 96.0))
            * vel_f(velocity, params.amp_velocity_scale_function);

        let amplitude = self
            .sources
            .and_then(|s| {
                let envelope = memory.get_mut(s.amp_envelope)?;
                // the first dB value is discarded
                envelope.out_db();
                let gain = envelope.out_db();
                Some(gain * memory.get_mut(s.amp_lfo)?.amp_out())
            })
            .unwrap_or(0.0);
        self.old_amplitude = self.volume * amplitude;
        self.new_amplitude = self.old_amplitude;

        if !legato {
            self.filter_q = params.filter.q();
            self.filter_freq_tracking = params.filter.freq_tracking(self.base_freq);
        }

        if !sample.is_some_and(|s| s.has_data()) {
            self.finished = true;
        }
        Ok(())
    }

    /// Retune without re-triggering envelopes. Control path.
    pub fn legato_note(&mut self, memory: &mut Allocator, params: LegatoParams) {
        tracing::trace!(
            frequency = params.frequency,
            velocity = params.velocity,
            midi_note = params.midi_note,
            "legato note"
        );
        self.legato_transition(memory, params);
    }

    pub(crate) fn legato_transition(&mut self, memory: &mut Allocator, params: LegatoParams) {
        if self.legato.update(params) {
            return;
        }
        // legato setups reuse the existing sources and cannot exhaust the slabs
        if self
            .setup(
                memory,
                params.frequency,
                params.velocity,
                params.portamento,
                params.midi_note,
                true,
            )
            .is_err()
        {
            self.finished = true;
        }
    }

    fn compute_current_parameters(
        &mut self,
        memory: &mut Allocator,
        ctl: &Controller,
    ) -> Option<()> {
        let s = self.sources?;

        let freq_env = memory.get_mut(s.freq_envelope)?.out();
        let freq_lfo = memory.get_mut(s.freq_lfo)?.out();
        let global_pitch = 0.01 * (freq_env + freq_lfo * ctl.mod_wheel.relmod + self.detune);

        self.old_amplitude = self.new_amplitude;
        let amp_env = memory.get_mut(s.amp_envelope)?.out_db();
        let amp_lfo = memory.get_mut(s.amp_lfo)?.amp_out();
        self.new_amplitude = self.volume * amp_env * amp_lfo;

        let filter_env = memory.get_mut(s.filter_envelope)?.out();
        let filter_lfo = memory.get_mut(s.filter_lfo)?.out();
        let filter_pitch = filter_env + filter_lfo + self.filter_center_pitch;

        let cutoff =
            real_freq(filter_pitch + ctl.filter_cutoff.relfreq + self.filter_freq_tracking);
        let q = self.filter_q * ctl.filter_q.relq;
        memory.get_mut(s.filter_l)?.set_freq_and_q(cutoff, q);
        memory.get_mut(s.filter_r)?.set_freq_and_q(cutoff, q);

        let mut portamento_freqrap = 1.0;
        if self.portamento {
            portamento_freqrap = ctl.portamento.freqrap;
            if !ctl.portamento.used {
                self.portamento = false;
            }
        }

        self.real_freq = self.base_freq
            * portamento_freqrap
            * 2.0f32.powf(global_pitch / 12.0)
            * ctl.pitch_wheel.relfreq;
        Some(())
    }

    /// Render one buffer (`buffer_size` samples) into `out_l`/`out_r`.
    ///
    /// Returns `false` when only silence was written: the note had already
    /// finished, or lost its sources.
    pub fn note_out(
        &mut self,
        memory: &mut Allocator,
        ctl: &Controller,
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) -> bool {
        let len = self.config.buffer_size().min(out_l.len()).min(out_r.len());
        let out_l = &mut out_l[..len];
        let out_r = &mut out_r[..len];

        if self.finished {
            out_l.fill(0.0);
            out_r.fill(0.0);
            return false;
        }

        if self.compute_current_parameters(memory, ctl).is_none() {
            self.finished = true;
            out_l.fill(0.0);
            out_r.fill(0.0);
            return false;
        }

        let Some(sample) = self.params.bank.get(self.sample_index) else {
            self.finished = true;
            out_l.fill(0.0);
            out_r.fill(0.0);
            return false;
        };
        let ratio = self.real_freq / sample.base_freq();
        let (freq_hi, freq_lo) = split_ratio(ratio);
        if !self
            .interpolation
            .render(sample, &mut self.position, freq_hi, freq_lo, out_l, out_r)
        {
            self.finished = true;
            out_l.fill(0.0);
            out_r.fill(0.0);
            return false;
        }

        if self.first_time {
            fade_in(out_l);
            fade_in(out_r);
            self.first_time = false;
        }

        if let Some(s) = self.sources {
            if let Some(filter) = memory.get_mut(s.filter_l) {
                filter.filter_out(out_l);
            }
            if let Some(filter) = memory.get_mut(s.filter_r) {
                filter.filter_out(out_r);
            }
        }

        if self.punch.enabled {
            for (l, r) in out_l.iter_mut().zip(out_r.iter_mut()) {
                let amp = self.punch.initial_value * self.punch.t + 1.0;
                *l *= amp;
                *r *= amp;
                self.punch.t -= self.punch.dt;
                if self.punch.t < 0.0 {
                    self.punch.enabled = false;
                    break;
                }
            }
        }

        let (old, new) = (self.old_amplitude, self.new_amplitude);
        if above_amplitude_threshold(old, new) {
            for (i, (l, r)) in out_l.iter_mut().zip(out_r.iter_mut()).enumerate() {
                let gain = interpolate_amplitude(old, new, i, len);
                *l *= gain * self.panning;
                *r *= gain * (1.0 - self.panning);
            }
        } else {
            for (l, r) in out_l.iter_mut().zip(out_r.iter_mut()) {
                *l *= new * self.panning;
                *r *= new * (1.0 - self.panning);
            }
        }

        if let Some(retune) = self.legato.apply(out_l, out_r) {
            self.legato_transition(memory, retune);
        }

        let amp_finished = self
            .sources
            .and_then(|s| memory.get(s.amp_envelope))
            .map_or(true, |env| env.finished());
        if amp_finished {
            let len_f = len as f32;
            for (i, (l, r)) in out_l.iter_mut().zip(out_r.iter_mut()).enumerate() {
                let gain = 1.0 - i as f32 / len_f;
                *l *= gain;
                *r *= gain;
            }
            self.finished = true;
        }

        true
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Key up: forward release to the pitch, filter and amplitude envelopes.
    pub fn release_key(&mut self, memory: &mut Allocator) {
        tracing::trace!(base_freq = self.base_freq, "release key");
        self.release_envelopes(memory);
    }

    pub(crate) fn release_envelopes(&mut self, memory: &mut Allocator) {
        let Some(s) = self.sources else {
            return;
        };
        for handle in [s.freq_envelope, s.filter_envelope, s.amp_envelope] {
            if let Some(envelope) = memory.get_mut(handle) {
                envelope.release_key();
            }
        }
    }

    /// Hand the note's modulation sources back to `memory`.
    pub fn dispose(mut self, memory: &mut Allocator) {
        if let Some(sources) = self.sources.take() {
            sources.free(memory);
        }
    }

    pub fn sources(&self) -> Option<NoteSources> {
        self.sources
    }

    pub fn sample_index(&self) -> usize {
        self.sample_index
    }

    pub fn position(&self) -> PlaybackPosition {
        self.position
    }

    pub fn punch_enabled(&self) -> bool {
        self.punch.enabled
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }
}
