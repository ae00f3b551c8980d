//! padplay - audio setup and the note engine driven by the audio callback

use std::sync::Arc;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use padsynth_dsp::{
    dsp::Interpolation,
    engine::Allocator,
    patch::{EnvelopeParams, PadNoteParameters, RANDOM_PANNING},
    synth::{Controller, LegatoParams, NoteParams, PadNote},
    util::rng::Rng,
    SynthConfig,
};
use rtrb::{Consumer, Producer, PushError, RingBuffer};

use super::{bank::harmonic_bank, ui::UiApp};

/// Notes that can sound at once, legato partners included.
const MAX_NOTES: usize = 16;
const BUFFER_SIZE: usize = 256;
const CONTROL_QUEUE_LEN: usize = 64;
/// Analyzer window, also the unit the scope ring is sized in.
pub const VIS_BLOCK_LEN: usize = 1024;
const AUDIO_RING_BLOCKS: usize = 16;

/// Commands sent from the UI thread to the audio thread
#[derive(Clone, Copy, Debug)]
pub enum Control {
    NoteOn { midi_note: u8, velocity: f32 },
    ReleaseAll,
    SetLegato(bool),
    SetInterpolation(Interpolation),
    ModWheel(u8),
}

pub fn midi_to_freq(midi_note: u8) -> f32 {
    440.0 * 2.0f32.powf((midi_note as f32 - 69.0) / 12.0)
}

/// Main application: opens the output device, then hands the terminal to
/// the UI until it quits.
pub struct PadPlay {
    seed: u64,
}

impl PadPlay {
    pub fn new() -> Self {
        Self {
            seed: Rng::generate_seed().unwrap_or(0x5eed),
        }
    }

    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        let synth_config =
            SynthConfig::new(sample_rate, BUFFER_SIZE).wrap_err("unusable output config")?;
        tracing::info!(sample_rate, channels, "opened output device");

        let params = Arc::new(demo_patch(sample_rate, self.seed));

        // --- Cross-thread rings ---
        let (control_tx, control_rx) = RingBuffer::<Control>::new(CONTROL_QUEUE_LEN);
        let (scope_tx, scope_rx) = RingBuffer::<f32>::new(VIS_BLOCK_LEN * AUDIO_RING_BLOCKS);

        let mut engine = NoteEngine::new(params, synth_config, self.seed, control_rx, scope_tx);
        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| engine.fill(data, channels),
                move |err| tracing::error!(%err, "stream error"),
                None,
            )
            .wrap_err("failed to build output stream")?;
        stream.play().wrap_err("failed to start output stream")?;

        let mut terminal = ratatui::init();
        let res = UiApp::new(scope_rx, control_tx, sample_rate as f32).run(&mut terminal);
        ratatui::restore();
        drop(stream);
        res
    }
}

impl Default for PadPlay {
    fn default() -> Self {
        Self::new()
    }
}

/// A slow, breathing pad.
fn demo_patch(sample_rate: u32, seed: u64) -> PadNoteParameters {
    let mut params = PadNoteParameters::with_bank(harmonic_bank(sample_rate, seed));
    params.panning = RANDOM_PANNING;
    params.amp_envelope = EnvelopeParams::adsr_db(60, 70, 110, 80);
    params.freq_lfo = params.freq_lfo.with_intensity(12);
    params.filter_lfo = params.filter_lfo.with_intensity(30);
    params.punch_strength = 20;
    params
}

struct Playing {
    note: PadNote,
    /// Half of the current legato pair.
    legato: bool,
}

/// Everything the audio callback owns. Notes render `BUFFER_SIZE` frames at
/// a time; `fill` hands those out to whatever the device asks for.
struct NoteEngine {
    params: Arc<PadNoteParameters>,
    config: SynthConfig,
    memory: Allocator,
    ctl: Controller,
    rng: Rng,
    notes: Vec<Playing>,
    legato: bool,
    interpolation: Interpolation,
    controls: Consumer<Control>,
    scope: Producer<f32>,
    mix_l: Vec<f32>,
    mix_r: Vec<f32>,
    note_l: Vec<f32>,
    note_r: Vec<f32>,
    cursor: usize,
}

impl NoteEngine {
    fn new(
        params: Arc<PadNoteParameters>,
        config: SynthConfig,
        seed: u64,
        controls: Consumer<Control>,
        scope: Producer<f32>,
    ) -> Self {
        let size = config.buffer_size();
        Self {
            params,
            config,
            memory: Allocator::with_notes(MAX_NOTES),
            ctl: Controller::new(config),
            rng: Rng::new_with_seed(seed),
            notes: Vec::with_capacity(MAX_NOTES),
            legato: false,
            interpolation: Interpolation::default(),
            controls,
            scope,
            mix_l: vec![0.0; size],
            mix_r: vec![0.0; size],
            note_l: vec![0.0; size],
            note_r: vec![0.0; size],
            cursor: size,
        }
    }

    fn fill(&mut self, data: &mut [f32], channels: usize) {
        for frame in data.chunks_mut(channels.max(1)) {
            if self.cursor >= self.mix_l.len() {
                self.render_block();
                self.cursor = 0;
            }
            let (l, r) = (self.mix_l[self.cursor], self.mix_r[self.cursor]);
            match frame {
                [mono] => *mono = 0.5 * (l + r),
                [left, right, rest @ ..] => {
                    *left = l;
                    *right = r;
                    rest.fill(0.0);
                }
                [] => {}
            }
            self.cursor += 1;
        }
    }

    fn render_block(&mut self) {
        self.apply_controls();

        self.mix_l.fill(0.0);
        self.mix_r.fill(0.0);
        let mut i = 0;
        while i < self.notes.len() {
            let note = &mut self.notes[i].note;
            if note.note_out(&mut self.memory, &self.ctl, &mut self.note_l, &mut self.note_r) {
                for (out, s) in self.mix_l.iter_mut().zip(&self.note_l) {
                    *out += s;
                }
                for (out, s) in self.mix_r.iter_mut().zip(&self.note_r) {
                    *out += s;
                }
            }
            if note.finished() {
                let done = self.notes.swap_remove(i);
                done.note.dispose(&mut self.memory);
            } else {
                i += 1;
            }
        }

        // Push mono block to UI ring, non-blocking (drop on overflow)
        for (&l, &r) in self.mix_l.iter().zip(&self.mix_r) {
            if let Err(PushError::Full(_)) = self.scope.push(0.5 * (l + r)) {
                break;
            }
        }
    }

    fn apply_controls(&mut self) {
        while let Ok(control) = self.controls.pop() {
            match control {
                Control::NoteOn {
                    midi_note,
                    velocity,
                } => self.note_on(midi_note, velocity),
                Control::ReleaseAll => self.release_all(),
                Control::SetLegato(legato) => {
                    self.release_all();
                    self.legato = legato;
                }
                Control::SetInterpolation(interpolation) => {
                    self.interpolation = interpolation;
                    for playing in &mut self.notes {
                        playing.note.set_interpolation(interpolation);
                    }
                }
                Control::ModWheel(value) => self.ctl.set_mod_wheel(value),
            }
        }
    }

    fn note_on(&mut self, midi_note: u8, velocity: f32) {
        let frequency = midi_to_freq(midi_note);

        if self.legato && self.notes.iter().any(|p| p.legato) {
            let params = LegatoParams {
                frequency,
                velocity,
                portamento: false,
                midi_note,
                extern_call: true,
            };
            for playing in self.notes.iter_mut().filter(|p| p.legato) {
                playing.note.legato_note(&mut self.memory, params);
            }
            return;
        }

        // legato mode plays an audible note plus a quiet partner to cross-fade into
        let quiet_flags: &[bool] = if self.legato { &[false, true] } else { &[false] };
        for &quiet in quiet_flags {
            let note = NoteParams {
                quiet,
                ..NoteParams::new(frequency, velocity, midi_note)
            };
            match PadNote::new(
                Arc::clone(&self.params),
                self.config,
                note,
                self.interpolation,
                &mut self.memory,
                &mut self.rng,
            ) {
                Ok(note) => self.notes.push(Playing {
                    note,
                    legato: self.legato,
                }),
                // the allocator has already reported which slab ran out
                Err(_) => return,
            }
        }
    }

    fn release_all(&mut self) {
        for playing in &mut self.notes {
            playing.note.release_key(&mut self.memory);
            playing.legato = false;
        }
    }
}
