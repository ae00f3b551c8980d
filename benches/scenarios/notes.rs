//! Full pad note rendering.
//!
//! Each iteration renders one buffer per note with every modulation source
//! active: frequency/amplitude/filter envelopes and LFOs, the stereo filter
//! pair and controller state.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use padsynth_dsp::{
    dsp::{
        filter::{AnalogType, FilterType},
        Interpolation,
    },
    engine::Allocator,
    patch::{FilterCategory, FilterParams, PadNoteParameters, PadSample, SampleBank},
    synth::{Controller, NoteParams, PadNote},
    util::rng::Rng,
    SynthConfig,
};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: u32 = 48_000;
const TABLE_SIZE: usize = 1 << 16;

/// One table per octave from 55 Hz, each a handful of detuned partials.
fn bank() -> SampleBank {
    let entries = (0..6)
        .map(|octave| {
            let base = 55.0 * 2.0f32.powi(octave);
            let table: Vec<f32> = (0..TABLE_SIZE)
                .map(|i| {
                    let t = i as f32 / TABLE_SIZE as f32;
                    (1..=8)
                        .map(|h| {
                            let cycles = (base * h as f32 * TABLE_SIZE as f32 / SAMPLE_RATE as f32)
                                .round();
                            (std::f32::consts::TAU * cycles * t).sin() / h as f32
                        })
                        .sum::<f32>()
                        * 0.2
                })
                .collect();
            PadSample::new(&table, base)
        })
        .collect();
    SampleBank::new(entries)
}

fn params(bank: SampleBank, category: FilterCategory) -> Arc<PadNoteParameters> {
    let mut params = PadNoteParameters::with_bank(bank);
    params.filter = FilterParams::new(category, 80, 60).with_stages(2);
    params.freq_lfo = params.freq_lfo.with_intensity(30);
    params.amp_lfo = params.amp_lfo.with_intensity(20);
    params.filter_lfo = params.filter_lfo.with_intensity(40);
    params.punch_strength = 40;
    Arc::new(params)
}

pub fn bench_notes(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/notes");
    let bank = bank();

    for &size in BLOCK_SIZES {
        let Ok(config) = SynthConfig::new(SAMPLE_RATE, size) else {
            continue;
        };
        let ctl = Controller::new(config);
        let mut out_l = vec![0.0f32; size];
        let mut out_r = vec![0.0f32; size];

        for (name, category, interpolation, count) in [
            ("analog_linear", FilterCategory::Analog(AnalogType::LowPass2), Interpolation::Linear, 1),
            ("analog_cubic", FilterCategory::Analog(AnalogType::LowPass2), Interpolation::Cubic, 1),
            ("svf_cubic", FilterCategory::StateVariable(FilterType::LowPass), Interpolation::Cubic, 1),
            ("chord_8", FilterCategory::Analog(AnalogType::LowPass2), Interpolation::Cubic, 8),
        ] {
            let params = params(bank.clone(), category);
            let mut memory = Allocator::with_notes(count);
            let mut rng = Rng::new_with_seed(7);
            let mut notes: Vec<PadNote> = (0..count)
                .filter_map(|i| {
                    let midi = 48 + (i as u8) * 4;
                    let freq = 440.0 * 2.0f32.powf((midi as f32 - 69.0) / 12.0);
                    PadNote::new(
                        params.clone(),
                        config,
                        NoteParams::new(freq, 0.8, midi),
                        interpolation,
                        &mut memory,
                        &mut rng,
                    )
                    .ok()
                })
                .collect();

            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    for note in notes.iter_mut() {
                        note.note_out(
                            &mut memory,
                            black_box(&ctl),
                            black_box(&mut out_l),
                            black_box(&mut out_r),
                        );
                    }
                })
            });

            for note in notes {
                note.dispose(&mut memory);
            }
        }
    }

    group.finish();
}
