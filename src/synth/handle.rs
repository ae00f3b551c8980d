use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::{
    engine::allocator::Allocator,
    synth::{controller::Controller, legato::LegatoParams, note::PadNote},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteMessage {
    ReleaseKey,
    Legato(LegatoParams),
}

/// Control-thread side of a [`SharedPadNote`].
pub struct PadNoteHandle {
    tx: Producer<NoteMessage>,
}

/// A note living on the audio thread that takes release and legato requests
/// through a lock-free queue.
pub struct SharedPadNote {
    note: PadNote,
    rx: Consumer<NoteMessage>,
}

const NOTE_QUEUE_SIZE: usize = 16;

impl PadNoteHandle {
    /// Returns `false` if the queue is full and the request was dropped.
    pub fn release_key(&mut self) -> bool {
        tracing::trace!("queue release key");
        self.push(NoteMessage::ReleaseKey)
    }

    pub fn legato_note(&mut self, params: LegatoParams) -> bool {
        tracing::trace!(frequency = params.frequency, "queue legato note");
        self.push(NoteMessage::Legato(params))
    }

    fn push(&mut self, msg: NoteMessage) -> bool {
        match self.tx.push(msg) {
            Ok(()) => true,
            Err(PushError::Full(msg)) => {
                tracing::warn!(?msg, "note queue full, dropping message");
                false
            }
        }
    }
}

impl SharedPadNote {
    pub fn new(note: PadNote) -> (Self, PadNoteHandle) {
        let (tx, rx) = RingBuffer::<NoteMessage>::new(NOTE_QUEUE_SIZE);
        (Self { note, rx }, PadNoteHandle { tx })
    }

    /// Apply queued requests, then render one buffer.
    pub fn note_out(
        &mut self,
        memory: &mut Allocator,
        ctl: &Controller,
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) -> bool {
        while let Ok(msg) = self.rx.pop() {
            match msg {
                NoteMessage::ReleaseKey => self.note.release_envelopes(memory),
                NoteMessage::Legato(params) => self.note.legato_transition(memory, params),
            }
        }

        self.note.note_out(memory, ctl, out_l, out_r)
    }

    pub fn finished(&self) -> bool {
        self.note.finished()
    }

    pub fn note(&self) -> &PadNote {
        &self.note
    }

    pub fn dispose(self, memory: &mut Allocator) {
        self.note.dispose(memory);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::SynthConfig,
        dsp::Interpolation,
        patch::{PadNoteParameters, PadSample, SampleBank},
        synth::note::NoteParams,
        util::rng::Rng,
    };

    #[test]
    fn queued_release_reaches_the_envelopes() {
        let table: Vec<f32> = (0..256).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut params =
            PadNoteParameters::with_bank(SampleBank::new(vec![PadSample::new(&table, 440.0)]));
        params.amp_envelope = params.amp_envelope.clone().with_stretch(0);
        let mut memory = Allocator::with_notes(1);
        let mut rng = Rng::new_with_seed(3);
        let note = PadNote::new(
            Arc::new(params),
            SynthConfig::default(),
            NoteParams::new(440.0, 1.0, 69),
            Interpolation::Linear,
            &mut memory,
            &mut rng,
        )
        .unwrap();
        let (mut shared, mut handle) = SharedPadNote::new(note);
        let ctl = Controller::default();
        let mut l = vec![0.0; 256];
        let mut r = vec![0.0; 256];

        for _ in 0..10 {
            shared.note_out(&mut memory, &ctl, &mut l, &mut r);
        }
        assert!(!shared.finished(), "sustaining while the key is down");

        assert!(handle.release_key());
        let mut buffers = 0;
        while !shared.finished() && buffers < 10_000 {
            shared.note_out(&mut memory, &ctl, &mut l, &mut r);
            buffers += 1;
        }
        assert!(shared.finished());
        shared.dispose(&mut memory);
        assert_eq!(memory.available::<crate::dsp::Envelope>(), 3);
    }
}
