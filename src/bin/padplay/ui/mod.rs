//! TUI for padplay
//!
//! Plays notes from the keyboard and shows the output as a scope and a
//! spectrum.

mod spectrum;
mod waveform;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use padsynth_dsp::dsp::Interpolation;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use std::time::Duration;

use super::app::{midi_to_freq, Control, VIS_BLOCK_LEN};
use spectrum::{render_spectrum, SpectrumAnalyzer};
use waveform::render_waveform;

/// One octave plus the next C, laid out like a piano on the home row.
const PIANO_KEYS: [(char, u8); 13] = [
    ('a', 0),
    ('w', 1),
    ('s', 2),
    ('e', 3),
    ('d', 4),
    ('f', 5),
    ('t', 6),
    ('g', 7),
    ('y', 8),
    ('h', 9),
    ('u', 10),
    ('j', 11),
    ('k', 12),
];
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const VELOCITY: f32 = 0.8;
const MOD_WHEEL_STEP: u8 = 16;

fn note_name(midi_note: u8) -> String {
    format!(
        "{}{}",
        NOTE_NAMES[midi_note as usize % 12],
        midi_note as i32 / 12 - 1
    )
}

struct Status {
    octave: u8,
    legato: bool,
    interpolation: Interpolation,
    last_note: Option<u8>,
    mod_wheel: u8,
    /// Controls lost to a full queue.
    dropped: usize,
}

/// UI application state
pub struct UiApp {
    scope_rx: Consumer<f32>,
    controls: Producer<Control>,
    vis_buffer: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    status: Status,
    should_quit: bool,
}

impl UiApp {
    pub fn new(scope_rx: Consumer<f32>, controls: Producer<Control>, sample_rate: f32) -> Self {
        Self {
            scope_rx,
            controls,
            vis_buffer: vec![0.0; VIS_BLOCK_LEN],
            spectrum: SpectrumAnalyzer::new(VIS_BLOCK_LEN, sample_rate),
            status: Status {
                octave: 4,
                legato: false,
                interpolation: Interpolation::default(),
                last_note: None,
                mod_wheel: 64,
                dropped: 0,
            },
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    /// Drain up to one analysis block of samples
    fn poll_audio(&mut self) {
        let mut filled = 0;
        while filled < VIS_BLOCK_LEN {
            match self.scope_rx.pop() {
                Ok(sample) => {
                    self.vis_buffer[filled] = sample;
                    filled += 1;
                }
                Err(_) => break,
            }
        }
        if filled == VIS_BLOCK_LEN {
            self.spectrum.update(&self.vis_buffer);
        }
    }

    fn send(&mut self, control: Control) {
        if self.controls.push(control).is_err() {
            self.status.dropped += 1;
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => self.send(Control::ReleaseAll),
            KeyCode::Char('l') => {
                self.status.legato = !self.status.legato;
                self.send(Control::SetLegato(self.status.legato));
            }
            KeyCode::Char('i') => {
                self.status.interpolation = match self.status.interpolation {
                    Interpolation::Linear => Interpolation::Cubic,
                    Interpolation::Cubic => Interpolation::Linear,
                };
                self.send(Control::SetInterpolation(self.status.interpolation));
            }
            KeyCode::Char('z') => self.status.octave = self.status.octave.saturating_sub(1).max(1),
            KeyCode::Char('x') => self.status.octave = (self.status.octave + 1).min(7),
            KeyCode::Char('[') => {
                self.status.mod_wheel = self.status.mod_wheel.saturating_sub(MOD_WHEEL_STEP);
                self.send(Control::ModWheel(self.status.mod_wheel));
            }
            KeyCode::Char(']') => {
                self.status.mod_wheel = (self.status.mod_wheel + MOD_WHEEL_STEP).min(127);
                self.send(Control::ModWheel(self.status.mod_wheel));
            }
            KeyCode::Char(c) => {
                if let Some(&(_, semitone)) = PIANO_KEYS.iter().find(|(k, _)| *k == c) {
                    let midi_note = (self.status.octave + 1) * 12 + semitone;
                    self.status.last_note = Some(midi_note);
                    self.send(Control::NoteOn {
                        midi_note,
                        velocity: VELOCITY,
                    });
                }
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Status bar
                Constraint::Min(8),     // Waveform
                Constraint::Length(12), // Spectrum
                Constraint::Length(1),  // Help bar
            ])
            .split(frame.area());

        let s = &self.status;
        let note = s.last_note.map_or_else(|| "-".to_string(), note_name);
        let mut line = format!(
            " Note: {note}  Octave: {}  Legato: {}  Interpolation: {:?}  Mod: {}",
            s.octave,
            if s.legato { "on" } else { "off" },
            s.interpolation,
            s.mod_wheel,
        );
        if s.dropped > 0 {
            line.push_str(&format!("  Dropped: {}", s.dropped));
        }
        let status = Paragraph::new(line).block(Block::default().title(" padplay ").borders(Borders::ALL));
        frame.render_widget(status, chunks[0]);

        render_waveform(frame, chunks[1], &self.vis_buffer);
        render_spectrum(
            frame,
            chunks[2],
            self.spectrum.data(),
            s.last_note.map(midi_to_freq),
        );

        let help = Paragraph::new(
            " [A-K] Play  [Z/X] Octave  [Space] Release  [L] Legato  [I] Interpolation  [ [ ] ] Mod  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
