//! Spectrum analyzer widget
//!
//! Log-spaced FFT magnitudes with a marker at the last played fundamental.
//! Pad tables spread every harmonic into a band, so the peaks here should
//! look smeared rather than like a comb.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

const SPECTRUM_BINS: usize = 64;
const FLOOR_DB: f64 = -100.0;

pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    /// (frequency in Hz, FFT bin) per display point
    bins: Vec<(f64, usize)>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// (log10 frequency, magnitude in dB)
    spectrum: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    pub fn new(buffer_len: usize, sample_rate: f32) -> Self {
        let fft = FftPlanner::<f32>::new().plan_fft_forward(buffer_len);

        // Hann window
        let denom = buffer_len.saturating_sub(1).max(1) as f32;
        let window = (0..buffer_len)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let max_freq = (sample_rate as f64 / 2.0).clamp(40.0, 20_000.0);
        let min_freq = 20.0;
        let half = (buffer_len / 2).max(1);
        let bins: Vec<(f64, usize)> = (0..SPECTRUM_BINS)
            .map(|i| {
                let t = i as f64 / (SPECTRUM_BINS - 1) as f64;
                let freq = min_freq * (max_freq / min_freq).powf(t);
                let index = (freq * buffer_len as f64 / sample_rate as f64).round() as usize;
                (freq, index.min(half - 1))
            })
            .collect();
        let spectrum = bins.iter().map(|&(f, _)| (f.log10(), FLOOR_DB)).collect();

        Self {
            window,
            bins,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); buffer_len],
            spectrum,
        }
    }

    /// Analyze one window's worth of samples; other lengths are ignored.
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }
        for ((bin, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *bin = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (point, &(_, index)) in self.spectrum.iter_mut().zip(&self.bins) {
            let power = self.scratch[index].norm_sqr().max(1e-12);
            point.1 = (10.0 * (power as f64).log10()).max(FLOOR_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.spectrum
    }
}

/// Render the spectrum; the x axis is log10(Hz).
pub fn render_spectrum(
    frame: &mut Frame,
    area: Rect,
    spectrum: &[(f64, f64)],
    fundamental: Option<f32>,
) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let min_x = spectrum.first().map_or(1.0, |p| p.0);
    let max_x = spectrum.last().map_or(4.3, |p| p.0).max(min_x + 0.1);
    let max_db = spectrum.iter().map(|p| p.1).fold(FLOOR_DB, f64::max);
    let top = max_db.max(0.0) + 10.0;

    let marker: Vec<(f64, f64)> = fundamental
        .map(|f| {
            let x = (f as f64).log10();
            vec![(x, FLOOR_DB), (x, top)]
        })
        .unwrap_or_default();

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(spectrum),
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&marker),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([min_x, max_x])
                .labels(vec!["20", "200", "2k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, top])
                .labels(vec!["-100", "-60", "-20", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
