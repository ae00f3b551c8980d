//! The immutable sample bank a pad note reads from.
//!
//! Each [`PadSample`] is one period-free loop of audio generated for a base
//! frequency. Playback reads up to three samples past the current index, so
//! every table is stored with a guard region that repeats its start: reads
//! past the end land on the same values a wrapped read would, and no tap can
//! leave the buffer.

/// Samples appended after each table, mirroring its first samples.
pub const PAD_GUARD_SAMPLES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PadSample {
    /// `size + PAD_GUARD_SAMPLES` values, or `None` when the slot is empty.
    data: Option<Box<[f32]>>,
    size: usize,
    base_freq: f32,
}

impl PadSample {
    /// Copy `samples` into a guarded table. An empty slice yields an empty slot.
    pub fn new(samples: &[f32], base_freq: f32) -> Self {
        if samples.is_empty() {
            return Self::empty(base_freq);
        }
        let size = samples.len();
        let data: Box<[f32]> = (0..size + PAD_GUARD_SAMPLES)
            .map(|i| samples[i % size])
            .collect();
        Self {
            data: Some(data),
            size,
            base_freq,
        }
    }

    /// A slot with a base frequency but no audio.
    pub fn empty(base_freq: f32) -> Self {
        Self {
            data: None,
            size: 0,
            base_freq,
        }
    }

    /// The guarded table, `size() + PAD_GUARD_SAMPLES` long.
    pub fn data(&self) -> Option<&[f32]> {
        self.data.as_deref()
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Loop length, excluding the guard region.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn base_freq(&self) -> f32 {
        self.base_freq
    }
}

/// Ordered set of tables spanning the instrument's range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBank {
    entries: Vec<PadSample>,
}

impl SampleBank {
    pub fn new(entries: Vec<PadSample>) -> Self {
        tracing::debug!(
            entries = entries.len(),
            with_data = entries.iter().filter(|e| e.has_data()).count(),
            "built sample bank"
        );
        Self { entries }
    }

    pub fn entries(&self) -> &[PadSample] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PadSample> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the table whose base frequency is nearest `freq` on a log
    /// scale. Empty slots are skipped; ties keep the lower index. Falls back
    /// to 0 when no table has data.
    pub fn closest(&self, freq: f32) -> usize {
        let log_freq = freq.ln();
        let mut best: Option<(usize, f32)> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.has_data() {
                continue;
            }
            let dist = (log_freq - (entry.base_freq + 0.0001).ln()).abs();
            match best {
                Some((_, min)) if dist >= min => {}
                _ => best = Some((index, dist)),
            }
        }
        best.map_or(0, |(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(base_freq: f32) -> PadSample {
        PadSample::new(&[0.0, 1.0, 0.0, -1.0], base_freq)
    }

    #[test]
    fn guard_region_mirrors_start() {
        let sample = PadSample::new(&[1.0, 2.0, 3.0], 100.0);
        assert_eq!(sample.size(), 3);
        assert_eq!(
            sample.data().unwrap(),
            &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0]
        );
        assert!(!PadSample::new(&[], 100.0).has_data());
    }

    #[test]
    fn picks_nearest_in_log_frequency() {
        let bank = SampleBank::new(vec![table(110.0), table(220.0), table(440.0), table(880.0)]);
        assert_eq!(bank.closest(100.0), 0);
        assert_eq!(bank.closest(300.0), 1, "300 Hz is closer to 220 than to 440 in octaves");
        assert_eq!(bank.closest(320.0), 2);
        assert_eq!(bank.closest(5_000.0), 3);
    }

    #[test]
    fn ties_keep_lowest_index() {
        let bank = SampleBank::new(vec![table(440.0), table(440.0)]);
        assert_eq!(bank.closest(440.0), 0);
        let bank = SampleBank::new(vec![table(220.0), table(880.0)]);
        assert_eq!(bank.closest(440.0), 0);
    }

    #[test]
    fn skips_empty_slots() {
        let bank = SampleBank::new(vec![PadSample::empty(440.0), table(220.0)]);
        assert_eq!(bank.closest(440.0), 1);
        let bank = SampleBank::new(vec![PadSample::empty(440.0), PadSample::empty(220.0)]);
        assert_eq!(bank.closest(440.0), 0);
        assert_eq!(SampleBank::default().closest(440.0), 0);
    }
}
