//! Real-world scenario benchmarks.
//!
//! These benchmarks model what a voice manager does every buffer: render
//! complete pad notes from a multi-table bank.

mod notes;

pub use notes::bench_notes;
