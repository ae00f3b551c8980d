//! Fixed-capacity storage shared by every note on the audio thread.

pub mod allocator;

pub use allocator::{Allocator, Handle, Pooled, Slab};
