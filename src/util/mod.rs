/// Seedable pseudorandom source passed explicitly to notes.
pub mod rng;

pub use rng::Rng;
