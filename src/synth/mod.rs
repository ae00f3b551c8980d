// Purpose: one pad note, the controller state it reads, legato cross-fades
// This layer sits above the dsp primitives; voice allocation is the caller's

pub mod controller;
#[cfg(feature = "rtrb")]
pub mod handle;
pub mod legato;
pub mod note;

pub use controller::Controller;
#[cfg(feature = "rtrb")]
pub use handle::{NoteMessage, PadNoteHandle, SharedPadNote};
pub use legato::{Legato, LegatoParams, LegatoState};
pub use note::{NoteParams, NoteSources, PadNote};
