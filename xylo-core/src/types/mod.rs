pub mod event;
pub mod note;
pub mod tempo;

pub use event::{Event, NoteSet};
pub use note::{format_minutes_seconds, note_name};
pub use tempo::{quantize_bpm, tempo_ratio, TEMPO_LIST};
