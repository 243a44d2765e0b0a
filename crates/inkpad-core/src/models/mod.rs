//! Data models for inkpad

mod note;
mod share;

pub use note::{EmptyNoteId, Note, NoteId, NotePatch, Version, DEFAULT_NOTE_TITLE};
pub use share::{ShareKind, ShareLink, ShareRecord};
