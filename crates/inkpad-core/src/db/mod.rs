//! Database layer for inkpad

mod connection;
mod migrations;
mod note_store;

pub use connection::Database;
pub use note_store::{LocalStore, SqliteNoteStore, CORRUPT_NOTES_KEY, NOTES_KEY};
