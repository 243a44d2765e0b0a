//! Local note store
//!
//! Durable persistence of the whole note collection on this device. The
//! collection is serialized as a single JSON blob under one key, so reads and
//! writes are all-or-nothing.

use rusqlite::{params, OptionalExtension};

use crate::error::{Error, Result};
use crate::models::Note;

use super::Database;

/// Key under which the note collection blob is stored
pub const NOTES_KEY: &str = "notes";
/// Key holding the last blob that failed to decode
pub const CORRUPT_NOTES_KEY: &str = "notes.corrupt";

/// Synchronous storage of the full note collection.
///
/// Callers never observe storage failures: implementations log them and
/// degrade to an empty collection on load.
pub trait LocalStore {
    /// Load the stored collection, or an empty one when nothing is stored
    fn load(&self) -> Vec<Note>;

    /// Replace the stored collection
    fn save(&self, notes: &[Note]);
}

/// `SQLite` key-value implementation of `LocalStore`
pub struct SqliteNoteStore {
    db: Database,
}

impl SqliteNoteStore {
    /// Create a new store over an opened database
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a store backed by an in-memory database (useful for testing)
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Load the collection, surfacing storage and decoding errors
    pub fn try_load(&self) -> Result<Vec<Note>> {
        let raw: Option<String> = self
            .db
            .connection()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?",
                params![NOTES_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Save the collection, surfacing storage and encoding errors
    pub fn try_save(&self, notes: &[Note]) -> Result<()> {
        let raw = serde_json::to_string(notes)?;
        let now = chrono::Utc::now().timestamp_millis();
        self.db.connection().execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![NOTES_KEY, raw, now],
        )?;
        Ok(())
    }

    /// Copy the stored blob aside so a later save cannot destroy it
    pub fn preserve_corrupt(&self) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        self.db.connection().execute(
            "INSERT INTO kv_store (key, value, updated_at)
             SELECT ?1, value, ?2 FROM kv_store WHERE key = ?3
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![CORRUPT_NOTES_KEY, now, NOTES_KEY],
        )?;
        Ok(())
    }
}

impl LocalStore for SqliteNoteStore {
    fn load(&self) -> Vec<Note> {
        match self.try_load() {
            Ok(notes) => notes,
            Err(Error::Serialization(error)) => {
                tracing::error!(
                    "Stored notes are unreadable, keeping them under {CORRUPT_NOTES_KEY}: {error}"
                );
                if let Err(error) = self.preserve_corrupt() {
                    tracing::error!("Failed to preserve unreadable notes: {error}");
                }
                Vec::new()
            }
            Err(error) => {
                tracing::error!("Failed to load local notes, starting empty: {error}");
                Vec::new()
            }
        }
    }

    fn save(&self, notes: &[Note]) {
        if let Err(error) = self.try_save(notes) {
            tracing::error!("Failed to save {} notes locally: {error}", notes.len());
        } else {
            tracing::debug!("Saved {} notes to local store", notes.len());
        }
    }
}
