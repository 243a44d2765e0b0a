//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::util::strip_markup;

/// Title given to freshly created notes.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

/// Opaque note identifier assigned by whichever backend created the note.
///
/// The local backend mints UUID v7 strings (time-sortable); the remote
/// backend may use any non-empty document key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wrap an identifier handed out by a backend.
    #[must_use]
    pub fn from_backend(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when parsing an empty note identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyNoteId;

impl fmt::Display for EmptyNoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("note id cannot be empty")
    }
}

impl std::error::Error for EmptyNoteId {}

impl FromStr for NoteId {
    type Err = EmptyNoteId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Err(EmptyNoteId)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

/// Immutable capture of a note's content at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub content: String,
    /// Capture time (Unix ms)
    pub timestamp: i64,
}

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Backend-assigned identifier
    pub id: NoteId,
    pub title: String,
    /// Rich-text markup; empty while the note is encrypted
    pub content: String,
    /// Markup-stripped cache of `content`
    #[serde(default)]
    pub plain_text: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub encrypted: bool,
    /// Obfuscated blob, present only while `encrypted` is set
    #[serde(default)]
    pub encrypted_content: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Snapshots, most recent last
    #[serde(default)]
    pub versions: Vec<Version>,
    #[serde(default)]
    pub shared_with: Vec<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Note {
    /// Create an empty untitled note with the given id.
    #[must_use]
    pub fn untitled(id: NoteId, now: i64) -> Self {
        Self {
            id,
            title: DEFAULT_NOTE_TITLE.to_string(),
            content: String::new(),
            plain_text: String::new(),
            pinned: false,
            encrypted: false,
            encrypted_content: None,
            tags: Vec::new(),
            versions: Vec::new(),
            shared_with: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Plain text of the note, falling back to stripping the markup when the
    /// cache is missing (older persisted notes).
    #[must_use]
    pub fn text(&self) -> String {
        if self.plain_text.is_empty() && !self.content.is_empty() {
            strip_markup(&self.content)
        } else {
            self.plain_text.clone()
        }
    }

    /// Get the first line of plain text, truncated to `max_len` characters
    #[must_use]
    pub fn preview(&self, max_len: usize) -> String {
        self.text()
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }

    /// Check if note content is empty (whitespace-only counts as empty)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// `encrypted` holds exactly when a blob is present and content is empty.
    #[must_use]
    pub fn has_consistent_encryption(&self) -> bool {
        self.encrypted == (self.encrypted_content.is_some() && self.content.is_empty())
            && (self.encrypted || self.encrypted_content.is_none())
    }

    /// Case-insensitive match against title and plain text.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query) || self.text().to_lowercase().contains(&query)
    }
}

/// Partial update of a note.
///
/// `None` leaves a field untouched. `encrypted_content` is a double option so
/// a patch can clear the blob (`Some(None)`). `skip_version` is never
/// persisted; it only tells the version history not to schedule a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub pinned: Option<bool>,
    pub encrypted: Option<bool>,
    pub encrypted_content: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub versions: Option<Vec<Version>>,
    pub shared_with: Option<Vec<String>>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub skip_version: bool,
}

impl NotePatch {
    /// Patch carrying every persisted field of `note`.
    #[must_use]
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: Some(note.title.clone()),
            content: Some(note.content.clone()),
            pinned: Some(note.pinned),
            encrypted: Some(note.encrypted),
            encrypted_content: Some(note.encrypted_content.clone()),
            tags: Some(note.tags.clone()),
            versions: Some(note.versions.clone()),
            shared_with: Some(note.shared_with.clone()),
            created_at: Some(note.created_at),
            updated_at: Some(note.updated_at),
            skip_version: false,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    #[must_use]
    pub const fn skipping_version(mut self) -> Self {
        self.skip_version = true;
        self
    }

    /// Whether the patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self
            == Self {
                skip_version: self.skip_version,
                ..Self::default()
            }
    }

    /// Merge the patch into `note`, keeping `plain_text` in sync with
    /// `content`.
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title.clone_from(title);
        }
        if let Some(content) = &self.content {
            note.content.clone_from(content);
            note.plain_text = strip_markup(content);
        }
        if let Some(pinned) = self.pinned {
            note.pinned = pinned;
        }
        if let Some(encrypted) = self.encrypted {
            note.encrypted = encrypted;
        }
        if let Some(encrypted_content) = &self.encrypted_content {
            note.encrypted_content.clone_from(encrypted_content);
        }
        if let Some(tags) = &self.tags {
            note.tags.clone_from(tags);
        }
        if let Some(versions) = &self.versions {
            note.versions.clone_from(versions);
        }
        if let Some(shared_with) = &self.shared_with {
            note.shared_with.clone_from(shared_with);
        }
        if let Some(created_at) = self.created_at {
            note.created_at = created_at;
        }
        if let Some(updated_at) = self.updated_at {
            note.updated_at = updated_at;
        }
    }

    /// Build a note from a full patch, defaulting missing fields.
    #[must_use]
    pub fn into_note(self, id: NoteId, now: i64) -> Note {
        let mut note = Note::untitled(id, now);
        self.apply_to(&mut note);
        note
    }
}
