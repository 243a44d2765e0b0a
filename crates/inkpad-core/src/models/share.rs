//! Share record model

use serde::{Deserialize, Serialize};

use super::note::{Note, NoteId};

/// Record published to the remote `shared` collection once per share action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRecord {
    pub note_id: NoteId,
    pub title: String,
    pub content: String,
    /// Share timestamp (unix ms)
    pub shared_at: i64,
}

impl ShareRecord {
    #[must_use]
    pub fn for_note(note: &Note, shared_at: i64) -> Self {
        Self {
            note_id: note.id.clone(),
            title: note.title.clone(),
            content: note.content.clone(),
            shared_at,
        }
    }
}

/// How a share link was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareKind {
    /// A share record was published remotely (`?shared=<id>`)
    Published,
    /// Plain link to the note (`?note=<id>`); used locally or after a failed publish
    Direct,
}

/// Link handed back to the UI after a share action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub note_id: NoteId,
    pub url: String,
    pub kind: ShareKind,
}

impl ShareLink {
    #[must_use]
    pub fn new(origin: &str, note_id: &NoteId, kind: ShareKind) -> Self {
        let param = match kind {
            ShareKind::Published => "shared",
            ShareKind::Direct => "note",
        };
        Self {
            note_id: note_id.clone(),
            url: format!("{}?{param}={note_id}", origin.trim_end_matches('/')),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_link_uses_query_parameter_per_kind() {
        let id = NoteId::from_backend("abc");
        let published = ShareLink::new("https://inkpad.app/", &id, ShareKind::Published);
        assert_eq!(published.url, "https://inkpad.app?shared=abc");

        let direct = ShareLink::new("https://inkpad.app", &id, ShareKind::Direct);
        assert_eq!(direct.url, "https://inkpad.app?note=abc");
    }

    #[test]
    fn share_record_copies_note_fields() {
        let mut note = Note::untitled(NoteId::from_backend("abc"), 10);
        note.content = "<p>hi</p>".to_string();
        let record = ShareRecord::for_note(&note, 99);
        assert_eq!(record.note_id, note.id);
        assert_eq!(record.content, "<p>hi</p>");
        assert_eq!(record.shared_at, 99);
    }
}
