//! Note export renderings shared by every client.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::Note;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
    Text,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
            Self::Text => "txt",
        }
    }
}

/// Serializable note representation used in JSON and Markdown exports.
///
/// Encrypted notes are exported without content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportNote {
    pub id: String,
    pub title: String,
    pub content: String,
    pub plain_text: String,
    pub pinned: bool,
    pub encrypted: bool,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Convert a note into an export record with stable tag ordering.
#[must_use]
pub fn note_to_export_item(note: &Note) -> ExportNote {
    let mut tags = note.tags.clone();
    tags.sort();

    ExportNote {
        id: note.id.to_string(),
        title: note.title.clone(),
        content: note.content.clone(),
        plain_text: note.text(),
        pinned: note.pinned,
        encrypted: note.encrypted,
        tags,
        created_at: note.created_at,
        updated_at: note.updated_at,
    }
}

/// Render notes as pretty-printed JSON.
pub fn render_json_export(notes: &[Note]) -> serde_json::Result<String> {
    let items = notes
        .iter()
        .map(note_to_export_item)
        .collect::<Vec<ExportNote>>();
    serde_json::to_string_pretty(&items)
}

/// Render notes in Markdown with frontmatter blocks.
#[must_use]
pub fn render_markdown_export(notes: &[Note]) -> String {
    let mut output = String::new();

    for (index, note) in notes.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let item = note_to_export_item(note);
        let _ = writeln!(output, "---");
        let _ = writeln!(output, "id: {}", item.id);
        let _ = writeln!(output, "title: {}", item.title);
        let _ = writeln!(output, "created_at: {}", item.created_at);
        let _ = writeln!(output, "updated_at: {}", item.updated_at);
        let _ = writeln!(output, "pinned: {}", item.pinned);
        let _ = writeln!(output, "tags:");
        for tag in item.tags {
            let _ = writeln!(output, "  - {tag}");
        }
        let _ = writeln!(output, "---");
        let _ = writeln!(output);
        if item.encrypted {
            output.push_str("_This note is encrypted._");
        } else {
            output.push_str(&item.plain_text);
        }
        output.push('\n');
    }

    output
}

/// Title, a blank line, then the plain text.
#[must_use]
pub fn render_note_text(note: &Note) -> String {
    format!("{}\n\n{}", note.title, note.text())
}

/// Plain-text export of several notes, separated by rules.
#[must_use]
pub fn render_text_export(notes: &[Note]) -> String {
    notes
        .iter()
        .map(render_note_text)
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Render notes based on selected export format.
pub fn render_notes_export(notes: &[Note], format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(notes),
        ExportFormat::Markdown => Ok(render_markdown_export(notes)),
        ExportFormat::Text => Ok(render_text_export(notes)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("inkpad-export-{timestamp_ms}.{}", format.extension())
}

/// File name for downloading a single note as text.
#[must_use]
pub fn suggested_note_file_name(note: &Note) -> String {
    let stem: String = note
        .title
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect();
    if stem.is_empty() {
        "note.txt".to_string()
    } else {
        format!("{stem}.txt")
    }
}
