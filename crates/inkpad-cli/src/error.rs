use std::io;

use inkpad_core::assist::AssistError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] inkpad_core::Error),
    #[error(transparent)]
    Assist(#[from] AssistError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("Note not found for id/prefix: {0}")]
    NoteNotFound(String),
    #[error("{0}")]
    AmbiguousNoteId(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Note is encrypted; decrypt it first")]
    EncryptedNote,
    #[error("Text generation is not configured. Set GROQ_API_KEY to enable assist commands.")]
    AssistNotConfigured,
    #[error("Remote simulation requires `inkpad shell --memory-remote`")]
    NoMemoryRemote,
}
