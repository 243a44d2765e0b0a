//! Error types for inkpad-core

use thiserror::Error;

use crate::assist::AssistError;
use crate::remote::RemoteError;
use crate::seal::SealError;

/// Result type alias using inkpad-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in inkpad-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote collection error that was not absorbed by the failover policy
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Encryption toggle rejected the request
    #[error(transparent)]
    Seal(#[from] SealError),

    /// Text generation assist failure
    #[error(transparent)]
    Assist(#[from] AssistError),
}
