//! Reversible content sealing for the encryption toggle.
//!
//! The sealed form is standard base64 over a JSON object holding the text and
//! the password. It hides content from casual view; it is not cryptography.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Note, NotePatch};

/// Validation failures of the encryption toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SealError {
    #[error("note is empty")]
    EmptyNote,
    #[error("password is required")]
    MissingPassword,
    #[error("note is not encrypted")]
    NotEncrypted,
    #[error("incorrect password")]
    IncorrectPassword,
}

#[derive(Serialize, Deserialize)]
struct Sealed {
    text: String,
    key: String,
}

/// Seal `text` under `password`.
pub fn seal(text: &str, password: &str) -> String {
    let payload = Sealed {
        text: text.to_string(),
        key: password.to_string(),
    };
    // Serializing two strings cannot fail.
    let json = serde_json::to_vec(&payload).unwrap_or_default();
    STANDARD.encode(json)
}

/// Recover the text from `blob`. Any decode failure or password mismatch
/// is reported as an incorrect password.
pub fn unseal(blob: &str, password: &str) -> Result<String, SealError> {
    let bytes = STANDARD
        .decode(blob.trim())
        .map_err(|_| SealError::IncorrectPassword)?;
    let sealed: Sealed =
        serde_json::from_slice(&bytes).map_err(|_| SealError::IncorrectPassword)?;
    if sealed.key == password {
        Ok(sealed.text)
    } else {
        Err(SealError::IncorrectPassword)
    }
}

fn require_password(password: &str) -> Result<(), SealError> {
    if password.trim().is_empty() {
        Err(SealError::MissingPassword)
    } else {
        Ok(())
    }
}

/// Build the patch that encrypts `note`.
pub fn encrypt_patch(note: &Note, password: &str) -> Result<NotePatch, SealError> {
    if note.encrypted || note.content.is_empty() {
        return Err(SealError::EmptyNote);
    }
    require_password(password)?;

    Ok(NotePatch {
        content: Some(String::new()),
        encrypted: Some(true),
        encrypted_content: Some(Some(seal(&note.content, password))),
        ..NotePatch::default()
    }
    .skipping_version())
}

/// Build the patch that restores the plaintext of `note`.
pub fn decrypt_patch(note: &Note, password: &str) -> Result<NotePatch, SealError> {
    require_password(password)?;
    let blob = match (&note.encrypted, &note.encrypted_content) {
        (true, Some(blob)) => blob,
        _ => return Err(SealError::NotEncrypted),
    };
    let content = unseal(blob, password)?;

    Ok(NotePatch {
        content: Some(content),
        encrypted: Some(false),
        encrypted_content: Some(None),
        ..NotePatch::default()
    }
    .skipping_version())
}
