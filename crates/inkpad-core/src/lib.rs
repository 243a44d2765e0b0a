//! inkpad-core - Core library for inkpad
//!
//! This crate contains the note model, the local and remote storage
//! backends, and the sync engine that keeps them consistent. Clients drive
//! everything through [`SyncController`].

pub mod assist;
pub mod backend;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod history;
pub mod models;
pub mod remote;
pub mod seal;
pub mod sync;
pub mod util;

pub use backend::BackendKind;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use models::{Note, NoteId, NotePatch, ShareKind, ShareLink, Version};
pub use sync::{AutoConfirm, Confirm, SyncController};
