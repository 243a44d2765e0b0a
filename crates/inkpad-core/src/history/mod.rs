//! Debounced version history.
//!
//! Content edits are grouped into bursts. The first edit of a burst captures
//! the content as it was before the burst and arms the debouncer; further
//! edits to the same note only push the deadline out. When the quiet period
//! elapses the captured content becomes a new version.

mod debounce;

use crate::config::EngineConfig;
use crate::models::{Note, NoteId, NotePatch, Version};

pub use debounce::Debouncer;

/// Content captured at the start of an edit burst, bound to its note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSnapshot {
    pub note_id: NoteId,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct VersionHistory {
    debouncer: Debouncer<PendingSnapshot>,
    max_versions: usize,
}

impl VersionHistory {
    pub const fn new(quiet_period_ms: i64, max_versions: usize) -> Self {
        Self {
            debouncer: Debouncer::new(quiet_period_ms),
            max_versions,
        }
    }

    pub const fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.snapshot_quiet_ms, config.max_versions)
    }

    /// Inspect an update before it is applied to `before`.
    ///
    /// Returns `true` when the edit started or extended a burst.
    pub fn observe_edit(&mut self, before: &Note, patch: &NotePatch, now: i64) -> bool {
        if patch.skip_version {
            return false;
        }
        let Some(content) = &patch.content else {
            return false;
        };
        if *content == before.content {
            return false;
        }

        let same_note = self
            .debouncer
            .pending()
            .is_some_and(|pending| pending.note_id == before.id);
        if same_note {
            self.debouncer.reset(now);
        } else {
            if let Some(dropped) = self.debouncer.arm(
                PendingSnapshot {
                    note_id: before.id.clone(),
                    content: before.content.clone(),
                },
                now,
            ) {
                tracing::debug!("Dropped pending snapshot for note {}", dropped.note_id);
            }
            tracing::debug!("Armed snapshot for note {}", before.id);
        }
        true
    }

    /// Cancel a pending snapshot bound to any note other than `keep`.
    pub fn cancel_unless(&mut self, keep: Option<&NoteId>) -> Option<PendingSnapshot> {
        let stale = self
            .debouncer
            .pending()
            .is_some_and(|pending| Some(&pending.note_id) != keep);
        if stale {
            let cancelled = self.debouncer.cancel();
            if let Some(pending) = &cancelled {
                tracing::debug!("Cancelled snapshot for note {}", pending.note_id);
            }
            cancelled
        } else {
            None
        }
    }

    pub fn cancel(&mut self) -> Option<PendingSnapshot> {
        self.debouncer.cancel()
    }

    /// Take the snapshot pending for `id` without waiting for its deadline.
    pub fn flush_for(&mut self, id: &NoteId) -> Option<PendingSnapshot> {
        if self.pending_for(id) {
            self.debouncer.cancel()
        } else {
            None
        }
    }

    pub fn take_due(&mut self, now: i64) -> Option<PendingSnapshot> {
        self.debouncer.take_due(now)
    }

    pub fn pending(&self) -> Option<&PendingSnapshot> {
        self.debouncer.pending()
    }

    pub fn pending_for(&self, id: &NoteId) -> bool {
        self.debouncer
            .pending()
            .is_some_and(|pending| pending.note_id == *id)
    }

    pub fn deadline(&self) -> Option<i64> {
        self.debouncer.deadline()
    }

    /// Build the write that records `snapshot` on `note`.
    ///
    /// Returns `None` for an empty capture. The patch skips versioning so the
    /// writeback never re-arms the debouncer.
    pub fn snapshot_patch(
        &self,
        note: &Note,
        snapshot: PendingSnapshot,
        now: i64,
    ) -> Option<NotePatch> {
        if snapshot.content.is_empty() {
            return None;
        }

        let versions = append_version(
            &note.versions,
            Version {
                content: snapshot.content,
                timestamp: now,
            },
            self.max_versions,
        );
        Some(
            NotePatch {
                versions: Some(versions),
                ..NotePatch::default()
            }
            .skipping_version(),
        )
    }
}

impl Default for VersionHistory {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Append `version`, keeping only the most recent `max` entries.
#[must_use]
pub fn append_version(versions: &[Version], version: Version, max: usize) -> Vec<Version> {
    let keep = max.saturating_sub(1);
    let start = versions.len().saturating_sub(keep);
    let mut next = Vec::with_capacity(keep + 1);
    next.extend_from_slice(&versions[start..]);
    next.push(version);
    next
}
