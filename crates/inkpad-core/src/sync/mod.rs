//! Note synchronization controller.
//!
//! [`SyncController`] owns the in-memory note collection and is the only
//! place it is mutated. Every mutation is applied optimistically, queued in a
//! FIFO outbox and then delivered to whichever backend the
//! [`BackendSelector`] has active. Pushes from the remote subscription arrive
//! on a channel and are merged on the event loop's thread.

mod outbox;
mod reconcile;


use std::rc::Rc;

use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::backend::{BackendKind, BackendSelector, NoteBackend};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::db::LocalStore;
use crate::history::{PendingSnapshot, VersionHistory};
use crate::models::{Note, NoteId, NotePatch, ShareKind, ShareLink, ShareRecord};
use crate::remote::{RemoteCollection, RemoteError, RemoteResult, SnapshotSink, SubscriptionEvent};
use crate::seal;
use crate::util::normalize_tags;
use crate::{Error, Result};

pub use outbox::{Outbound, Outbox};
pub use reconcile::{reconcile, recover};

/// Prompt shown before a note is deleted.
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this note?";
/// Prompt shown before a version is restored.
pub const RESTORE_PROMPT: &str = "Restore this version?";

/// User confirmation for destructive actions.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt with the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

pub struct SyncController {
    config: EngineConfig,
    selector: BackendSelector,
    clock: Rc<dyn Clock>,
    notes: Vec<Note>,
    current: Option<NoteId>,
    history: VersionHistory,
    outbox: Outbox,
    events_tx: SnapshotSink,
    events_rx: UnboundedReceiver<SubscriptionEvent>,
    started: bool,
}

impl SyncController {
    pub fn new(selector: BackendSelector, clock: Rc<dyn Clock>, config: EngineConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            history: VersionHistory::from_config(&config),
            config,
            selector,
            clock,
            notes: Vec::new(),
            current: None,
            outbox: Outbox::default(),
            events_tx,
            events_rx,
            started: false,
        }
    }

    /// Pick the backend from the outcome of constructing the remote store.
    pub fn probe(
        local_store: Rc<dyn LocalStore>,
        remote: RemoteResult<Rc<dyn RemoteCollection>>,
        clock: Rc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self::new(BackendSelector::probe(local_store, remote), clock, config)
    }

    /// Load the initial collection: subscribe when remote is active,
    /// otherwise read the local store.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        if self.selector.is_remote_active() {
            match self.selector.subscribe(self.events_tx.clone()) {
                Ok(()) => {
                    self.pump_events();
                }
                Err(error) => {
                    tracing::warn!("Failed to subscribe to remote notes: {error}");
                    self.handle_event(SubscriptionEvent::Failed(error));
                }
            }
        } else {
            self.notes = self.selector.local_store().load();
            tracing::debug!("Loaded {} notes from local storage", self.notes.len());
        }
    }

    /// Cancel the pending snapshot and release the live subscription.
    pub fn shutdown(&mut self) {
        self.history.cancel();
        if self.selector.release_subscription() {
            tracing::debug!("Released remote subscription");
        }
        if !self.outbox.is_empty() {
            tracing::warn!("Shutting down with {} undelivered writes", self.outbox.len());
        }
        self.started = false;
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub const fn backend_kind(&self) -> BackendKind {
        self.selector.active_kind()
    }

    pub fn has_live_subscription(&self) -> bool {
        self.selector.has_live_subscription()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == *id)
    }

    pub const fn current_id(&self) -> Option<&NoteId> {
        self.current.as_ref()
    }

    pub fn current_note(&self) -> Option<&Note> {
        self.current.as_ref().and_then(|id| self.note(id))
    }

    pub const fn history(&self) -> &VersionHistory {
        &self.history
    }

    pub fn pending_writes(&self) -> usize {
        self.outbox.len()
    }

    /// Notes matching `search` by title or plain text, pinned first and then
    /// most recently updated.
    pub fn visible_notes(&self, search: &str) -> Vec<&Note> {
        let mut visible: Vec<&Note> = self
            .notes
            .iter()
            .filter(|note| note.matches(search))
            .collect();
        visible.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        visible
    }

    /// Make `id` the open note. A snapshot pending for another note is
    /// dropped.
    pub fn open_note(&mut self, id: &NoteId) -> Result<&Note> {
        let index = self.index_of(id)?;
        self.history.cancel_unless(Some(id));
        self.current = Some(id.clone());
        Ok(&self.notes[index])
    }

    pub fn close_note(&mut self) {
        self.history.cancel_unless(None);
        self.current = None;
    }

    /// Deadline of the pending snapshot, for the event loop's timer.
    pub fn next_wakeup(&self) -> Option<i64> {
        self.history.deadline()
    }

    /// Create an untitled note and open it.
    pub async fn create_note(&mut self) -> Result<NoteId> {
        let now = self.clock.now_millis();
        let draft = Note::untitled(NoteId::generate(), now);

        let created = self.selector.active().create(&draft, &self.notes).await;
        let id = match created {
            Ok(id) => id,
            Err(error) => {
                tracing::warn!("Failed to create note remotely: {error}");
                self.selector.demote(&error);
                self.selector.local().create(&draft, &self.notes).await?
            }
        };

        let note = Note {
            id: id.clone(),
            ..draft
        };
        self.notes.retain(|existing| existing.id != id);
        self.notes.insert(0, note);
        self.history.cancel_unless(Some(&id));
        self.current = Some(id.clone());
        tracing::debug!("Created note {id} on {} backend", self.backend_kind());
        Ok(id)
    }

    /// Apply `patch` in memory and queue the write without delivering it.
    pub fn stage_update(&mut self, id: &NoteId, patch: NotePatch) -> Result<()> {
        let now = self.clock.now_millis();
        let index = self.index_of(id)?;
        let before = &self.notes[index];

        let mut next = before.clone();
        patch.apply_to(&mut next);
        next.updated_at = now.max(before.updated_at);
        if !next.has_consistent_encryption() {
            return Err(Error::InvalidInput(
                "update would leave the note's encryption state inconsistent".to_string(),
            ));
        }

        self.history.observe_edit(before, &patch, now);
        let payload = NotePatch::from_note(&next);
        self.notes[index] = next;
        self.outbox.push(Outbound::Write {
            id: id.clone(),
            patch: payload,
        });
        Ok(())
    }

    /// Deliver queued writes to the active backend in order.
    pub async fn flush_writes(&mut self) {
        while let Some(item) = self.outbox.pop_front() {
            let backend = self.selector.active();
            match &item {
                Outbound::Write { id, patch } => {
                    let result = backend.write(id, patch, &self.notes).await;
                    match result {
                        Ok(()) => {}
                        Err(error) if error.is_permanent_auth() => {
                            self.fail_over(&error);
                        }
                        Err(error) => {
                            tracing::warn!("Write to note {id} failed, keeping local state: {error}");
                        }
                    }
                }
                Outbound::Delete { id } => {
                    let result = backend.delete(id, &self.notes).await;
                    if let Err(error) = result {
                        tracing::warn!("Delete of note {id} failed: {error}");
                        self.fail_over(&error);
                    }
                }
            }
            tracing::trace!("Delivered outbound change for note {}", item.note_id());
        }
    }

    /// Merge `patch` into the note, bump `updated_at` and persist.
    pub async fn update_note(&mut self, id: &NoteId, patch: NotePatch) -> Result<()> {
        self.stage_update(id, patch)?;
        self.flush_writes().await;
        Ok(())
    }

    /// Flip the pinned flag; only `pinned` and `updated_at` are sent.
    pub async fn toggle_pin(&mut self, id: &NoteId) -> Result<bool> {
        let now = self.clock.now_millis();
        let index = self.index_of(id)?;
        let note = &mut self.notes[index];
        note.pinned = !note.pinned;
        note.updated_at = now.max(note.updated_at);

        let pinned = note.pinned;
        let patch = NotePatch {
            pinned: Some(pinned),
            updated_at: Some(note.updated_at),
            ..NotePatch::default()
        };
        self.outbox.push(Outbound::Write {
            id: id.clone(),
            patch,
        });
        self.flush_writes().await;
        Ok(pinned)
    }

    /// Delete a note after confirmation. Returns `false` when declined.
    pub async fn delete_note(&mut self, id: &NoteId, confirm: &dyn Confirm) -> Result<bool> {
        let index = self.index_of(id)?;
        if !confirm.confirm(DELETE_PROMPT) {
            return Ok(false);
        }

        self.notes.remove(index);
        if self.history.pending_for(id) {
            self.history.cancel();
        }
        if self.current.as_ref() == Some(id) {
            self.current = None;
        }

        self.outbox.push(Outbound::Delete { id: id.clone() });
        self.flush_writes().await;
        Ok(true)
    }

    /// Record the pending snapshot once its quiet period has elapsed.
    ///
    /// Returns `true` when a version was written.
    pub async fn fire_due_snapshot(&mut self) -> Result<bool> {
        let now = self.clock.now_millis();
        let Some(snapshot) = self.history.take_due(now) else {
            return Ok(false);
        };
        if self.current.as_ref() != Some(&snapshot.note_id) {
            tracing::debug!("Dropping snapshot for note {} that is no longer open", snapshot.note_id);
            return Ok(false);
        }
        self.write_snapshot(snapshot).await
    }

    /// Record the open note's pending snapshot without waiting for the quiet
    /// period. Used before a short-lived client exits.
    pub async fn flush_snapshot(&mut self) -> Result<bool> {
        let Some(id) = self.current.clone() else {
            return Ok(false);
        };
        match self.history.flush_for(&id) {
            Some(snapshot) => self.write_snapshot(snapshot).await,
            None => Ok(false),
        }
    }

    /// Replace the note's content with version `index` after confirmation.
    /// The version list itself is left untouched.
    pub async fn restore_version(
        &mut self,
        id: &NoteId,
        index: usize,
        confirm: &dyn Confirm,
    ) -> Result<bool> {
        let note = self.find(id)?;
        let content = note
            .versions
            .get(index)
            .map(|version| version.content.clone())
            .ok_or_else(|| Error::InvalidInput(format!("note {id} has no version {index}")))?;
        if !confirm.confirm(RESTORE_PROMPT) {
            return Ok(false);
        }

        let patch = NotePatch::default().with_content(content).skipping_version();
        self.update_note(id, patch).await?;
        Ok(true)
    }

    pub async fn encrypt_note(&mut self, id: &NoteId, password: &str) -> Result<()> {
        let patch = seal::encrypt_patch(self.find(id)?, password)?;
        if let Some(snapshot) = self.history.flush_for(id) {
            self.write_snapshot(snapshot).await?;
        }
        self.update_note(id, patch).await?;
        tracing::debug!("Encrypted note {id}");
        Ok(())
    }

    pub async fn decrypt_note(&mut self, id: &NoteId, password: &str) -> Result<()> {
        let patch = seal::decrypt_patch(self.find(id)?, password)?;
        self.update_note(id, patch).await?;
        tracing::debug!("Decrypted note {id}");
        Ok(())
    }

    /// Replace the note's tags, returning the normalized list.
    pub async fn apply_tags(&mut self, id: &NoteId, tags: Vec<String>) -> Result<Vec<String>> {
        let tags = normalize_tags(tags);
        self.update_note(id, NotePatch::default().with_tags(tags.clone()))
            .await?;
        Ok(tags)
    }

    /// Share a note. A failed publish degrades to a direct link.
    pub async fn share_note(&mut self, id: &NoteId) -> Result<ShareLink> {
        let record = ShareRecord::for_note(self.find(id)?, self.clock.now_millis());
        let kind = match self.selector.active().share(&record).await {
            Ok(kind) => kind,
            Err(error) => {
                tracing::warn!("Failed to publish share for note {id}: {error}");
                ShareKind::Direct
            }
        };
        Ok(ShareLink::new(&self.config.share_origin, id, kind))
    }

    /// Wait for the next subscription event.
    pub async fn recv_event(&mut self) -> Option<SubscriptionEvent> {
        self.events_rx.recv().await
    }

    /// Handle every subscription event already queued.
    pub fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn handle_event(&mut self, event: SubscriptionEvent) {
        match event {
            SubscriptionEvent::Snapshot(incoming) => {
                if !self.selector.is_remote_active() {
                    tracing::debug!("Ignoring remote snapshot after failover");
                    return;
                }
                tracing::debug!("Received remote snapshot with {} notes", incoming.len());
                let pending_deletes = self.outbox.pending_deletes();
                self.notes = reconcile(
                    &self.notes,
                    incoming,
                    self.current.as_ref(),
                    &pending_deletes,
                );
            }
            SubscriptionEvent::Failed(error) => {
                tracing::error!("Remote subscription failed: {error}");
                if self.selector.demote(&error) {
                    self.reload_local();
                }
            }
        }
    }

    async fn write_snapshot(&mut self, snapshot: PendingSnapshot) -> Result<bool> {
        let id = snapshot.note_id.clone();
        let now = self.clock.now_millis();
        let Some(note) = self.note(&id) else {
            return Ok(false);
        };
        let Some(patch) = self.history.snapshot_patch(note, snapshot, now) else {
            return Ok(false);
        };
        self.update_note(&id, patch).await?;
        tracing::debug!("Recorded version for note {id}");
        Ok(true)
    }

    /// Demote to local storage and persist the optimistic state there.
    fn fail_over(&mut self, error: &RemoteError) {
        self.selector.demote(error);
        self.selector.local_store().save(&self.notes);
    }

    /// Replace the collection with the local copy after losing the remote.
    fn reload_local(&mut self) {
        let stored = self.selector.local_store().load();
        if !stored.is_empty() {
            self.notes = recover(
                &self.notes,
                stored,
                self.current.as_ref(),
                &self.outbox.pending_deletes(),
            );
        }
        self.selector.local_store().save(&self.notes);
        tracing::info!("Reloaded {} notes from local storage", self.notes.len());
    }

    fn index_of(&self, id: &NoteId) -> Result<usize> {
        self.notes
            .iter()
            .position(|note| note.id == *id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn find(&self, id: &NoteId) -> Result<&Note> {
        self.note(id).ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
