//! Storage backends behind one capability interface.
//!
//! The sync controller only talks to [`NoteBackend`]; whether a write lands
//! in the remote collection or in the local store is decided by the
//! [`BackendSelector`].

mod selector;

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;

use crate::db::LocalStore;
use crate::models::{Note, NoteId, NotePatch, ShareKind, ShareRecord};
use crate::remote::{RemoteCollection, RemoteResult};

pub use selector::BackendSelector;

/// Which backend is serving writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Remote,
    Local,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Remote => "remote",
            Self::Local => "local",
        })
    }
}

/// Persistence capability shared by both backends.
///
/// Every call receives the in-memory collection as it stands after the
/// optimistic mutation; the local backend persists it wholesale while the
/// remote backend only sends the per-note change.
#[async_trait(?Send)]
pub trait NoteBackend {
    fn kind(&self) -> BackendKind;

    /// Persist a new note and return the id the backend assigned to it.
    /// `notes` is the collection before the draft is inserted.
    async fn create(&self, draft: &Note, notes: &[Note]) -> RemoteResult<NoteId>;

    async fn write(&self, id: &NoteId, patch: &NotePatch, notes: &[Note]) -> RemoteResult<()>;

    async fn delete(&self, id: &NoteId, notes: &[Note]) -> RemoteResult<()>;

    /// Record a share action; returns how the resulting link is addressed
    async fn share(&self, record: &ShareRecord) -> RemoteResult<ShareKind>;
}

/// Backend persisting the full collection to the device.
#[derive(Clone)]
pub struct LocalBackend {
    store: Rc<dyn LocalStore>,
}

impl LocalBackend {
    pub fn new(store: Rc<dyn LocalStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn LocalStore {
        self.store.as_ref()
    }
}

#[async_trait(?Send)]
impl NoteBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn create(&self, draft: &Note, notes: &[Note]) -> RemoteResult<NoteId> {
        let mut all = Vec::with_capacity(notes.len() + 1);
        all.push(draft.clone());
        all.extend(notes.iter().filter(|note| note.id != draft.id).cloned());
        self.store.save(&all);
        Ok(draft.id.clone())
    }

    async fn write(&self, _id: &NoteId, _patch: &NotePatch, notes: &[Note]) -> RemoteResult<()> {
        self.store.save(notes);
        Ok(())
    }

    async fn delete(&self, _id: &NoteId, notes: &[Note]) -> RemoteResult<()> {
        self.store.save(notes);
        Ok(())
    }

    async fn share(&self, _record: &ShareRecord) -> RemoteResult<ShareKind> {
        Ok(ShareKind::Direct)
    }
}

/// Backend forwarding per-note changes to the remote collection.
#[derive(Clone)]
pub struct RemoteBackend {
    remote: Rc<dyn RemoteCollection>,
}

impl RemoteBackend {
    pub fn new(remote: Rc<dyn RemoteCollection>) -> Self {
        Self { remote }
    }

    pub fn collection(&self) -> &dyn RemoteCollection {
        self.remote.as_ref()
    }
}

#[async_trait(?Send)]
impl NoteBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn create(&self, draft: &Note, _notes: &[Note]) -> RemoteResult<NoteId> {
        self.remote.create(&NotePatch::from_note(draft)).await
    }

    async fn write(&self, id: &NoteId, patch: &NotePatch, _notes: &[Note]) -> RemoteResult<()> {
        self.remote.merge_write(id, patch).await
    }

    async fn delete(&self, id: &NoteId, _notes: &[Note]) -> RemoteResult<()> {
        self.remote.delete(id).await
    }

    async fn share(&self, record: &ShareRecord) -> RemoteResult<ShareKind> {
        self.remote.publish_share(record).await?;
        Ok(ShareKind::Published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteNoteStore;
    use crate::remote::MemoryRemote;

    fn note(id: &str, content: &str) -> Note {
        NotePatch::default()
            .with_content(content)
            .into_note(NoteId::from_backend(id), 1)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn local_create_prepends_draft_and_keeps_its_id() {
        let store = Rc::new(SqliteNoteStore::in_memory().unwrap());
        let backend = LocalBackend::new(store.clone());
        let existing = vec![note("old", "older")];

        let id = backend
            .create(&note("fresh", ""), &existing)
            .await
            .unwrap();
        assert_eq!(id.as_str(), "fresh");

        let stored = store.load();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id.as_str(), "fresh");
        assert_eq!(stored[1].id.as_str(), "old");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn local_write_persists_whole_collection() {
        let store = Rc::new(SqliteNoteStore::in_memory().unwrap());
        let backend = LocalBackend::new(store.clone());
        let notes = vec![note("a", "alpha"), note("b", "beta")];

        backend
            .write(&notes[0].id, &NotePatch::default(), &notes)
            .await
            .unwrap();
        assert_eq!(store.load(), notes);

        backend.delete(&notes[0].id, &notes[1..]).await.unwrap();
        assert_eq!(store.load(), notes[1..].to_vec());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn remote_backend_forwards_per_note_changes() {
        let remote = MemoryRemote::new();
        let backend = RemoteBackend::new(Rc::new(remote.clone()));

        let id = backend.create(&note("draft", "hi"), &[]).await.unwrap();
        assert_ne!(id.as_str(), "draft");
        assert_eq!(remote.note(&id).unwrap().content, "hi");

        let pin = NotePatch {
            pinned: Some(true),
            ..NotePatch::default()
        };
        backend.write(&id, &pin, &[]).await.unwrap();
        assert!(remote.note(&id).unwrap().pinned);

        backend.delete(&id, &[]).await.unwrap();
        assert!(remote.note(&id).is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn share_kind_depends_on_backend() {
        let record = ShareRecord::for_note(&note("a", "x"), 1);
        let remote = MemoryRemote::new();

        let published = RemoteBackend::new(Rc::new(remote.clone()))
            .share(&record)
            .await
            .unwrap();
        assert_eq!(published, ShareKind::Published);
        assert_eq!(remote.shares().len(), 1);

        let store = Rc::new(SqliteNoteStore::in_memory().unwrap());
        let direct = LocalBackend::new(store).share(&record).await.unwrap();
        assert_eq!(direct, ShareKind::Direct);
    }
}
