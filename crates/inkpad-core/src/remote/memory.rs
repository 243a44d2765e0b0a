//! In-process remote collection.
//!
//! Behaves like a document store with ordered live queries: every mutation
//! pushes the full collection, newest first, to each subscriber. Failures can
//! be scripted per call, which makes it the fake backend for engine tests and
//! the `--memory-remote` mode of the CLI shell.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::{Rc, Weak};

use async_trait::async_trait;

use crate::models::{Note, NoteId, NotePatch, ShareRecord};

use super::{
    RemoteCollection, RemoteError, RemoteResult, SnapshotSink, Subscription, SubscriptionEvent,
};

/// Number of calls received per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub creates: usize,
    pub writes: usize,
    pub deletes: usize,
    pub subscribes: usize,
    pub shares: usize,
}

impl CallCounts {
    /// Total number of note mutations attempted
    #[must_use]
    pub const fn mutations(&self) -> usize {
        self.creates + self.writes + self.deletes
    }
}

#[derive(Default)]
struct Inner {
    docs: BTreeMap<NoteId, Note>,
    shares: Vec<ShareRecord>,
    subscribers: BTreeMap<u64, SnapshotSink>,
    next_subscriber: u64,
    next_doc: u64,
    scripted_failures: VecDeque<RemoteError>,
    persistent_failure: Option<RemoteError>,
    subscribe_failure: Option<RemoteError>,
    calls: CallCounts,
}

impl Inner {
    fn take_failure(&mut self) -> RemoteResult<()> {
        if let Some(error) = self.scripted_failures.pop_front() {
            return Err(error);
        }
        match &self.persistent_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Next `doc-NNNNNN` id not already held, seeded documents included.
    fn mint_id(&mut self) -> NoteId {
        loop {
            self.next_doc += 1;
            let id = NoteId::from_backend(format!("doc-{:06}", self.next_doc));
            if !self.docs.contains_key(&id) {
                return id;
            }
        }
    }

    fn ordered(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.docs.values().cloned().collect();
        notes.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        notes
    }

    fn broadcast(&mut self) {
        let snapshot = self.ordered();
        self.subscribers.retain(|_, sink| {
            sink.send(SubscriptionEvent::Snapshot(snapshot.clone()))
                .is_ok()
        });
    }
}

/// Shared in-memory remote collection. Clones observe the same documents.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed documents without notifying subscribers.
    #[must_use]
    pub fn with_notes(self, notes: Vec<Note>) -> Self {
        {
            let mut inner = self.inner.borrow_mut();
            for note in notes {
                inner.docs.insert(note.id.clone(), note);
            }
        }
        self
    }

    /// Fail the next call (of any kind) with `error`.
    pub fn fail_next(&self, error: RemoteError) {
        self.inner.borrow_mut().scripted_failures.push_back(error);
    }

    /// Fail every call with `error` until cleared.
    pub fn fail_always(&self, error: RemoteError) {
        self.inner.borrow_mut().persistent_failure = Some(error);
    }

    pub fn clear_failures(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.scripted_failures.clear();
        inner.persistent_failure = None;
        inner.subscribe_failure = None;
    }

    /// Make new subscriptions fail to register.
    pub fn refuse_subscriptions(&self, error: RemoteError) {
        self.inner.borrow_mut().subscribe_failure = Some(error);
    }

    /// Deliver `error` to every live subscriber and drop them.
    pub fn break_subscriptions(&self, error: &RemoteError) {
        let subscribers = std::mem::take(&mut self.inner.borrow_mut().subscribers);
        for sink in subscribers.into_values() {
            let _ = sink.send(SubscriptionEvent::Failed(error.clone()));
        }
    }

    /// Write a document as another device would, notifying subscribers.
    pub fn push_external(&self, note: Note) {
        let mut inner = self.inner.borrow_mut();
        inner.docs.insert(note.id.clone(), note);
        inner.broadcast();
    }

    /// Remove a document as another device would, notifying subscribers.
    pub fn remove_external(&self, id: &NoteId) {
        let mut inner = self.inner.borrow_mut();
        inner.docs.remove(id);
        inner.broadcast();
    }

    #[must_use]
    pub fn notes(&self) -> Vec<Note> {
        self.inner.borrow().ordered()
    }

    #[must_use]
    pub fn note(&self, id: &NoteId) -> Option<Note> {
        self.inner.borrow().docs.get(id).cloned()
    }

    #[must_use]
    pub fn shares(&self) -> Vec<ShareRecord> {
        self.inner.borrow().shares.clone()
    }

    #[must_use]
    pub fn calls(&self) -> CallCounts {
        self.inner.borrow().calls
    }

    #[must_use]
    pub fn active_subscribers(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

#[async_trait(?Send)]
impl RemoteCollection for MemoryRemote {
    async fn create(&self, data: &NotePatch) -> RemoteResult<NoteId> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.creates += 1;
        inner.take_failure()?;

        let id = inner.mint_id();
        let note = data.clone().into_note(id.clone(), 0);
        inner.docs.insert(id.clone(), note);
        inner.broadcast();
        Ok(id)
    }

    async fn merge_write(&self, id: &NoteId, data: &NotePatch) -> RemoteResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.writes += 1;
        inner.take_failure()?;

        match inner.docs.get_mut(id) {
            Some(note) => data.apply_to(note),
            None => {
                let note = data.clone().into_note(id.clone(), 0);
                inner.docs.insert(id.clone(), note);
            }
        }
        inner.broadcast();
        Ok(())
    }

    async fn delete(&self, id: &NoteId) -> RemoteResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.deletes += 1;
        inner.take_failure()?;

        inner.docs.remove(id);
        inner.broadcast();
        Ok(())
    }

    fn subscribe_ordered(&self, sink: SnapshotSink) -> RemoteResult<Subscription> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.subscribes += 1;
        if let Some(error) = inner.subscribe_failure.clone() {
            return Err(error);
        }

        let key = inner.next_subscriber;
        inner.next_subscriber += 1;
        let _ = sink.send(SubscriptionEvent::Snapshot(inner.ordered()));
        inner.subscribers.insert(key, sink);

        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().subscribers.remove(&key);
            }
        }))
    }

    async fn publish_share(&self, record: &ShareRecord) -> RemoteResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.shares += 1;
        inner.take_failure()?;

        inner.shares.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn patch(content: &str, updated_at: i64) -> NotePatch {
        NotePatch {
            updated_at: Some(updated_at),
            ..NotePatch::default().with_content(content)
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SubscriptionEvent>) -> Vec<SubscriptionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(flavor = "current_thread")]
    async fn create_assigns_ids_and_notifies() {
        let remote = MemoryRemote::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = remote.subscribe_ordered(tx).unwrap();

        let first = remote.create(&patch("one", 1)).await.unwrap();
        let second = remote.create(&patch("two", 2)).await.unwrap();
        assert_ne!(first, second);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 3);
        let SubscriptionEvent::Snapshot(latest) = events.last().unwrap() else {
            panic!("expected snapshot");
        };
        assert_eq!(latest[0].id, second);
        assert_eq!(latest[1].id, first);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn create_skips_ids_held_by_seeded_documents() {
        let seeded = patch("earlier session note", 1)
            .into_note(NoteId::from_backend("doc-000001"), 1);
        let remote = MemoryRemote::new().with_notes(vec![seeded]);

        let id = remote.create(&patch("fresh", 2)).await.unwrap();
        assert_eq!(id.as_str(), "doc-000002");
        assert_eq!(remote.notes().len(), 2);
        assert_eq!(
            remote.note(&NoteId::from_backend("doc-000001")).unwrap().content,
            "earlier session note"
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn merge_write_creates_missing_documents() {
        let remote = MemoryRemote::new();
        let id = NoteId::from_backend("manual");
        remote.merge_write(&id, &patch("hello", 5)).await.unwrap();

        let stored = remote.note(&id).unwrap();
        assert_eq!(stored.content, "hello");

        let pin = NotePatch {
            pinned: Some(true),
            ..NotePatch::default()
        };
        remote.merge_write(&id, &pin).await.unwrap();
        let stored = remote.note(&id).unwrap();
        assert!(stored.pinned);
        assert_eq!(stored.content, "hello");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn scripted_failures_are_consumed_in_order() {
        let remote = MemoryRemote::new();
        remote.fail_next(RemoteError::unavailable("flaky"));

        assert!(remote.create(&patch("a", 1)).await.is_err());
        assert!(remote.create(&patch("a", 1)).await.is_ok());
        assert_eq!(remote.calls().creates, 2);
        assert_eq!(remote.notes().len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unsubscribe_stops_delivery() {
        let remote = MemoryRemote::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut subscription = remote.subscribe_ordered(tx).unwrap();
        assert_eq!(remote.active_subscribers(), 1);

        subscription.unsubscribe();
        assert_eq!(remote.active_subscribers(), 0);
        drain(&mut rx);

        remote.create(&patch("quiet", 1)).await.unwrap();
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn break_subscriptions_delivers_error() {
        let remote = MemoryRemote::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = remote.subscribe_ordered(tx).unwrap();
        drain(&mut rx);

        remote.break_subscriptions(&RemoteError::permission_denied("revoked"));
        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![SubscriptionEvent::Failed(RemoteError::permission_denied(
                "revoked"
            ))]
        );
        assert_eq!(remote.active_subscribers(), 0);
    }

    #[test]
    fn refused_subscription_reports_error() {
        let remote = MemoryRemote::new();
        remote.refuse_subscriptions(RemoteError::unauthenticated("signed out"));
        let (tx, _rx) = mpsc::unbounded_channel();
        let error = remote.subscribe_ordered(tx).unwrap_err();
        assert!(error.is_permanent_auth());
    }
}
