//! Remote note collection capability.
//!
//! The remote store is used as an opaque, subscribable collection: create,
//! merge-write, delete and an ordered live subscription. Operations are
//! asynchronous and fail with a classified [`RemoteError`].

mod memory;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::models::{Note, NoteId, NotePatch, ShareRecord};

pub use memory::{CallCounts, MemoryRemote};

/// Classification of remote failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    PermissionDenied,
    Unauthenticated,
    Unavailable,
    DeadlineExceeded,
    NotFound,
    Internal,
}

impl RemoteErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission-denied",
            Self::Unauthenticated => "unauthenticated",
            Self::Unavailable => "unavailable",
            Self::DeadlineExceeded => "deadline-exceeded",
            Self::NotFound => "not-found",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error reported by the remote collection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::PermissionDenied, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Unauthenticated, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Unavailable, message)
    }

    /// Authorization and authentication failures will not go away by
    /// retrying; everything else is treated as transient.
    #[must_use]
    pub const fn is_permanent_auth(&self) -> bool {
        matches!(
            self.kind,
            RemoteErrorKind::PermissionDenied | RemoteErrorKind::Unauthenticated
        )
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Delivery from a live subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// Full collection ordered by `updated_at`, newest first
    Snapshot(Vec<Note>),
    /// The subscription failed and will deliver nothing further
    Failed(RemoteError),
}

/// Channel the remote pushes subscription events into.
pub type SnapshotSink = UnboundedSender<SubscriptionEvent>;

/// Handle to a live subscription. Releasing is idempotent and also happens
/// on drop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Release the subscription. Returns `true` only for the call that
    /// actually released it.
    pub fn unsubscribe(&mut self) -> bool {
        match self.release.take() {
            Some(release) => {
                release();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Subscribable remote collection of notes.
#[async_trait(?Send)]
pub trait RemoteCollection {
    /// Create a document from `data`; the remote assigns the id
    async fn create(&self, data: &NotePatch) -> RemoteResult<NoteId>;

    /// Merge `data` into the document, creating it when missing
    async fn merge_write(&self, id: &NoteId, data: &NotePatch) -> RemoteResult<()>;

    async fn delete(&self, id: &NoteId) -> RemoteResult<()>;

    /// Deliver the ordered collection into `sink` now and on every change
    fn subscribe_ordered(&self, sink: SnapshotSink) -> RemoteResult<Subscription>;

    /// Publish a share record to the shared collection
    async fn publish_share(&self, record: &ShareRecord) -> RemoteResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn permanent_auth_classification() {
        assert!(RemoteError::permission_denied("no").is_permanent_auth());
        assert!(RemoteError::unauthenticated("expired").is_permanent_auth());
        assert!(!RemoteError::unavailable("offline").is_permanent_auth());
        assert!(!RemoteError::new(RemoteErrorKind::DeadlineExceeded, "slow").is_permanent_auth());
        assert!(!RemoteError::new(RemoteErrorKind::NotFound, "gone").is_permanent_auth());
    }

    #[test]
    fn remote_error_display_includes_code() {
        let error = RemoteError::permission_denied("rules rejected write");
        assert_eq!(error.to_string(), "permission-denied: rules rejected write");
    }

    #[test]
    fn subscription_releases_exactly_once() {
        let released = Rc::new(Cell::new(0));
        let counter = Rc::clone(&released);
        let mut subscription = Subscription::new(move || counter.set(counter.get() + 1));

        assert!(subscription.is_active());
        assert!(subscription.unsubscribe());
        assert!(!subscription.unsubscribe());
        drop(subscription);
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn dropping_subscription_releases_it() {
        let released = Rc::new(Cell::new(false));
        let flag = Rc::clone(&released);
        drop(Subscription::new(move || flag.set(true)));
        assert!(released.get());
    }
}
