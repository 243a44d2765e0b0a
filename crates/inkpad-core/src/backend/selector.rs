//! Active backend selection and remote-to-local failover.

use std::rc::Rc;

use crate::db::LocalStore;
use crate::remote::{RemoteCollection, RemoteError, RemoteResult, SnapshotSink, Subscription};

use super::{BackendKind, LocalBackend, NoteBackend, RemoteBackend};

/// Owns both backends, the choice between them and the live subscription.
///
/// The only transition is `Remote -> Local`, and it is permanent for the
/// lifetime of the selector.
pub struct BackendSelector {
    local: LocalBackend,
    remote: Option<RemoteBackend>,
    active: BackendKind,
    subscription: Option<Subscription>,
}

impl BackendSelector {
    /// Choose the remote backend when it could be constructed, otherwise
    /// start on local storage.
    pub fn probe(
        local_store: Rc<dyn LocalStore>,
        remote: RemoteResult<Rc<dyn RemoteCollection>>,
    ) -> Self {
        match remote {
            Ok(remote) => {
                tracing::info!("Remote note store available; using remote backend");
                Self {
                    local: LocalBackend::new(local_store),
                    remote: Some(RemoteBackend::new(remote)),
                    active: BackendKind::Remote,
                    subscription: None,
                }
            }
            Err(error) => {
                tracing::info!("Running in local-only mode ({error})");
                Self::local_only(local_store)
            }
        }
    }

    pub fn local_only(local_store: Rc<dyn LocalStore>) -> Self {
        Self {
            local: LocalBackend::new(local_store),
            remote: None,
            active: BackendKind::Local,
            subscription: None,
        }
    }

    pub const fn active_kind(&self) -> BackendKind {
        self.active
    }

    pub const fn is_remote_active(&self) -> bool {
        matches!(self.active, BackendKind::Remote)
    }

    /// Backend that should receive the next write
    pub fn active(&self) -> &dyn NoteBackend {
        match (&self.active, &self.remote) {
            (BackendKind::Remote, Some(remote)) => remote as &dyn NoteBackend,
            _ => &self.local,
        }
    }

    pub const fn local(&self) -> &LocalBackend {
        &self.local
    }

    pub fn local_store(&self) -> &dyn LocalStore {
        self.local.store()
    }

    /// Start the ordered live subscription, releasing any previous one first.
    ///
    /// Does nothing while local storage is active.
    pub fn subscribe(&mut self, sink: SnapshotSink) -> RemoteResult<()> {
        if !self.is_remote_active() {
            return Ok(());
        }

        self.release_subscription();
        let Some(remote) = &self.remote else {
            return Ok(());
        };
        let subscription = remote.collection().subscribe_ordered(sink)?;
        self.subscription = Some(subscription);
        tracing::debug!("Subscribed to remote note collection");
        Ok(())
    }

    pub fn has_live_subscription(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(Subscription::is_active)
    }

    /// Release the live subscription. Returns `true` if one was released.
    pub fn release_subscription(&mut self) -> bool {
        self.subscription
            .take()
            .is_some_and(|mut subscription| subscription.unsubscribe())
    }

    /// Switch to local storage after a permanent failure.
    ///
    /// Returns `true` when this call performed the transition.
    pub fn demote(&mut self, cause: &RemoteError) -> bool {
        if !self.is_remote_active() {
            return false;
        }

        self.active = BackendKind::Local;
        self.release_subscription();
        tracing::warn!("Remote note store failed permanently ({cause}); switching to local storage");
        true
    }
}
