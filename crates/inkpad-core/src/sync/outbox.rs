//! FIFO queue of backend writes awaiting delivery.

use std::collections::{HashSet, VecDeque};

use crate::models::{NoteId, NotePatch};

/// A write already applied in memory and not yet sent to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Write { id: NoteId, patch: NotePatch },
    Delete { id: NoteId },
}

impl Outbound {
    pub const fn note_id(&self) -> &NoteId {
        match self {
            Self::Write { id, .. } | Self::Delete { id } => id,
        }
    }
}

#[derive(Debug, Default)]
pub struct Outbox {
    queue: VecDeque<Outbound>,
}

impl Outbox {
    pub fn push(&mut self, item: Outbound) {
        self.queue.push_back(item);
    }

    pub fn pop_front(&mut self) -> Option<Outbound> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Notes whose deletion has not reached the backend yet.
    pub fn pending_deletes(&self) -> HashSet<NoteId> {
        self.queue
            .iter()
            .filter_map(|item| match item {
                Outbound::Delete { id } => Some(id.clone()),
                Outbound::Write { .. } => None,
            })
            .collect()
    }
}
