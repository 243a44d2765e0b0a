//! Merge of a pushed collection into the in-memory one.

use std::collections::{HashMap, HashSet};

use crate::models::{Note, NoteId};

/// Build the collection that replaces `local` after `incoming` arrives.
///
/// Incoming order is kept. A local copy wins only when its `updated_at` is
/// strictly newer; ties go to the incoming copy. Notes awaiting deletion are
/// dropped, and the open note survives even when the push no longer has it.
pub fn reconcile(
    local: &[Note],
    incoming: Vec<Note>,
    current: Option<&NoteId>,
    pending_deletes: &HashSet<NoteId>,
) -> Vec<Note> {
    let by_id: HashMap<&NoteId, &Note> = local.iter().map(|note| (&note.id, note)).collect();

    let mut merged: Vec<Note> = incoming
        .into_iter()
        .filter(|note| !pending_deletes.contains(&note.id))
        .map(|note| match by_id.get(&note.id) {
            Some(mine) if mine.updated_at > note.updated_at => {
                tracing::debug!("Keeping newer local copy of note {}", note.id);
                (*mine).clone()
            }
            _ => note,
        })
        .collect();

    if let Some(current) = current {
        let present = merged.iter().any(|note| note.id == *current);
        if !present && !pending_deletes.contains(current) {
            if let Some(open) = by_id.get(current) {
                merged.push((*open).clone());
            }
        }
    }

    merged
}

/// Rebuild the collection from the device copy after losing the remote.
///
/// Follows [`reconcile`] with `stored` as the incoming side, then puts back
/// in-memory notes the device copy never received, ahead of the rest.
pub fn recover(
    memory: &[Note],
    stored: Vec<Note>,
    current: Option<&NoteId>,
    pending_deletes: &HashSet<NoteId>,
) -> Vec<Note> {
    let merged = reconcile(memory, stored, current, pending_deletes);
    let known: HashSet<&NoteId> = merged.iter().map(|note| &note.id).collect();

    let mut recovered: Vec<Note> = memory
        .iter()
        .filter(|note| !known.contains(&note.id) && !pending_deletes.contains(&note.id))
        .cloned()
        .collect();
    if !recovered.is_empty() {
        tracing::debug!("Keeping {} notes missing from local storage", recovered.len());
    }
    recovered.extend(merged);
    recovered
}
