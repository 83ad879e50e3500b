//! JSON wire format for note collections.
//!
//! Payload shape: a JSON array of flat objects with `id`, `title`,
//! `content`, `createdAt` and `updatedAt` (RFC 3339). No version field.

use super::PersistResult;
use crate::model::note::{Note, NoteId};
use std::collections::{HashMap, HashSet};

/// Encodes notes in collection order.
pub fn encode_notes(notes: &[Note]) -> PersistResult<String> {
    Ok(serde_json::to_string_pretty(notes)?)
}

/// Decodes a stored payload. Blank payloads decode as an empty collection.
///
/// Every record is validated; one bad record fails the whole payload.
pub fn decode_notes(payload: &str) -> PersistResult<Vec<Note>> {
    if payload.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(payload)?)
}

/// Combines stored notes with the live collection.
///
/// Stored order is kept; a live note replaces the stored note with the same
/// id, and live notes the backend has never seen are appended. Stored notes
/// whose id is in `removed` are dropped. Duplicate ids keep their first
/// occurrence.
pub fn merge_for_save(stored: Vec<Note>, live: &[Note], removed: &HashSet<NoteId>) -> Vec<Note> {
    let live_by_id: HashMap<&str, &Note> = live.iter().map(|note| (note.id(), note)).collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(stored.len() + live.len());
    let mut merged = Vec::with_capacity(stored.len() + live.len());

    for note in stored {
        if removed.contains(note.id()) || !seen.insert(note.id().to_string()) {
            continue;
        }
        match live_by_id.get(note.id()) {
            Some(current) => merged.push((*current).clone()),
            None => merged.push(note),
        }
    }
    for note in live {
        if seen.insert(note.id().to_string()) {
            merged.push(note.clone());
        }
    }

    merged
}
