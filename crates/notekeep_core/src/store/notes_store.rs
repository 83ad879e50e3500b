//! Notes store: CRUD, undo/redo and persistence glue.
//!
//! # Responsibility
//! - Keep notes in insertion order with unique ids.
//! - Record add/delete mutations as [`Action`]s and replay them on
//!   undo/redo through silent primitives.
//! - Load and save through any [`PersistenceAdapter`].
//!
//! # Invariants
//! - `add` and `delete_by_id` clear the redo stack; silent primitives and
//!   `update_by_id` leave both stacks untouched.
//! - Undo moves an action to the redo stack and redo moves it back; an
//!   action whose replay fails is dropped.
//! - Failed loads leave the collection unchanged.
//! - A note removed from the live collection (by delete, undo or redo) stays
//!   out of merge saves until it is inserted again.
//! - Every public mutation reports its outcome to the notifier.

use super::action::{Action, ActionKind};
use super::notify::{LogNotifier, Notice, Notifier, Operation};
use super::{StoreError, StoreResult};
use crate::model::note::{Note, NoteId};
use crate::persist::{decode_notes, encode_notes, merge_for_save, PersistenceAdapter, SaveMode};
use log::debug;
use std::collections::HashSet;

/// Outcome of [`NotesStore::load_from`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Notes added to the live collection.
    pub loaded: usize,
    /// Stored notes skipped because their id was already present.
    pub skipped: usize,
}

/// Outcome of [`NotesStore::save_to`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Notes in the payload that was written.
    pub written: usize,
}

/// In-memory owner of the note collection and its undo/redo history.
pub struct NotesStore<N: Notifier = LogNotifier> {
    notes: Vec<Note>,
    undo_stack: Vec<Action>,
    redo_stack: Vec<Action>,
    removed: HashSet<NoteId>,
    notifier: N,
}

impl NotesStore<LogNotifier> {
    /// Creates an empty store reporting to the log.
    pub fn new() -> Self {
        Self::with_notifier(LogNotifier)
    }
}

impl Default for NotesStore<LogNotifier> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Notifier> NotesStore<N> {
    /// Creates an empty store reporting to `notifier`.
    pub fn with_notifier(notifier: N) -> Self {
        Self {
            notes: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            removed: HashSet::new(),
            notifier,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// All notes in store order.
    pub fn list(&self) -> &[Note] {
        &self.notes
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id() == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Appends `note` and records it for undo.
    ///
    /// Clears the redo history on success.
    ///
    /// # Errors
    /// - `DuplicateId` when a note with the same id is already stored.
    pub fn add(&mut self, note: Note) -> StoreResult<NoteId> {
        let id = note.id().to_string();
        let title = note.title().to_string();
        if let Err(err) = self.add_silently(note.clone()) {
            return Err(self.report(Operation::Add, err));
        }
        self.undo_stack.push(Action::AddNote { note });
        self.redo_stack.clear();
        self.trace_stacks(Operation::Add);
        self.notify(Notice::success(
            Operation::Add,
            format!("added note `{title}` ({id})"),
        ));
        Ok(id)
    }

    /// Appends `note` without recording an action or touching redo history.
    pub fn add_silently(&mut self, note: Note) -> StoreResult<()> {
        self.insert_silently(self.notes.len(), note)
    }

    /// Removes the note with `id` and records a full snapshot for undo.
    ///
    /// Clears the redo history on success.
    ///
    /// # Errors
    /// - `NotFound` when no note has `id`; the store is left unchanged.
    pub fn delete_by_id(&mut self, id: &str) -> StoreResult<Note> {
        let Some((index, note)) = self.remove_silently(id) else {
            return Err(self.report(Operation::Delete, StoreError::NotFound(id.to_string())));
        };
        self.undo_stack.push(Action::DeleteNote {
            note: note.clone(),
            index,
        });
        self.redo_stack.clear();
        self.trace_stacks(Operation::Delete);
        self.notify(Notice::success(
            Operation::Delete,
            format!("deleted note `{}` ({id})", note.title()),
        ));
        Ok(note)
    }

    /// Removes the note with `id` without recording an action.
    pub fn delete_silently(&mut self, id: &str) -> StoreResult<Note> {
        self.remove_silently(id)
            .map(|(_, note)| note)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Replaces title and content of the note with `id`.
    ///
    /// Edits are not part of the undo log and do not clear redo history.
    pub fn update_by_id(
        &mut self,
        id: &str,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> StoreResult<()> {
        let Some(index) = self.notes.iter().position(|note| note.id() == id) else {
            return Err(self.report(Operation::Update, StoreError::NotFound(id.to_string())));
        };
        let note = &mut self.notes[index];
        note.update(title, content);
        let message = format!("updated note `{}` ({id})", note.title());
        self.notify(Notice::success(Operation::Update, message));
        Ok(())
    }

    /// Reverts the most recent recorded action.
    ///
    /// # Errors
    /// - `NothingToUndo` on an empty undo stack (no state change).
    /// - `DuplicateId`/`NotFound` when the collection no longer matches the
    ///   action; the action is dropped.
    pub fn undo(&mut self) -> StoreResult<ActionKind> {
        let Some(action) = self.undo_stack.pop() else {
            return Err(self.report(Operation::Undo, StoreError::NothingToUndo));
        };
        let kind = action.kind();
        let replayed = match &action {
            Action::AddNote { note } => self.delete_silently(note.id()).map(drop),
            Action::DeleteNote { note, index } => self.insert_silently(*index, note.clone()),
        };
        if let Err(err) = replayed {
            return Err(self.report(Operation::Undo, err));
        }

        let message = format!("undid {kind} of `{}`", action.note().title());
        self.redo_stack.push(action);
        self.trace_stacks(Operation::Undo);
        self.notify(Notice::success(Operation::Undo, message));
        Ok(kind)
    }

    /// Re-applies the most recently undone action.
    ///
    /// # Errors
    /// - `NothingToRedo` on an empty redo stack (no state change).
    /// - `DuplicateId`/`NotFound` when the collection no longer matches the
    ///   action; the action is dropped.
    pub fn redo(&mut self) -> StoreResult<ActionKind> {
        let Some(action) = self.redo_stack.pop() else {
            return Err(self.report(Operation::Redo, StoreError::NothingToRedo));
        };
        let kind = action.kind();
        let replayed = match &action {
            Action::AddNote { note } => self.add_silently(note.clone()),
            Action::DeleteNote { note, .. } => self.delete_silently(note.id()).map(drop),
        };
        if let Err(err) = replayed {
            return Err(self.report(Operation::Redo, err));
        }

        let message = format!("redid {kind} of `{}`", action.note().title());
        self.undo_stack.push(action);
        self.trace_stacks(Operation::Redo);
        self.notify(Notice::success(Operation::Redo, message));
        Ok(kind)
    }

    /// Merges the collection stored under `key` into the live collection.
    ///
    /// Notes whose id is already present are skipped, never overwritten.
    /// Loaded notes are added silently and are not undoable.
    ///
    /// # Errors
    /// - `Persist` when the backend fails or the payload is malformed; the
    ///   collection is left unchanged.
    pub fn load_from<A>(&mut self, adapter: &A, key: &str) -> StoreResult<LoadReport>
    where
        A: PersistenceAdapter + ?Sized,
    {
        let incoming = match adapter
            .retrieve(key)
            .and_then(|payload| payload.as_deref().map(decode_notes).transpose())
        {
            Ok(incoming) => incoming.unwrap_or_default(),
            Err(err) => return Err(self.report(Operation::Load, err.into())),
        };

        let mut report = LoadReport::default();
        for note in incoming {
            match self.add_silently(note) {
                Ok(()) => report.loaded += 1,
                Err(_) => report.skipped += 1,
            }
        }

        self.notify(Notice::success(
            Operation::Load,
            format!(
                "loaded {} note(s) from {} `{key}`, skipped {} already present",
                report.loaded,
                adapter.backend_name(),
                report.skipped
            ),
        ));
        Ok(report)
    }

    /// Writes the live collection under `key` as directed by `mode`.
    ///
    /// # Errors
    /// - `Persist` when the backend fails, the lock times out or the stored
    ///   payload cannot be decoded for merging; nothing is written.
    pub fn save_to<A>(&self, adapter: &A, key: &str, mode: SaveMode) -> StoreResult<SaveReport>
    where
        A: PersistenceAdapter + ?Sized,
    {
        let mut report = SaveReport::default();
        let result = adapter.read_modify_write(key, &mut |stored| {
            let payload_notes = match mode {
                SaveMode::Replace => self.notes.clone(),
                SaveMode::Merge => {
                    let stored = match stored.as_deref() {
                        Some(payload) => decode_notes(payload)?,
                        None => Vec::new(),
                    };
                    merge_for_save(stored, &self.notes, &self.removed)
                }
            };
            report.written = payload_notes.len();
            encode_notes(&payload_notes)
        });

        if let Err(err) = result {
            return Err(self.report(Operation::Save, err.into()));
        }

        self.notify(Notice::success(
            Operation::Save,
            format!(
                "saved {} note(s) to {} `{key}` ({})",
                report.written,
                adapter.backend_name(),
                mode.as_str()
            ),
        ));
        Ok(report)
    }

    fn insert_silently(&mut self, index: usize, note: Note) -> StoreResult<()> {
        if self.get_by_id(note.id()).is_some() {
            return Err(StoreError::DuplicateId(note.id().to_string()));
        }
        let index = index.min(self.notes.len());
        self.removed.remove(note.id());
        self.notes.insert(index, note);
        Ok(())
    }

    fn remove_silently(&mut self, id: &str) -> Option<(usize, Note)> {
        let index = self.notes.iter().position(|note| note.id() == id)?;
        let note = self.notes.remove(index);
        self.removed.insert(note.id().to_string());
        Some((index, note))
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(&notice);
    }

    fn report(&self, operation: Operation, err: StoreError) -> StoreError {
        self.notify(Notice::error(operation, err.to_string()));
        err
    }

    fn trace_stacks(&self, operation: Operation) {
        debug!(
            "event=action_log module=store op={} notes={} undo_depth={} redo_depth={}",
            operation.as_str(),
            self.notes.len(),
            self.undo_stack.len(),
            self.redo_stack.len()
        );
    }
}
