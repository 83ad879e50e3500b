//! In-memory notes store and its undo/redo log.
//!
//! # Responsibility
//! - Own the note collection and the action stacks.
//! - Report every operation outcome through a [`Notifier`].
//!
//! # Invariants
//! - No two notes in one store share an id.
//! - Stacks are mutated only by store methods; silent primitives never
//!   touch them.

use crate::model::note::NoteId;
use crate::persist::PersistError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod action;
pub mod notes_store;
pub mod notify;

pub use action::{Action, ActionKind};
pub use notes_store::{LoadReport, NotesStore, SaveReport};
pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier, Operation};

pub type StoreResult<T> = Result<T, StoreError>;

/// Non-fatal store failure. Every variant is also reported as a notice.
#[derive(Debug)]
pub enum StoreError {
    DuplicateId(NoteId),
    NotFound(NoteId),
    NothingToUndo,
    NothingToRedo,
    Persist(PersistError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "a note with id `{id}` already exists"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::NothingToUndo => write!(f, "nothing to undo"),
            Self::NothingToRedo => write!(f, "nothing to redo"),
            Self::Persist(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persist(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersistError> for StoreError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}
