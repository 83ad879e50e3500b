//! Undo/redo log entries.
//!
//! # Invariants
//! - An action always carries a full note snapshot, so replay never needs
//!   to consult the live collection for field values.

use crate::model::note::Note;
use std::fmt::{Display, Formatter};

/// One recorded store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A note was appended to the collection.
    AddNote { note: Note },
    /// A note was removed from `index`.
    DeleteNote { note: Note, index: usize },
}

/// Payload-free discriminant of [`Action`], used in notices and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    AddNote,
    DeleteNote,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::AddNote { .. } => ActionKind::AddNote,
            Self::DeleteNote { .. } => ActionKind::DeleteNote,
        }
    }

    pub fn note(&self) -> &Note {
        match self {
            Self::AddNote { note } | Self::DeleteNote { note, .. } => note,
        }
    }
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddNote => "add_note",
            Self::DeleteNote => "delete_note",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
