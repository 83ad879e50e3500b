//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record owned by the notes store.
//! - Keep wire naming (`createdAt`, `updatedAt`) stable for persistence.
//!
//! # Invariants
//! - `id` is non-empty, assigned once and never reused for another note.
//! - `updated_at >= created_at` at all times.
//! - Deserialization rejects records that violate either invariant.
//! - Timestamps are held in UTC; a stored offset such as `+02:00` keeps its
//!   instant but is written back with a `Z` suffix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque note identifier.
///
/// Loaded notes may carry ids minted by other tools, so this stays a plain
/// string rather than a parsed UUID.
pub type NoteId = String;

/// Validation failures for note invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// `id` is empty or whitespace only.
    EmptyId,
    /// `updated_at` is earlier than `created_at`.
    UpdatedBeforeCreated {
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "note id must not be empty"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "updatedAt ({}) must be >= createdAt ({})",
                updated_at.to_rfc3339(),
                created_at.to_rfc3339()
            ),
        }
    }
}

impl Error for NoteValidationError {}

/// One user-authored note.
///
/// Fields are private so identity and creation time cannot be rewritten
/// after construction; use [`Note::update`] for content changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "NoteRecord")]
pub struct Note {
    id: NoteId,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Unvalidated wire shape used by `Deserialize`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteRecord {
    id: NoteId,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NoteRecord> for Note {
    type Error = NoteValidationError;

    fn try_from(record: NoteRecord) -> Result<Self, Self::Error> {
        Note::from_parts(
            record.id,
            record.title,
            record.content,
            record.created_at,
            record.updated_at,
        )
    }
}

impl Note {
    /// Creates a note with a freshly generated id and both timestamps set
    /// to now.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_note_id(),
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a note with a caller-provided id and timestamps.
    ///
    /// Used by import/load paths where identity already exists externally.
    ///
    /// # Errors
    /// - `EmptyId` when `id` is blank.
    /// - `UpdatedBeforeCreated` when the timestamps are reversed.
    pub fn from_parts(
        id: impl Into<NoteId>,
        title: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, NoteValidationError> {
        let note = Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            created_at,
            updated_at,
        };
        note.validate()?;
        Ok(note)
    }

    /// Creates a note with a caller-provided id, stamped now.
    pub fn with_id(
        id: impl Into<NoteId>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, NoteValidationError> {
        let now = Utc::now();
        Self::from_parts(id, title, content, now, now)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces title and content and bumps `updated_at`.
    ///
    /// `updated_at` is clamped to `created_at` so a clock step backwards
    /// cannot break the timestamp invariant.
    pub fn update(&mut self, title: impl Into<String>, content: impl Into<String>) {
        self.title = title.into();
        self.content = content.into();
        self.updated_at = Utc::now().max(self.created_at);
    }

    /// Checks note invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.trim().is_empty() {
            return Err(NoteValidationError::EmptyId);
        }
        if self.updated_at < self.created_at {
            return Err(NoteValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Renders every field as human-readable text for listings.
    pub fn describe(&self) -> String {
        format!(
            "ID: {}\nTitle: {}\nContent: {}\nCreated: {}\nUpdated: {}",
            self.id,
            self.title,
            self.content,
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }
}

impl Display for Note {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Mints a new note id: 128 random bits rendered as 32 lowercase hex chars.
pub fn generate_note_id() -> NoteId {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::{generate_note_id, Note, NoteValidationError};
    use chrono::{Duration, Utc};
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_compact_and_distinct() {
        let ids: HashSet<_> = (0..256).map(|_| generate_note_id()).collect();
        assert_eq!(ids.len(), 256);
        assert!(ids.iter().all(|id| id.len() == 32));
    }

    #[test]
    fn update_never_moves_updated_at_before_created_at() {
        let created = Utc::now() + Duration::hours(1);
        let mut note = Note::from_parts("n1", "t", "c", created, created).unwrap();

        note.update("t2", "c2");

        assert_eq!(note.updated_at(), created);
        assert_eq!(note.title(), "t2");
    }

    #[test]
    fn with_id_rejects_blank_id() {
        let err = Note::with_id("  ", "t", "c").unwrap_err();
        assert_eq!(err, NoteValidationError::EmptyId);
    }
}
