//! Persistence boundary for serialized note collections.
//!
//! # Responsibility
//! - Define the backend capability the notes store saves to and loads from.
//! - Provide file and SQLite key-value implementations.
//!
//! # Invariants
//! - `read_modify_write` holds the backend's exclusive lock for `key` for
//!   the whole read-merge-write sequence.
//! - A failed update writes nothing.
//! - The core never picks a backend on its own; the host constructs one.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod codec;
pub mod file;
pub mod kv;

pub use codec::{decode_notes, encode_notes, merge_for_save};
pub use file::FileAdapter;
pub use kv::SqliteKvAdapter;

pub type PersistResult<T> = Result<T, PersistError>;

/// Failure talking to, or decoding data from, a persistence backend.
#[derive(Debug)]
pub enum PersistError {
    /// Stored data is not a valid note collection (or could not be encoded).
    Serialization(serde_json::Error),
    /// The backend could not be read or written.
    BackendUnavailable {
        backend: &'static str,
        source: Box<dyn Error + Send + Sync>,
    },
    /// The per-key lock could not be acquired in time.
    Timeout { key: String, waited: Duration },
    /// The collection key cannot be mapped onto the backend.
    InvalidKey(String),
}

impl PersistError {
    pub(crate) fn unavailable(
        backend: &'static str,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::BackendUnavailable {
            backend,
            source: source.into(),
        }
    }
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialization(err) => write!(f, "malformed note data: {err}"),
            Self::BackendUnavailable { backend, source } => {
                write!(f, "{backend} backend unavailable: {source}")
            }
            Self::Timeout { key, waited } => write!(
                f,
                "timed out after {}ms waiting for lock on `{key}`",
                waited.as_millis()
            ),
            Self::InvalidKey(key) => write!(f, "invalid collection key `{key}`"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            Self::BackendUnavailable { source, .. } => Some(&**source),
            Self::Timeout { .. } | Self::InvalidKey(_) => None,
        }
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// How `save` combines the live collection with what the backend holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveMode {
    /// Keep backend-only notes, except those the store removed; live notes
    /// win on id collisions.
    #[default]
    Merge,
    /// Write exactly the live collection.
    Replace,
}

impl SaveMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Replace => "replace",
        }
    }
}

/// Read/write capability over serialized note collections.
pub trait PersistenceAdapter {
    /// Short backend name for logs and errors.
    fn backend_name(&self) -> &'static str;

    /// Returns the stored payload for `key`, or `None` when nothing is stored.
    fn retrieve(&self, key: &str) -> PersistResult<Option<String>>;

    /// Atomically replaces the payload for `key` with `update(current)`.
    ///
    /// When `update` fails the stored payload is left untouched.
    fn read_modify_write(
        &self,
        key: &str,
        update: &mut dyn FnMut(Option<String>) -> PersistResult<String>,
    ) -> PersistResult<()>;

    /// Overwrites the payload for `key`.
    fn persist(&self, key: &str, serialized: &str) -> PersistResult<()> {
        self.read_modify_write(key, &mut |_| Ok(serialized.to_string()))
    }
}
