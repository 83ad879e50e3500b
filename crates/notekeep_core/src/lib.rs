//! Core domain logic for notekeep.
//! This crate owns the note invariants, the undo/redo log and persistence.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod persist;
pub mod store;

pub use config::{load_config, BackendKind, Config, ConfigError};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::note::{generate_note_id, Note, NoteId, NoteValidationError};
pub use persist::{
    FileAdapter, PersistError, PersistResult, PersistenceAdapter, SaveMode, SqliteKvAdapter,
};
pub use store::{
    Action, ActionKind, LoadReport, LogNotifier, Notice, NoticeLevel, Notifier, NotesStore,
    Operation, SaveReport, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
