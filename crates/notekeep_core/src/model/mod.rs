//! Domain model for notes.
//!
//! # Responsibility
//! - Define the note record shared by the store, persistence and CLI.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Deletion is a hard removal from the store; history lives in the
//!   store's action log, not in tombstones.

pub mod note;
