//! SQLite-backed key-value backend.
//!
//! Native counterpart of a browser-local key-value store: one row per
//! collection key in `kv_entries`.
//!
//! # Invariants
//! - Read-modify-write runs inside one `IMMEDIATE` transaction, so a
//!   concurrent writer on the same database waits (up to the connection's
//!   busy timeout) instead of interleaving.
//! - A failed update rolls back and leaves the stored value untouched.

use super::{PersistError, PersistResult, PersistenceAdapter};
use log::{error, info};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior};
use std::time::Instant;

pub(crate) const BACKEND_NAME: &str = "sqlite";

/// Key-value backend over a migrated SQLite connection.
///
/// Open the connection with [`crate::db::open_db`] so the `kv_entries`
/// table exists.
pub struct SqliteKvAdapter<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvAdapter<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PersistenceAdapter for SqliteKvAdapter<'_> {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn retrieve(&self, key: &str) -> PersistResult<Option<String>> {
        validate_key(key)?;
        let started_at = Instant::now();
        self.conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|err| map_sqlite_error(key, err, started_at))
    }

    fn read_modify_write(
        &self,
        key: &str,
        update: &mut dyn FnMut(Option<String>) -> PersistResult<String>,
    ) -> PersistResult<()> {
        validate_key(key)?;
        let started_at = Instant::now();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(|err| map_sqlite_error(key, err, started_at))?;

        let current = tx
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|err| map_sqlite_error(key, err, started_at))?;

        // Dropping `tx` on this early return rolls back.
        let next = update(current)?;

        tx.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, next.as_str()],
        )
        .map_err(|err| map_sqlite_error(key, err, started_at))?;
        tx.commit()
            .map_err(|err| map_sqlite_error(key, err, started_at))?;

        info!(
            "event=persist_write module=persist status=ok backend=sqlite key={} bytes={} duration_ms={}",
            key,
            next.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

fn validate_key(key: &str) -> PersistResult<()> {
    if key.trim().is_empty() {
        return Err(PersistError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn map_sqlite_error(key: &str, err: rusqlite::Error, started_at: Instant) -> PersistError {
    let waited = started_at.elapsed();
    if err.sqlite_error_code() == Some(ErrorCode::DatabaseBusy) {
        error!(
            "event=persist_write module=persist status=error backend=sqlite key={} duration_ms={} error_code=busy_timeout",
            key,
            waited.as_millis()
        );
        return PersistError::Timeout {
            key: key.to_string(),
            waited,
        };
    }
    error!(
        "event=persist_io module=persist status=error backend=sqlite key={} duration_ms={} error={}",
        key,
        waited.as_millis(),
        err
    );
    PersistError::unavailable(BACKEND_NAME, err)
}
