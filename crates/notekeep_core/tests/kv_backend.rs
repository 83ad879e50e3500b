use notekeep_core::db::migrations::latest_version;
use notekeep_core::db::{open_db, open_db_in_memory, open_db_with_timeout, DbError};
use notekeep_core::{Note, NotesStore, PersistError, PersistenceAdapter, SaveMode, SqliteKvAdapter};
use rusqlite::Connection;
use std::time::Duration;

#[test]
fn open_db_in_memory_creates_kv_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_entries');",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1);
}

#[test]
fn database_with_newer_schema_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_key_retrieves_none_and_persist_overwrites() {
    let conn = open_db_in_memory().unwrap();
    let adapter = SqliteKvAdapter::new(&conn);

    assert_eq!(adapter.retrieve("notes").unwrap(), None);

    adapter.persist("notes", "[]").unwrap();
    adapter.persist("notes", "[ ]").unwrap();
    assert_eq!(adapter.retrieve("notes").unwrap().as_deref(), Some("[ ]"));

    let err = adapter.retrieve("   ").unwrap_err();
    assert!(matches!(err, PersistError::InvalidKey(_)));
}

#[test]
fn store_round_trips_through_kv_backend() {
    let conn = open_db_in_memory().unwrap();
    let adapter = SqliteKvAdapter::new(&conn);

    let mut store = NotesStore::new();
    store.add(Note::new("Groceries", "milk, eggs")).unwrap();
    store.add(Note::new("Call", "dentist at 3")).unwrap();
    store.save_to(&adapter, "notes", SaveMode::Merge).unwrap();

    let mut fresh = NotesStore::new();
    let report = fresh.load_from(&adapter, "notes").unwrap();

    assert_eq!(report.loaded, 2);
    assert_eq!(fresh.list(), store.list());
}

#[test]
fn failed_update_rolls_back() {
    let conn = open_db_in_memory().unwrap();
    let adapter = SqliteKvAdapter::new(&conn);
    adapter.persist("notes", "original").unwrap();

    let err = adapter
        .read_modify_write("notes", &mut |_| {
            Err(PersistError::InvalidKey("forced".to_string()))
        })
        .unwrap_err();

    assert!(matches!(err, PersistError::InvalidKey(_)));
    assert_eq!(adapter.retrieve("notes").unwrap().as_deref(), Some("original"));
}

#[test]
fn malformed_stored_value_blocks_merge_save() {
    let conn = open_db_in_memory().unwrap();
    let adapter = SqliteKvAdapter::new(&conn);
    adapter.persist("notes", "{not json").unwrap();

    let mut store = NotesStore::new();
    store.add(Note::new("kept", "in memory")).unwrap();
    let err = store.save_to(&adapter, "notes", SaveMode::Merge).unwrap_err();

    assert!(matches!(
        err,
        notekeep_core::StoreError::Persist(PersistError::Serialization(_))
    ));
    assert_eq!(adapter.retrieve("notes").unwrap().as_deref(), Some("{not json"));
}

#[test]
fn writer_blocked_by_another_connection_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.sqlite3");

    let holder = open_db(&path).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let conn = open_db_with_timeout(&path, Duration::from_millis(50)).unwrap();
    let adapter = SqliteKvAdapter::new(&conn);
    let err = adapter.persist("notes", "[]").unwrap_err();
    assert!(matches!(err, PersistError::Timeout { .. }), "got {err}");

    holder.execute_batch("ROLLBACK;").unwrap();
    adapter.persist("notes", "[]").unwrap();
}

#[test]
fn reader_blocked_by_exclusive_lock_reports_time_waited() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.sqlite3");

    let holder = open_db(&path).unwrap();
    holder.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let busy_timeout = Duration::from_millis(50);
    let conn = open_db_with_timeout(&path, busy_timeout).unwrap();
    let adapter = SqliteKvAdapter::new(&conn);
    match adapter.retrieve("notes").unwrap_err() {
        PersistError::Timeout { key, waited } => {
            assert_eq!(key, "notes");
            assert!(waited >= busy_timeout, "waited {waited:?}");
        }
        other => panic!("unexpected error: {other}"),
    }

    holder.execute_batch("ROLLBACK;").unwrap();
    assert_eq!(adapter.retrieve("notes").unwrap(), None);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}
