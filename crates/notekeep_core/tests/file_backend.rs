use notekeep_core::{
    FileAdapter, Note, NotesStore, PersistError, PersistenceAdapter, SaveMode, StoreError,
};
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

#[test]
fn save_then_load_into_fresh_store_reproduces_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FileAdapter::new(dir.path());

    let mut store = NotesStore::new();
    store.add(Note::new("Groceries", "milk, eggs")).unwrap();
    let mut edited = Note::new("Plan", "draft");
    edited.update("Plan", "final");
    store.add(edited).unwrap();
    let report = store.save_to(&adapter, "notes", SaveMode::Merge).unwrap();
    assert_eq!(report.written, 2);

    let mut fresh = NotesStore::new();
    let report = fresh.load_from(&adapter, "notes").unwrap();
    assert_eq!(report.loaded, 2);
    assert_eq!(fresh.list(), store.list());
    assert!(!fresh.can_undo());

    let again = fresh.load_from(&adapter, "notes").unwrap();
    assert_eq!((again.loaded, again.skipped), (0, 2));
    assert_eq!(fresh.len(), 2);
}

#[test]
fn load_never_overwrites_live_notes() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FileAdapter::new(dir.path());
    let stored = Note::with_id("shared", "stored title", "stored").unwrap();
    adapter
        .persist("notes", &serde_json::to_string(&[stored]).unwrap())
        .unwrap();

    let mut store = NotesStore::new();
    store
        .add(Note::with_id("shared", "live title", "live").unwrap())
        .unwrap();
    store.load_from(&adapter, "notes").unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.get_by_id("shared").unwrap().title(), "live title");
}

#[test]
fn missing_file_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FileAdapter::new(dir.path().join("not-created-yet"));

    let mut store = NotesStore::new();
    let report = store.load_from(&adapter, "notes").unwrap();

    assert_eq!(report.loaded, 0);
    assert!(store.is_empty());
}

#[test]
fn malformed_file_leaves_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.json"), "[{\"id\": 1}]").unwrap();
    let adapter = FileAdapter::new(dir.path());

    let mut store = NotesStore::new();
    store.add(Note::new("keep", "me")).unwrap();
    let before = store.list().to_vec();

    let err = store.load_from(&adapter, "notes").unwrap_err();

    assert!(matches!(err, StoreError::Persist(PersistError::Serialization(_))));
    assert_eq!(store.list(), before.as_slice());
}

#[test]
fn merge_keeps_backend_only_notes_and_replace_drops_them() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FileAdapter::new(dir.path());

    let mut first = NotesStore::new();
    first.add(Note::with_id("old", "old", "x").unwrap()).unwrap();
    first.save_to(&adapter, "notes", SaveMode::Merge).unwrap();

    let mut second = NotesStore::new();
    second.add(Note::with_id("new", "new", "y").unwrap()).unwrap();
    let merged = second.save_to(&adapter, "notes", SaveMode::Merge).unwrap();
    assert_eq!(merged.written, 2);

    let replaced = second.save_to(&adapter, "notes", SaveMode::Replace).unwrap();
    assert_eq!(replaced.written, 1);

    let mut check = NotesStore::new();
    check.load_from(&adapter, "notes").unwrap();
    let ids: Vec<_> = check.list().iter().map(|n| n.id().to_string()).collect();
    assert_eq!(ids, ["new"]);
}

#[test]
fn merge_save_after_delete_removes_the_note_from_storage() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FileAdapter::new(dir.path());

    let mut first = NotesStore::new();
    let id = first.add(Note::new("Groceries", "milk, eggs")).unwrap();
    first.add(Note::new("Other", "stays")).unwrap();
    first.save_to(&adapter, "notes", SaveMode::Merge).unwrap();

    let mut second = NotesStore::new();
    second.load_from(&adapter, "notes").unwrap();
    second.delete_by_id(&id).unwrap();
    let report = second.save_to(&adapter, "notes", SaveMode::Merge).unwrap();
    assert_eq!(report.written, 1);

    let mut third = NotesStore::new();
    third.load_from(&adapter, "notes").unwrap();
    assert!(third.get_by_id(&id).is_none());
    assert_eq!(third.len(), 1);
    assert!(matches!(
        third.delete_by_id(&id).unwrap_err(),
        StoreError::NotFound(_)
    ));
}

#[test]
fn undone_delete_is_saved_again_by_merge() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FileAdapter::new(dir.path());

    let mut store = NotesStore::new();
    let id = store.add(Note::new("Groceries", "milk, eggs")).unwrap();
    store.save_to(&adapter, "notes", SaveMode::Merge).unwrap();
    store.delete_by_id(&id).unwrap();
    store.undo().unwrap();
    store.save_to(&adapter, "notes", SaveMode::Merge).unwrap();

    let mut check = NotesStore::new();
    check.load_from(&adapter, "notes").unwrap();
    assert!(check.get_by_id(&id).is_some());
}

#[test]
fn held_lock_times_out_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FileAdapter::new(dir.path()).with_lock_timeout(Duration::from_millis(30));
    adapter.persist("notes", "[]").unwrap();
    fs::write(dir.path().join("notes.json.lock"), "").unwrap();

    let mut store = NotesStore::new();
    store.add(Note::new("blocked", "write")).unwrap();
    let err = store.save_to(&adapter, "notes", SaveMode::Merge).unwrap_err();

    assert!(matches!(err, StoreError::Persist(PersistError::Timeout { .. })));
    assert_eq!(adapter.retrieve("notes").unwrap().as_deref(), Some("[]"));
}

#[test]
fn lock_left_by_dead_writer_is_broken() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FileAdapter::new(dir.path()).with_lock_timeout(Duration::from_millis(200));
    let lock_path = dir.path().join("notes.json.lock");
    let lock = fs::File::create(&lock_path).unwrap();
    lock.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_577_836_800))
        .unwrap();
    drop(lock);

    let mut store = NotesStore::new();
    store.add(Note::with_id("x", "X", "y").unwrap()).unwrap();
    store.save_to(&adapter, "notes", SaveMode::Merge).unwrap();

    let mut check = NotesStore::new();
    check.load_from(&adapter, "notes").unwrap();
    assert!(check.get_by_id("x").is_some());
    assert!(!lock_path.exists());
}

#[test]
fn concurrent_merge_saves_do_not_lose_notes() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = Arc::new(FileAdapter::new(dir.path()));

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let adapter = Arc::clone(&adapter);
            thread::spawn(move || {
                let mut store = NotesStore::new();
                store
                    .add(Note::with_id(format!("w{worker}"), "title", "body").unwrap())
                    .unwrap();
                store.save_to(adapter.as_ref(), "notes", SaveMode::Merge).unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let mut check = NotesStore::new();
    let report = check.load_from(adapter.as_ref(), "notes").unwrap();
    assert_eq!(report.loaded, 8);
    assert!(!dir.path().join("notes.json.lock").exists());
}
