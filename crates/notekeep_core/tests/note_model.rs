use chrono::{DateTime, Utc};
use notekeep_core::{Note, NoteValidationError};

fn ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
}

#[test]
fn note_new_sets_defaults() {
    let note = Note::new("Groceries", "milk, eggs");

    assert!(!note.id().is_empty());
    assert_eq!(note.title(), "Groceries");
    assert_eq!(note.content(), "milk, eggs");
    assert_eq!(note.created_at(), note.updated_at());
}

#[test]
fn update_keeps_identity_and_bumps_updated_at() {
    let created = ts("2024-01-01T08:00:00Z");
    let mut note = Note::from_parts("n-1", "draft", "", created, created).unwrap();

    note.update("final", "body");

    assert_eq!(note.id(), "n-1");
    assert_eq!(note.created_at(), created);
    assert!(note.updated_at() > created);
    assert_eq!(note.title(), "final");
    assert_eq!(note.content(), "body");
}

#[test]
fn from_parts_rejects_reversed_timestamps() {
    let err = Note::from_parts(
        "n-1",
        "t",
        "c",
        ts("2024-01-02T00:00:00Z"),
        ts("2024-01-01T00:00:00Z"),
    )
    .unwrap_err();

    assert!(matches!(err, NoteValidationError::UpdatedBeforeCreated { .. }));
}

#[test]
fn serialization_uses_expected_wire_fields() {
    let note = Note::from_parts(
        "kx3f9a",
        "Groceries",
        "milk, eggs",
        ts("2024-03-05T10:00:00Z"),
        ts("2024-03-05T10:30:00.250Z"),
    )
    .unwrap();

    let json = serde_json::to_value(&note).unwrap();
    assert_eq!(json["id"], "kx3f9a");
    assert_eq!(json["title"], "Groceries");
    assert_eq!(json["content"], "milk, eggs");
    assert_eq!(json["createdAt"], "2024-03-05T10:00:00Z");
    assert_eq!(json["updatedAt"], "2024-03-05T10:30:00.250Z");

    let decoded: Note = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, note);
}

#[test]
fn deserialize_rejects_empty_id() {
    let value = serde_json::json!({
        "id": "",
        "title": "t",
        "content": "c",
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z"
    });

    let err = serde_json::from_value::<Note>(value).unwrap_err();
    assert!(err.to_string().contains("id must not be empty"), "unexpected error: {err}");
}

#[test]
fn describe_lists_every_field() {
    let note = Note::from_parts(
        "n-7",
        "Call",
        "dentist",
        ts("2024-02-01T09:00:00Z"),
        ts("2024-02-01T09:05:00Z"),
    )
    .unwrap();

    let text = note.describe();
    for expected in ["n-7", "Call", "dentist", "2024-02-01 09:00:00", "2024-02-01 09:05:00"] {
        assert!(text.contains(expected), "missing {expected} in {text}");
    }
    assert_eq!(note.to_string(), text);
}

#[test]
fn offset_timestamps_keep_their_instant_and_are_written_as_utc() {
    let payload = r#"{"id":"n-1","title":"t","content":"c",
        "createdAt":"2024-03-05T12:00:00+02:00","updatedAt":"2024-03-05T12:30:00+02:00"}"#;

    let note: Note = serde_json::from_str(payload).unwrap();
    assert_eq!(note.created_at(), ts("2024-03-05T10:00:00Z"));

    let json = serde_json::to_value(&note).unwrap();
    assert_eq!(json["createdAt"], "2024-03-05T10:00:00Z");
    assert_eq!(json["updatedAt"], "2024-03-05T10:30:00Z");
}
