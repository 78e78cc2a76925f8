#![allow(clippy::unwrap_used, clippy::expect_used)]

/// Scenario 6: Edit session lifecycle
///
/// View -> Edit -> Saved/Cancelled -> View, with the synthetic creation
/// entry for records that have no history yet.
mod common;

use common::{employee, new_service, service_over, value};
use hrlog_core::model::{ChangeKind, RecordSnapshot};
use hrlog_core::store::MemoryStorage;
use hrlog_core::{EditMode, SessionEnd};
use serde_json::json;

#[test]
fn test_scenario_06_full_session() {
    // GIVEN a service in view mode
    let (mut svc, clock) = new_service();
    assert_eq!(svc.mode(), EditMode::View);

    // WHEN a session is opened
    let original = employee();
    let session_id = svc.enter_edit_session("emp-1", original.clone());
    assert_eq!(svc.mode(), EditMode::Edit);
    assert_eq!(svc.session_id(), Some(&session_id));
    assert_eq!(svc.editing_entity(), Some("emp-1"));
    assert_eq!(svc.session_original(), Some(&original));

    // AND a field is typed and left to settle
    svc.record_field_change("unit", value(json!("Alpha")), value(json!("Bravo")));
    clock.advance(1_000);
    assert_eq!(svc.tick().len(), 1);

    // AND the record is saved with another change
    clock.advance(5_000);
    let edited = original
        .clone()
        .with_field("unit", value(json!("Bravo")))
        .with_field("age", value(json!(31)));
    let saved = svc.commit_edits(&original, &edited);

    // THEN both fields are recorded by the save, in field order
    let fields: Vec<_> = saved.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["age", "unit"]);
    assert_eq!(svc.mode(), EditMode::View);
    assert_eq!(svc.last_session_end(), Some(SessionEnd::Saved));
    assert_eq!(svc.baseline("emp-1"), Some(&edited));

    // AND the log holds the mode entry, the typed edit and the save, newest first
    let log = svc.load_log("emp-1", Some(&edited));
    let kinds: Vec<_> = log.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ChangeKind::FieldUpdated,
            ChangeKind::FieldUpdated,
            ChangeKind::FieldUpdated,
            ChangeKind::ModeEntered
        ]
    );
    assert!(log[0].timestamp > log[2].timestamp);
}

#[test]
fn test_scenario_06_created_entry_for_fresh_record() {
    let (svc, _) = new_service();
    let log = svc.load_log("emp-1", Some(&employee()));

    assert_eq!(log.len(), 1);
    assert_eq!(log[0].kind, ChangeKind::Created);
    assert_eq!(log[0].timestamp.to_rfc3339(), "2024-01-10T00:00:00+00:00");
    assert_eq!(log[0].actor, "System Administrator");
}

#[test]
fn test_scenario_06_no_created_entry_without_timestamp() {
    let (svc, _) = new_service();
    let record = RecordSnapshot::from_json(json!({"name": "Ahmed", "createdAt": "someday"}));
    assert!(svc.load_log("emp-1", Some(&record)).is_empty());
    assert!(svc.load_log("emp-1", None).is_empty());
}

#[test]
fn test_scenario_06_storage_failure_never_blocks_editing() {
    // GIVEN a medium with no room at all
    let (mut svc, clock) = service_over(MemoryStorage::with_quota(0));

    // WHEN a whole session runs
    let original = employee();
    svc.enter_edit_session("emp-1", original.clone());
    svc.record_field_change("age", value(json!(30)), value(json!(31)));
    clock.advance(1_000);
    let typed = svc.tick();
    let edited = original.clone().with_field("name", value(json!("Ahmed Khan")));
    let saved = svc.commit_edits(&original, &edited);

    // THEN every entry was still produced and remains visible
    assert_eq!(typed.len(), 1);
    assert_eq!(saved.len(), 1);
    assert_eq!(svc.load_log("emp-1", None).len(), 3);
}

#[test]
fn test_scenario_06_clear_and_clear_all() {
    let (mut svc, _) = new_service();
    svc.enter_edit_session("emp-1", employee());
    svc.cancel_edit();
    svc.enter_edit_session("emp-2", employee());
    svc.cancel_edit();

    assert!(svc.clear("emp-1"));
    assert!(svc.load_log("emp-1", None).is_empty());
    assert_eq!(svc.load_log("emp-2", None).len(), 1);

    assert_eq!(svc.clear_all(), 1);
    assert!(svc.load_log("emp-2", None).is_empty());
}
