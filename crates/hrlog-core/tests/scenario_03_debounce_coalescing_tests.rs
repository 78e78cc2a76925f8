#![allow(clippy::unwrap_used, clippy::expect_used)]

/// Scenario 3: Typing bursts coalesce into one entry per field
mod common;

use common::{employee, new_service, value};
use hrlog_core::model::ChangeKind;
use serde_json::json;

#[test]
fn test_scenario_03_age_burst_commits_once() {
    // GIVEN an open edit session
    let (mut svc, clock) = new_service();
    svc.enter_edit_session("emp-1", employee());

    // WHEN age is edited three times inside the window
    assert!(svc.record_field_change("age", value(json!(30)), value(json!(31))));
    clock.advance(200);
    svc.record_field_change("age", value(json!(31)), value(json!(32)));
    clock.advance(200);
    svc.record_field_change("age", value(json!(32)), value(json!(33)));

    // THEN nothing commits before the window after the last edit
    clock.advance(999);
    assert!(svc.tick().is_empty());

    // AND exactly one entry commits once it elapses
    clock.advance(1);
    let entries = svc.tick();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].field, "age");
    assert_eq!(entries[0].old_value, json!(30));
    assert_eq!(entries[0].new_value, json!(33));
    assert_eq!(svc.pending_edits(), 0);

    let fields: Vec<_> = svc
        .load_log("emp-1", None)
        .into_iter()
        .filter(|e| e.kind == ChangeKind::FieldUpdated)
        .collect();
    assert_eq!(fields.len(), 1);
}

#[test]
fn test_scenario_03_burst_back_to_start_records_nothing() {
    let (mut svc, clock) = new_service();
    svc.enter_edit_session("emp-1", employee());

    svc.record_field_change("unit", value(json!("Alpha")), value(json!("Alph")));
    svc.record_field_change("unit", value(json!("Alph")), value(json!("Alpha")));

    clock.advance(2_000);
    assert!(svc.tick().is_empty());
}

#[test]
fn test_scenario_03_fields_commit_independently() {
    let (mut svc, clock) = new_service();
    svc.enter_edit_session("emp-1", employee());

    svc.record_field_change("name", value(json!("Ahmed")), value(json!("Ahmed K")));
    clock.advance(600);
    svc.record_field_change("unit", value(json!("Alpha")), value(json!("Bravo")));

    clock.advance(400);
    let first = svc.tick();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].field, "name");

    clock.advance(600);
    let second = svc.tick();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].field, "unit");
}

#[test]
fn test_scenario_03_denylisted_edit_records_nothing() {
    let (mut svc, clock) = new_service();
    svc.enter_edit_session("emp-1", employee());

    svc.record_field_change("picture", value(json!("a.png")), value(json!("b.png")));
    clock.advance(1_000);
    assert!(svc.tick().is_empty());
}

#[test]
fn test_scenario_03_save_cancels_pending_timers() {
    let (mut svc, clock) = new_service();
    let original = employee();
    svc.enter_edit_session("emp-1", original.clone());
    svc.record_field_change("age", value(json!(30)), value(json!(31)));

    let edited = original.clone().with_field("age", value(json!(31)));
    let saved = svc.commit_edits(&original, &edited);
    assert_eq!(saved.len(), 1);

    // the buffered edit must not fire after the session ended
    clock.advance(5_000);
    assert!(svc.tick().is_empty());
    assert_eq!(svc.next_due(), None);
}
