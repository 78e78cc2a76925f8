use chrono::{TimeZone, Utc};
use hrlog_core::model::{ChangeEntry, ChangeKind, FieldChange, FieldValue, RecordSnapshot};
use hrlog_core::scheduler::ManualClock;
use hrlog_core::store::MemoryStorage;
use hrlog_core::AuditLogService;
use serde_json::{json, Value};

/// Service over an unlimited in-memory medium and a manual clock
///
/// The returned clock shares time with the service's clock.
#[allow(dead_code)]
pub fn new_service() -> (AuditLogService<MemoryStorage, ManualClock>, ManualClock) {
    service_over(MemoryStorage::new())
}

#[allow(dead_code)]
pub fn service_over(
    storage: MemoryStorage,
) -> (AuditLogService<MemoryStorage, ManualClock>, ManualClock) {
    let clock = ManualClock::starting_at(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap());
    (AuditLogService::new(storage, clock.clone()), clock)
}

#[allow(dead_code)]
pub fn value(v: Value) -> FieldValue {
    FieldValue::from(v)
}

/// A representative employee record
#[allow(dead_code)]
pub fn employee() -> RecordSnapshot {
    RecordSnapshot::from_json(json!({
        "id": "emp-1",
        "name": "Ahmed",
        "age": 30,
        "unit": "Alpha",
        "createdAt": "2024-01-10",
        "children": [{"name": "Rafi"}],
        "permanentAddress": {"village": "Kashipur", "district": "Barisal"},
        "emergencyContact": {"name": "Karim", "mobile": "01711000000"}
    }))
}

/// Build a stamped field entry `n` seconds after a fixed origin
#[allow(dead_code)]
pub fn numbered_entry(entity_id: &str, n: i64) -> ChangeEntry {
    let origin = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    ChangeEntry::stamp(
        FieldChange {
            kind: ChangeKind::FieldUpdated,
            field: "line".to_string(),
            old_value: json!(n),
            new_value: json!(n + 1),
        },
        entity_id,
        "System Administrator",
        format!("Line was changed from \"{}\" to \"{}\"", n, n + 1),
        origin + chrono::Duration::seconds(n),
    )
}
