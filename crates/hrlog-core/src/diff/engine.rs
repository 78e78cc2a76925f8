//! Snapshot diff computation engine.
//!
//! The core entry point is [`compute_diff`], which compares two record
//! snapshots field by field and returns the changes in field-name order.

use crate::diff::summary::{list_summary, record_summary};
use crate::model::{ChangeKind, FieldChange, FieldValue, RecordSnapshot, Scalar, Shape};
use serde_json::Value;
use std::collections::BTreeSet;

/// Fields that never produce changes: identity, bookkeeping timestamps,
/// and the photo (logged through its own upload path).
pub const DEFAULT_DENYLIST: &[&str] = &["id", "createdAt", "updatedAt", "picture"];

/// Compute the changes between two snapshots using the default denylist.
pub fn compute_diff(original: &RecordSnapshot, edited: &RecordSnapshot) -> Vec<FieldChange> {
    diff_fields(original, edited, |field| DEFAULT_DENYLIST.contains(&field))
}

/// Compute the changes between two snapshots, skipping `denylist` fields.
pub fn compute_diff_with(
    original: &RecordSnapshot,
    edited: &RecordSnapshot,
    denylist: &[String],
) -> Vec<FieldChange> {
    diff_fields(original, edited, |field| denylist.iter().any(|d| d == field))
}

fn diff_fields<F>(original: &RecordSnapshot, edited: &RecordSnapshot, is_denied: F) -> Vec<FieldChange>
where
    F: Fn(&str) -> bool,
{
    let fields: BTreeSet<&str> = original.field_names().chain(edited.field_names()).collect();

    fields
        .into_iter()
        .filter(|field| !is_denied(field))
        .filter_map(|field| diff_field(field, original.get(field), edited.get(field)))
        .collect()
}

/// Treat null and the empty string the same as an absent field.
fn present(value: Option<&FieldValue>) -> Option<&FieldValue> {
    value.filter(|v| !is_blank(v))
}

fn is_blank(value: &FieldValue) -> bool {
    match value {
        FieldValue::Scalar(Scalar::Null) => true,
        FieldValue::Scalar(Scalar::Text(text)) => text.is_empty(),
        _ => false,
    }
}

/// Shape of the edited value, falling back to the original's when the
/// edited value is absent, null or empty.
fn classify(old: Option<&FieldValue>, new: Option<&FieldValue>) -> Shape {
    present(new)
        .or_else(|| present(old))
        .map(FieldValue::shape)
        .unwrap_or(Shape::Scalar)
}

/// Canonical form with blank/absent normalized to the empty value of `shape`.
fn normalized_canonical(value: Option<&FieldValue>, shape: Shape) -> String {
    match present(value) {
        Some(v) => v.canonical(),
        None => match shape {
            Shape::Scalar => Value::String(String::new()).to_string(),
            Shape::List => Value::Array(Vec::new()).to_string(),
            Shape::Record => Value::Object(serde_json::Map::new()).to_string(),
        },
    }
}

fn raw_json(value: Option<&FieldValue>) -> Value {
    value.map(FieldValue::to_json).unwrap_or(Value::Null)
}

fn diff_field(
    field: &str,
    old: Option<&FieldValue>,
    new: Option<&FieldValue>,
) -> Option<FieldChange> {
    let shape = classify(old, new);
    if normalized_canonical(old, shape) == normalized_canonical(new, shape) {
        return None;
    }

    let change = match shape {
        Shape::List => FieldChange {
            kind: ChangeKind::ArrayUpdated,
            field: field.to_string(),
            old_value: Value::String(list_summary(field, old)),
            new_value: Value::String(list_summary(field, new)),
        },
        Shape::Record => FieldChange {
            kind: ChangeKind::ObjectUpdated,
            field: field.to_string(),
            old_value: Value::String(record_summary(field, old)),
            new_value: Value::String(record_summary(field, new)),
        },
        Shape::Scalar => FieldChange {
            kind: ChangeKind::FieldUpdated,
            field: field.to_string(),
            old_value: raw_json(old),
            new_value: raw_json(new),
        },
    };
    Some(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snap(v: Value) -> RecordSnapshot {
        RecordSnapshot::from_json(v)
    }

    #[test]
    fn test_scalar_change() {
        let changes = compute_diff(
            &snap(json!({"name": "Ahmed", "age": 30})),
            &snap(json!({"name": "Ahmed Khan", "age": 30})),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::FieldUpdated);
        assert_eq!(changes[0].field, "name");
        assert_eq!(changes[0].old_value, json!("Ahmed"));
        assert_eq!(changes[0].new_value, json!("Ahmed Khan"));
    }

    #[test]
    fn test_null_and_absent_equal_empty() {
        let changes = compute_diff(
            &snap(json!({"spouseName": null, "religion": ""})),
            &snap(json!({"spouseName": "", "nidNumber": null})),
        );
        assert!(changes.is_empty(), "unexpected changes: {:?}", changes);
    }

    #[test]
    fn test_absent_list_equals_empty_list() {
        let changes = compute_diff(&snap(json!({})), &snap(json!({"children": []})));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_empty_string_equals_empty_container() {
        let changes = compute_diff(
            &snap(json!({"skills": "", "permanentAddress": ""})),
            &snap(json!({"skills": [], "permanentAddress": {}})),
        );
        assert!(changes.is_empty(), "unexpected changes: {:?}", changes);

        let back = compute_diff(
            &snap(json!({"skills": []})),
            &snap(json!({"skills": ""})),
        );
        assert!(back.is_empty());
    }

    #[test]
    fn test_list_cleared_to_empty_string_is_array_update() {
        let changes = compute_diff(
            &snap(json!({"children": [{"name": "Rafi"}]})),
            &snap(json!({"children": ""})),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::ArrayUpdated);
        assert_eq!(changes[0].old_value, json!("1 child(ren)"));
        assert_eq!(changes[0].new_value, json!("0 child(ren)"));
    }

    #[test]
    fn test_list_growth_summarized() {
        let changes = compute_diff(
            &snap(json!({"children": [{"name": "Ali"}]})),
            &snap(json!({"children": [{"name": "Ali"}, {"name": "Sara"}]})),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::ArrayUpdated);
        assert_eq!(changes[0].old_value, json!("1 child(ren)"));
        assert_eq!(changes[0].new_value, json!("2 child(ren)"));
    }

    #[test]
    fn test_list_element_edit_detected_with_same_length() {
        let changes = compute_diff(
            &snap(json!({"nominee": [{"name": "Rahim"}]})),
            &snap(json!({"nominee": [{"name": "Karim"}]})),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value, json!("1 nominee(s)"));
        assert_eq!(changes[0].new_value, json!("1 nominee(s)"));
    }

    #[test]
    fn test_record_key_order_is_not_a_change() {
        let changes = compute_diff(
            &snap(json!({"emergencyContact": {"name": "Karim", "mobile": "017"}})),
            &snap(json!({"emergencyContact": {"mobile": "017", "name": "Karim"}})),
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn test_denylisted_fields_skipped() {
        let changes = compute_diff(
            &snap(json!({"id": 1, "createdAt": "a", "updatedAt": "b", "picture": "x.png"})),
            &snap(json!({"id": 2, "createdAt": "c", "updatedAt": "d", "picture": "y.png"})),
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn test_custom_denylist() {
        let deny = vec!["grossSalary".to_string()];
        let changes = compute_diff_with(
            &snap(json!({"grossSalary": 100, "id": 1})),
            &snap(json!({"grossSalary": 200, "id": 2})),
            &deny,
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "id");
    }

    #[test]
    fn test_shape_change_is_reported() {
        let changes = compute_diff(
            &snap(json!({"skills": "welding"})),
            &snap(json!({"skills": ["welding"]})),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::ArrayUpdated);
        assert_eq!(changes[0].old_value, json!("0 items"));
    }

    #[test]
    fn test_number_and_string_are_distinct() {
        let changes = compute_diff(&snap(json!({"age": 30})), &snap(json!({"age": "30"})));
        assert_eq!(changes.len(), 1);
    }
}
