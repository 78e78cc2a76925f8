//! Human-readable descriptions of field changes.

use crate::model::{ChangeKind, FieldChange};
use serde_json::Value;

const EMPTY: &str = "empty";

/// Turn a raw field name into a label.
///
/// Inserts a space before each capital letter, replaces underscores with
/// spaces and capitalizes the first letter: `emergencyContact` becomes
/// `Emergency Contact`, `blood_group` becomes `Blood group`.
pub fn format_field_name(raw: &str) -> String {
    let mut spaced = String::with_capacity(raw.len() + 4);
    for c in raw.chars() {
        if c.is_uppercase() {
            spaced.push(' ');
        }
        spaced.push(if c == '_' { ' ' } else { c });
    }

    let trimmed = spaced.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Display text of a logged value: strings verbatim, null as empty,
/// containers as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn or_empty(text: &str) -> &str {
    if text.is_empty() {
        EMPTY
    } else {
        text
    }
}

/// Render the sentence recorded as a change entry's description.
pub fn describe(change: &FieldChange) -> String {
    let label = format_field_name(&change.field);
    let old = display_value(&change.old_value);
    let new = display_value(&change.new_value);

    match change.kind {
        ChangeKind::FieldUpdated => {
            if old.is_empty() && !new.is_empty() {
                format!("{} was set to \"{}\"", label, new)
            } else if new.is_empty() && !old.is_empty() {
                format!("{} was cleared", label)
            } else {
                format!(
                    "{} was changed from \"{}\" to \"{}\"",
                    label,
                    or_empty(&old),
                    or_empty(&new)
                )
            }
        }
        ChangeKind::ArrayUpdated | ChangeKind::ObjectUpdated => {
            format!("{} was updated ({} → {})", label, or_empty(&old), or_empty(&new))
        }
        ChangeKind::Created => "Record was created".to_string(),
        ChangeKind::ModeEntered => "Entered edit mode".to_string(),
    }
}
