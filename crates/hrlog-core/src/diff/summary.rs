//! Domain-aware value summaries for list and record changes.
//!
//! List and record changes are logged as short summaries rather than full
//! values, so that a nominee list or an address does not bloat the log.

use crate::model::FieldValue;
use std::collections::BTreeMap;

/// Field-name fragments of known list groups and the noun used to count them.
const LIST_GROUPS: &[(&str, &str)] = &[
    ("child", "child(ren)"),
    ("nominee", "nominee(s)"),
    ("expertise", "expertise(s)"),
    ("experience", "experience(s)"),
    ("efficiency", "efficiency record(s)"),
];

/// Address parts in the order they are written on an envelope.
const POSTAL_ORDER: &[&str] = &["houseOwnerName", "village", "postOffice", "upazilla", "district"];

/// Summarize a list value, e.g. `"2 child(ren)"` or `"3 items"`.
///
/// Anything that is not a list counts as zero items.
pub fn list_summary(field: &str, value: Option<&FieldValue>) -> String {
    let count = match value {
        Some(FieldValue::List(items)) => items.len(),
        _ => 0,
    };
    format!("{} {}", count, list_noun(field))
}

fn list_noun(field: &str) -> &'static str {
    let lower = field.to_ascii_lowercase();
    LIST_GROUPS
        .iter()
        .find(|(fragment, _)| lower.contains(fragment))
        .map(|(_, noun)| *noun)
        .unwrap_or("items")
}

/// Summarize a record value.
///
/// - addresses: non-empty parts joined with `", "`
/// - `emergencyContact`: `"Name (Mobile)"`
/// - anything else: `"<n> properties"`
///
/// Anything that is not a record summarizes as an empty record.
pub fn record_summary(field: &str, value: Option<&FieldValue>) -> String {
    let empty = BTreeMap::new();
    let fields = match value {
        Some(FieldValue::Record(fields)) => fields,
        _ => &empty,
    };

    if field.to_ascii_lowercase().contains("address") {
        address_summary(fields)
    } else if field.eq_ignore_ascii_case("emergencyContact") {
        contact_summary(fields)
    } else {
        format!("{} properties", fields.len())
    }
}

fn part_text(fields: &BTreeMap<String, FieldValue>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(FieldValue::as_display_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn address_summary(fields: &BTreeMap<String, FieldValue>) -> String {
    let known = POSTAL_ORDER.iter().copied();
    let rest = fields
        .keys()
        .map(String::as_str)
        .filter(|k| !POSTAL_ORDER.contains(k));

    known
        .chain(rest)
        .filter_map(|key| part_text(fields, key))
        .collect::<Vec<_>>()
        .join(", ")
}

fn contact_summary(fields: &BTreeMap<String, FieldValue>) -> String {
    match (part_text(fields, "name"), part_text(fields, "mobile")) {
        (Some(name), Some(mobile)) => format!("{} ({})", name, mobile),
        (Some(name), None) => name,
        (None, Some(mobile)) => format!("({})", mobile),
        (None, None) => String::new(),
    }
}
